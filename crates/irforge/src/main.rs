use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use irforge::analysis;
use irforge::config::{self, CheckOptions, TreeMode};
use irforge::diagnostics::{self, Location};
use irforge::light_tree::LightTree;
use irforge::logging::{init_logging, LogFormat, LogLevel, LogSettings};
use irforge::parse_tree::ParseTree;
use irforge::parser::parse;
use irforge::source_tree::SourceTree;
use irforge_contracts::IRFORGE_REPORT_SCHEMA_VERSION;

#[derive(Parser)]
#[command(name = "irforge")]
#[command(about = "Type-argument placement checker.", long_about = None)]
struct Cli {
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    Check {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum)]
        tree: Option<TreeMode>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        report_json: bool,
    },
    Parse {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = TreeMode::Materialized)]
        tree: TreeMode,
    },
}

#[derive(Debug, Serialize)]
struct IrforgeToolReport {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    r#in: String,
    tree: &'static str,
    diagnostics_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<diagnostics::Diagnostic>,
    exit_code: u8,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let log_options = LogSettings {
        format: cli.log_format,
        level: cli.log_level,
    }
    .merged_with_env();
    init_logging(&log_options);

    match cli.cmd {
        Cmd::Check {
            input,
            tree,
            config,
            report_json,
        } => {
            let mut options = match &config {
                Some(path) => config::load_check_config(path)?.into_options(),
                None => CheckOptions::default(),
            };
            if let Some(tree) = tree {
                options.tree = tree;
            }
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("read input: {}", input.display()))?;
            let unit = input.display().to_string();
            let report = analysis::analyze_source(&unit, &text, &options);
            let exit_code: u8 = if report.ok { 0 } else { 1 };

            if report_json {
                let tool_report = IrforgeToolReport {
                    schema_version: IRFORGE_REPORT_SCHEMA_VERSION,
                    command: "check",
                    ok: report.ok,
                    r#in: unit,
                    tree: options.tree.as_str(),
                    diagnostics_count: report.diagnostics.len(),
                    diagnostics: report.diagnostics,
                    exit_code,
                };
                print_json(&tool_report)?;
            } else {
                for d in &report.diagnostics {
                    eprintln!("{}", render_diagnostic(d));
                }
            }
            Ok(ExitCode::from(exit_code))
        }
        Cmd::Parse { input, tree } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("read input: {}", input.display()))?;
            let parse = parse(&text);
            let dump = match tree {
                TreeMode::Materialized => ParseTree::build(&text, &parse.events).dump(),
                TreeMode::Flyweight => LightTree::new(&text, parse.events).dump(),
            };
            print!("{dump}");
            for error in &parse.errors {
                eprintln!(
                    "{}:{}..{}: {}",
                    input.display(),
                    error.range.start,
                    error.range.end,
                    error.message
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn render_diagnostic(d: &diagnostics::Diagnostic) -> String {
    match &d.loc {
        Some(Location::Text { span, .. }) => format!(
            "{}:{}:{}: {}: {}",
            span.file.as_deref().unwrap_or("<input>"),
            span.start.line,
            span.start.col,
            d.code,
            d.message
        ),
        _ => format!("{}: {}", d.code, d.message),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
