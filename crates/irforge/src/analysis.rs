//! Source text in, diagnostic report out: parse, build the configured tree,
//! resolve, check.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info_span};

use crate::checker::{DiagnosticKind, DiagnosticReporter, SourceSpan, TypeArgumentsChecker};
use crate::config::{limits, CheckOptions, TreeMode};
use crate::diagnostics::{
    Diagnostic, Location, Position, Quickfix, QuickfixKind, Report, Severity, Span, Stage,
    TextEdit,
};
use crate::light_tree::LightTree;
use crate::line_index::LineIndex;
use crate::parse_tree::ParseTree;
use crate::parser::{parse, ParseError};
use crate::resolve::resolve_file;
use crate::source_tree::{SourceTree, TextRange};

pub const PARSE_ERROR_CODE: &str = "IRF-PARSE-0001";
pub const SOURCE_TOO_LARGE_CODE: &str = "IRF-LIMIT-0001";

/// Turns checker reports into located diagnostics for one unit.
pub struct DiagnosticCollector<'a> {
    unit: String,
    text: &'a str,
    line_index: LineIndex,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> DiagnosticCollector<'a> {
    pub fn new(unit: &str, text: &'a str) -> Self {
        Self {
            unit: unit.to_string(),
            text,
            line_index: LineIndex::new(text),
            diagnostics: Vec::new(),
        }
    }

    fn location(&self, range: TextRange) -> Location {
        let position = |offset: u32| {
            let (line, col) = self.line_index.line_col(offset);
            Position {
                line,
                col,
                offset: Some(u64::from(offset)),
            }
        };
        Location::Text {
            span: Span {
                start: position(range.start),
                end: position(range.end),
                file: Some(self.unit.clone()),
            },
            snippet: self
                .text
                .get(range.start as usize..range.end as usize)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    fn parse_error(&mut self, error: &ParseError) {
        let loc = self.location(error.range);
        self.diagnostics.push(Diagnostic {
            code: PARSE_ERROR_CODE.to_string(),
            severity: Severity::Error,
            stage: Stage::Parse,
            message: error.message.clone(),
            loc: Some(loc),
            notes: Vec::new(),
            related: Vec::new(),
            data: BTreeMap::new(),
            quickfix: None,
        });
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticReporter for DiagnosticCollector<'_> {
    fn report(&mut self, kind: DiagnosticKind, span: SourceSpan) {
        let range = TextRange::new(span.start, span.end);
        let mut data = BTreeMap::new();
        data.insert("kind".to_string(), Value::String(kind.name().to_string()));
        let loc = self.location(range);
        self.diagnostics.push(Diagnostic {
            code: kind.code().to_string(),
            severity: Severity::Error,
            stage: Stage::Check,
            message: kind.message().to_string(),
            loc: Some(loc),
            notes: Vec::new(),
            related: Vec::new(),
            data,
            quickfix: Some(Quickfix {
                kind: QuickfixKind::TextEdit,
                edits: vec![TextEdit {
                    start: u64::from(span.start),
                    end: u64::from(span.end),
                    replacement: String::new(),
                }],
                note: Some("remove the type arguments".to_string()),
            }),
        });
    }
}

/// Resolves `tree` and runs the type-argument checker over it.
pub fn check_tree<T: SourceTree>(
    unit: &str,
    tree: &T,
    known_packages: &[String],
    reporter: &mut dyn DiagnosticReporter,
) {
    let resolved = resolve_file(tree, known_packages);
    TypeArgumentsChecker::new(unit).check_file(tree, &resolved, reporter);
}

pub fn analyze_source(unit: &str, text: &str, options: &CheckOptions) -> Report {
    let _span = info_span!("analyze", unit, tree = options.tree.as_str()).entered();
    let mut collector = DiagnosticCollector::new(unit, text);

    let max_bytes = limits::max_source_bytes();
    if text.len() > max_bytes {
        collector.diagnostics.push(Diagnostic {
            code: SOURCE_TOO_LARGE_CODE.to_string(),
            severity: Severity::Error,
            stage: Stage::Parse,
            message: format!("source is {} bytes, limit is {max_bytes}", text.len()),
            loc: None,
            notes: Vec::new(),
            related: Vec::new(),
            data: BTreeMap::new(),
            quickfix: None,
        });
        return finish(unit, options, collector.into_diagnostics());
    }

    let parse = parse(text);
    for error in &parse.errors {
        collector.parse_error(error);
    }
    match options.tree {
        TreeMode::Materialized => {
            let tree = ParseTree::build(text, &parse.events);
            check_tree(unit, &tree, &options.known_packages, &mut collector);
        }
        TreeMode::Flyweight => {
            let tree = LightTree::new(text, parse.events);
            check_tree(unit, &tree, &options.known_packages, &mut collector);
        }
    }
    finish(unit, options, collector.into_diagnostics())
}

fn finish(unit: &str, options: &CheckOptions, diagnostics: Vec<Diagnostic>) -> Report {
    let total = diagnostics.len();
    let mut report = Report::ok()
        .with_diagnostics(diagnostics)
        .with_meta("unit", Value::String(unit.to_string()))
        .with_meta("tree", Value::String(options.tree.as_str().to_string()));
    if total > options.max_diagnostics {
        report.diagnostics.truncate(options.max_diagnostics);
        report = report.with_meta("truncated_from", Value::from(total));
    }
    debug!(diagnostics = total, ok = report.ok, "analysis finished");
    report
}
