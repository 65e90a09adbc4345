use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use irforge_contracts::{IRFORGE_CHECK_CONFIG_SCHEMA_VERSION, IRFORGE_REPORT_SCHEMA_VERSION};
use serde_json::json;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir(prefix: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    base.join(format!("{prefix}_{pid}_{n}"))
}

#[test]
fn cli_check_report_json_is_stable() {
    let dir = temp_dir("irforge_cli_report_json");
    std::fs::create_dir_all(&dir).expect("create temp dir");

    let ok_path = dir.join("ok.kt");
    std::fs::write(&ok_path, "class C<T> { val x: List<T> }\n").expect("write ok source");

    let bin = env!("CARGO_BIN_EXE_irforge");
    let ok_out = Command::new(bin)
        .arg("check")
        .arg("--input")
        .arg(&ok_path)
        .arg("--report-json")
        .output()
        .expect("run irforge check --report-json");

    assert!(
        ok_out.status.success(),
        "status={}\nstderr={}",
        ok_out.status,
        String::from_utf8_lossy(&ok_out.stderr)
    );
    let v: serde_json::Value = serde_json::from_slice(&ok_out.stdout).expect("parse report json");
    assert_eq!(
        v.get("schema_version").and_then(|s| s.as_str()),
        Some(IRFORGE_REPORT_SCHEMA_VERSION)
    );
    assert_eq!(v.get("command").and_then(|s| s.as_str()), Some("check"));
    assert_eq!(v.get("ok").and_then(|b| b.as_bool()), Some(true));
    assert_eq!(v.get("tree").and_then(|s| s.as_str()), Some("materialized"));
    assert_eq!(v.get("diagnostics_count").and_then(|n| n.as_u64()), Some(0));
    assert_eq!(v.get("exit_code").and_then(|n| n.as_u64()), Some(0));
    assert!(v.get("diagnostics").is_none());

    let bad_path = dir.join("bad.kt");
    std::fs::write(&bad_path, "class C<T> { val x: T<String> }\n").expect("write bad source");
    let bad_out = Command::new(bin)
        .arg("check")
        .arg("--input")
        .arg(&bad_path)
        .arg("--tree")
        .arg("flyweight")
        .arg("--report-json")
        .output()
        .expect("run irforge check --report-json (bad)");

    assert_eq!(bad_out.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_slice(&bad_out.stdout).expect("parse report json");
    assert_eq!(v.get("ok").and_then(|b| b.as_bool()), Some(false));
    assert_eq!(v.get("tree").and_then(|s| s.as_str()), Some("flyweight"));
    assert_eq!(v.get("diagnostics_count").and_then(|n| n.as_u64()), Some(1));
    let diag = &v["diagnostics"][0];
    assert_eq!(diag["code"], json!("IRF-TYPEARGS-0001"));
    assert_eq!(diag["data"], json!({ "kind": "TYPE_ARGUMENTS_NOT_ALLOWED" }));
    assert_eq!(diag["loc"]["snippet"], json!("<String>"));
}

#[test]
fn cli_check_reads_config_and_reports_text() {
    let dir = temp_dir("irforge_cli_config");
    std::fs::create_dir_all(&dir).expect("create temp dir");

    let src = dir.join("main.kt");
    std::fs::write(&src, "val x = kotlin<Int>.println()\n").expect("write source");
    let config = dir.join("irforge.json");
    let config_doc = json!({
        "schema_version": IRFORGE_CHECK_CONFIG_SCHEMA_VERSION,
        "known_packages": ["kotlin"],
    });
    std::fs::write(
        &config,
        serde_json::to_vec(&config_doc).expect("encode config"),
    )
    .expect("write config");

    let out = Command::new(env!("CARGO_BIN_EXE_irforge"))
        .arg("check")
        .arg("--input")
        .arg(&src)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("run irforge check --config");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(":1:15: IRF-TYPEARGS-0001:"), "stderr={stderr}");

    let bad_config = dir.join("bad.json");
    std::fs::write(&bad_config, br#"{"schema_version":"irforge.check-config@0.0.0"}"#)
        .expect("write bad config");
    let out = Command::new(env!("CARGO_BIN_EXE_irforge"))
        .arg("check")
        .arg("--input")
        .arg(&src)
        .arg("--config")
        .arg(&bad_config)
        .output()
        .expect("run irforge check with bad config");
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn cli_parse_dumps_the_tree() {
    let dir = temp_dir("irforge_cli_parse");
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let src = dir.join("t.kt");
    std::fs::write(&src, "val x: Int").expect("write source");

    let bin = env!("CARGO_BIN_EXE_irforge");
    let mut dumps = Vec::new();
    for tree in ["materialized", "flyweight"] {
        let out = Command::new(bin)
            .arg("parse")
            .arg("--input")
            .arg(&src)
            .arg("--tree")
            .arg(tree)
            .output()
            .expect("run irforge parse");
        assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
        dumps.push(String::from_utf8(out.stdout).expect("utf-8 dump"));
    }
    assert_eq!(dumps[0], dumps[1]);
    assert!(dumps[0].starts_with("File@0..10"), "dump:\n{}", dumps[0]);
    assert!(dumps[0].contains("UserType@7..10"), "dump:\n{}", dumps[0]);
}
