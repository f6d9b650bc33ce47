use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "shoptrader-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_shoptrader-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("smoke"));
}

#[test]
fn cli_runs_smoke_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_shoptrader-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke",
            "--iterations",
            "1",
            "--seeds",
            "1,0x2",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Shop Trader Automated Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let results: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let results = results.as_array().expect("array");
    assert_eq!(results.len(), 4, "two variants times two seeds");
    assert!(results.iter().all(|r| r["passed"] == true));
}

#[test]
fn cli_fails_on_unreachable_victory() {
    let exe = env!("CARGO_BIN_EXE_shoptrader-tester");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "victory",
            "--variant",
            "book_trader",
            "--max-days",
            "2",
            "--iterations",
            "1",
            "--output",
        ])
        .arg(temp_path("victory"))
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn cli_rejects_bad_seeds() {
    let exe = env!("CARGO_BIN_EXE_shoptrader-tester");
    let output = Command::new(exe)
        .args(["--seeds", "banana", "--output"])
        .arg(temp_path("bad"))
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}
