use std::process::Command;

use serde_json::Value;

#[test]
fn simulate_prints_a_json_report() {
    let output = Command::new(env!("CARGO_BIN_EXE_bastion"))
        .args(["--seed", "11", "simulate", "--max-seconds", "3"])
        .output()
        .expect("failed to launch the bastion binary");

    assert!(output.status.success(), "bastion simulate should succeed");
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout is json");
    assert_eq!(report["seed"], 11);
    assert!(report["outcome"].is_null());
    assert_eq!(report["players"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["players"][0]["gold"], 100);
}

#[test]
fn missing_config_files_are_reported() {
    let output = Command::new(env!("CARGO_BIN_EXE_bastion"))
        .args(["--config", "does-not-exist.toml", "simulate"])
        .output()
        .expect("failed to launch the bastion binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does-not-exist.toml"));
}
