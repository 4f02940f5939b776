#![cfg(feature = "cli")]

use std::process::Command;

fn dsmrp1(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dsmrp1"))
        .args(args)
        .output()
        .expect("dsmrp1 should run")
}

#[test]
fn version_prints_package_version() {
    let output = dsmrp1(&["version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("dsmrp1 {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_extended_lists_features() {
    let output = dsmrp1(&["version", "--extended"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: dsmrp1"));
    assert!(stdout.contains("serial=true"));
    assert!(stdout.contains("default_device: /dev/ttyUSB0"));
    assert!(!stdout.contains("unknown"));
}

#[test]
fn envinfo_reports_resolved_serial_settings() {
    let output = Command::new(env!("CARGO_BIN_EXE_dsmrp1"))
        .args(["--format", "json", "envinfo", "--parity", "even"])
        .env("DSMRP1_DEVICE", "/dev/ttyAMA0")
        .env_remove("DSMRP1_BAUD")
        .output()
        .expect("envinfo should run");

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("envinfo output should be JSON");
    assert_eq!(value["serial"]["device"], "/dev/ttyAMA0");
    assert_eq!(value["serial"]["baud_rate"], 115_200);
    assert_eq!(value["serial"]["parity"], "even");
    assert_eq!(value["defaults"]["device"], "/dev/ttyUSB0");
    assert_eq!(value["defaults"]["parity"], "none");
    assert_eq!(value["environment"]["DSMRP1_DEVICE"], "/dev/ttyAMA0");
    assert!(value["environment"]["DSMRP1_BAUD"].is_null());
    assert_eq!(value["serial_support"], true);
    assert_eq!(value["decoder"]["max_telegram_size"], 16 * 1024);
    assert_eq!(value["decoder"]["winter_zone"], "CET (+01:00)");
}

#[test]
fn envinfo_table_lists_settings() {
    let output = dsmrp1(&["--format", "table", "envinfo", "--baud", "9600"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("9600 8N1"));
    assert!(stdout.contains("CEST (+02:00)"));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = dsmrp1(&["listen"]);
    assert_eq!(output.status.code(), Some(2));
}
