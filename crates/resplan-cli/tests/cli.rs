//! End-to-end tests driving the `resplan` binary
//!
//! ## Exit Code Contract
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success |
//! | 1 | Failure |
//! | 2 | Week edit declined, workbook untouched |

use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

fn resplan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_resplan"))
        .args(args)
        .env_remove("RESPLAN_FORMAT")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute resplan")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

const PORTAL: &str = r#"{
  "project": {
    "name": "Customer Portal",
    "clientCurrency": "EUR",
    "exchangeRate": 0.89,
    "defaultMargin": 25
  },
  "rateCards": [
    {"role": "Application Development", "ukraine": 25, "london": "62.5"},
    {"role": "QA Engineer", "namingInPM": "Test Engineer", "ukraine": 13}
  ],
  "resources": [
    {"role": "Application Development", "name": "John Smith", "intRate": 25}
  ],
  "weeks": 3,
  "plans": [
    {
      "id": "1",
      "role": "Application Development",
      "intHourlyRate": 25,
      "clientHourlyRate": 43,
      "weeklyAllocations": [
        {"weekNumber": 1, "allocation": 10},
        {"weekNumber": 2, "allocation": "20"},
        {"weekNumber": 3, "allocation": 30}
      ]
    }
  ]
}
"#;

fn portal() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portal.json");
    fs::write(&path, PORTAL).unwrap();
    (dir, path)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn allocations(workbook: &Value) -> Vec<(u64, u64)> {
    workbook["plans"][0]["weeklyAllocations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|wa| (wa["weekNumber"].as_u64().unwrap(), wa["allocation"].as_u64().unwrap()))
        .collect()
}

// =============================================================================
// init
// =============================================================================

#[test]
fn init_writes_default_workbook() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");

    let output = resplan(&["init", arg(&path)]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Created:"));
    let workbook = read_json(&path);
    assert_eq!(workbook["project"]["name"], "Default Project");
    assert_eq!(workbook["project"]["clientCurrency"], "EUR");
    assert_eq!(workbook["project"]["exchangeRate"], 0.89);
    assert_eq!(workbook["project"]["daysInFTE"], 20);
    assert_eq!(workbook["weeks"], 1);
}

#[test]
fn init_toml_with_settings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.toml");

    let output = resplan(&[
        "init",
        arg(&path),
        "--name",
        "Data Platform",
        "--currency",
        "gbp",
        "--exchange-rate",
        "0.79",
        "--weeks",
        "6",
    ]);

    assert!(output.status.success(), "{}", stderr(&output));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("name = \"Data Platform\""));
    assert!(text.contains("clientCurrency = \"GBP\""));
    assert!(text.contains("weeks = 6"));
}

#[test]
fn init_refuses_overwrite() {
    let (_dir, path) = portal();

    let output = resplan(&["init", arg(&path)]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("already exists"));
    assert_eq!(fs::read_to_string(&path).unwrap(), PORTAL);
}

// =============================================================================
// report / export
// =============================================================================

#[test]
fn text_report() {
    let (_dir, path) = portal();

    let output = resplan(&["report", arg(&path)]);

    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Project: Customer Portal"));
    // 60% of a week over three weeks is 24 hours
    assert!(text.contains("Total effort:   24.0 h"));
    assert!(text.contains("Internal cost:  $600.00"));
    assert!(text.contains("Client price:   €1,032.00"));
}

#[test]
fn json_report_selected_by_environment() {
    let (_dir, path) = portal();

    let output = Command::new(env!("CARGO_BIN_EXE_resplan"))
        .args(["report", arg(&path)])
        .env("RESPLAN_FORMAT", "json")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["projectName"], "Customer Portal");
    assert_eq!(report["weeks"], serde_json::json!([1, 2, 3]));
    assert_eq!(report["plans"][0]["effortHours"], 24.0);
    assert_eq!(report["totals"]["internalCost"], 600.0);
}

#[test]
fn report_to_file() {
    let (dir, path) = portal();
    let out = dir.path().join("report.json");

    let output = resplan(&["report", arg(&path), "--format", "json", "-o", arg(&out)]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(read_json(&out)["currency"], "EUR");
}

#[test]
fn export_writes_xlsx() {
    let (dir, path) = portal();
    let out = dir.path().join("portal.xlsx");

    let output = resplan(&["export", arg(&path), "-o", arg(&out)]);

    assert!(output.status.success(), "{}", stderr(&output));
    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn unreadable_workbook_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let output = resplan(&["report", arg(&path)]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("broken.json"));
}

// =============================================================================
// week
// =============================================================================

#[test]
fn week_insert_rewrites_in_place() {
    let (_dir, path) = portal();

    let output = resplan(&["week", "insert", arg(&path), "--at", "2"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Weeks: 4"));
    let workbook = read_json(&path);
    assert_eq!(workbook["weeks"], 4);
    assert_eq!(allocations(&workbook), vec![(1, 10), (2, 20), (3, 0), (4, 30)]);
}

#[test]
fn week_remove_to_output_file() {
    let (dir, path) = portal();
    let out = dir.path().join("shorter.json");

    let output = resplan(&["week", "remove", arg(&path), "2", "-o", arg(&out)]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(allocations(&read_json(&out)), vec![(1, 10), (2, 30)]);
    assert_eq!(fs::read_to_string(&path).unwrap(), PORTAL);
}

#[test]
fn week_append() {
    let (_dir, path) = portal();

    let output = resplan(&["week", "append", arg(&path)]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(allocations(&read_json(&path)), vec![(1, 10), (2, 20), (3, 30), (4, 0)]);
}

#[test]
fn removing_last_week_is_declined() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("single.json");
    assert!(resplan(&["init", arg(&path)]).status.success());
    let before = fs::read_to_string(&path).unwrap();

    let output = resplan(&["week", "remove", arg(&path), "1"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("declined"));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn removing_unknown_week_is_declined() {
    let (_dir, path) = portal();

    let output = resplan(&["week", "remove", arg(&path), "9"]);

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(fs::read_to_string(&path).unwrap(), PORTAL);
}

#[test]
fn inserting_past_the_end_fails() {
    let (_dir, path) = portal();

    let output = resplan(&["week", "insert", arg(&path), "--at", "7"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read_to_string(&path).unwrap(), PORTAL);
}

#[test]
fn appending_to_full_timeline_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("decade.json");
    assert!(resplan(&["init", arg(&path), "--weeks", "520"]).status.success());
    let before = fs::read_to_string(&path).unwrap();

    let output = resplan(&["week", "append", arg(&path)]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("limited to 520 weeks"));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

// =============================================================================
// price / resources
// =============================================================================

#[test]
fn price_from_flags() {
    let output = resplan(&[
        "price",
        "--rate",
        "50",
        "--margin",
        "25",
        "--exchange-rate",
        "0.89",
        "--currency",
        "EUR",
    ]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Client rate: €59.33/h"));
}

#[test]
fn price_from_workbook_settings() {
    let (_dir, path) = portal();

    let output = resplan(&["price", "--rate", "50", arg(&path)]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("€59.33/h"));
}

#[test]
fn price_rejects_full_margin() {
    let output = resplan(&["price", "--rate", "50", "--margin", "100"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("100"));
}

#[test]
fn resources_seeded_from_rate_card() {
    let (_dir, path) = portal();

    let output = resplan(&["resources", arg(&path), "--seed", "ukraine"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Added 1 resource(s) priced for Ukraine"));
    assert!(text.contains("2 resource(s), average rate $19.00/h"));

    let workbook = read_json(&path);
    let seeded = &workbook["resources"][1];
    assert_eq!(seeded["role"], "QA Engineer");
    assert_eq!(seeded["clientRole"], "Test Engineer");
    assert_eq!(seeded["intRate"], 13.0);
}
