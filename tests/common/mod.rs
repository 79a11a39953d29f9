#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Unordered two-day history: `b` must pick up `a`'s closing balance.
pub const TWO_DAY_SNAPSHOT: &str = r#"{
  "records": [
    {
      "id": "b",
      "date": "2024-01-02",
      "cashReceived": 500,
      "receipts": [
        { "id": "rb1", "supplier": "Bakery", "paymentMode": "cash", "amount": 200 },
        { "id": "rb2", "supplier": "Duka", "paymentMode": "mpesa", "amount": 80 }
      ]
    },
    {
      "id": "a",
      "date": "2024-01-01",
      "cashReceived": 1000,
      "balanceBF": 0,
      "receipts": [
        { "id": "ra1", "supplier": "Duka", "paymentMode": "cash", "amount": 300 }
      ]
    }
  ],
  "suppliers": ["Bakery", "Duka"],
  "exportDate": "2024-01-03T08:00:00Z"
}"#;

/// One valid record and one missing its cash received and supplier.
pub const INVALID_SNAPSHOT: &str = r#"{
  "records": [
    { "id": "ok", "date": "2024-03-01", "cashReceived": 100, "balanceBF": 0, "receipts": [] },
    {
      "id": "bad",
      "date": "2024-03-02",
      "cashReceived": "",
      "receipts": [ { "id": "r1", "supplier": " ", "paymentMode": "cash", "amount": 5 } ]
    }
  ],
  "suppliers": []
}"#;

/// Creates an isolated home directory that outlives the calling test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

/// Writes `contents` to `<home>/<name>` and returns the path.
pub fn write_fixture(home: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = home.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

/// The CLI binary pointed at `home`, with colours off and logging quiet.
pub fn cli(home: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("purchase_tracker_cli").expect("binary exists");
    cmd.env("PURCHASE_TRACKER_HOME", home)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off")
        .env("USER", "cli-test");
    cmd
}
