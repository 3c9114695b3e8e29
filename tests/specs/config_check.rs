//! Configuration validation specs (`zsnapd <config> --check`)

use crate::prelude::*;

#[test]
fn valid_config_passes_check() {
    let (_dir, path) = config_file(VALID_CONFIG);

    zsnapd()
        .arg(path)
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration OK: 1 volumes"));
}

#[test]
fn invalid_schema_fails_check() {
    let (_dir, path) = config_file(
        r#"
[volume."tank/data"]
mountpoint = "/tank/data"
time = "21:00"
schema = "forever"
"#,
    );

    zsnapd()
        .arg(path)
        .arg("--check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid retention schema"));
}

#[test]
fn invalid_time_fails_check() {
    let (_dir, path) = config_file(
        r#"
[volume."tank/data"]
mountpoint = "/tank/data"
time = "25:99"
schema = "7d3w11m5y"
"#,
    );

    zsnapd()
        .arg(path)
        .arg("--check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid time"));
}

#[test]
fn malformed_toml_fails_check() {
    let (_dir, path) = config_file("volume = not-toml");

    zsnapd()
        .arg(path)
        .arg("--check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TOML parse error"));
}

#[test]
fn replication_target_must_be_a_dataset_name() {
    let (_dir, path) = config_file(
        r#"
[volume."tank/data"]
mountpoint = "/tank/data"
time = "trigger"
schema = "7d3w11m5y"

[volume."tank/data".replicate]
target = "not a dataset"
host = "bak.example.com"
"#,
    );

    zsnapd()
        .arg(path)
        .arg("--check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a valid dataset name"));
}
