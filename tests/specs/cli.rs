//! Argument handling specs

use crate::prelude::*;

#[test]
fn missing_arguments_prints_usage() {
    zsnapd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("usage: zsnapd"));
}

#[test]
fn unknown_flag_prints_usage() {
    zsnapd()
        .args(["zsnapd.toml", "--bogus"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("usage: zsnapd"));
}

#[test]
fn missing_config_file_is_an_error() {
    zsnapd()
        .args(["/nonexistent/zsnapd.toml", "--check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}
