//! Shared helpers for black-box specs

pub use assert_cmd::Command;
pub use predicates::prelude::*;

pub const VALID_CONFIG: &str = r#"
interval = "5m"

[volume."tank/data"]
mountpoint = "/tank/data"
time = "21:00"
schema = "7d3w11m5y"
"#;

/// Invoke the daemon binary
pub fn zsnapd() -> Command {
    Command::cargo_bin("zsnapd").unwrap()
}

/// Write `content` to a file under a fresh temp dir, returning both
pub fn config_file(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zsnapd.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}
