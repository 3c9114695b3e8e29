// SPDX-License-Identifier: MIT

//! Command builders and thin operations for the external `zfs` tool
//!
//! Builders are pure and return [`Cmd`]/[`Pipeline`] values; the async
//! functions hand them to a [`CommandRunner`]. Transfer pipelines follow the
//! classic composition: `zfs send`, optional compressor, an `mbuffer` stage
//! on each side of the wire, optional decompressor, `zfs receive -F`.
//!
//! `receive -F` forces the target to the incoming state. That is destructive
//! to divergent remote state; the replication planner only issues transfers
//! along a confirmed common chain.

use crate::config::Direction;
use crate::runner::{Cmd, CommandRunner, Endpoint, Pipeline, RunError};
use crate::snapshot::HOLD_TAG;

const MBUFFER_ARGS: [&str; 4] = ["-s", "128k", "-m", "512M"];

fn at(dataset: &str, snapshot: &str) -> String {
    format!("{}@{}", dataset, snapshot)
}

/// List all snapshots visible at an endpoint, tab-separated
/// `name<TAB>creation-epoch`, sorted by creation time ascending
pub fn list_snapshots_cmd() -> Cmd {
    Cmd::new("zfs").args([
        "list", "-pH", "-s", "creation", "-o", "name,creation", "-t", "snapshot",
    ])
}

/// List all dataset names visible at an endpoint
pub fn list_datasets_cmd() -> Cmd {
    Cmd::new("zfs").args(["list", "-H", "-o", "name"])
}

pub fn snapshot_cmd(dataset: &str, name: &str) -> Cmd {
    Cmd::new("zfs").arg("snapshot").arg(at(dataset, name))
}

pub fn destroy_cmd(dataset: &str, name: &str) -> Cmd {
    Cmd::new("zfs").arg("destroy").arg(at(dataset, name))
}

pub fn hold_cmd(dataset: &str, name: &str) -> Cmd {
    Cmd::new("zfs")
        .arg("hold")
        .arg(HOLD_TAG)
        .arg(at(dataset, name))
}

pub fn release_cmd(dataset: &str, name: &str) -> Cmd {
    Cmd::new("zfs")
        .arg("release")
        .arg(HOLD_TAG)
        .arg(at(dataset, name))
}

pub fn holds_cmd(dataset: &str, name: &str) -> Cmd {
    Cmd::new("zfs").arg("holds").arg(at(dataset, name))
}

fn send_cmd(dataset: &str, base: Option<&str>, last: &str, dry_run: bool) -> Cmd {
    let mut cmd = Cmd::new("zfs").arg("send");
    if dry_run {
        cmd = cmd.arg("-nv");
    }
    if let Some(base) = base {
        cmd = cmd.arg("-i").arg(at(dataset, base));
    }
    cmd.arg(at(dataset, last))
}

/// Dry-run send used to estimate a delta's size
pub fn send_estimate_cmd(dataset: &str, base: Option<&str>, last: &str) -> Cmd {
    send_cmd(dataset, base, last, true)
}

/// Full send/receive pipeline for one (possibly incremental) transfer
///
/// `source` and `dest` are dataset names; with `Push` the source side is
/// local, with `Pull` the source side is at the endpoint. A local endpoint
/// degenerates to a direct send-pipe-receive with no buffering stages.
pub fn replicate_pipeline(
    source: &str,
    base: Option<&str>,
    last: &str,
    dest: &str,
    endpoint: &Endpoint,
    direction: Direction,
    compression: Option<&str>,
) -> Pipeline {
    let send = send_cmd(source, base, last, false);
    let receive = Cmd::new("zfs").args(["receive", "-F"]).arg(dest);

    if endpoint.is_local() {
        return Pipeline::new(Endpoint::Local).local(send).local(receive);
    }

    let compress = compression.map(|c| Cmd::new(c).arg("-c"));
    let decompress = compression.map(|c| Cmd::new(c).arg("-cd"));
    let sending_buffer = Cmd::new("mbuffer").args(["-q", "-v", "0"]).args(MBUFFER_ARGS);
    let receiving_buffer = Cmd::new("mbuffer").args(MBUFFER_ARGS);

    let mut pipeline = Pipeline::new(endpoint.clone());
    match direction {
        Direction::Push => {
            pipeline = pipeline.local(send);
            if let Some(compress) = compress {
                pipeline = pipeline.local(compress);
            }
            pipeline = pipeline.local(sending_buffer).remote(receiving_buffer);
            if let Some(decompress) = decompress {
                pipeline = pipeline.remote(decompress);
            }
            pipeline.remote(receive)
        }
        Direction::Pull => {
            pipeline = pipeline.remote(send);
            if let Some(compress) = compress {
                pipeline = pipeline.remote(compress);
            }
            pipeline = pipeline.remote(sending_buffer).local(receiving_buffer);
            if let Some(decompress) = decompress {
                pipeline = pipeline.local(decompress);
            }
            pipeline.local(receive)
        }
    }
}

/// Take a snapshot at an endpoint
pub async fn take_snapshot<R: CommandRunner>(
    runner: &R,
    endpoint: &Endpoint,
    dataset: &str,
    name: &str,
) -> Result<(), RunError> {
    runner.run(endpoint, &snapshot_cmd(dataset, name)).await?;
    Ok(())
}

/// Destroy a snapshot at an endpoint
pub async fn destroy<R: CommandRunner>(
    runner: &R,
    endpoint: &Endpoint,
    dataset: &str,
    name: &str,
) -> Result<(), RunError> {
    runner.run(endpoint, &destroy_cmd(dataset, name)).await?;
    Ok(())
}

/// Place an advisory hold on a snapshot
pub async fn hold<R: CommandRunner>(
    runner: &R,
    endpoint: &Endpoint,
    dataset: &str,
    name: &str,
) -> Result<(), RunError> {
    runner.run(endpoint, &hold_cmd(dataset, name)).await?;
    Ok(())
}

/// Release an advisory hold, best-effort
///
/// Releasing an absent hold must never fail the caller, so errors are
/// logged at debug and swallowed.
pub async fn release<R: CommandRunner>(runner: &R, endpoint: &Endpoint, dataset: &str, name: &str) {
    if let Err(e) = runner.run(endpoint, &release_cmd(dataset, name)).await {
        tracing::debug!(dataset, snapshot = name, error = %e, "hold release failed");
    }
}

/// Whether a snapshot carries our advisory hold
pub async fn is_held<R: CommandRunner>(
    runner: &R,
    endpoint: &Endpoint,
    dataset: &str,
    name: &str,
) -> Result<bool, RunError> {
    let output = runner.run(endpoint, &holds_cmd(dataset, name)).await?;
    Ok(output.contains(HOLD_TAG))
}

/// Dry-run the delta and return a normalized human-readable size
pub async fn estimate_size<R: CommandRunner>(
    runner: &R,
    endpoint: &Endpoint,
    dataset: &str,
    base: Option<&str>,
    last: &str,
) -> Result<String, RunError> {
    let output = runner
        .run(endpoint, &send_estimate_cmd(dataset, base, last))
        .await?;
    Ok(parse_estimate(&output).unwrap_or_else(|| "0B".to_string()))
}

/// Extract and normalize the size from `zfs send -nv` output
///
/// The tool reports either a plain byte count or a value with an
/// order-of-magnitude letter; normalize to `...B` and `...iB` respectively.
pub fn parse_estimate(output: &str) -> Option<String> {
    let line = output
        .lines()
        .find(|l| l.contains("total estimated size is"))?;
    let size = line.split_whitespace().last()?;
    Some(normalize_size(size))
}

fn normalize_size(size: &str) -> String {
    match size.chars().last() {
        Some(c) if c.is_ascii_digit() => format!("{}B", size),
        _ => format!("{}iB", size),
    }
}

#[cfg(test)]
#[path = "zfs_tests.rs"]
mod tests;
