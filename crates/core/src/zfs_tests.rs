// SPDX-License-Identifier: MIT

use super::*;
use crate::runner::FakeRunner;
use yare::parameterized;

#[test]
fn listing_commands() {
    assert_eq!(
        list_snapshots_cmd().rendered(),
        "zfs list -pH -s creation -o name,creation -t snapshot"
    );
    assert_eq!(list_datasets_cmd().rendered(), "zfs list -H -o name");
}

#[test]
fn snapshot_and_hold_commands() {
    assert_eq!(
        snapshot_cmd("tank/data", "20240501").rendered(),
        "zfs snapshot tank/data@20240501"
    );
    assert_eq!(
        hold_cmd("tank/data", "20240501").rendered(),
        "zfs hold zsm tank/data@20240501"
    );
    assert_eq!(
        release_cmd("tank/data", "20240501").rendered(),
        "zfs release zsm tank/data@20240501"
    );
    assert_eq!(
        holds_cmd("tank/data", "20240501").rendered(),
        "zfs holds tank/data@20240501"
    );
}

#[test]
fn estimate_command_is_incremental_when_base_given() {
    assert_eq!(
        send_estimate_cmd("tank/data", Some("a"), "b").rendered(),
        "zfs send -nv -i tank/data@a tank/data@b"
    );
    assert_eq!(
        send_estimate_cmd("tank/data", None, "b").rendered(),
        "zfs send -nv tank/data@b"
    );
}

#[test]
fn local_transfer_is_direct_send_receive() {
    let p = replicate_pipeline(
        "tank/data",
        Some("a"),
        "b",
        "backup/data",
        &Endpoint::Local,
        Direction::Push,
        None,
    );
    assert_eq!(
        p.rendered(),
        "zfs send -i tank/data@a tank/data@b | zfs receive -F backup/data"
    );
}

#[test]
fn push_transfer_buffers_both_sides() {
    let endpoint = Endpoint::ssh("bak", 22, None);
    let p = replicate_pipeline(
        "tank/data",
        Some("a"),
        "b",
        "backup/data",
        &endpoint,
        Direction::Push,
        None,
    );
    assert_eq!(
        p.rendered(),
        "zfs send -i tank/data@a tank/data@b | mbuffer -q -v 0 -s 128k -m 512M | \
         ssh -p 22 bak 'mbuffer -s 128k -m 512M | zfs receive -F backup/data'"
    );
}

#[test]
fn push_transfer_with_compression() {
    let endpoint = Endpoint::ssh("bak", 22, None);
    let p = replicate_pipeline(
        "tank/data",
        None,
        "b",
        "backup/data",
        &endpoint,
        Direction::Push,
        Some("zstd"),
    );
    assert_eq!(
        p.rendered(),
        "zfs send tank/data@b | zstd -c | mbuffer -q -v 0 -s 128k -m 512M | \
         ssh -p 22 bak 'mbuffer -s 128k -m 512M | zstd -cd | zfs receive -F backup/data'"
    );
}

#[test]
fn pull_transfer_originates_remotely() {
    let endpoint = Endpoint::ssh("bak", 22, None);
    let p = replicate_pipeline(
        "backup/data",
        Some("a"),
        "b",
        "tank/data",
        &endpoint,
        Direction::Pull,
        None,
    );
    assert_eq!(
        p.rendered(),
        "ssh -p 22 bak 'zfs send -i backup/data@a backup/data@b | \
         mbuffer -q -v 0 -s 128k -m 512M' | mbuffer -s 128k -m 512M | zfs receive -F tank/data"
    );
}

#[parameterized(
    plain_bytes = { "total estimated size is 1024", "1024B" },
    kilo = { "total estimated size is 10.0K", "10.0KiB" },
    mega = { "total estimated size is 1.52M", "1.52MiB" },
)]
fn estimate_normalization(line: &str, expected: &str) {
    let output = format!("send from @a to tank/data@b\n{}\n", line);
    assert_eq!(parse_estimate(&output).unwrap(), expected);
}

#[test]
fn estimate_missing_from_output_is_none() {
    assert_eq!(parse_estimate("no estimate here\n"), None);
}

#[tokio::test]
async fn is_held_checks_for_hold_tag() {
    let runner = FakeRunner::new();
    runner.respond(
        "zfs holds tank/data@a",
        "NAME               TAG  TIMESTAMP\ntank/data@a        zsm  Wed May  1 08:00 2024\n",
    );

    assert!(is_held(&runner, &Endpoint::Local, "tank/data", "a")
        .await
        .unwrap());
    assert!(!is_held(&runner, &Endpoint::Local, "tank/data", "b")
        .await
        .unwrap());
}

#[tokio::test]
async fn release_swallows_errors() {
    let runner = FakeRunner::new();
    runner.fail_matching("zfs release");

    // Must not panic or propagate
    release(&runner, &Endpoint::Local, "tank/data", "a").await;
}
