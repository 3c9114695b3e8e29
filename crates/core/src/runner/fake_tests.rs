// SPDX-License-Identifier: MIT

use super::*;

#[tokio::test]
async fn records_calls_in_order() {
    let runner = FakeRunner::new();

    runner
        .run(&Endpoint::Local, &Cmd::new("zfs").arg("list"))
        .await
        .unwrap();
    runner
        .run_pipeline(
            &Pipeline::new(Endpoint::Local)
                .local(Cmd::new("zfs").args(["send", "tank@a"]))
                .local(Cmd::new("zfs").args(["receive", "-F", "backup"])),
        )
        .await
        .unwrap();

    let calls = runner.rendered_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], "zfs list");
    assert!(calls[1].starts_with("zfs send"));
}

#[tokio::test]
async fn unmatched_calls_return_empty_output() {
    let runner = FakeRunner::new();
    let out = runner
        .run(&Endpoint::Local, &Cmd::new("zfs").arg("list"))
        .await
        .unwrap();
    assert_eq!(out, "");
}

#[tokio::test]
async fn scripted_response_matches_by_substring() {
    let runner = FakeRunner::new();
    runner.respond("zfs list", "tank/data@20240501\t1714540800");

    let out = runner
        .run(&Endpoint::Local, &Cmd::new("zfs").args(["list", "-pH"]))
        .await
        .unwrap();
    assert_eq!(out, "tank/data@20240501\t1714540800");
}

#[tokio::test]
async fn responses_distinguish_endpoints() {
    let runner = FakeRunner::new();
    runner.respond("local: zfs list", "tank/data@a\t100");
    runner.respond("bak:22: zfs list", "backup/data@a\t100");

    let local = runner
        .run(&Endpoint::Local, &Cmd::new("zfs").arg("list"))
        .await
        .unwrap();
    let remote = runner
        .run(&Endpoint::ssh("bak", 22, None), &Cmd::new("zfs").arg("list"))
        .await
        .unwrap();

    assert_eq!(local, "tank/data@a\t100");
    assert_eq!(remote, "backup/data@a\t100");
}

#[tokio::test]
async fn injected_failure_matches_by_substring() {
    let runner = FakeRunner::new();
    runner.fail_matching("zfs snapshot");

    let err = runner
        .run(
            &Endpoint::Local,
            &Cmd::new("zfs").args(["snapshot", "tank@x"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Failed { status: 1, .. }));

    // Other commands still succeed
    runner
        .run(&Endpoint::Local, &Cmd::new("zfs").arg("list"))
        .await
        .unwrap();
}
