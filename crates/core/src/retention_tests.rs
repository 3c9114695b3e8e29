// SPDX-License-Identifier: MIT

use super::*;
use crate::clock::FakeClock;
use crate::runner::FakeRunner;
use chrono::{Local, TimeZone};

#[test]
fn parses_schema_with_and_without_hours() {
    assert_eq!(
        parse_schema("24h7d3w11m5y"),
        Some(Schema {
            hours: 24,
            days: 7,
            weeks: 3,
            months: 11,
            years: 5
        })
    );
    assert_eq!(
        parse_schema("7d3w11m5y"),
        Some(Schema {
            hours: 0,
            days: 7,
            weeks: 3,
            months: 11,
            years: 5
        })
    );
    assert_eq!(parse_schema("7d"), None);
    assert_eq!(parse_schema("forever"), None);
}

#[test]
fn keeps_oldest_per_bucket() {
    let schema = parse_schema("7d0w0m0y").unwrap();
    // Two snapshots land in the first daily bucket (age <= 23h); the older
    // one survives.
    let ages = vec![
        ("202405010600".to_string(), 18),
        ("202405011800".to_string(), 6),
    ];

    let destroy = plan(&ages, &schema);
    assert_eq!(destroy, vec!["202405011800".to_string()]);
}

#[test]
fn destroys_end_of_life_snapshots() {
    let schema = parse_schema("2d0w0m0y").unwrap();
    // Buckets cover ages up to 47h; a 96h snapshot has aged out.
    let ages = vec![
        ("20240501".to_string(), 96),
        ("20240504".to_string(), 24),
    ];

    let destroy = plan(&ages, &schema);
    assert_eq!(destroy, vec!["20240501".to_string()]);
}

#[test]
fn single_occupant_buckets_destroy_nothing() {
    let schema = parse_schema("7d3w11m5y").unwrap();
    let ages = vec![
        ("a".to_string(), 5),
        ("b".to_string(), 30),
        ("c".to_string(), 60),
    ];

    assert!(plan(&ages, &schema).is_empty());
}

fn snapshots_named(dataset: &str, names: &[&str], creation: i64) -> Vec<Snapshot> {
    names
        .iter()
        .enumerate()
        .map(|(i, n)| Snapshot::new(dataset, *n, creation + i as i64))
        .collect()
}

#[tokio::test]
async fn cleaner_destroys_aged_out_snapshots() {
    let runner = FakeRunner::new();
    let clock = FakeClock::at(Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());
    let cleaner = BucketCleaner::new(runner.clone(), clock);

    // 20240101 is far past a 2-day schema; 20240510 is current.
    cleaner
        .clean(
            "tank/data",
            &snapshots_named("tank/data", &["20240101", "20240510"], 1_700_000_000),
            "2d0w0m0y",
        )
        .await
        .unwrap();

    let calls = runner.rendered_calls();
    assert!(calls.contains(&"zfs destroy tank/data@20240101".to_string()));
    assert!(!calls.iter().any(|c| c.contains("destroy tank/data@20240510")));
}

#[tokio::test]
async fn cleaner_skips_held_snapshots() {
    let runner = FakeRunner::new();
    runner.respond("zfs holds tank/data@20240101", "tank/data@20240101  zsm  ts");
    let clock = FakeClock::at(Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());
    let cleaner = BucketCleaner::new(runner.clone(), clock);

    cleaner
        .clean(
            "tank/data",
            &snapshots_named("tank/data", &["20240101"], 1_700_000_000),
            "2d0w0m0y",
        )
        .await
        .unwrap();

    assert!(!runner
        .rendered_calls()
        .iter()
        .any(|c| c.starts_with("zfs destroy")));
}

#[tokio::test]
async fn cleaner_ignores_foreign_snapshots() {
    let runner = FakeRunner::new();
    let clock = FakeClock::at(Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());
    let cleaner = BucketCleaner::new(runner.clone(), clock);

    cleaner
        .clean(
            "tank/data",
            &snapshots_named("tank/data", &["before-upgrade"], 1_500_000_000),
            "2d0w0m0y",
        )
        .await
        .unwrap();

    // Never even checks holds on a foreign snapshot.
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn cleaner_treats_invalid_schema_as_noop() {
    let runner = FakeRunner::new();
    let clock = FakeClock::at(Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());
    let cleaner = BucketCleaner::new(runner.clone(), clock);

    cleaner
        .clean(
            "tank/data",
            &snapshots_named("tank/data", &["20240101"], 1_700_000_000),
            "bogus",
        )
        .await
        .unwrap();

    assert!(runner.calls().is_empty());
}
