// SPDX-License-Identifier: MIT

//! Snapshot data model and naming convention
//!
//! Managed snapshots are named after the local date they were taken
//! (`YYYYMMDD`, or `YYYYMMDDHHMM` for sub-daily snapshots created by hand).
//! The recognizer regex is the boundary between snapshots this system owns
//! and foreign/manual snapshots it must never touch.

use chrono::{DateTime, Local, TimeZone};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Advisory hold tag protecting in-flight replication bases
pub const HOLD_TAG: &str = "zsm";

/// Date format used to generate managed snapshot names
pub const NAME_FORMAT: &str = "%Y%m%d";

static MANAGED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})(1[0-2]|0[1-9])(0[1-9]|[1-2]\d|3[0-1])(([0-1]\d|2[0-3])([0-5]\d))?$")
        .expect("constant regex pattern is valid")
});

/// Date bucket for a given moment, e.g. `20240501`
pub fn bucket_for(moment: DateTime<Local>) -> String {
    moment.format(NAME_FORMAT).to_string()
}

/// Whether a snapshot name follows the managed naming convention
pub fn is_managed_name(name: &str) -> bool {
    MANAGED_NAME.is_match(name)
}

/// An observed point-in-time snapshot of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Owning dataset
    pub dataset: String,
    /// Snapshot name (the part after `@`)
    pub name: String,
    /// Creation time, epoch seconds
    pub creation: i64,
    /// Local date bucket derived from the creation time, used for
    /// "already done today" checks
    pub bucket: String,
}

impl Snapshot {
    pub fn new(dataset: impl Into<String>, name: impl Into<String>, creation: i64) -> Self {
        let bucket = Local
            .timestamp_opt(creation, 0)
            .single()
            .map(bucket_for)
            .unwrap_or_default();
        Self {
            dataset: dataset.into(),
            name: name.into(),
            creation,
            bucket,
        }
    }
}

/// Per-dataset snapshot sequences, in arrival (== chronological) order
///
/// The listing tool emits snapshots sorted by creation time; the inventory
/// preserves that order rather than re-sorting, since several snapshots can
/// share one date bucket.
#[derive(Debug, Clone, Default)]
pub struct SnapshotInventory {
    datasets: BTreeMap<String, Vec<Snapshot>>,
}

impl SnapshotInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot to its dataset's sequence
    pub fn push(&mut self, snapshot: Snapshot) {
        self.datasets
            .entry(snapshot.dataset.clone())
            .or_default()
            .push(snapshot);
    }

    /// Snapshots of one dataset, oldest first (empty if unknown)
    pub fn snapshots(&self, dataset: &str) -> &[Snapshot] {
        self.datasets.get(dataset).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a dataset already has a snapshot in the given date bucket
    pub fn has_bucket(&self, dataset: &str, bucket: &str) -> bool {
        self.snapshots(dataset).iter().any(|s| s.bucket == bucket)
    }

    /// Whether a dataset has a snapshot with the given name
    pub fn contains(&self, dataset: &str, name: &str) -> bool {
        self.snapshots(dataset).iter().any(|s| s.name == name)
    }

    /// Dataset names present in the inventory
    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
