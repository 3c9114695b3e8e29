// SPDX-License-Identifier: MIT

//! Retention cleaner collaborator
//!
//! The scheduler only talks to the [`Retention`] trait; the bundled
//! [`BucketCleaner`] implements an age-bucket schema of the form
//! `[Nh]NdNwNmNy` (hours, days, weeks, months, years). Each schema term
//! contributes buckets of growing width; within a bucket the oldest
//! snapshot is kept and the rest are destroyed, and snapshots older than
//! the last bucket age out entirely. Held snapshots are never touched.

use crate::clock::Clock;
use crate::runner::{CommandRunner, Endpoint, RunError};
use crate::snapshot::{self, Snapshot};
use crate::zfs;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static SCHEMA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?P<hours>\d+)h)?(?P<days>\d+)d(?P<weeks>\d+)w(?P<months>\d+)m(?P<years>\d+)y$")
        .expect("constant regex pattern is valid")
});

/// Errors from a retention pass
#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("destroy of {dataset}@{snapshot} failed: {source}")]
    DestroyFailed {
        dataset: String,
        snapshot: String,
        #[source]
        source: RunError,
    },
    #[error("hold check on {dataset}@{snapshot} failed: {source}")]
    HoldCheckFailed {
        dataset: String,
        snapshot: String,
        #[source]
        source: RunError,
    },
}

/// Destroys snapshots that fell out of the retention schema
#[async_trait]
pub trait Retention: Send + Sync {
    async fn clean(
        &self,
        dataset: &str,
        snapshots: &[Snapshot],
        schema: &str,
    ) -> Result<(), RetentionError>;
}

/// No-op retention for testing
#[derive(Clone, Default)]
pub struct NoOpRetention;

#[async_trait]
impl Retention for NoOpRetention {
    async fn clean(
        &self,
        _dataset: &str,
        _snapshots: &[Snapshot],
        _schema: &str,
    ) -> Result<(), RetentionError> {
        Ok(())
    }
}

/// Parsed schema term counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub hours: u32,
    pub days: u32,
    pub weeks: u32,
    pub months: u32,
    pub years: u32,
}

/// Parse a retention schema string, e.g. `24h7d3w11m5y` or `7d3w11m5y`
pub fn parse_schema(schema: &str) -> Option<Schema> {
    let captures = SCHEMA.captures(schema)?;
    let count = |name: &str| -> u32 {
        captures
            .name(name)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(Schema {
        hours: count("hours"),
        days: count("days"),
        weeks: count("weeks"),
        months: count("months"),
        years: count("years"),
    })
}

/// Upper age boundaries (in hours) of the schema's buckets, ascending
fn bucket_boundaries(schema: &Schema) -> Vec<i64> {
    let mut boundaries = Vec::new();
    let mut counter: i64 = -1;
    let mut extend = |count: u32, width: i64| {
        for _ in 0..count {
            counter += width;
            boundaries.push(counter);
        }
    };
    extend(schema.hours, 1);
    extend(schema.days, 24);
    extend(schema.weeks, 7 * 24);
    extend(schema.months, 30 * 24);
    extend(schema.years, 12 * 30 * 24);
    boundaries
}

/// Creation time encoded in a managed snapshot name
fn name_timestamp(name: &str) -> Option<NaiveDateTime> {
    if !snapshot::is_managed_name(name) {
        return None;
    }
    if name.len() > 8 {
        NaiveDateTime::parse_from_str(name, "%Y%m%d%H%M").ok()
    } else {
        chrono::NaiveDate::parse_from_str(name, "%Y%m%d")
            .ok()
            .map(|d| d.and_hms_opt(0, 0, 0))?
    }
}

/// Which snapshot names an age-bucket pass would destroy
///
/// `ages` pairs each candidate name with its age in hours. Within each
/// bucket the oldest survives; candidates beyond the last boundary are
/// end-of-life.
pub fn plan(ages: &[(String, i64)], schema: &Schema) -> Vec<String> {
    let boundaries = bucket_boundaries(schema);
    let mut buckets: Vec<Vec<&(String, i64)>> = vec![Vec::new(); boundaries.len()];
    let mut destroy = Vec::new();

    for entry in ages {
        match boundaries.iter().position(|b| entry.1 <= *b) {
            Some(i) => buckets[i].push(entry),
            None => destroy.push(entry.0.clone()),
        }
    }

    for bucket in buckets {
        let Some(oldest) = bucket.iter().map(|e| e.1).max() else {
            continue;
        };
        let mut kept = false;
        for (name, age) in bucket {
            // Ties keep the first arrival only.
            if *age == oldest && !kept {
                kept = true;
            } else {
                destroy.push(name.clone());
            }
        }
    }

    destroy
}

/// Age-bucket cleaner driving the external tool
#[derive(Clone)]
pub struct BucketCleaner<R: CommandRunner, C: Clock> {
    runner: R,
    clock: C,
}

impl<R: CommandRunner, C: Clock> BucketCleaner<R, C> {
    pub fn new(runner: R, clock: C) -> Self {
        Self { runner, clock }
    }
}

#[async_trait]
impl<R: CommandRunner, C: Clock> Retention for BucketCleaner<R, C> {
    async fn clean(
        &self,
        dataset: &str,
        snapshots: &[Snapshot],
        schema: &str,
    ) -> Result<(), RetentionError> {
        let Some(schema) = parse_schema(schema) else {
            tracing::warn!(dataset, schema, "invalid retention schema, skipping");
            return Ok(());
        };
        let now = self.clock.now().naive_local();

        let mut ages = Vec::new();
        for snap in snapshots {
            let Some(taken) = name_timestamp(&snap.name) else {
                // Foreign snapshot, not ours to destroy.
                continue;
            };
            if zfs::is_held(&self.runner, &Endpoint::Local, dataset, &snap.name)
                .await
                .map_err(|source| RetentionError::HoldCheckFailed {
                    dataset: dataset.to_string(),
                    snapshot: snap.name.clone(),
                    source,
                })?
            {
                tracing::info!(dataset, snapshot = %snap.name, "skipping held snapshot");
                continue;
            }
            let age_hours = (now - taken).num_seconds() / 3600;
            ages.push((snap.name.clone(), age_hours));
        }

        let destroy = plan(&ages, &schema);
        if destroy.is_empty() {
            return Ok(());
        }

        tracing::info!(dataset, count = destroy.len(), "cleaning");
        for name in destroy {
            tracing::info!(dataset, snapshot = %name, "destroying");
            zfs::destroy(&self.runner, &Endpoint::Local, dataset, &name)
                .await
                .map_err(|source| RetentionError::DestroyFailed {
                    dataset: dataset.to_string(),
                    snapshot: name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
