// SPDX-License-Identifier: MIT

//! Per-volume scheduling decision engine
//!
//! The scheduler keeps no timer state of its own. Every cycle re-derives
//! "has this volume been snapshotted today" from the inventory's date
//! buckets, so a restarted daemon (or a failed attempt) converges on the
//! right decision at the next cycle without any bookkeeping.

use crate::catalog::{self, CatalogError};
use crate::clock::Clock;
use crate::config::{Config, TriggerPolicy, Volume};
use crate::replicator::{ReplicateError, Replicator};
use crate::retention::{Retention, RetentionError};
use crate::runner::{CommandRunner, Endpoint, RunError};
use crate::snapshot::{self, Snapshot};
use crate::zfs;
use chrono::{DateTime, Local};
use thiserror::Error;

/// Name of the marker file requesting an on-demand snapshot
pub const TRIGGER_FILE: &str = ".trigger";

/// Errors from processing a single volume
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("snapshot creation failed: {0}")]
    Snapshot(#[source] RunError),
    #[error(transparent)]
    Replicate(#[from] ReplicateError),
    #[error(transparent)]
    Retention(#[from] RetentionError),
    #[error("failed to consume trigger file {path}: {source}")]
    Trigger {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one volume in one cycle
#[derive(Debug)]
pub enum VolumeOutcome {
    /// Volume is configured but its dataset does not exist
    UnknownDataset,
    /// Trigger conditions did not fire
    Idle,
    /// The decision fired and every step succeeded
    Completed {
        snapshotted: bool,
        transfers: usize,
        cleaned: bool,
    },
    /// The decision fired and a step failed; retried naturally next cycle
    Failed(SchedulerError),
}

/// Per-volume result of a cycle
#[derive(Debug)]
pub struct VolumeReport {
    pub dataset: String,
    pub outcome: VolumeOutcome,
}

/// Collected results of one scheduling cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    pub volumes: Vec<VolumeReport>,
}

impl CycleReport {
    /// Volumes whose decision fired this cycle
    pub fn fired(&self) -> usize {
        self.volumes
            .iter()
            .filter(|v| {
                matches!(
                    v.outcome,
                    VolumeOutcome::Completed { .. } | VolumeOutcome::Failed(_)
                )
            })
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &VolumeReport> {
        self.volumes
            .iter()
            .filter(|v| matches!(v.outcome, VolumeOutcome::Failed(_)))
    }
}

/// Top-level control loop body: evaluates every configured volume once
pub struct Scheduler<R: CommandRunner, C: Clock, T: Retention> {
    runner: R,
    clock: C,
    retention: T,
    replicator: Replicator<R>,
    config: Config,
}

impl<R: CommandRunner, C: Clock, T: Retention> Scheduler<R, C, T> {
    pub fn new(runner: R, clock: C, retention: T, config: Config) -> Self {
        let replicator = Replicator::new(runner.clone());
        Self {
            runner,
            clock,
            retention,
            replicator,
            config,
        }
    }

    /// Run one cycle over all configured volumes
    ///
    /// A failure inside one volume is captured in its report; only a
    /// failure to build the local inventory fails the whole cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport, CatalogError> {
        let now = self.clock.now();
        let today = snapshot::bucket_for(now);

        let inventory =
            catalog::list_snapshots(&self.runner, &Endpoint::Local, None, false).await?;
        let datasets = catalog::list_datasets(&self.runner, &Endpoint::Local).await?;

        let mut report = CycleReport::default();
        for (dataset, volume) in &self.config.volumes {
            let outcome = if !datasets.iter().any(|d| d == dataset) {
                tracing::debug!(dataset, "dataset not present, skipping");
                VolumeOutcome::UnknownDataset
            } else {
                let local = inventory.snapshots(dataset).to_vec();
                match self.process_volume(dataset, volume, local, &today, now).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(dataset, error = %e, "volume processing failed");
                        VolumeOutcome::Failed(e)
                    }
                }
            };
            report.volumes.push(VolumeReport {
                dataset: dataset.clone(),
                outcome,
            });
        }
        Ok(report)
    }

    async fn process_volume(
        &self,
        dataset: &str,
        volume: &Volume,
        mut local: Vec<Snapshot>,
        today: &str,
        now: DateTime<Local>,
    ) -> Result<VolumeOutcome, SchedulerError> {
        let done_today = local.iter().any(|s| s.bucket == today);

        let execute = match &volume.policy {
            TriggerPolicy::TriggerFile => {
                let marker = volume.mountpoint.join(TRIGGER_FILE);
                if marker.exists() && !done_today {
                    // Consume the marker before doing anything else: a
                    // poisoned trigger must not re-fire every cycle.
                    std::fs::remove_file(&marker).map_err(|source| SchedulerError::Trigger {
                        path: marker.clone(),
                        source,
                    })?;
                    tracing::info!(dataset, "trigger found");
                    true
                } else {
                    false
                }
            }
            TriggerPolicy::TimeOfDay(at) => {
                if now.time() >= *at && !done_today {
                    tracing::info!(dataset, "time passed");
                    true
                } else {
                    false
                }
            }
        };

        if !execute {
            return Ok(VolumeOutcome::Idle);
        }

        let mut snapshotted = false;
        if volume.snapshot {
            tracing::info!(dataset, snapshot = today, "taking snapshot");
            zfs::take_snapshot(&self.runner, &Endpoint::Local, dataset, today)
                .await
                .map_err(SchedulerError::Snapshot)?;
            // Later steps in this same cycle must see the new snapshot.
            local.push(Snapshot::new(dataset, today, now.timestamp()));
            snapshotted = true;
        }

        let mut transfers = 0;
        if let Some(target) = &volume.replicate {
            tracing::info!(dataset, target = %target.dataset, "replicating");
            let outcome = self.replicator.sync(dataset, &local, target).await?;
            transfers = outcome.transfers;
        }

        let mut cleaned = false;
        if volume.clean {
            tracing::info!(dataset, "cleaning");
            self.retention
                .clean(dataset, &local, &volume.schema)
                .await?;
            cleaned = true;
        }

        Ok(VolumeOutcome::Completed {
            snapshotted,
            transfers,
            cleaned,
        })
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
