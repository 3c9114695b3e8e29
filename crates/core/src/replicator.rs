// SPDX-License-Identifier: MIT

//! Incremental replication planner and executor
//!
//! The planner walks the source snapshot chain in chronological order and
//! emits the minimal sequence of single-increment transfers needed to bring
//! the other side up to date. Nothing is re-sent once confirmed present
//! remotely, so an interrupted sync resumes from the last confirmed point
//! on the next cycle without any persisted state.

use crate::catalog::{self, CatalogError};
use crate::config::{Direction, ReplicationTarget};
use crate::runner::{CommandRunner, Endpoint, RunError};
use crate::snapshot::Snapshot;
use crate::zfs;
use std::collections::HashSet;
use thiserror::Error;

/// Errors from a replication pass
#[derive(Debug, Error)]
pub enum ReplicateError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{dataset}: remote inventory shares no common snapshot with the source chain")]
    DivergentRemote { dataset: String },
    #[error("transfer of {dataset}@{snapshot} failed: {source}")]
    TransferFailed {
        dataset: String,
        snapshot: String,
        #[source]
        source: RunError,
    },
    #[error("hold on {dataset}@{snapshot} failed: {source}")]
    HoldFailed {
        dataset: String,
        snapshot: String,
        #[source]
        source: RunError,
    },
}

/// One planned transfer; `base == None` means a full send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub base: Option<String>,
    pub snapshot: String,
}

impl Transfer {
    fn full(snapshot: &str) -> Self {
        Self {
            base: None,
            snapshot: snapshot.to_string(),
        }
    }

    fn incremental(base: &str, snapshot: &str) -> Self {
        Self {
            base: Some(base.to_string()),
            snapshot: snapshot.to_string(),
        }
    }
}

/// Compute the ordered transfer sequence from a source chain to a
/// destination inventory
///
/// Source snapshots already present on the destination only advance the
/// base. When the destination is empty there is no base to build on, so the
/// walk falls back to one full send of the first source snapshot and
/// continues incrementally. A non-empty destination with no common snapshot
/// is refused: forcing the destination over divergent history is a decision
/// the operator must make, not this planner.
pub fn plan(source: &[Snapshot], dest_names: &HashSet<String>) -> Result<Vec<Transfer>, ReplicateError> {
    let mut transfers = Vec::new();
    let mut base: Option<&str> = None;

    for snapshot in source {
        if dest_names.contains(&snapshot.name) {
            base = Some(&snapshot.name);
        } else if let Some(current) = base {
            transfers.push(Transfer::incremental(current, &snapshot.name));
            base = Some(&snapshot.name);
        } else if dest_names.is_empty() {
            transfers.push(Transfer::full(&snapshot.name));
            base = Some(&snapshot.name);
        }
        // No base yet and the destination is non-empty: keep scanning for
        // a common point.
    }

    if base.is_none() && !source.is_empty() && !dest_names.is_empty() {
        return Err(ReplicateError::DivergentRemote {
            dataset: source[0].dataset.clone(),
        });
    }

    Ok(transfers)
}

/// Outcome of one replication pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    /// Transfers executed this pass
    pub transfers: usize,
}

/// Executes replication passes for configured volumes
#[derive(Clone)]
pub struct Replicator<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> Replicator<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Bring the target in sync with the volume's snapshot chain
    ///
    /// With `Push` the volume's local snapshots are the source and the
    /// target dataset at the endpoint is the destination; with `Pull` the
    /// roles are mirrored and the walk runs over the remote chain.
    pub async fn sync(
        &self,
        dataset: &str,
        local: &[Snapshot],
        target: &ReplicationTarget,
    ) -> Result<SyncOutcome, ReplicateError> {
        let remote = catalog::list_snapshots(
            &self.runner,
            &target.endpoint,
            Some(&target.dataset),
            false,
        )
        .await?;
        let remote = remote.snapshots(&target.dataset);

        let names = |snapshots: &[Snapshot]| -> HashSet<String> {
            snapshots.iter().map(|s| s.name.clone()).collect()
        };

        // Source side is where `zfs send` runs; holds protect its base.
        let (source_dataset, dest_dataset, source_endpoint, transfers) = match target.direction {
            Direction::Push => (
                dataset,
                target.dataset.as_str(),
                Endpoint::Local,
                plan(local, &names(remote))?,
            ),
            Direction::Pull => (
                target.dataset.as_str(),
                dataset,
                target.endpoint.clone(),
                plan(remote, &names(local))?,
            ),
        };

        let mut outcome = SyncOutcome::default();
        for transfer in &transfers {
            self.execute(
                source_dataset,
                dest_dataset,
                &source_endpoint,
                transfer,
                target,
            )
            .await?;
            outcome.transfers += 1;
        }
        Ok(outcome)
    }

    async fn execute(
        &self,
        source: &str,
        dest: &str,
        source_endpoint: &Endpoint,
        transfer: &Transfer,
        target: &ReplicationTarget,
    ) -> Result<(), ReplicateError> {
        let base = transfer.base.as_deref();

        // Protect the delta base from retention while the transfer runs.
        if let Some(base) = base {
            zfs::hold(&self.runner, source_endpoint, source, base)
                .await
                .map_err(|source_err| ReplicateError::HoldFailed {
                    dataset: source.to_string(),
                    snapshot: base.to_string(),
                    source: source_err,
                })?;
        }

        match zfs::estimate_size(&self.runner, source_endpoint, source, base, &transfer.snapshot)
            .await
        {
            Ok(size) => tracing::info!(
                source,
                dest,
                base,
                snapshot = %transfer.snapshot,
                %size,
                "transferring"
            ),
            Err(e) => tracing::debug!(source, error = %e, "size estimate unavailable"),
        }

        let pipeline = zfs::replicate_pipeline(
            source,
            base,
            &transfer.snapshot,
            dest,
            &target.endpoint,
            target.direction,
            target.compression.as_deref(),
        );
        let result = self.runner.run_pipeline(&pipeline).await;

        // Release unconditionally, success or failure.
        if let Some(base) = base {
            zfs::release(&self.runner, source_endpoint, source, base).await;
        }

        result.map_err(|source_err| ReplicateError::TransferFailed {
            dataset: source.to_string(),
            snapshot: transfer.snapshot.clone(),
            source: source_err,
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "replicator_tests.rs"]
mod tests;
