// SPDX-License-Identifier: MIT

//! Snapshot catalog: inventories of existing snapshots and datasets
//!
//! Listing output is parsed tolerantly: one malformed line is skipped with
//! a warning instead of blanking the whole inventory. Arrival order is
//! preserved as-is; the listing tool already sorts by creation time and
//! several snapshots can share a date bucket, so re-sorting by bucket would
//! lose information.

use crate::runner::{CommandRunner, Endpoint, RunError};
use crate::snapshot::{self, Snapshot, SnapshotInventory};
use crate::zfs;
use thiserror::Error;

/// Errors from building an inventory
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("snapshot listing failed at {endpoint}: {source}")]
    SnapshotListing {
        endpoint: String,
        #[source]
        source: RunError,
    },
    #[error("dataset listing failed at {endpoint}: {source}")]
    DatasetListing {
        endpoint: String,
        #[source]
        source: RunError,
    },
}

/// Build the snapshot inventory visible at an endpoint
///
/// `dataset_filter` narrows the result to one dataset; `managed_only`
/// drops snapshots whose name does not follow the managed convention.
pub async fn list_snapshots<R: CommandRunner>(
    runner: &R,
    endpoint: &Endpoint,
    dataset_filter: Option<&str>,
    managed_only: bool,
) -> Result<SnapshotInventory, CatalogError> {
    let output = runner
        .run(endpoint, &zfs::list_snapshots_cmd())
        .await
        .map_err(|source| CatalogError::SnapshotListing {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let mut inventory = SnapshotInventory::new();
    for line in output.lines().filter(|l| !l.is_empty()) {
        let mut parts = line.split('\t').filter(|p| !p.is_empty());
        let (Some(full_name), Some(creation)) = (parts.next(), parts.next()) else {
            tracing::warn!(line, "skipping malformed snapshot listing line");
            continue;
        };
        let Some((dataset, name)) = full_name.split_once('@') else {
            tracing::warn!(line, "skipping malformed snapshot listing line");
            continue;
        };
        let Ok(creation) = creation.trim().parse::<i64>() else {
            tracing::warn!(line, "skipping snapshot with unparseable creation time");
            continue;
        };
        if let Some(filter) = dataset_filter {
            if dataset != filter {
                continue;
            }
        }
        if managed_only && !snapshot::is_managed_name(name) {
            continue;
        }
        inventory.push(Snapshot::new(dataset, name, creation));
    }
    Ok(inventory)
}

/// Dataset names visible at an endpoint, in listing order
pub async fn list_datasets<R: CommandRunner>(
    runner: &R,
    endpoint: &Endpoint,
) -> Result<Vec<String>, CatalogError> {
    let output = runner
        .run(endpoint, &zfs::list_datasets_cmd())
        .await
        .map_err(|source| CatalogError::DatasetListing {
            endpoint: endpoint.to_string(),
            source,
        })?;

    Ok(output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
