// SPDX-License-Identifier: MIT

//! zsnap-core: Core library for the zsnap snapshot manager
//!
//! This crate provides:
//! - The snapshot data model and inventory catalog
//! - The per-volume scheduling decision engine
//! - The incremental replication planner and executor
//! - The retention cleaner collaborator
//! - A structured command-runner seam for the external storage tool

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod catalog;
pub mod clock;
pub mod config;
pub mod replicator;
pub mod retention;
pub mod runner;
pub mod scheduler;
pub mod snapshot;
pub mod zfs;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError, Direction, ReplicationTarget, TriggerPolicy, Volume};
pub use replicator::{ReplicateError, Replicator, SyncOutcome, Transfer};
pub use retention::{BucketCleaner, NoOpRetention, Retention, RetentionError};
pub use runner::{
    Cmd, CommandRunner, Endpoint, FakeRunner, NoOpRunner, Pipeline, RunError, RunnerCall,
};
pub use scheduler::{CycleReport, Scheduler, SchedulerError, VolumeOutcome, VolumeReport};
pub use snapshot::{Snapshot, SnapshotInventory};
