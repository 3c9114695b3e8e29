// SPDX-License-Identifier: MIT

//! Command runner seam for the external storage tool
//!
//! Every external invocation is built as a structured [`Cmd`] or
//! [`Pipeline`] value and handed to a [`CommandRunner`]. Real execution
//! lives in the adapters crate; this module owns the types, the rendering
//! (including shell quoting and remote-hop composition) and the fake used
//! by tests.

mod command;
mod fake;

pub use command::{Cmd, Endpoint, Locality, Pipeline};
pub use fake::{FakeRunner, RunnerCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from running an external command
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },
}

/// Runs structured commands locally or at a remote endpoint
#[async_trait]
pub trait CommandRunner: Clone + Send + Sync + 'static {
    /// Run a single command at an endpoint, returning captured stdout
    async fn run(&self, endpoint: &Endpoint, cmd: &Cmd) -> Result<String, RunError>;

    /// Run a multi-stage pipeline, returning captured stdout of the final
    /// stage
    async fn run_pipeline(&self, pipeline: &Pipeline) -> Result<String, RunError>;
}

/// No-op command runner for testing
#[derive(Clone, Default)]
pub struct NoOpRunner;

#[async_trait]
impl CommandRunner for NoOpRunner {
    async fn run(&self, _endpoint: &Endpoint, _cmd: &Cmd) -> Result<String, RunError> {
        Ok(String::new())
    }

    async fn run_pipeline(&self, _pipeline: &Pipeline) -> Result<String, RunError> {
        Ok(String::new())
    }
}
