// SPDX-License-Identifier: MIT

//! Traced runner wrapper for consistent observability

use async_trait::async_trait;
use zsnap_core::runner::{Cmd, CommandRunner, Endpoint, Pipeline, RunError};

/// Wrapper that adds tracing to any CommandRunner
#[derive(Clone)]
pub struct TracedRunner<R> {
    inner: R,
}

impl<R> TracedRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: CommandRunner> CommandRunner for TracedRunner<R> {
    async fn run(&self, endpoint: &Endpoint, cmd: &Cmd) -> Result<String, RunError> {
        let span = tracing::info_span!("runner.run", endpoint = %endpoint, program = %cmd.program);
        let _guard = span.enter();

        tracing::debug!(cmd = %cmd.rendered(), "running");
        let start = std::time::Instant::now();
        let result = self.inner.run(endpoint, cmd).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(stdout) => tracing::debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                stdout_len = stdout.len(),
                "done"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "command failed"
            ),
        }

        result
    }

    async fn run_pipeline(&self, pipeline: &Pipeline) -> Result<String, RunError> {
        let span = tracing::info_span!("runner.pipeline", endpoint = %pipeline.endpoint);
        let _guard = span.enter();

        tracing::info!(pipeline = %pipeline.rendered(), "running");
        let start = std::time::Instant::now();
        let result = self.inner.run_pipeline(pipeline).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "transfer done"),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "transfer failed"
            ),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
