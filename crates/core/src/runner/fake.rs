// SPDX-License-Identifier: MIT

//! Fake command runner with call recording for testing

use super::{Cmd, CommandRunner, Endpoint, Pipeline, RunError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Recorded runner invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCall {
    Run {
        endpoint: Endpoint,
        rendered: String,
    },
    RunPipeline {
        rendered: String,
    },
}

impl RunnerCall {
    pub fn rendered(&self) -> &str {
        match self {
            RunnerCall::Run { rendered, .. } => rendered,
            RunnerCall::RunPipeline { rendered } => rendered,
        }
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<RunnerCall>,
    // (needle, canned stdout), matched by substring, first match wins
    responses: Vec<(String, String)>,
    // needles that make a matching call fail
    failures: Vec<String>,
}

/// Fake command runner for testing
///
/// Responses are scripted by substring match against the haystack
/// `"<endpoint>: <rendered command>"`, so a test can answer the same
/// listing command differently per endpoint. Unmatched calls succeed with
/// empty output.
#[derive(Clone, Default)]
pub struct FakeRunner {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RunnerCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Rendered command lines, in call order
    pub fn rendered_calls(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.rendered().to_string())
            .collect()
    }

    /// Clear recorded calls
    pub fn clear_calls(&self) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clear();
    }

    /// Script canned stdout for calls whose haystack contains `needle`
    pub fn respond(&self, needle: impl Into<String>, output: impl Into<String>) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .responses
            .push((needle.into(), output.into()));
    }

    /// Make calls whose haystack contains `needle` fail
    pub fn fail_matching(&self, needle: impl Into<String>) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .failures
            .push(needle.into());
    }

    fn dispatch(&self, haystack: &str, call: RunnerCall) -> Result<String, RunError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(call);
        if state.failures.iter().any(|n| haystack.contains(n.as_str())) {
            return Err(RunError::Failed {
                status: 1,
                stderr: "injected failure".to_string(),
            });
        }
        let output = state
            .responses
            .iter()
            .find(|(n, _)| haystack.contains(n.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(output)
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, endpoint: &Endpoint, cmd: &Cmd) -> Result<String, RunError> {
        let rendered = cmd.rendered();
        let haystack = format!("{}: {}", endpoint, rendered);
        self.dispatch(
            &haystack,
            RunnerCall::Run {
                endpoint: endpoint.clone(),
                rendered,
            },
        )
    }

    async fn run_pipeline(&self, pipeline: &Pipeline) -> Result<String, RunError> {
        let rendered = pipeline.rendered();
        let haystack = format!("{}: {}", pipeline.endpoint, rendered);
        self.dispatch(&haystack, RunnerCall::RunPipeline { rendered })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
