// SPDX-License-Identifier: MIT

//! Real command runner backed by `tokio::process`
//!
//! Local commands are spawned directly from their argument list, without a
//! shell. Remote commands go through `ssh` with the already-quoted rendering
//! as the remote line. Pipelines need `|` plumbing, so they run under
//! `sh -c` with every stage argument quoted by the rendering.

use async_trait::async_trait;
use tokio::process::Command;
use zsnap_core::runner::{Cmd, CommandRunner, Endpoint, Pipeline, RunError};

/// Command runner that spawns real processes
#[derive(Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }

    async fn exec(&self, program: &str, args: Vec<String>) -> Result<String, RunError> {
        let output = Command::new(program)
            .args(&args)
            .output()
            .await
            .map_err(|source| RunError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(RunError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, endpoint: &Endpoint, cmd: &Cmd) -> Result<String, RunError> {
        match endpoint {
            Endpoint::Local => self.exec(&cmd.program, cmd.args.clone()).await,
            Endpoint::Ssh { host, port, user } => {
                let destination = match user {
                    Some(user) => format!("{}@{}", user, host),
                    None => host.clone(),
                };
                let args = vec!["-p".to_string(), port.to_string(), destination, cmd.rendered()];
                self.exec("ssh", args).await
            }
        }
    }

    async fn run_pipeline(&self, pipeline: &Pipeline) -> Result<String, RunError> {
        self.exec("sh", vec!["-c".to_string(), pipeline.rendered()])
            .await
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
