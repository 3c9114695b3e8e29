// SPDX-License-Identifier: MIT

//! Structured command and pipeline values
//!
//! Commands are argument lists, never interpolated strings; rendering to a
//! shell line quotes every argument, so dataset names and endpoints cannot
//! smuggle shell syntax into a transfer.

use std::fmt;

/// Where a command runs; `Local` is the host the daemon runs on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Endpoint {
    #[default]
    Local,
    Ssh {
        host: String,
        port: u16,
        user: Option<String>,
    },
}

impl Endpoint {
    pub fn ssh(host: impl Into<String>, port: u16, user: Option<String>) -> Self {
        Self::Ssh {
            host: host.into(),
            port,
            user,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Endpoint::Local)
    }

    /// The `ssh` prefix that reaches this endpoint, e.g. `ssh -p 22 bak`
    pub fn ssh_rendered(&self) -> String {
        match self {
            Endpoint::Local => String::new(),
            Endpoint::Ssh { host, port, user } => match user {
                Some(user) => format!("ssh -p {} {}@{}", port, shell_quote(user), shell_quote(host)),
                None => format!("ssh -p {} {}", port, shell_quote(host)),
            },
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Local => write!(f, "local"),
            Endpoint::Ssh { host, port, .. } => write!(f, "{}:{}", host, port),
        }
    }
}

/// A single external command as program + argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    pub program: String,
    pub args: Vec<String>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Shell-quoted single-line rendering
    pub fn rendered(&self) -> String {
        let mut parts = vec![shell_quote(&self.program)];
        parts.extend(self.args.iter().map(|a| shell_quote(a)));
        parts.join(" ")
    }
}

/// Which side of the endpoint a pipeline stage runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locality {
    Local,
    Remote,
}

/// An ordered sequence of piped commands spanning at most one remote hop
///
/// Consecutive `Remote` stages render into a single quoted `ssh` invocation
/// at the pipeline's endpoint. With a `Local` endpoint, remote stages render
/// inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub endpoint: Endpoint,
    stages: Vec<(Locality, Cmd)>,
}

impl Pipeline {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            stages: Vec::new(),
        }
    }

    pub fn local(mut self, cmd: Cmd) -> Self {
        self.stages.push((Locality::Local, cmd));
        self
    }

    pub fn remote(mut self, cmd: Cmd) -> Self {
        self.stages.push((Locality::Remote, cmd));
        self
    }

    pub fn stages(&self) -> &[(Locality, Cmd)] {
        &self.stages
    }

    /// Render the whole pipeline to one shell line
    pub fn rendered(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut i = 0;
        while i < self.stages.len() {
            match self.stages[i].0 {
                Locality::Local => {
                    parts.push(self.stages[i].1.rendered());
                    i += 1;
                }
                Locality::Remote => {
                    let mut inner = Vec::new();
                    while i < self.stages.len() && self.stages[i].0 == Locality::Remote {
                        inner.push(self.stages[i].1.rendered());
                        i += 1;
                    }
                    let joined = inner.join(" | ");
                    if self.endpoint.is_local() {
                        parts.push(joined);
                    } else {
                        parts.push(format!(
                            "{} {}",
                            self.endpoint.ssh_rendered(),
                            shell_quote(&joined)
                        ));
                    }
                }
            }
        }
        parts.join(" | ")
    }
}

/// Quote a string for POSIX shell use
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_@%+=:,./".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
