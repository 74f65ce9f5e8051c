//! Command runner trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Invocation;
use crate::error::RunnerResult;
use crate::outcome::ToolFailure;

/// Result of a tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code of the process (-1 when killed by a signal)
    pub exit_code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr (also forwarded to our own stderr)
    pub stderr: String,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Turn a non-zero exit into a [`ToolFailure`] describing it.
    pub fn check(self, tool: &str, invocation: &Invocation) -> Result<Self, ToolFailure> {
        if self.success() {
            return Ok(self);
        }
        Err(ToolFailure {
            tool: tool.to_string(),
            command: invocation.subcommand().unwrap_or_default().to_string(),
            exit_code: self.exit_code,
            output: self.combined_output(),
        })
    }
}

/// Runs one external tool.
///
/// A runner returns `Ok` whenever the process could be started and waited on,
/// whatever its exit code; `Err` means the tool could not be invoked at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the tool with the given invocation and wait for it to exit.
    async fn run(&self, invocation: &Invocation) -> RunnerResult<ExecutionResult>;
}
