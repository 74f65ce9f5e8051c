//! Outcomes of state-producing tool runs.
//!
//! `terraform apply` and `bosh create-env` can fail halfway and still leave a
//! state file describing what they managed to create. Such a run is not an
//! `Err`: the caller has to persist the partial state before reporting the
//! failure, and [`RunOutcome`] makes that case impossible to ignore.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tool that ran to completion but exited non-zero.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{tool} {command} exited with status {exit_code}")]
pub struct ToolFailure {
    pub tool: String,
    pub command: String,
    pub exit_code: i32,
    /// Captured tool output
    pub output: String,
}

/// Result of a run that always yields a state, complete or partial.
#[must_use = "a failed run carries partial state that has to be persisted"]
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<S> {
    /// The tool succeeded and produced this state.
    Completed(S),
    /// The tool failed; `partial` is what it left on disk.
    Failed { partial: S, cause: ToolFailure },
}

impl<S> RunOutcome<S> {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    /// The state produced by the run, partial or not.
    pub fn state(&self) -> &S {
        match self {
            RunOutcome::Completed(state) => state,
            RunOutcome::Failed { partial, .. } => partial,
        }
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match self {
            RunOutcome::Completed(_) => None,
            RunOutcome::Failed { cause, .. } => Some(cause),
        }
    }

    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> RunOutcome<T> {
        match self {
            RunOutcome::Completed(state) => RunOutcome::Completed(f(state)),
            RunOutcome::Failed { partial, cause } => RunOutcome::Failed {
                partial: f(partial),
                cause,
            },
        }
    }

    /// Split into the state to persist and the failure to report, if any.
    pub fn into_parts(self) -> (S, Option<ToolFailure>) {
        match self {
            RunOutcome::Completed(state) => (state, None),
            RunOutcome::Failed { partial, cause } => (partial, Some(cause)),
        }
    }
}
