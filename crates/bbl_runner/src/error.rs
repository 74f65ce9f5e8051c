//! Error types for the runner module.

use std::fmt;

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while invoking an external tool.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("{0} executable not found on PATH")]
    ToolNotFound(String),

    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for {program}: {message}")]
    WaitFailed { program: String, message: String },

    #[error("Simulated failure: {0}")]
    Simulated(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Several failures reported together.
///
/// Used when a tool failed and the state it should have left behind could not
/// be read either; each cause is kept so the user sees both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList {
    messages: Vec<String>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: impl fmt::Display) {
        self.messages.push(error.to_string());
    }

    pub fn with(mut self, error: impl fmt::Display) -> Self {
        self.push(error);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join("\n"))
    }
}

impl std::error::Error for ErrorList {}
