//! Error types for bosh orchestration.

use thiserror::Error;

use bbl_runner::{ErrorList, RunnerError, ToolFailure};

/// Result type alias for bosh operations.
pub type BoshResult<T> = Result<T, BoshError>;

/// Errors that can occur while driving the bosh CLI.
#[derive(Error, Debug)]
pub enum BoshError {
    #[error(transparent)]
    Command(#[from] ToolFailure),

    #[error("bosh interpolate: {0}: {}", .0.output)]
    Interpolate(ToolFailure),

    #[error("{causes}")]
    Unrecoverable { causes: ErrorList },

    #[error("BOSH version could not be parsed")]
    VersionParse,

    #[error("BOSH version must be at least v{minimum}, found v{found}")]
    VersionTooOld { found: String, minimum: String },

    #[error("no ops file named {0}")]
    UnknownOpsFile(String),

    #[error("vars store has no value for {0}")]
    MissingVariable(String),

    #[error("failed to parse vars store: {0}")]
    VarsStore(#[source] serde_yaml::Error),

    #[error("failed to parse bosh state: {0}")]
    State(#[source] serde_json::Error),

    #[error(transparent)]
    Iaas(#[from] bbl_iaas::IaasError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
