//! Error types for terraform orchestration.

use thiserror::Error;

use bbl_runner::{ErrorList, RunnerError, ToolFailure};

/// Result type alias for terraform operations.
pub type TerraformResult<T> = Result<T, TerraformError>;

/// Errors that can occur while driving terraform.
///
/// A failed `apply` or `destroy` that still left a readable state file is not
/// an error: it is reported as [`bbl_runner::RunOutcome::Failed`].
#[derive(Error, Debug)]
pub enum TerraformError {
    #[error(transparent)]
    Command(#[from] ToolFailure),

    #[error("failed to import: {0}")]
    Import(ToolFailure),

    #[error("{causes}")]
    Unrecoverable { causes: ErrorList },

    #[error("Terraform version could not be parsed")]
    VersionParse,

    #[error("Terraform version must be at least v{minimum}, found v{found}")]
    VersionTooOld { found: String, minimum: String },

    #[error("invalid terraform address: {0}")]
    InvalidAddress(String),

    #[error("failed to parse terraform outputs: {0}")]
    Outputs(#[source] serde_json::Error),

    #[error("environment has both legacy infrastructure and terraform state; refusing to migrate")]
    LegacyConflict,

    #[error(transparent)]
    Iaas(#[from] bbl_iaas::IaasError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
