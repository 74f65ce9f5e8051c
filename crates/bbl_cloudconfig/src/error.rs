//! Error types for cloud-config generation and upload.

use thiserror::Error;

/// Result type alias for cloud-config operations.
pub type CloudConfigResult<T> = Result<T, CloudConfigError>;

/// Errors that can occur while generating or applying a cloud config.
#[derive(Error, Debug)]
pub enum CloudConfigError {
    #[error("environment has no director")]
    NoDirector,

    #[error("failed to update cloud config: {0}")]
    Update(String),

    #[error(transparent)]
    Iaas(#[from] bbl_iaas::IaasError),

    #[error(transparent)]
    Bosh(#[from] bbl_bosh::BoshError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
