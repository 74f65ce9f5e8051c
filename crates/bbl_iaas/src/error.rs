//! Error types for the IAAS layer.

use thiserror::Error;

/// Result type alias for IAAS operations.
pub type IaasResult<T> = Result<T, IaasError>;

/// Errors that can occur while generating provider-specific artifacts.
#[derive(Error, Debug)]
pub enum IaasError {
    #[error("missing terraform output: {0}")]
    MissingOutput(String),

    #[error("missing terraform outputs: {}", .0.join(", "))]
    MissingOutputs(Vec<String>),

    #[error("{0}")]
    OutputSource(String),

    #[error("no IAAS configured in state")]
    NoIaas,

    #[error("importing legacy resources is not supported on {0}")]
    ImportUnsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
