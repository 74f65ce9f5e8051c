//! Error types for state handling.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while loading, saving or configuring state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("State file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("State file version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("The iaas type cannot be changed for an existing environment. The current iaas type is {0}.")]
    IaasMismatch(String),

    #[error("The region cannot be changed for an existing environment. The current region is {0}.")]
    RegionMismatch(String),

    #[error("The zone cannot be changed for an existing environment. The current zone is {0}.")]
    ZoneMismatch(String),

    #[error("--iaas [gcp, aws, azure] must be provided or BBL_IAAS must be set")]
    MissingIaas,

    #[error("invalid IAAS specified: {0}")]
    InvalidIaas(String),

    #[error("\"{0}\" is not a valid lb type, valid lb types are: concourse and cf")]
    InvalidLbType(String),

    #[error("{0}")]
    MissingCredential(&'static str),

    #[error("error unmarshalling service account key (must be valid json): {0}")]
    InvalidServiceAccountKey(String),

    #[error("error reading service account key from file: {0}")]
    ServiceAccountKeyRead(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
