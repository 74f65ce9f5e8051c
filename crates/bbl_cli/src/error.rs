//! Errors raised by the CLI itself, before or between tool runs.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("A bbl environment could not be found, please create a new environment before running this command again.")]
    NoEnvironment,

    #[error("The director name cannot be changed for an existing environment. Current name is {0}.")]
    EnvIdConflict(String),

    #[error("Names must start with a letter and be alphanumeric or hyphenated.")]
    InvalidName,

    #[error("Director already exists, you must re-create your environment to use \"--no-director\"")]
    DirectorExists,

    #[error("failed to read ops file {path:?}: {source}")]
    OpsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("--type is required")]
    MissingLbType,

    #[error("Validate certificate: {0}")]
    Certificate(String),

    #[error("--domain is not implemented for concourse load balancers. Remove the --domain flag and try again.")]
    DomainUnsupported,

    #[error("no load balancer has been found for this bbl environment")]
    NoLoadBalancer,

    #[error("Could not retrieve {0}, please make sure you are targeting the proper state dir.")]
    MissingProperty(&'static str),

    #[error("Error BBL does not manage this director.")]
    UnmanagedDirector,
}
