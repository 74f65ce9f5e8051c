//! # bbl_cloudconfig
//!
//! Cloud-config generation and upload for bbl.
//!
//! The base cloud config is provider-neutral. [`OpsGenerator`] asks the
//! environment's provider for the ops that specialise it, using the
//! terraform outputs of the environment; [`Manager`] renders the result with
//! `bosh interpolate` and sends it to the director through a
//! [`DirectorClient`].

pub mod director;
pub mod error;
pub mod manager;
pub mod ops_generator;

pub use director::{
    BoshCliClientProvider, BoshCliDirectorClient, DirectorClient, DirectorClientProvider,
    DirectorTarget,
};
pub use error::{CloudConfigError, CloudConfigResult};
pub use manager::{Manager, BASE_CLOUD_CONFIG};
pub use ops_generator::OpsGenerator;
