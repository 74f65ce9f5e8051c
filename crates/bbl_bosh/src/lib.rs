//! # bbl_bosh
//!
//! Jumpbox and director deployment for bbl.
//!
//! The [`Executor`] renders manifests with `bosh interpolate` and deploys
//! them with `bosh create-env`; the [`Manager`] feeds it the provider's
//! deployment vars and records the results in the bbl state. Manifests and
//! ops files ship inside the binary (see [`assets`]).
//!
//! ## Features
//!
//! - jumpbox and director interpolation, with an optional user ops file
//!   layered over the director manifest
//! - create-env / delete-env with partial-state recovery
//! - director credentials and jumpbox key extraction from vars stores
//! - bosh CLI version detection
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bbl_bosh::Manager;
//! use bbl_iaas::{provider_for, Outputs};
//! use bbl_runner::{CliRunner, LocalFs};
//! use bbl_state::{Iaas, State};
//!
//! # async fn run(outputs: Outputs) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Manager::new(
//!     Arc::new(CliRunner::new("bosh")),
//!     Arc::new(LocalFs),
//!     "/tmp/bbl/bosh",
//!     provider_for(Iaas::Gcp),
//! );
//!
//! let state = State::new().with_iaas(Iaas::Gcp);
//! let (state, failure) = manager.create_jumpbox(state, &outputs).await?.into_parts();
//! if let Some(cause) = failure {
//!     eprintln!("{}", cause);
//! }
//! println!("{}", state.jumpbox.url);
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod manager;

pub use credentials::{all_proxy, jumpbox_private_key, DirectorCredentials, DIRECTOR_USERNAME};
pub use error::{BoshError, BoshResult};
pub use executor::{
    BoshState, DirectorInterpolateInput, EnvInput, Executor, InterpolateOutput, Interpolation,
    Interpolator, JumpboxInterpolateInput, OpsFile, OpsFileSet, DIRECTOR_DIR, JUMPBOX_DIR,
    VERSION_DEV_BUILD,
};
pub use manager::{Manager, MINIMUM_VERSION};
