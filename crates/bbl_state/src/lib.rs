//! # bbl_state
//!
//! The persisted record of a bbl environment.
//!
//! [`State`] describes which IAAS the environment lives on, the credentials
//! used to reach it, the opaque state blobs owned by terraform and bosh, and
//! the director's connection details. [`Store`] reads and writes it as
//! `bbl-state.json` inside the state directory; every mutating step of a
//! command writes it back immediately.
//!
//! The [`config`] module merges global flags into a loaded state and checks
//! that the active provider block is complete.

pub mod config;
pub mod error;
pub mod model;
pub mod store;

pub use config::{needs_iaas_config, update_iaas_state, validate_iaas, GlobalFlags};
pub use error::{StateError, StateResult};
pub use model::{
    Aws, Azure, Bosh, Gcp, Iaas, Jumpbox, LbType, LegacyInfrastructure, LegacyResource,
    LoadBalancer, State, STATE_VERSION,
};
pub use store::{Store, STATE_FILE};
