//! # bbl_terraform
//!
//! Terraform orchestration for bbl.
//!
//! The [`Executor`] drives the terraform binary inside the state directory's
//! `terraform/` folder. The [`Manager`] builds on it: it renders the
//! provider's template and inputs, migrates legacy environments by importing
//! their resources, and folds terraform's state back into the bbl [`State`].
//!
//! ## Features
//!
//! - apply / destroy with partial-state recovery
//! - single resource import for legacy environments
//! - output lookup, exposed to other crates as an [`OutputSource`]
//! - version detection and minimum version check
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bbl_runner::{CliRunner, LocalFs, RunOutcome};
//! use bbl_state::{Iaas, State};
//! use bbl_terraform::Manager;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Manager::new(
//!     Arc::new(CliRunner::new("terraform")),
//!     Arc::new(LocalFs),
//!     "/tmp/bbl/terraform",
//!     bbl_iaas::provider_for(Iaas::Gcp),
//! );
//!
//! match manager.apply(State::new().with_iaas(Iaas::Gcp)).await? {
//!     RunOutcome::Completed(state) => println!("{}", state.tf_state),
//!     RunOutcome::Failed { cause, .. } => eprintln!("{}", cause),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`State`]: bbl_state::State
//! [`OutputSource`]: bbl_iaas::OutputSource

pub mod error;
pub mod executor;
pub mod manager;

pub use error::{TerraformError, TerraformResult};
pub use executor::{Executor, ImportInput, STATE_FILE, TEMPLATE_FILE, VARS_FILE};
pub use manager::{Manager, MINIMUM_VERSION};
