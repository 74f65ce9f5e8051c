//! # bbl_iaas
//!
//! Per-IAAS knowledge for bbl.
//!
//! Each supported IAAS implements [`Provider`], which supplies the terraform
//! template and inputs, the bosh deployment vars and director ops files, and
//! the ops overlay that turns the provider-neutral base cloud config into an
//! IAAS-specific one.
//!
//! ## Example
//!
//! ```rust
//! use bbl_iaas::{provider_for, render_ops, Outputs};
//! use bbl_state::{Iaas, State};
//!
//! let provider = provider_for(Iaas::Azure);
//! let outputs = Outputs::new()
//!     .with("bosh_network_name", "some-virtual-network-name")
//!     .with("bosh_subnet_name", "some-subnet-name")
//!     .with("bosh_default_security_group", "some-security-group");
//!
//! let ops = provider
//!     .cloud_config_ops(&State::new().with_iaas(Iaas::Azure), &outputs)
//!     .unwrap();
//! println!("{}", render_ops(&ops).unwrap());
//! ```

pub mod aws;
pub mod azure;
pub mod error;
pub mod gcp;
pub mod ops;
pub mod outputs;
pub mod provider;

pub use error::{IaasError, IaasResult};
pub use ops::{render_ops, render_vars, DeploymentVars, Op, OpType};
pub use outputs::{OutputSource, Outputs};
pub use provider::{
    director_name, provider_for, provider_for_state, Provider, TerraformVars,
    DIRECTOR_INTERNAL_IP, JUMPBOX_INTERNAL_IP,
};
