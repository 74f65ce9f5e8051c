//! The per-IAAS provider abstraction.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use bbl_runner::FileIo;
use bbl_state::{Iaas, State};

use crate::aws::AwsProvider;
use crate::azure::AzureProvider;
use crate::error::{IaasError, IaasResult};
use crate::gcp::GcpProvider;
use crate::ops::{DeploymentVars, Op};
use crate::outputs::Outputs;

pub const INTERNAL_CIDR: &str = "10.0.0.0/24";
pub const INTERNAL_GW: &str = "10.0.0.1";
pub const JUMPBOX_INTERNAL_IP: &str = "10.0.0.5";
pub const DIRECTOR_INTERNAL_IP: &str = "10.0.0.6";

/// Terraform input variables, sorted by name.
pub type TerraformVars = BTreeMap<String, String>;

/// Everything bbl needs to know about one IAAS.
///
/// Implementations are pure apart from [`Provider::inputs`], which may drop
/// credential or certificate files next to the terraform template.
pub trait Provider: Send + Sync {
    fn iaas(&self) -> Iaas;

    /// Terraform template for the environment, including the load balancer
    /// resources of the configured lb type.
    fn template(&self, state: &State) -> String;

    /// Terraform input variables.
    fn inputs(
        &self,
        state: &State,
        terraform_dir: &Path,
        files: &dyn FileIo,
    ) -> IaasResult<TerraformVars>;

    /// Outputs [`Provider::cloud_config_ops`] reads for this state.
    fn required_outputs(&self, state: &State) -> Vec<&'static str>;

    /// Ops overlay turning the base cloud config into this IAAS' cloud config.
    fn cloud_config_ops(&self, state: &State, outputs: &Outputs) -> IaasResult<Vec<Op>>;

    /// Whether the director is reached through a jumpbox.
    fn deploys_jumpbox(&self) -> bool {
        true
    }

    fn jumpbox_deployment_vars(&self, state: &State, outputs: &Outputs)
        -> IaasResult<DeploymentVars>;

    fn director_deployment_vars(
        &self,
        state: &State,
        outputs: &Outputs,
    ) -> IaasResult<DeploymentVars>;

    /// Ops files applied to the base director manifest, in order.
    fn director_ops_files(&self) -> &'static [&'static str];

    /// Provider block used when importing a legacy resource.
    fn import_provider_block(&self, _state: &State) -> IaasResult<String> {
        Err(IaasError::ImportUnsupported(self.iaas().to_string()))
    }
}

/// The provider implementation for `iaas`.
pub fn provider_for(iaas: Iaas) -> Arc<dyn Provider> {
    match iaas {
        Iaas::Aws => Arc::new(AwsProvider::new()),
        Iaas::Azure => Arc::new(AzureProvider::new()),
        Iaas::Gcp => Arc::new(GcpProvider::new()),
    }
}

/// The provider for the state's IAAS.
pub fn provider_for_state(state: &State) -> IaasResult<Arc<dyn Provider>> {
    state.iaas.map(provider_for).ok_or(IaasError::NoIaas)
}

pub fn director_name(state: &State) -> String {
    format!("bosh-{}", state.env_id)
}

/// Vars every deployment shares: the internal network and the vm's address on it.
pub(crate) fn network_vars(internal_ip: &str) -> DeploymentVars {
    let mut vars = DeploymentVars::new();
    vars.insert("internal_cidr".to_string(), json!(INTERNAL_CIDR));
    vars.insert("internal_gw".to_string(), json!(INTERNAL_GW));
    vars.insert("internal_ip".to_string(), json!(internal_ip));
    vars
}

/// Write `contents` into the terraform directory and return the path.
pub(crate) fn write_input_file(
    files: &dyn FileIo,
    terraform_dir: &Path,
    name: &str,
    contents: &str,
) -> IaasResult<String> {
    let path = terraform_dir.join(name);
    files.write(&path, contents.as_bytes())?;
    Ok(path.to_string_lossy().to_string())
}

/// Same as [`write_input_file`] for keys and credentials.
pub(crate) fn write_secret_file(
    files: &dyn FileIo,
    terraform_dir: &Path,
    name: &str,
    contents: &str,
) -> IaasResult<String> {
    let path = terraform_dir.join(name);
    files.write_private(&path, contents.as_bytes())?;
    Ok(path.to_string_lossy().to_string())
}
