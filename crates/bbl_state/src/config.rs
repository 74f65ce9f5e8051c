//! Merging global flags into a loaded state.
//!
//! Flags only ever fill in or confirm values: once an environment has an
//! IAAS, region or zone, a flag with a different value is rejected rather than
//! applied. Applying the same flags twice yields the same state.

use std::fs;
use std::path::Path;

use crate::error::{StateError, StateResult};
use crate::model::{Aws, Azure, Gcp, Iaas, State};

/// Provider selection and credentials given on the command line or through
/// `BBL_*` environment variables. Empty strings mean "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalFlags {
    pub iaas: String,

    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_region: String,

    pub azure_client_id: String,
    pub azure_client_secret: String,
    pub azure_location: String,
    pub azure_subscription_id: String,
    pub azure_tenant_id: String,

    pub gcp_service_account_key: String,
    pub gcp_project_id: String,
    pub gcp_zone: String,
    pub gcp_region: String,
}

/// Apply `flags` to `state`.
pub fn update_iaas_state(flags: &GlobalFlags, mut state: State) -> StateResult<State> {
    if !flags.iaas.is_empty() {
        let requested: Iaas = flags.iaas.parse()?;
        match state.iaas {
            Some(current) if current != requested => {
                return Err(StateError::IaasMismatch(current.to_string()));
            }
            _ => state.iaas = Some(requested),
        }
    }

    match state.iaas {
        Some(Iaas::Aws) => update_aws(flags, &mut state.aws)?,
        Some(Iaas::Gcp) => update_gcp(flags, &mut state.gcp)?,
        Some(Iaas::Azure) => update_azure(flags, &mut state.azure),
        None => {}
    }

    Ok(state)
}

fn update_aws(flags: &GlobalFlags, aws: &mut Aws) -> StateResult<()> {
    set_if_given(&mut aws.access_key_id, &flags.aws_access_key_id);
    set_if_given(&mut aws.secret_access_key, &flags.aws_secret_access_key);
    if !flags.aws_region.is_empty() {
        if !aws.region.is_empty() && aws.region != flags.aws_region {
            return Err(StateError::RegionMismatch(aws.region.clone()));
        }
        aws.region = flags.aws_region.clone();
    }
    Ok(())
}

fn update_gcp(flags: &GlobalFlags, gcp: &mut Gcp) -> StateResult<()> {
    if !flags.gcp_service_account_key.is_empty() {
        gcp.service_account_key = parse_service_account_key(&flags.gcp_service_account_key)?;
    }
    set_if_given(&mut gcp.project_id, &flags.gcp_project_id);
    if !flags.gcp_zone.is_empty() {
        if !gcp.zone.is_empty() && gcp.zone != flags.gcp_zone {
            return Err(StateError::ZoneMismatch(gcp.zone.clone()));
        }
        gcp.zone = flags.gcp_zone.clone();
    }
    if !flags.gcp_region.is_empty() {
        if !gcp.region.is_empty() && gcp.region != flags.gcp_region {
            return Err(StateError::RegionMismatch(gcp.region.clone()));
        }
        gcp.region = flags.gcp_region.clone();
    }
    Ok(())
}

fn update_azure(flags: &GlobalFlags, azure: &mut Azure) {
    set_if_given(&mut azure.client_id, &flags.azure_client_id);
    set_if_given(&mut azure.client_secret, &flags.azure_client_secret);
    set_if_given(&mut azure.location, &flags.azure_location);
    set_if_given(&mut azure.subscription_id, &flags.azure_subscription_id);
    set_if_given(&mut azure.tenant_id, &flags.azure_tenant_id);
}

fn set_if_given(field: &mut String, flag: &str) {
    if !flag.is_empty() {
        *field = flag.to_string();
    }
}

/// Accept either a path to a key file or the key JSON itself.
fn parse_service_account_key(value: &str) -> StateResult<String> {
    let key = if Path::new(value).is_file() {
        fs::read_to_string(value).map_err(|e| StateError::ServiceAccountKeyRead(e.to_string()))?
    } else {
        value.to_string()
    };

    serde_json::from_str::<serde_json::Value>(&key)
        .map_err(|e| StateError::InvalidServiceAccountKey(e.to_string()))?;

    Ok(key)
}

/// Commands that talk to the IAAS and therefore need complete credentials.
pub fn needs_iaas_config(command: &str) -> bool {
    matches!(
        command,
        "up" | "down" | "destroy" | "create-lbs" | "delete-lbs" | "update-lbs"
    )
}

/// Check that an IAAS is selected and its provider block is complete.
pub fn validate_iaas(state: &State) -> StateResult<()> {
    match state.iaas {
        None => Err(StateError::MissingIaas),
        Some(Iaas::Aws) => validate_aws(&state.aws),
        Some(Iaas::Gcp) => validate_gcp(&state.gcp),
        Some(Iaas::Azure) => validate_azure(&state.azure),
    }
}

fn validate_aws(aws: &Aws) -> StateResult<()> {
    require(&aws.access_key_id, "AWS access key ID must be provided")?;
    require(&aws.secret_access_key, "AWS secret access key must be provided")?;
    require(&aws.region, "AWS region must be provided")
}

fn validate_gcp(gcp: &Gcp) -> StateResult<()> {
    require(&gcp.service_account_key, "GCP service account key must be provided")?;
    require(&gcp.project_id, "GCP project ID must be provided")?;
    require(&gcp.zone, "GCP zone must be provided")?;
    require(&gcp.region, "GCP region must be provided")
}

fn validate_azure(azure: &Azure) -> StateResult<()> {
    require(&azure.client_id, "Azure client id must be provided")?;
    require(&azure.client_secret, "Azure client secret must be provided")?;
    require(&azure.location, "Azure location must be provided")?;
    require(&azure.subscription_id, "Azure subscription id must be provided")?;
    require(&azure.tenant_id, "Azure tenant id must be provided")
}

fn require(value: &str, message: &'static str) -> StateResult<()> {
    if value.is_empty() {
        Err(StateError::MissingCredential(message))
    } else {
        Ok(())
    }
}
