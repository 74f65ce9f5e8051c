//! State model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StateError;

/// Current version of the state file format.
pub const STATE_VERSION: u32 = 3;

/// Supported infrastructure providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Iaas {
    Aws,
    Azure,
    Gcp,
}

impl Iaas {
    pub fn as_str(&self) -> &'static str {
        match self {
            Iaas::Aws => "aws",
            Iaas::Azure => "azure",
            Iaas::Gcp => "gcp",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Iaas::Aws, Iaas::Azure, Iaas::Gcp]
    }
}

impl FromStr for Iaas {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" => Ok(Iaas::Aws),
            "azure" => Ok(Iaas::Azure),
            "gcp" => Ok(Iaas::Gcp),
            _ => Err(StateError::InvalidIaas(s.to_string())),
        }
    }
}

impl fmt::Display for Iaas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Load balancer flavours bbl can attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LbType {
    Cf,
    Concourse,
}

impl LbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LbType::Cf => "cf",
            LbType::Concourse => "concourse",
        }
    }
}

impl FromStr for LbType {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cf" => Ok(LbType::Cf),
            "concourse" => Ok(LbType::Concourse),
            other => Err(StateError::InvalidLbType(other.to_string())),
        }
    }
}

impl fmt::Display for LbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Aws {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Gcp {
    pub service_account_key: String,
    pub project_id: String,
    pub zone: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Azure {
    pub client_id: String,
    pub client_secret: String,
    pub location: String,
    pub subscription_id: String,
    pub tenant_id: String,
}

/// Jumpbox deployment record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Jumpbox {
    /// `host:port` used to reach the jumpbox over ssh
    pub url: String,
    /// bosh vars-store contents
    pub variables: String,
    pub manifest: String,
    /// bosh create-env state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Map<String, Value>>,
}

impl Jumpbox {
    pub fn is_deployed(&self) -> bool {
        self.state.is_some() || !self.url.is_empty()
    }
}

/// Director deployment record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bosh {
    pub director_name: String,
    pub director_username: String,
    pub director_password: String,
    pub director_address: String,
    #[serde(rename = "directorSSLCA")]
    pub director_ssl_ca: String,
    #[serde(rename = "directorSSLCertificate")]
    pub director_ssl_certificate: String,
    #[serde(rename = "directorSSLPrivateKey")]
    pub director_ssl_private_key: String,
    /// bosh vars-store contents
    pub variables: String,
    pub manifest: String,
    /// User ops file layered over the director manifest on every deploy
    pub user_ops_file: String,
    /// bosh create-env state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Map<String, Value>>,
}

impl Bosh {
    pub fn is_deployed(&self) -> bool {
        self.state.is_some() || !self.director_address.is_empty()
    }
}

/// Load balancer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancer {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub lb_type: Option<LbType>,
    pub cert: String,
    pub key: String,
    pub chain: String,
    pub domain: String,
}

impl LoadBalancer {
    pub fn is_configured(&self) -> bool {
        self.lb_type.is_some()
    }
}

/// A resource created before terraform managed the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyResource {
    /// Terraform address the resource is imported under, e.g. `aws_vpc.vpc`
    pub address: String,
    /// Provider-side identifier
    pub id: String,
}

/// Infrastructure created by the pre-terraform (CloudFormation) mechanism.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyInfrastructure {
    pub stack_name: String,
    pub certificate_name: String,
    pub resources: Vec<LegacyResource>,
}

/// Everything bbl knows about an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct State {
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iaas: Option<Iaas>,
    pub aws: Aws,
    pub azure: Azure,
    pub gcp: Gcp,
    #[serde(rename = "envID")]
    pub env_id: String,
    pub jumpbox: Jumpbox,
    pub bosh: Bosh,
    pub lb: LoadBalancer,
    #[serde(rename = "tfState")]
    pub tf_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<LegacyInfrastructure>,
    pub no_director: bool,
    #[serde(rename = "latestTFOutput")]
    pub latest_tf_output: String,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            iaas: None,
            aws: Aws::default(),
            azure: Azure::default(),
            gcp: Gcp::default(),
            env_id: String::new(),
            jumpbox: Jumpbox::default(),
            bosh: Bosh::default(),
            lb: LoadBalancer::default(),
            tf_state: String::new(),
            legacy: None,
            no_director: false,
            latest_tf_output: String::new(),
        }
    }
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no environment has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.env_id.is_empty()
            && self.tf_state.is_empty()
            && self.legacy.is_none()
            && !self.bosh.is_deployed()
            && !self.jumpbox.is_deployed()
    }

    /// True when a director is expected to be running.
    pub fn has_director(&self) -> bool {
        !self.no_director && self.bosh.is_deployed()
    }

    pub fn with_iaas(mut self, iaas: Iaas) -> Self {
        self.iaas = Some(iaas);
        self
    }

    pub fn with_env_id(mut self, env_id: impl Into<String>) -> Self {
        self.env_id = env_id.into();
        self
    }
}
