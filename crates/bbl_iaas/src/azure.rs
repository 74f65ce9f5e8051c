//! Azure provider.
//!
//! Azure environments have no jumpbox: the director gets a public IP and is
//! reached directly.

use std::path::Path;

use serde_json::{json, Value};

use bbl_runner::FileIo;
use bbl_state::{Iaas, LbType, State};

use crate::error::IaasResult;
use crate::ops::{self, DeploymentVars, Op};
use crate::outputs::Outputs;
use crate::provider::{
    director_name, network_vars, Provider, TerraformVars, DIRECTOR_INTERNAL_IP,
    JUMPBOX_INTERNAL_IP,
};

const BASE_TEMPLATE: &str = r#"variable "env_id" {}
variable "simple_env_id" {}
variable "location" {}
variable "subscription_id" {}
variable "tenant_id" {}
variable "client_id" {}
variable "client_secret" {}

provider "azurerm" {
  subscription_id = "${var.subscription_id}"
  tenant_id       = "${var.tenant_id}"
  client_id       = "${var.client_id}"
  client_secret   = "${var.client_secret}"
}

resource "azurerm_resource_group" "bosh" {
  name     = "${var.env_id}-bosh"
  location = "${var.location}"
}

resource "azurerm_public_ip" "bosh" {
  name                         = "${var.env_id}-bosh"
  location                     = "${var.location}"
  resource_group_name          = "${azurerm_resource_group.bosh.name}"
  public_ip_address_allocation = "static"
}

resource "azurerm_virtual_network" "bosh" {
  name                = "${var.env_id}-bosh-vn"
  address_space       = ["10.0.0.0/16"]
  location            = "${var.location}"
  resource_group_name = "${azurerm_resource_group.bosh.name}"
}

resource "azurerm_subnet" "bosh" {
  name                 = "${var.env_id}-bosh-sn"
  address_prefix       = "10.0.0.0/16"
  resource_group_name  = "${azurerm_resource_group.bosh.name}"
  virtual_network_name = "${azurerm_virtual_network.bosh.name}"
}

resource "azurerm_storage_account" "bosh" {
  name                     = "${var.simple_env_id}"
  resource_group_name      = "${azurerm_resource_group.bosh.name}"
  location                 = "${var.location}"
  account_tier             = "Standard"
  account_replication_type = "GRS"
}

resource "azurerm_storage_container" "bosh" {
  name                  = "bosh"
  resource_group_name   = "${azurerm_resource_group.bosh.name}"
  storage_account_name  = "${azurerm_storage_account.bosh.name}"
  container_access_type = "private"
}

resource "azurerm_storage_container" "stemcell" {
  name                  = "stemcell"
  resource_group_name   = "${azurerm_resource_group.bosh.name}"
  storage_account_name  = "${azurerm_storage_account.bosh.name}"
  container_access_type = "blob"
}

resource "azurerm_network_security_group" "bosh" {
  name                = "${var.env_id}-bosh"
  location            = "${var.location}"
  resource_group_name = "${azurerm_resource_group.bosh.name}"
}

resource "azurerm_network_security_rule" "ssh" {
  name                        = "${var.env_id}-ssh"
  priority                    = 200
  direction                   = "Inbound"
  access                      = "Allow"
  protocol                    = "Tcp"
  source_port_range           = "*"
  destination_port_range      = "22"
  source_address_prefix       = "*"
  destination_address_prefix  = "*"
  resource_group_name         = "${azurerm_resource_group.bosh.name}"
  network_security_group_name = "${azurerm_network_security_group.bosh.name}"
}

resource "azurerm_network_security_rule" "bosh-agent" {
  name                        = "${var.env_id}-bosh-agent"
  priority                    = 201
  direction                   = "Inbound"
  access                      = "Allow"
  protocol                    = "Tcp"
  source_port_range           = "*"
  destination_port_range      = "6868"
  source_address_prefix       = "*"
  destination_address_prefix  = "*"
  resource_group_name         = "${azurerm_resource_group.bosh.name}"
  network_security_group_name = "${azurerm_network_security_group.bosh.name}"
}

resource "azurerm_network_security_rule" "bosh-director" {
  name                        = "${var.env_id}-bosh-director"
  priority                    = 202
  direction                   = "Inbound"
  access                      = "Allow"
  protocol                    = "Tcp"
  source_port_range           = "*"
  destination_port_range      = "25555"
  source_address_prefix       = "*"
  destination_address_prefix  = "*"
  resource_group_name         = "${azurerm_resource_group.bosh.name}"
  network_security_group_name = "${azurerm_network_security_group.bosh.name}"
}

output "external_ip" {
  value = "${azurerm_public_ip.bosh.ip_address}"
}

output "bosh_network_name" {
  value = "${azurerm_virtual_network.bosh.name}"
}

output "bosh_subnet_name" {
  value = "${azurerm_subnet.bosh.name}"
}

output "bosh_resource_group_name" {
  value = "${azurerm_resource_group.bosh.name}"
}

output "bosh_storage_account_name" {
  value = "${azurerm_storage_account.bosh.name}"
}

output "bosh_default_security_group" {
  value = "${azurerm_network_security_group.bosh.name}"
}
"#;

const CF_LB_TEMPLATE: &str = r#"
resource "azurerm_public_ip" "web-lb" {
  name                         = "${var.env_id}-web-lb"
  location                     = "${var.location}"
  resource_group_name          = "${azurerm_resource_group.bosh.name}"
  public_ip_address_allocation = "static"
}

resource "azurerm_lb" "web" {
  name                = "${var.env_id}-web-lb"
  location            = "${var.location}"
  resource_group_name = "${azurerm_resource_group.bosh.name}"

  frontend_ip_configuration {
    name                 = "${var.env_id}-web-frontend"
    public_ip_address_id = "${azurerm_public_ip.web-lb.id}"
  }
}

resource "azurerm_public_ip" "tcp-lb" {
  name                         = "${var.env_id}-tcp-lb"
  location                     = "${var.location}"
  resource_group_name          = "${azurerm_resource_group.bosh.name}"
  public_ip_address_allocation = "static"
}

resource "azurerm_lb" "tcp" {
  name                = "${var.env_id}-tcp-lb"
  location            = "${var.location}"
  resource_group_name = "${azurerm_resource_group.bosh.name}"

  frontend_ip_configuration {
    name                 = "${var.env_id}-tcp-frontend"
    public_ip_address_id = "${azurerm_public_ip.tcp-lb.id}"
  }
}

output "web_lb_name" {
  value = "${azurerm_lb.web.name}"
}

output "tcp_lb_name" {
  value = "${azurerm_lb.tcp.name}"
}
"#;

const CONCOURSE_LB_TEMPLATE: &str = r#"
resource "azurerm_public_ip" "concourse-lb" {
  name                         = "${var.env_id}-concourse-lb"
  location                     = "${var.location}"
  resource_group_name          = "${azurerm_resource_group.bosh.name}"
  public_ip_address_allocation = "static"
}

resource "azurerm_lb" "concourse" {
  name                = "${var.env_id}-concourse-lb"
  location            = "${var.location}"
  resource_group_name = "${azurerm_resource_group.bosh.name}"

  frontend_ip_configuration {
    name                 = "${var.env_id}-concourse-frontend"
    public_ip_address_id = "${azurerm_public_ip.concourse-lb.id}"
  }
}

output "concourse_lb_name" {
  value = "${azurerm_lb.concourse.name}"
}
"#;

const DIRECTOR_OPS_FILES: &[&str] = &[
    "jumpbox-user.yml",
    "azure-external-ip-not-recommended.yml",
    "azure-ssh-static-ip.yml",
];

/// Storage account names allow 3 to 24 lowercase alphanumerics.
fn simple_env_id(env_id: &str) -> String {
    env_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(20)
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AzureProvider;

impl AzureProvider {
    pub fn new() -> Self {
        Self
    }

    fn common_vars(
        &self,
        state: &State,
        outputs: &Outputs,
        internal_ip: &str,
    ) -> IaasResult<DeploymentVars> {
        let mut vars = network_vars(internal_ip);
        vars.insert("external_ip".into(), json!(outputs.string("external_ip")?));
        vars.insert("vnet_name".into(), json!(outputs.string("bosh_network_name")?));
        vars.insert("subnet_name".into(), json!(outputs.string("bosh_subnet_name")?));
        vars.insert("subscription_id".into(), json!(state.azure.subscription_id));
        vars.insert("tenant_id".into(), json!(state.azure.tenant_id));
        vars.insert("client_id".into(), json!(state.azure.client_id));
        vars.insert("client_secret".into(), json!(state.azure.client_secret));
        vars.insert(
            "resource_group_name".into(),
            json!(outputs.string("bosh_resource_group_name")?),
        );
        vars.insert(
            "storage_account_name".into(),
            json!(outputs.string("bosh_storage_account_name")?),
        );
        vars.insert(
            "default_security_group".into(),
            json!(outputs.string("bosh_default_security_group")?),
        );
        Ok(vars)
    }
}

impl Provider for AzureProvider {
    fn iaas(&self) -> Iaas {
        Iaas::Azure
    }

    fn template(&self, state: &State) -> String {
        let mut template = BASE_TEMPLATE.to_string();
        match state.lb.lb_type {
            Some(LbType::Cf) => template.push_str(CF_LB_TEMPLATE),
            Some(LbType::Concourse) => template.push_str(CONCOURSE_LB_TEMPLATE),
            None => {}
        }
        template
    }

    fn inputs(
        &self,
        state: &State,
        _terraform_dir: &Path,
        _files: &dyn FileIo,
    ) -> IaasResult<TerraformVars> {
        let mut inputs = TerraformVars::new();
        inputs.insert("env_id".into(), state.env_id.clone());
        inputs.insert("simple_env_id".into(), simple_env_id(&state.env_id));
        inputs.insert("location".into(), state.azure.location.clone());
        inputs.insert("subscription_id".into(), state.azure.subscription_id.clone());
        inputs.insert("tenant_id".into(), state.azure.tenant_id.clone());
        inputs.insert("client_id".into(), state.azure.client_id.clone());
        inputs.insert("client_secret".into(), state.azure.client_secret.clone());
        Ok(inputs)
    }

    fn required_outputs(&self, state: &State) -> Vec<&'static str> {
        let mut required = vec![
            "bosh_network_name",
            "bosh_subnet_name",
            "bosh_default_security_group",
        ];
        match state.lb.lb_type {
            Some(LbType::Cf) => required.extend(["web_lb_name", "tcp_lb_name"]),
            Some(LbType::Concourse) => required.push("concourse_lb_name"),
            None => {}
        }
        required
    }

    fn cloud_config_ops(&self, state: &State, outputs: &Outputs) -> IaasResult<Vec<Op>> {
        let mut ops = vec![
            ops::azs([Value::Null, Value::Null, Value::Null]),
            ops::default_subnet(json!({
                "virtual_network_name": outputs.string("bosh_network_name")?,
                "subnet_name": outputs.string("bosh_subnet_name")?,
                "security_group": outputs.string("bosh_default_security_group")?,
            })),
        ];

        match state.lb.lb_type {
            Some(LbType::Cf) => {
                ops.push(ops::vm_extension(
                    "cf-router-network-properties",
                    json!({ "load_balancer": outputs.string("web_lb_name")? }),
                ));
                ops.push(ops::vm_extension(
                    "cf-tcp-router-network-properties",
                    json!({ "load_balancer": outputs.string("tcp_lb_name")? }),
                ));
            }
            Some(LbType::Concourse) => {
                ops.push(ops::vm_extension(
                    "lb",
                    json!({ "load_balancer": outputs.string("concourse_lb_name")? }),
                ));
            }
            None => {}
        }

        Ok(ops)
    }

    fn deploys_jumpbox(&self) -> bool {
        false
    }

    fn jumpbox_deployment_vars(
        &self,
        state: &State,
        outputs: &Outputs,
    ) -> IaasResult<DeploymentVars> {
        self.common_vars(state, outputs, JUMPBOX_INTERNAL_IP)
    }

    fn director_deployment_vars(
        &self,
        state: &State,
        outputs: &Outputs,
    ) -> IaasResult<DeploymentVars> {
        let mut vars = self.common_vars(state, outputs, DIRECTOR_INTERNAL_IP)?;
        vars.insert("director_name".into(), json!(director_name(state)));
        Ok(vars)
    }

    fn director_ops_files(&self) -> &'static [&'static str] {
        DIRECTOR_OPS_FILES
    }
}
