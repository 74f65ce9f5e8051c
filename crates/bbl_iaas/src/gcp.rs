//! GCP provider.

use std::path::Path;

use serde_json::json;

use bbl_runner::FileIo;
use bbl_state::{Iaas, LbType, State};

use crate::error::IaasResult;
use crate::ops::{self, DeploymentVars, Op};
use crate::outputs::Outputs;
use crate::provider::{
    director_name, network_vars, write_input_file, write_secret_file, Provider, TerraformVars,
    DIRECTOR_INTERNAL_IP, JUMPBOX_INTERNAL_IP,
};

const BASE_TEMPLATE: &str = r#"variable "env_id" {}
variable "project_id" {}
variable "region" {}
variable "zone" {}
variable "credentials" {}

variable "system_domain" {
  default = ""
}

provider "google" {
  credentials = "${file("${var.credentials}")}"
  project     = "${var.project_id}"
  region      = "${var.region}"
}

resource "google_compute_network" "bbl-network" {
  name                    = "${var.env_id}-network"
  auto_create_subnetworks = false
}

resource "google_compute_subnetwork" "bbl-subnet" {
  name          = "${var.env_id}-subnet"
  ip_cidr_range = "10.0.0.0/16"
  network       = "${google_compute_network.bbl-network.self_link}"
}

resource "google_compute_address" "jumpbox-ip" {
  name = "${var.env_id}-jumpbox-ip"
}

resource "google_compute_firewall" "external" {
  name    = "${var.env_id}-external"
  network = "${google_compute_network.bbl-network.name}"

  source_ranges = ["0.0.0.0/0"]

  allow {
    protocol = "tcp"
    ports    = ["22", "6868"]
  }

  target_tags = ["${var.env_id}-jumpbox"]
}

resource "google_compute_firewall" "bosh-open" {
  name    = "${var.env_id}-bosh-open"
  network = "${google_compute_network.bbl-network.name}"

  source_tags = ["${var.env_id}-jumpbox"]

  allow {
    protocol = "tcp"
    ports    = ["22", "6868", "8443", "8844", "25555"]
  }

  target_tags = ["${var.env_id}-bosh-director"]
}

resource "google_compute_firewall" "internal" {
  name    = "${var.env_id}-internal"
  network = "${google_compute_network.bbl-network.name}"

  allow {
    protocol = "icmp"
  }

  allow {
    protocol = "tcp"
  }

  allow {
    protocol = "udp"
  }

  source_tags = ["${var.env_id}-bosh-director", "${var.env_id}-internal", "${var.env_id}-jumpbox"]
  target_tags = ["${var.env_id}-internal", "${var.env_id}-bosh-director"]
}

output "external_ip" {
  value = "${google_compute_address.jumpbox-ip.address}"
}

output "network_name" {
  value = "${google_compute_network.bbl-network.name}"
}

output "subnetwork_name" {
  value = "${google_compute_subnetwork.bbl-subnet.name}"
}

output "bosh_open_tag_name" {
  value = "${google_compute_firewall.bosh-open.name}"
}

output "bosh_director_tag_name" {
  value = "${var.env_id}-bosh-director"
}

output "jumpbox_tag_name" {
  value = "${var.env_id}-jumpbox"
}

output "internal_tag_name" {
  value = "${var.env_id}-internal"
}
"#;

const CF_LB_TEMPLATE: &str = r#"
variable "ssl_certificate" {}
variable "ssl_certificate_private_key" {}

resource "google_compute_ssl_certificate" "cf-cert" {
  name_prefix = "${var.env_id}"
  certificate = "${file(var.ssl_certificate)}"
  private_key = "${file(var.ssl_certificate_private_key)}"

  lifecycle {
    create_before_destroy = true
  }
}

resource "google_compute_instance_group" "router-lb" {
  name    = "${var.env_id}-router-lb"
  zone    = "${var.zone}"
  network = "${google_compute_network.bbl-network.self_link}"
}

resource "google_compute_health_check" "cf-public-health-check" {
  name = "${var.env_id}-cf-public"

  http_health_check {
    port         = 8080
    request_path = "/health"
  }
}

resource "google_compute_backend_service" "router-lb-backend-service" {
  name        = "${var.env_id}-router-lb"
  port_name   = "https"
  protocol    = "HTTPS"
  timeout_sec = 900

  backend {
    group = "${google_compute_instance_group.router-lb.self_link}"
  }

  health_checks = ["${google_compute_health_check.cf-public-health-check.self_link}"]
}

resource "google_compute_url_map" "cf-https-lb-url-map" {
  name            = "${var.env_id}-cf-https"
  default_service = "${google_compute_backend_service.router-lb-backend-service.self_link}"
}

resource "google_compute_target_https_proxy" "cf-https-lb-proxy" {
  name             = "${var.env_id}-cf-https"
  url_map          = "${google_compute_url_map.cf-https-lb-url-map.self_link}"
  ssl_certificates = ["${google_compute_ssl_certificate.cf-cert.self_link}"]
}

resource "google_compute_global_address" "cf-address" {
  name = "${var.env_id}-cf"
}

resource "google_compute_global_forwarding_rule" "cf-https-forwarding-rule" {
  name       = "${var.env_id}-cf-https"
  ip_address = "${google_compute_global_address.cf-address.address}"
  target     = "${google_compute_target_https_proxy.cf-https-lb-proxy.self_link}"
  port_range = "443"
}

resource "google_compute_target_pool" "cf-ws" {
  name = "${var.env_id}-cf-ws"
}

resource "google_compute_target_pool" "cf-ssh-proxy" {
  name = "${var.env_id}-cf-ssh-proxy"
}

resource "google_compute_target_pool" "cf-tcp-router" {
  name = "${var.env_id}-cf-tcp-router"
}

resource "google_compute_address" "cf-ssh-proxy" {
  name = "${var.env_id}-cf-ssh-proxy"
}

resource "google_compute_forwarding_rule" "cf-ssh-proxy" {
  name        = "${var.env_id}-cf-ssh-proxy"
  target      = "${google_compute_target_pool.cf-ssh-proxy.self_link}"
  port_range  = "2222"
  ip_protocol = "TCP"
  ip_address  = "${google_compute_address.cf-ssh-proxy.address}"
}

resource "google_compute_address" "cf-tcp-router" {
  name = "${var.env_id}-cf-tcp-router"
}

resource "google_compute_forwarding_rule" "cf-tcp-router" {
  name        = "${var.env_id}-cf-tcp-router"
  target      = "${google_compute_target_pool.cf-tcp-router.self_link}"
  port_range  = "1024-32768"
  ip_protocol = "TCP"
  ip_address  = "${google_compute_address.cf-tcp-router.address}"
}

output "router_backend_service" {
  value = "${google_compute_backend_service.router-lb-backend-service.name}"
}

output "ws_target_pool" {
  value = "${google_compute_target_pool.cf-ws.name}"
}

output "ssh_proxy_target_pool" {
  value = "${google_compute_target_pool.cf-ssh-proxy.name}"
}

output "tcp_router_target_pool" {
  value = "${google_compute_target_pool.cf-tcp-router.name}"
}
"#;

const CF_DNS_TEMPLATE: &str = r#"
resource "google_dns_managed_zone" "env_dns_zone" {
  name     = "${var.env_id}-zone"
  dns_name = "${var.system_domain}."
}

resource "google_dns_record_set" "wildcard-dns" {
  name         = "*.${google_dns_managed_zone.env_dns_zone.dns_name}"
  type         = "A"
  ttl          = 300
  managed_zone = "${google_dns_managed_zone.env_dns_zone.name}"
  rrdatas      = ["${google_compute_global_address.cf-address.address}"]
}

output "system_domain_dns_servers" {
  value = "${google_dns_managed_zone.env_dns_zone.name_servers}"
}
"#;

const CONCOURSE_LB_TEMPLATE: &str = r#"
resource "google_compute_target_pool" "target-pool" {
  name = "${var.env_id}-concourse"
}

resource "google_compute_address" "concourse-address" {
  name = "${var.env_id}-concourse"
}

resource "google_compute_forwarding_rule" "ssh-forwarding-rule" {
  name        = "${var.env_id}-concourse-ssh"
  target      = "${google_compute_target_pool.target-pool.self_link}"
  port_range  = "2222"
  ip_protocol = "TCP"
  ip_address  = "${google_compute_address.concourse-address.address}"
}

resource "google_compute_forwarding_rule" "https-forwarding-rule" {
  name        = "${var.env_id}-concourse-https"
  target      = "${google_compute_target_pool.target-pool.self_link}"
  port_range  = "443"
  ip_protocol = "TCP"
  ip_address  = "${google_compute_address.concourse-address.address}"
}

output "concourse_target_pool" {
  value = "${google_compute_target_pool.target-pool.name}"
}
"#;

const DIRECTOR_OPS_FILES: &[&str] = &[
    "jumpbox-user.yml",
    "uaa.yml",
    "credhub.yml",
    "gcp-bosh-director-ephemeral-ip-ops.yml",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct GcpProvider;

impl GcpProvider {
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
        vars.insert("zone".into(), json!(state.gcp.zone));
        vars.insert("network".into(), json!(outputs.string("network_name")?));
        vars.insert("subnetwork".into(), json!(outputs.string("subnetwork_name")?));
        vars.insert("project_id".into(), json!(state.gcp.project_id));
        vars.insert(
            "gcp_credentials_json".into(),
            json!(state.gcp.service_account_key),
        );
        Ok(vars)
    }
}

impl Provider for GcpProvider {
    fn iaas(&self) -> Iaas {
        Iaas::Gcp
    }

    fn template(&self, state: &State) -> String {
        let mut template = BASE_TEMPLATE.to_string();
        match state.lb.lb_type {
            Some(LbType::Cf) => {
                template.push_str(CF_LB_TEMPLATE);
                if !state.lb.domain.is_empty() {
                    template.push_str(CF_DNS_TEMPLATE);
                }
            }
            Some(LbType::Concourse) => template.push_str(CONCOURSE_LB_TEMPLATE),
            None => {}
        }
        template
    }

    fn inputs(
        &self,
        state: &State,
        terraform_dir: &Path,
        files: &dyn FileIo,
    ) -> IaasResult<TerraformVars> {
        let credentials = write_secret_file(
            files,
            terraform_dir,
            "credentials.json",
            &state.gcp.service_account_key,
        )?;

        let mut inputs = TerraformVars::new();
        inputs.insert("env_id".into(), state.env_id.clone());
        inputs.insert("project_id".into(), state.gcp.project_id.clone());
        inputs.insert("region".into(), state.gcp.region.clone());
        inputs.insert("zone".into(), state.gcp.zone.clone());
        inputs.insert("credentials".into(), credentials);
        inputs.insert("system_domain".into(), state.lb.domain.clone());

        if !state.lb.cert.is_empty() && !state.lb.key.is_empty() {
            inputs.insert(
                "ssl_certificate".into(),
                write_input_file(files, terraform_dir, "cert", &state.lb.cert)?,
            );
            inputs.insert(
                "ssl_certificate_private_key".into(),
                write_secret_file(files, terraform_dir, "key", &state.lb.key)?,
            );
        }

        Ok(inputs)
    }

    fn required_outputs(&self, state: &State) -> Vec<&'static str> {
        let mut required = vec!["network_name", "subnetwork_name", "internal_tag_name"];
        match state.lb.lb_type {
            Some(LbType::Cf) => required.extend([
                "router_backend_service",
                "ws_target_pool",
                "ssh_proxy_target_pool",
                "tcp_router_target_pool",
            ]),
            Some(LbType::Concourse) => required.push("concourse_target_pool"),
            None => {}
        }
        required
    }

    fn cloud_config_ops(&self, state: &State, outputs: &Outputs) -> IaasResult<Vec<Op>> {
        let zone = json!({ "zone": state.gcp.zone });
        let mut ops = vec![
            ops::azs([zone.clone(), zone.clone(), zone]),
            ops::default_subnet(json!({
                "ephemeral_external_ip": true,
                "network_name": outputs.string("network_name")?,
                "subnetwork_name": outputs.string("subnetwork_name")?,
                "tags": [outputs.string("internal_tag_name")?],
            })),
        ];

        match state.lb.lb_type {
            Some(LbType::Cf) => {
                let backend_service = outputs.string("router_backend_service")?;
                let ws_pool = outputs.string("ws_target_pool")?;
                let ssh_pool = outputs.string("ssh_proxy_target_pool")?;
                let tcp_pool = outputs.string("tcp_router_target_pool")?;
                ops.push(ops::vm_extension(
                    "cf-router-network-properties",
                    json!({
                        "backend_service": backend_service,
                        "target_pool": ws_pool,
                        "tags": [backend_service, ws_pool],
                    }),
                ));
                ops.push(ops::vm_extension(
                    "diego-ssh-proxy-network-properties",
                    json!({ "target_pool": ssh_pool, "tags": [ssh_pool] }),
                ));
                ops.push(ops::vm_extension(
                    "cf-tcp-router-network-properties",
                    json!({ "target_pool": tcp_pool, "tags": [tcp_pool] }),
                ));
            }
            Some(LbType::Concourse) => {
                let pool = outputs.string("concourse_target_pool")?;
                ops.push(ops::vm_extension(
                    "lb",
                    json!({ "target_pool": pool, "tags": [pool] }),
                ));
            }
            None => {}
        }

        Ok(ops)
    }

    fn jumpbox_deployment_vars(
        &self,
        state: &State,
        outputs: &Outputs,
    ) -> IaasResult<DeploymentVars> {
        let mut vars = self.common_vars(state, outputs, JUMPBOX_INTERNAL_IP)?;
        vars.insert("external_ip".into(), json!(outputs.string("external_ip")?));
        vars.insert(
            "tags".into(),
            json!([
                outputs.string("bosh_open_tag_name")?,
                outputs.string("jumpbox_tag_name")?
            ]),
        );
        Ok(vars)
    }

    fn director_deployment_vars(
        &self,
        state: &State,
        outputs: &Outputs,
    ) -> IaasResult<DeploymentVars> {
        let mut vars = self.common_vars(state, outputs, DIRECTOR_INTERNAL_IP)?;
        vars.insert("director_name".into(), json!(director_name(state)));
        vars.insert(
            "tags".into(),
            json!([outputs.string("bosh_director_tag_name")?]),
        );
        Ok(vars)
    }

    fn director_ops_files(&self) -> &'static [&'static str] {
        DIRECTOR_OPS_FILES
    }
}
