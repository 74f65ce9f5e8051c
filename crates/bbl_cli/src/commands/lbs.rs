//! Load balancer commands: create-lbs, update-lbs, delete-lbs and lbs.
//!
//! Load balancers are part of the terraform template, so every change is a
//! terraform apply followed by a cloud-config update when a director exists.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use tracing::info;

use bbl_iaas::Outputs;
use bbl_state::{Iaas, LbType, LoadBalancer};
use bbl_terraform::TerraformError;

use crate::app::App;
use crate::error::CliError;

#[derive(Args, Debug, Default, Clone)]
pub struct CertificateArgs {
    /// Path to the SSL certificate
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Path to the SSL certificate key
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Path to the SSL certificate chain
    #[arg(long)]
    pub chain: Option<PathBuf>,

    /// Creates a DNS zone and records for the given domain (cf only)
    #[arg(long)]
    pub domain: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct CreateLbsArgs {
    /// Load balancer type: cf or concourse
    #[arg(long = "type")]
    pub lb_type: Option<String>,

    #[command(flatten)]
    pub certificate: CertificateArgs,

    /// Do nothing when a load balancer of this type already exists
    #[arg(long)]
    pub skip_if_exists: bool,
}

#[derive(Args, Debug, Default)]
pub struct UpdateLbsArgs {
    #[command(flatten)]
    pub certificate: CertificateArgs,

    /// Do nothing when no load balancer is attached
    #[arg(long)]
    pub skip_if_missing: bool,
}

#[derive(Args, Debug, Default)]
pub struct DeleteLbsArgs {
    /// Do nothing when no load balancer is attached
    #[arg(long)]
    pub skip_if_missing: bool,
}

pub async fn create(app: &mut App, args: CreateLbsArgs) -> Result<()> {
    app.require_environment()?;

    let lb_type: LbType = match args.lb_type.as_deref() {
        None | Some("") => return Err(CliError::MissingLbType.into()),
        Some(value) => value.parse()?,
    };
    if args.skip_if_exists && app.state.lb.lb_type == Some(lb_type) {
        info!("lb type {:?} exists, skipping...", lb_type.as_str());
        return Ok(());
    }

    let lb = load_balancer(app.state.iaas, lb_type, &args.certificate)?;
    validate_versions(app).await?;
    apply(app, lb).await
}

pub async fn update(app: &mut App, args: UpdateLbsArgs) -> Result<()> {
    app.require_environment()?;

    let Some(lb_type) = app.state.lb.lb_type else {
        if args.skip_if_missing {
            info!("no lb type exists, skipping...");
            return Ok(());
        }
        return Err(CliError::NoLoadBalancer.into());
    };

    let lb = load_balancer(app.state.iaas, lb_type, &args.certificate)?;
    if lb == app.state.lb {
        info!("no updates are to be performed");
        return Ok(());
    }

    validate_versions(app).await?;
    apply(app, lb).await
}

pub async fn delete(app: &mut App, args: DeleteLbsArgs) -> Result<()> {
    app.require_environment()?;

    if !app.state.lb.is_configured() {
        if args.skip_if_missing {
            info!("no lb type exists, skipping...");
            return Ok(());
        }
        return Err(CliError::NoLoadBalancer.into());
    }

    let mut state = app.state.clone();
    state.lb = LoadBalancer::default();

    if state.has_director() {
        info!("step: updating cloud config");
        app.cloud_config()?.update(&state).await?;
    }
    app.save(state)?;

    info!("step: deleting load balancers");
    let outcome = app.terraform()?.apply(app.state.clone()).await?;
    app.settle(outcome, TerraformError::from)?;
    info!("step: finished deleting load balancers");
    Ok(())
}

/// Print the attached load balancers.
pub async fn list(app: &App) -> Result<()> {
    app.require_environment()?;

    let lb_type = app.state.lb.lb_type.ok_or(CliError::NoLoadBalancer)?;
    let iaas = app.state.iaas.ok_or(CliError::NoEnvironment)?;
    let outputs = app.terraform()?.get_outputs(&app.state).await?;

    for line in describe(iaas, lb_type, &app.state.lb.domain, &outputs) {
        println!("{}", line);
    }
    Ok(())
}

async fn validate_versions(app: &App) -> Result<()> {
    app.terraform()?.validate_version().await?;
    if !app.state.no_director {
        app.bosh()?.validate_version().await?;
    }
    Ok(())
}

async fn apply(app: &mut App, lb: LoadBalancer) -> Result<()> {
    let mut state = app.state.clone();
    state.lb = lb;
    app.save(state)?;

    info!("step: applying terraform template");
    let outcome = app.terraform()?.apply(app.state.clone()).await?;
    app.settle(outcome, TerraformError::from)?;

    if app.state.has_director() {
        info!("step: updating cloud config");
        app.cloud_config()?.update(&app.state).await?;
    }
    info!("step: finished applying load balancers");
    Ok(())
}

/// Validate the flags for `lb_type` and read the certificate files.
///
/// Concourse load balancers on gcp terminate plain TCP and take no
/// certificate.
fn load_balancer(
    iaas: Option<Iaas>,
    lb_type: LbType,
    args: &CertificateArgs,
) -> Result<LoadBalancer, CliError> {
    let domain = args.domain.clone().unwrap_or_default();
    if lb_type == LbType::Concourse && !domain.is_empty() {
        return Err(CliError::DomainUnsupported);
    }

    let mut lb = LoadBalancer {
        lb_type: Some(lb_type),
        domain,
        ..LoadBalancer::default()
    };

    if iaas == Some(Iaas::Gcp) && lb_type == LbType::Concourse {
        return Ok(lb);
    }

    let (Some(cert), Some(key)) = (&args.cert, &args.key) else {
        return Err(CliError::Certificate("--cert and --key are required".into()));
    };
    lb.cert = read_certificate(cert)?;
    lb.key = read_certificate(key)?;
    if let Some(chain) = &args.chain {
        lb.chain = read_certificate(chain)?;
    }
    Ok(lb)
}

fn read_certificate(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path)
        .map_err(|e| CliError::Certificate(format!("file {:?} could not be read: {}", path, e)))
}

/// Terraform outputs naming each load balancer, with their labels.
fn lb_outputs(iaas: Iaas, lb_type: LbType) -> &'static [(&'static str, &'static str)] {
    match (iaas, lb_type) {
        (Iaas::Aws, LbType::Cf) => &[
            ("CF Router LB", "cf_router_lb_name"),
            ("CF SSH Proxy LB", "cf_ssh_lb_name"),
            ("CF TCP Router LB", "cf_tcp_lb_name"),
        ],
        (Iaas::Aws, LbType::Concourse) => &[("Concourse LB", "concourse_lb_name")],
        (Iaas::Gcp, LbType::Cf) => &[
            ("CF Router LB", "router_backend_service"),
            ("CF SSH Proxy LB", "ssh_proxy_target_pool"),
            ("CF TCP Router LB", "tcp_router_target_pool"),
            ("CF WebSocket LB", "ws_target_pool"),
        ],
        (Iaas::Gcp, LbType::Concourse) => &[("Concourse LB", "concourse_target_pool")],
        (Iaas::Azure, LbType::Cf) => &[
            ("CF Web LB", "web_lb_name"),
            ("CF TCP LB", "tcp_lb_name"),
        ],
        (Iaas::Azure, LbType::Concourse) => &[("Concourse LB", "concourse_lb_name")],
    }
}

fn dns_servers_output(iaas: Iaas) -> Option<&'static str> {
    match iaas {
        Iaas::Aws => Some("env_dns_zone_name_servers"),
        Iaas::Gcp => Some("system_domain_dns_servers"),
        Iaas::Azure => None,
    }
}

fn describe(iaas: Iaas, lb_type: LbType, domain: &str, outputs: &Outputs) -> Vec<String> {
    let mut lines: Vec<String> = lb_outputs(iaas, lb_type)
        .iter()
        .filter_map(|(label, name)| {
            outputs
                .get(name)
                .map(|value| format!("{}: {}", label, display(value)))
        })
        .collect();

    if lb_type == LbType::Cf && !domain.is_empty() {
        if let Some(servers) = dns_servers_output(iaas).and_then(|name| outputs.get(name)) {
            lines.push(format!("CF System Domain DNS servers: {}", display(servers)));
        }
    }
    lines
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}
