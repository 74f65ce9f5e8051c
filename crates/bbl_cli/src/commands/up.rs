//! Up command - create or update an environment.
//!
//! Runs terraform, then deploys the jumpbox and the director, then applies
//! the cloud config. The state is saved after every stage, so a failed run
//! can simply be repeated.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use bbl_bosh::BoshError;
use bbl_terraform::TerraformError;

use crate::app::App;
use crate::env_id;
use crate::error::CliError;

#[derive(Args, Debug, Default)]
pub struct UpArgs {
    /// Name to assign to the environment (randomly generated when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// Path to a BOSH ops file applied to the director manifest
    #[arg(long)]
    pub ops_file: Option<PathBuf>,

    /// Provision infrastructure only, without a jumpbox or director
    #[arg(long)]
    pub no_director: bool,
}

pub async fn execute(app: &mut App, args: UpArgs) -> Result<()> {
    let no_director = args.no_director || app.state.no_director;
    if args.no_director && app.state.has_director() {
        return Err(CliError::DirectorExists.into());
    }

    app.terraform()?.validate_version().await?;
    if !no_director {
        app.bosh()?.validate_version().await?;
    }

    let mut state = app.state.clone();
    state.env_id = env_id::resolve(&state.env_id, args.name.as_deref())?;
    state.no_director = no_director;
    if let Some(path) = &args.ops_file {
        state.bosh.user_ops_file = fs::read_to_string(path).map_err(|source| CliError::OpsFile {
            path: path.clone(),
            source,
        })?;
    }
    app.save(state)?;
    info!("step: environment {}", app.state.env_id);

    info!("step: generating terraform template");
    info!("step: applying terraform template");
    let outcome = app.terraform()?.apply(app.state.clone()).await?;
    app.settle(outcome, TerraformError::from)?;
    info!("step: terraform apply completed");

    if no_director {
        info!("Skipping the bosh director (--no-director)");
        return Ok(());
    }

    let outputs = app
        .terraform()?
        .get_outputs(&app.state)
        .await
        .context("Failed to read terraform outputs")?;

    let bosh = app.bosh()?;
    let outcome = bosh.create_jumpbox(app.state.clone(), &outputs).await?;
    app.settle(outcome, BoshError::from)?;

    let outcome = bosh.create_director(app.state.clone(), &outputs).await?;
    app.settle(outcome, BoshError::from)?;

    app.cloud_config()?.update(&app.state).await?;

    info!("Environment {} is ready", app.state.env_id);
    Ok(())
}
