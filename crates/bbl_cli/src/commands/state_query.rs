//! Read-only commands that print values from the state.

use anyhow::Result;

use bbl_state::State;

use crate::app::App;
use crate::error::CliError;

/// A single value recorded in the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    EnvId,
    JumpboxAddress,
    DirectorAddress,
    DirectorUsername,
    DirectorPassword,
    DirectorCaCert,
}

impl Property {
    fn description(&self) -> &'static str {
        match self {
            Property::EnvId => "environment id",
            Property::JumpboxAddress => "jumpbox address",
            Property::DirectorAddress => "director address",
            Property::DirectorUsername => "director username",
            Property::DirectorPassword => "director password",
            Property::DirectorCaCert => "director ca cert",
        }
    }

    fn is_director(&self) -> bool {
        !matches!(self, Property::EnvId | Property::JumpboxAddress)
    }
}

pub fn lookup(state: &State, property: Property) -> Result<String, CliError> {
    if property.is_director() && state.no_director {
        return Err(CliError::UnmanagedDirector);
    }

    let value = match property {
        Property::EnvId => &state.env_id,
        Property::JumpboxAddress => &state.jumpbox.url,
        Property::DirectorAddress => &state.bosh.director_address,
        Property::DirectorUsername => &state.bosh.director_username,
        Property::DirectorPassword => &state.bosh.director_password,
        Property::DirectorCaCert => &state.bosh.director_ssl_ca,
    };
    if value.is_empty() {
        return Err(CliError::MissingProperty(property.description()));
    }
    Ok(value.clone())
}

pub fn print_property(app: &App, property: Property) -> Result<()> {
    app.require_environment()?;
    println!("{}", lookup(&app.state, property)?);
    Ok(())
}

/// `export` lines that point the bosh CLI at the director.
pub fn env_lines(app: &App) -> Result<Vec<String>> {
    if app.state.no_director {
        return Err(CliError::UnmanagedDirector.into());
    }

    let target = app.director_target()?;
    let mut lines = vec![
        format!("export BOSH_CLIENT={}", target.username),
        format!("export BOSH_CLIENT_SECRET={}", target.password),
        format!("export BOSH_CA_CERT='{}'", target.ca_cert),
        format!("export BOSH_ENVIRONMENT={}", target.address),
    ];
    if let Some(proxy) = target.all_proxy {
        lines.push(format!("export BOSH_ALL_PROXY={}", proxy));
    }
    Ok(lines)
}

pub fn print_env(app: &App) -> Result<()> {
    app.require_environment()?;
    for line in env_lines(app)? {
        println!("{}", line);
    }
    Ok(())
}

pub fn latest_error(app: &App) -> Result<()> {
    app.require_environment()?;
    println!("{}", app.state.latest_tf_output);
    Ok(())
}

pub async fn bosh_deployment_vars(app: &App) -> Result<()> {
    app.require_environment()?;
    let outputs = app.terraform()?.get_outputs(&app.state).await?;
    println!("{}", app.bosh()?.director_deployment_vars(&app.state, &outputs)?);
    Ok(())
}

pub async fn jumpbox_deployment_vars(app: &App) -> Result<()> {
    app.require_environment()?;
    let outputs = app.terraform()?.get_outputs(&app.state).await?;
    println!("{}", app.bosh()?.jumpbox_deployment_vars(&app.state, &outputs)?);
    Ok(())
}
