//! bbl CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Terraform failure
//! - 4: BOSH failure
//! - 5: Cloud-config failure

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod app;
mod commands;
mod env_id;
mod error;

use app::App;
use commands::state_query::{self, Property};
use commands::{cloud_config, destroy, lbs, up, Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const TERRAFORM_ERROR: u8 = 3;
    pub const BOSH_ERROR: u8 = 4;
    pub const CLOUD_CONFIG_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.debug);

    match run(cli).await {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("\n\n{:#}\n", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "bbl=debug" } else { "bbl=info" };
    let mut filter = EnvFilter::from_default_env();
    for directive in ["warn", level] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.name();

    match &cli.command {
        Commands::Version => {
            println!("bbl {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Destroy(args) if destroy::skip(&cli.global, args) => return Ok(()),
        _ => {}
    }

    let mut app = App::load(&cli.global, command)?;

    match cli.command {
        Commands::Up(args) => up::execute(&mut app, args).await,
        Commands::Destroy(args) => {
            let stdin = std::io::stdin();
            destroy::execute(&mut app, args, &mut stdin.lock()).await
        }
        Commands::CreateLbs(args) => lbs::create(&mut app, args).await,
        Commands::UpdateLbs(args) => lbs::update(&mut app, args).await,
        Commands::DeleteLbs(args) => lbs::delete(&mut app, args).await,
        Commands::Lbs => lbs::list(&app).await,
        Commands::CloudConfig => cloud_config::execute(&app).await,
        Commands::LatestError => state_query::latest_error(&app),
        Commands::EnvId => state_query::print_property(&app, Property::EnvId),
        Commands::JumpboxAddress => state_query::print_property(&app, Property::JumpboxAddress),
        Commands::DirectorAddress => state_query::print_property(&app, Property::DirectorAddress),
        Commands::DirectorUsername => {
            state_query::print_property(&app, Property::DirectorUsername)
        }
        Commands::DirectorPassword => {
            state_query::print_property(&app, Property::DirectorPassword)
        }
        Commands::DirectorCaCert => state_query::print_property(&app, Property::DirectorCaCert),
        Commands::PrintEnv => state_query::print_env(&app),
        Commands::BoshDeploymentVars => state_query::bosh_deployment_vars(&app).await,
        Commands::JumpboxDeploymentVars => state_query::jumpbox_deployment_vars(&app).await,
        Commands::Version => Ok(()),
    }
}

/// Categorize error to determine exit code
///
/// The outermost bbl error in the chain decides.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.is::<error::CliError>() || cause.is::<bbl_state::StateError>() {
            return ExitCodes::INVALID_ARGS;
        }
        if cause.is::<bbl_terraform::TerraformError>() {
            return ExitCodes::TERRAFORM_ERROR;
        }
        if cause.is::<bbl_bosh::BoshError>() {
            return ExitCodes::BOSH_ERROR;
        }
        if cause.is::<bbl_cloudconfig::CloudConfigError>() {
            return ExitCodes::CLOUD_CONFIG_ERROR;
        }
    }
    ExitCodes::GENERAL_ERROR
}
