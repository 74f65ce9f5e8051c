//! CLI command definitions.
//!
//! Global flags select the IAAS and carry its credentials; every one of them
//! can also be given through a `BBL_*` environment variable.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use bbl_state::GlobalFlags;

pub mod cloud_config;
pub mod destroy;
pub mod lbs;
pub mod state_query;
pub mod up;

/// bbl - BOSH director bootloader
#[derive(Parser)]
#[command(name = "bbl")]
#[command(version, about = "bbl - bootloads a BOSH director on aws, gcp or azure")]
#[command(long_about = r#"
bbl provisions the infrastructure for a BOSH director with terraform and
deploys a jumpbox and the director onto it with the bosh CLI.

LIFECYCLE:
  up            → Create or update infrastructure, jumpbox and director
  destroy       → Tear everything down again
  create-lbs    → Attach load balancers
  update-lbs    → Update load balancer certificates
  delete-lbs    → Remove load balancers

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Terraform failure
  4 - BOSH failure
  5 - Cloud-config failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory containing the bbl state
    #[arg(short, long, global = true, env = "BBL_STATE_DIR", default_value = ".")]
    pub state_dir: PathBuf,

    /// Print debugging output
    #[arg(short, long, global = true, env = "BBL_DEBUG")]
    pub debug: bool,

    /// IAAS to deploy onto: aws, azure or gcp
    #[arg(long, global = true, env = "BBL_IAAS")]
    pub iaas: Option<String>,

    #[arg(long, global = true, env = "BBL_AWS_ACCESS_KEY_ID")]
    pub aws_access_key_id: Option<String>,

    #[arg(long, global = true, env = "BBL_AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,

    #[arg(long, global = true, env = "BBL_AWS_REGION")]
    pub aws_region: Option<String>,

    /// GCP service account key, as a file path or inline JSON
    #[arg(long, global = true, env = "BBL_GCP_SERVICE_ACCOUNT_KEY", hide_env_values = true)]
    pub gcp_service_account_key: Option<String>,

    #[arg(long, global = true, env = "BBL_GCP_PROJECT_ID")]
    pub gcp_project_id: Option<String>,

    #[arg(long, global = true, env = "BBL_GCP_ZONE")]
    pub gcp_zone: Option<String>,

    #[arg(long, global = true, env = "BBL_GCP_REGION")]
    pub gcp_region: Option<String>,

    #[arg(long, global = true, env = "BBL_AZURE_CLIENT_ID")]
    pub azure_client_id: Option<String>,

    #[arg(long, global = true, env = "BBL_AZURE_CLIENT_SECRET", hide_env_values = true)]
    pub azure_client_secret: Option<String>,

    #[arg(long, global = true, env = "BBL_AZURE_LOCATION")]
    pub azure_location: Option<String>,

    #[arg(long, global = true, env = "BBL_AZURE_SUBSCRIPTION_ID")]
    pub azure_subscription_id: Option<String>,

    #[arg(long, global = true, env = "BBL_AZURE_TENANT_ID")]
    pub azure_tenant_id: Option<String>,

    /// terraform binary to run
    #[arg(long, global = true, env = "BBL_TERRAFORM_BIN", default_value = "terraform")]
    pub terraform_bin: String,

    /// bosh CLI binary to run
    #[arg(long, global = true, env = "BBL_BOSH_BIN", default_value = "bosh")]
    pub bosh_bin: String,
}

impl GlobalArgs {
    /// Provider flags in the form the state layer merges.
    pub fn flags(&self) -> GlobalFlags {
        let given = |value: &Option<String>| value.clone().unwrap_or_default();
        GlobalFlags {
            iaas: given(&self.iaas),
            aws_access_key_id: given(&self.aws_access_key_id),
            aws_secret_access_key: given(&self.aws_secret_access_key),
            aws_region: given(&self.aws_region),
            azure_client_id: given(&self.azure_client_id),
            azure_client_secret: given(&self.azure_client_secret),
            azure_location: given(&self.azure_location),
            azure_subscription_id: given(&self.azure_subscription_id),
            azure_tenant_id: given(&self.azure_tenant_id),
            gcp_service_account_key: given(&self.gcp_service_account_key),
            gcp_project_id: given(&self.gcp_project_id),
            gcp_zone: given(&self.gcp_zone),
            gcp_region: given(&self.gcp_region),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploys a BOSH director on an IAAS
    Up(up::UpArgs),

    /// Tears down BOSH director infrastructure
    #[command(visible_alias = "down")]
    Destroy(destroy::DestroyArgs),

    /// Attaches load balancers with a certificate, key and optional chain
    #[command(name = "create-lbs")]
    CreateLbs(lbs::CreateLbsArgs),

    /// Updates load balancer certificates
    #[command(name = "update-lbs")]
    UpdateLbs(lbs::UpdateLbsArgs),

    /// Deletes load balancers
    #[command(name = "delete-lbs")]
    DeleteLbs(lbs::DeleteLbsArgs),

    /// Prints attached load balancers
    Lbs,

    /// Prints suggested cloud configuration for the BOSH environment
    #[command(name = "cloud-config")]
    CloudConfig,

    /// Prints the output from the latest call to terraform
    #[command(name = "latest-error")]
    LatestError,

    /// Prints version
    Version,

    /// Prints environment ID
    #[command(name = "env-id")]
    EnvId,

    /// Prints BOSH jumpbox address
    #[command(name = "jumpbox-address")]
    JumpboxAddress,

    /// Prints BOSH director address
    #[command(name = "director-address")]
    DirectorAddress,

    /// Prints BOSH director username
    #[command(name = "director-username")]
    DirectorUsername,

    /// Prints BOSH director password
    #[command(name = "director-password")]
    DirectorPassword,

    /// Prints BOSH director CA certificate
    #[command(name = "director-ca-cert")]
    DirectorCaCert,

    /// Prints required BOSH environment variables
    #[command(name = "print-env")]
    PrintEnv,

    /// Prints required variables for BOSH deployment
    #[command(name = "bosh-deployment-vars")]
    BoshDeploymentVars,

    /// Prints required variables for jumpbox deployment
    #[command(name = "jumpbox-deployment-vars")]
    JumpboxDeploymentVars,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Up(_) => "up",
            Commands::Destroy(_) => "destroy",
            Commands::CreateLbs(_) => "create-lbs",
            Commands::UpdateLbs(_) => "update-lbs",
            Commands::DeleteLbs(_) => "delete-lbs",
            Commands::Lbs => "lbs",
            Commands::CloudConfig => "cloud-config",
            Commands::LatestError => "latest-error",
            Commands::Version => "version",
            Commands::EnvId => "env-id",
            Commands::JumpboxAddress => "jumpbox-address",
            Commands::DirectorAddress => "director-address",
            Commands::DirectorUsername => "director-username",
            Commands::DirectorPassword => "director-password",
            Commands::DirectorCaCert => "director-ca-cert",
            Commands::PrintEnv => "print-env",
            Commands::BoshDeploymentVars => "bosh-deployment-vars",
            Commands::JumpboxDeploymentVars => "jumpbox-deployment-vars",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbl_state::needs_iaas_config;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_up_with_global_flags() {
        let cli = Cli::try_parse_from([
            "bbl",
            "up",
            "--iaas",
            "gcp",
            "--gcp-zone",
            "us-east1-b",
            "--name",
            "my-env",
            "--no-director",
        ])
        .unwrap();

        let flags = cli.global.flags();
        assert_eq!(flags.iaas, "gcp");
        assert_eq!(flags.gcp_zone, "us-east1-b");
        assert_eq!(flags.aws_region, "");
        match cli.command {
            Commands::Up(args) => {
                assert_eq!(args.name.as_deref(), Some("my-env"));
                assert!(args.no_director);
            }
            _ => panic!("expected up"),
        }
    }

    #[test]
    fn test_down_is_destroy() {
        let cli = Cli::try_parse_from(["bbl", "down", "--no-confirm"]).unwrap();
        assert_eq!(cli.command.name(), "destroy");
    }

    #[test]
    fn test_iaas_commands() {
        let cli = Cli::try_parse_from(["bbl", "create-lbs", "--type", "cf"]).unwrap();
        assert!(needs_iaas_config(cli.command.name()));

        let cli = Cli::try_parse_from(["bbl", "director-ca-cert"]).unwrap();
        assert!(!needs_iaas_config(cli.command.name()));
    }
}
