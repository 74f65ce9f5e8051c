//! Per-invocation context shared by the commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use bbl_cloudconfig::{BoshCliClientProvider, DirectorTarget, OpsGenerator};
use bbl_iaas::{provider_for_state, Provider};
use bbl_runner::{CliRunner, CliRunnerOptions, CommandRunner, FileIo, LocalFs, RunOutcome, ToolFailure};
use bbl_state::{needs_iaas_config, update_iaas_state, validate_iaas, State, Store};

use crate::commands::GlobalArgs;
use crate::error::CliError;

/// The loaded state plus the tools and stores commands operate on.
pub struct App {
    store: Store,
    pub state: State,
    terraform_runner: Arc<dyn CommandRunner>,
    bosh_runner: Arc<dyn CommandRunner>,
    files: Arc<dyn FileIo>,
}

impl App {
    /// Load the state for `command` and merge the global flags into it.
    pub fn load(global: &GlobalArgs, command: &str) -> Result<Self> {
        let store = Store::new(&global.state_dir);
        let state = store.get().context("Failed to load state")?;
        let state = update_iaas_state(&global.flags(), state)?;

        // Read-only commands leave the state dir untouched.
        if needs_iaas_config(command) {
            validate_iaas(&state)?;
            store
                .ensure_dirs()
                .context("Failed to create working directories")?;
        }

        let options = CliRunnerOptions::new().debug(global.debug);
        Ok(Self::new(
            store,
            state,
            Arc::new(CliRunner::new(&global.terraform_bin).with_options(options.clone())),
            Arc::new(CliRunner::new(&global.bosh_bin).with_options(options)),
        ))
    }

    pub fn new(
        store: Store,
        state: State,
        terraform_runner: Arc<dyn CommandRunner>,
        bosh_runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            store,
            state,
            terraform_runner,
            bosh_runner,
            files: Arc::new(LocalFs),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Fail unless an environment has been created in this state dir.
    pub fn require_environment(&self) -> Result<(), CliError> {
        if self.state.is_empty() {
            return Err(CliError::NoEnvironment);
        }
        Ok(())
    }

    fn provider(&self) -> Result<Arc<dyn Provider>> {
        Ok(provider_for_state(&self.state)?)
    }

    pub fn terraform(&self) -> Result<bbl_terraform::Manager> {
        Ok(bbl_terraform::Manager::new(
            self.terraform_runner.clone(),
            self.files.clone(),
            self.store.terraform_dir(),
            self.provider()?,
        ))
    }

    pub fn bosh(&self) -> Result<bbl_bosh::Manager> {
        Ok(bbl_bosh::Manager::new(
            self.bosh_runner.clone(),
            self.files.clone(),
            self.store.bosh_dir(),
            self.provider()?,
        ))
    }

    pub fn cloud_config(&self) -> Result<bbl_cloudconfig::Manager> {
        let ops = OpsGenerator::new(self.provider()?, Arc::new(self.terraform()?));
        let interpolator =
            bbl_bosh::Executor::new(self.bosh_runner.clone(), self.files.clone(), self.store.bosh_dir());

        Ok(bbl_cloudconfig::Manager::new(
            Arc::new(interpolator),
            self.files.clone(),
            ops,
            Arc::new(self.director_clients()),
            self.cloud_config_dir(),
        ))
    }

    /// How to reach the director, writing the jumpbox key when needed.
    pub fn director_target(&self) -> Result<DirectorTarget> {
        Ok(self.director_clients().target(&self.state)?)
    }

    fn director_clients(&self) -> BoshCliClientProvider {
        BoshCliClientProvider::new(
            self.bosh_runner.clone(),
            self.files.clone(),
            self.cloud_config_dir(),
        )
    }

    fn cloud_config_dir(&self) -> std::path::PathBuf {
        self.store.bosh_dir().join("cloudconfig")
    }

    /// Replace the current state and write it to disk.
    pub fn save(&mut self, state: State) -> Result<()> {
        self.store.set(&state).context("Failed to save state")?;
        self.state = state;
        Ok(())
    }

    /// Persist whatever state a run produced, then surface its failure.
    pub fn settle<E>(
        &mut self,
        outcome: RunOutcome<State>,
        wrap: impl FnOnce(ToolFailure) -> E,
    ) -> Result<()>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let (state, failure) = outcome.into_parts();
        self.save(state)?;
        match failure {
            Some(cause) => {
                debug!("Saved partial state after {}", cause);
                Err(wrap(cause).into())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use bbl_runner::{MockResponse, MockRunner};
    use bbl_state::Iaas;
    use tempfile::TempDir;

    pub const DIRECTOR_VARS: &str = "admin_password: some-admin-password
director_ssl:
  ca: some-ca
  certificate: some-certificate
  private_key: some-private-key
";

    pub const AZURE_OUTPUTS: &str = r#"{
  "external_ip": {"sensitive": false, "type": "string", "value": "52.1.2.3"},
  "bosh_network_name": {"sensitive": false, "type": "string", "value": "some-network"},
  "bosh_subnet_name": {"sensitive": false, "type": "string", "value": "some-subnet"},
  "bosh_resource_group_name": {"sensitive": false, "type": "string", "value": "some-group"},
  "bosh_storage_account_name": {"sensitive": false, "type": "string", "value": "somestorage"},
  "bosh_default_security_group": {"sensitive": false, "type": "string", "value": "some-sg"}
}"#;

    pub fn azure_state() -> State {
        let mut state = State::new().with_iaas(Iaas::Azure);
        state.azure.client_id = "some-client-id".into();
        state.azure.client_secret = "some-client-secret".into();
        state.azure.location = "westus".into();
        state.azure.subscription_id = "some-subscription".into();
        state.azure.tenant_id = "some-tenant".into();
        state
    }

    /// A terraform mock whose runs succeed and whose outputs describe an
    /// azure environment.
    pub fn terraform_runner() -> MockRunner {
        MockRunner::new()
            .respond("version", MockResponse::success("Terraform v0.11.7\n"))
            .respond(
                "apply",
                MockResponse::success("").writes_file("terraform.tfstate", "some-tf-state"),
            )
            .respond(
                "destroy",
                MockResponse::success("").writes_file("terraform.tfstate", ""),
            )
            .respond("output", MockResponse::success(AZURE_OUTPUTS))
    }

    pub fn bosh_runner() -> MockRunner {
        MockRunner::new()
            .respond("-v", MockResponse::success("version 2.0.48-e94aeeb-2018-01-09T23:08:07Z\n"))
            .respond(
                "interpolate",
                MockResponse::success("some-manifest").writes_file("variables.yml", DIRECTOR_VARS),
            )
            .respond(
                "create-env",
                MockResponse::success("").writes_file("state.json", r#"{"current_vm_cid": "vm-1"}"#),
            )
    }

    pub fn test_app(dir: &TempDir, state: State, terraform: &MockRunner, bosh: &MockRunner) -> App {
        let store = Store::new(dir.path());
        store.ensure_dirs().unwrap();
        App::new(
            store,
            state,
            Arc::new(terraform.clone()),
            Arc::new(bosh.clone()),
        )
    }
}
