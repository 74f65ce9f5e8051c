//! Jumpbox and director lifecycle for a bbl environment.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use bbl_iaas::{director_name, render_vars, Outputs, Provider, DIRECTOR_INTERNAL_IP};
use bbl_runner::{version_at_least, CommandRunner, FileIo, RunOutcome};
use bbl_state::{Bosh, Jumpbox, State};

use crate::credentials::DirectorCredentials;
use crate::error::{BoshError, BoshResult};
use crate::executor::{
    DirectorInterpolateInput, EnvInput, Executor, JumpboxInterpolateInput, OpsFileSet,
    DIRECTOR_DIR, JUMPBOX_DIR, VERSION_DEV_BUILD,
};

/// Oldest bosh CLI with `create-env` and `interpolate`.
pub const MINIMUM_VERSION: &str = "2.0.0";

const DIRECTOR_PORT: u16 = 25555;

/// Deploys and deletes the jumpbox and the director.
#[derive(Clone)]
pub struct Manager {
    executor: Executor,
    provider: Arc<dyn Provider>,
}

impl Manager {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        files: Arc<dyn FileIo>,
        bosh_dir: impl Into<PathBuf>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            executor: Executor::new(runner, files, bosh_dir),
            provider,
        }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Jumpbox deployment vars as YAML.
    pub fn jumpbox_deployment_vars(&self, state: &State, outputs: &Outputs) -> BoshResult<String> {
        let vars = self.provider.jumpbox_deployment_vars(state, outputs)?;
        Ok(render_vars(&vars)?)
    }

    /// Director deployment vars as YAML.
    pub fn director_deployment_vars(&self, state: &State, outputs: &Outputs) -> BoshResult<String> {
        let vars = self.provider.director_deployment_vars(state, outputs)?;
        Ok(render_vars(&vars)?)
    }

    /// Deploy or update the jumpbox.
    ///
    /// A no-op on IAASes that reach the director directly.
    pub async fn create_jumpbox(
        &self,
        mut state: State,
        outputs: &Outputs,
    ) -> BoshResult<RunOutcome<State>> {
        if !self.provider.deploys_jumpbox() {
            debug!("{} environments have no jumpbox", self.provider.iaas());
            return Ok(RunOutcome::Completed(state));
        }

        info!("step: creating jumpbox");
        // Everything derived from the outputs is resolved before create-env,
        // so a deployed VM is never left without its state recorded.
        let url = format!("{}:22", outputs.string("external_ip")?);
        let rendered = self
            .executor
            .jumpbox_interpolate(&JumpboxInterpolateInput {
                iaas: self.provider.iaas(),
                deployment_vars: self.jumpbox_deployment_vars(&state, outputs)?,
                variables: state.jumpbox.variables.clone(),
            })
            .await?;

        state.jumpbox.variables = rendered.variables;
        state.jumpbox.manifest = rendered.manifest;

        let outcome = self
            .executor
            .create_env(&EnvInput {
                manifest: state.jumpbox.manifest.clone(),
                variables: state.jumpbox.variables.clone(),
                state: state.jumpbox.state.clone(),
                dir: JUMPBOX_DIR.to_string(),
            })
            .await?;

        let (bosh_state, failure) = outcome.into_parts();
        state.jumpbox.state = Some(bosh_state);
        if let Some(cause) = failure {
            return Ok(RunOutcome::Failed {
                partial: state,
                cause,
            });
        }

        state.jumpbox.url = url;
        info!("step: created jumpbox");
        Ok(RunOutcome::Completed(state))
    }

    /// Deploy or update the director and record how to reach it.
    pub async fn create_director(
        &self,
        mut state: State,
        outputs: &Outputs,
    ) -> BoshResult<RunOutcome<State>> {
        info!("step: creating bosh director");
        let address = self.director_address(outputs)?;
        let ops = OpsFileSet::director(
            self.provider.iaas(),
            self.provider.director_ops_files(),
            state.bosh.user_ops_file.clone(),
        )?;
        let rendered = self
            .executor
            .director_interpolate(&DirectorInterpolateInput {
                deployment_vars: self.director_deployment_vars(&state, outputs)?,
                variables: state.bosh.variables.clone(),
                ops,
            })
            .await?;

        let credentials = DirectorCredentials::from_vars_store(&rendered.variables)?;
        state.bosh.variables = rendered.variables;
        state.bosh.manifest = rendered.manifest;

        let outcome = self
            .executor
            .create_env(&EnvInput {
                manifest: state.bosh.manifest.clone(),
                variables: state.bosh.variables.clone(),
                state: state.bosh.state.clone(),
                dir: DIRECTOR_DIR.to_string(),
            })
            .await?;

        let (bosh_state, failure) = outcome.into_parts();
        state.bosh.state = Some(bosh_state);
        if let Some(cause) = failure {
            return Ok(RunOutcome::Failed {
                partial: state,
                cause,
            });
        }

        state.bosh.director_name = director_name(&state);
        state.bosh.director_username = credentials.username;
        state.bosh.director_password = credentials.password;
        state.bosh.director_ssl_ca = credentials.ca;
        state.bosh.director_ssl_certificate = credentials.certificate;
        state.bosh.director_ssl_private_key = credentials.private_key;
        state.bosh.director_address = address;

        info!("step: created bosh director");
        Ok(RunOutcome::Completed(state))
    }

    /// Delete the director, then the jumpbox.
    ///
    /// Stops at the first failure; the returned state records what is left.
    pub async fn delete(&self, state: State) -> BoshResult<RunOutcome<State>> {
        match self.delete_director(state).await? {
            RunOutcome::Completed(state) => self.delete_jumpbox(state).await,
            failed => Ok(failed),
        }
    }

    pub async fn delete_director(&self, mut state: State) -> BoshResult<RunOutcome<State>> {
        if !state.bosh.is_deployed() {
            debug!("No director to delete");
            return Ok(RunOutcome::Completed(state));
        }

        info!("step: deleting bosh director");
        let outcome = self
            .executor
            .delete_env(&EnvInput {
                manifest: state.bosh.manifest.clone(),
                variables: state.bosh.variables.clone(),
                state: state.bosh.state.clone(),
                dir: DIRECTOR_DIR.to_string(),
            })
            .await?;

        match outcome {
            RunOutcome::Completed(_) => {
                state.bosh = Bosh {
                    user_ops_file: std::mem::take(&mut state.bosh.user_ops_file),
                    ..Bosh::default()
                };
                Ok(RunOutcome::Completed(state))
            }
            RunOutcome::Failed { partial, cause } => {
                state.bosh.state = Some(partial);
                Ok(RunOutcome::Failed {
                    partial: state,
                    cause,
                })
            }
        }
    }

    pub async fn delete_jumpbox(&self, mut state: State) -> BoshResult<RunOutcome<State>> {
        if !state.jumpbox.is_deployed() {
            debug!("No jumpbox to delete");
            return Ok(RunOutcome::Completed(state));
        }

        info!("step: deleting jumpbox");
        let outcome = self
            .executor
            .delete_env(&EnvInput {
                manifest: state.jumpbox.manifest.clone(),
                variables: state.jumpbox.variables.clone(),
                state: state.jumpbox.state.clone(),
                dir: JUMPBOX_DIR.to_string(),
            })
            .await?;

        match outcome {
            RunOutcome::Completed(_) => {
                state.jumpbox = Jumpbox::default();
                Ok(RunOutcome::Completed(state))
            }
            RunOutcome::Failed { partial, cause } => {
                state.jumpbox.state = Some(partial);
                Ok(RunOutcome::Failed {
                    partial: state,
                    cause,
                })
            }
        }
    }

    pub async fn version(&self) -> BoshResult<String> {
        self.executor.version().await
    }

    /// Fail unless the bosh CLI is at least [`MINIMUM_VERSION`].
    ///
    /// Development builds are accepted.
    pub async fn validate_version(&self) -> BoshResult<()> {
        let found = self.version().await?;
        if found != VERSION_DEV_BUILD && !version_at_least(&found, MINIMUM_VERSION) {
            return Err(BoshError::VersionTooOld {
                found,
                minimum: MINIMUM_VERSION.to_string(),
            });
        }
        Ok(())
    }

    fn director_address(&self, outputs: &Outputs) -> BoshResult<String> {
        let host = if self.provider.deploys_jumpbox() {
            DIRECTOR_INTERNAL_IP.to_string()
        } else {
            outputs.string("external_ip")?
        };
        Ok(format!("https://{}:{}", host, DIRECTOR_PORT))
    }
}
