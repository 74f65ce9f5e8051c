//! Terraform lifecycle for a bbl environment.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use bbl_iaas::{IaasError, IaasResult, OutputSource, Outputs, Provider};
use bbl_runner::{version_at_least, CommandRunner, FileIo, RunOutcome};
use bbl_state::State;

use crate::error::{TerraformError, TerraformResult};
use crate::executor::{Executor, ImportInput};

/// Oldest terraform that accepts `apply -auto-approve`.
pub const MINIMUM_VERSION: &str = "0.11.0";

/// Applies and destroys an environment's infrastructure.
///
/// The manager turns a [`State`] into terraform inputs through the
/// environment's [`Provider`], runs the [`Executor`], and folds the resulting
/// terraform state back into a new `State`.
#[derive(Clone)]
pub struct Manager {
    executor: Executor,
    provider: Arc<dyn Provider>,
    files: Arc<dyn FileIo>,
}

impl Manager {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        files: Arc<dyn FileIo>,
        terraform_dir: impl Into<PathBuf>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            executor: Executor::new(runner, files.clone(), terraform_dir),
            provider,
            files,
        }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Create or update the environment's infrastructure.
    ///
    /// Legacy resources are imported before the first apply. Once every
    /// import succeeded the returned state no longer carries the legacy
    /// descriptor, even when the apply itself fails.
    pub async fn apply(&self, mut state: State) -> TerraformResult<RunOutcome<State>> {
        if state.legacy.is_some() && !state.tf_state.is_empty() {
            return Err(TerraformError::LegacyConflict);
        }

        let dir = self.executor.terraform_dir();
        let inputs = self.provider.inputs(&state, dir, self.files.as_ref())?;
        let template = self.provider.template(&state);

        if let Some(legacy) = state.legacy.take() {
            info!(
                "Migrating {} resources from {}",
                legacy.resources.len(),
                legacy.stack_name
            );
            let provider_block = self.provider.import_provider_block(&state)?;
            for resource in &legacy.resources {
                let input = ImportInput {
                    address: resource.address.clone(),
                    id: resource.id.clone(),
                    tf_state: state.tf_state.clone(),
                    provider_block: provider_block.clone(),
                };
                state.tf_state = self.executor.import(&input).await?;
            }
        }

        let outcome = self
            .executor
            .apply(&inputs, &template, &state.tf_state)
            .await?;
        Ok(self.fold(state, outcome))
    }

    /// Destroy the environment's infrastructure.
    pub async fn destroy(&self, state: State) -> TerraformResult<RunOutcome<State>> {
        if state.tf_state.is_empty() {
            info!("No terraform state recorded, nothing to destroy");
            return Ok(RunOutcome::Completed(state));
        }

        let dir = self.executor.terraform_dir();
        let inputs = self.provider.inputs(&state, dir, self.files.as_ref())?;
        let template = self.provider.template(&state);

        let outcome = self
            .executor
            .destroy(&inputs, &template, &state.tf_state)
            .await?;
        Ok(self.fold(state, outcome))
    }

    /// Outputs of the recorded terraform state.
    pub async fn get_outputs(&self, state: &State) -> TerraformResult<Outputs> {
        if state.tf_state.is_empty() {
            return Ok(Outputs::new());
        }
        self.executor.outputs(&state.tf_state).await
    }

    pub async fn version(&self) -> TerraformResult<String> {
        self.executor.version().await
    }

    /// Fail unless the installed terraform is at least [`MINIMUM_VERSION`].
    pub async fn validate_version(&self) -> TerraformResult<()> {
        let found = self.version().await?;
        if !version_at_least(&found, MINIMUM_VERSION) {
            return Err(TerraformError::VersionTooOld {
                found,
                minimum: MINIMUM_VERSION.to_string(),
            });
        }
        Ok(())
    }

    fn fold(&self, mut state: State, outcome: RunOutcome<String>) -> RunOutcome<State> {
        match outcome {
            RunOutcome::Completed(tf_state) => {
                state.tf_state = tf_state;
                state.latest_tf_output.clear();
                RunOutcome::Completed(state)
            }
            RunOutcome::Failed { partial, cause } => {
                warn!("terraform failed: {}", cause);
                state.tf_state = partial;
                state.latest_tf_output = cause.output.clone();
                RunOutcome::Failed {
                    partial: state,
                    cause,
                }
            }
        }
    }
}

#[async_trait]
impl OutputSource for Manager {
    async fn outputs(&self, state: &State) -> IaasResult<Outputs> {
        self.get_outputs(state)
            .await
            .map_err(|e| IaasError::OutputSource(e.to_string()))
    }
}
