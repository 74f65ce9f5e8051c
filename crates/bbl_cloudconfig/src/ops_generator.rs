//! Cloud-config ops generation.

use std::sync::Arc;

use tracing::debug;

use bbl_iaas::{render_ops, IaasError, OutputSource, Provider};
use bbl_state::State;

use crate::error::CloudConfigResult;

/// Produces the ops file that turns the base cloud config into the
/// environment's cloud config.
#[derive(Clone)]
pub struct OpsGenerator {
    provider: Arc<dyn Provider>,
    outputs: Arc<dyn OutputSource>,
}

impl OpsGenerator {
    pub fn new(provider: Arc<dyn Provider>, outputs: Arc<dyn OutputSource>) -> Self {
        Self { provider, outputs }
    }

    /// Ops file YAML for `state`.
    ///
    /// Every output the provider needs has to be present; missing ones are
    /// reported together.
    pub async fn generate(&self, state: &State) -> CloudConfigResult<String> {
        let outputs = self.outputs.outputs(state).await?;

        let required = self.provider.required_outputs(state);
        let missing = outputs.missing(&required);
        if !missing.is_empty() {
            return Err(IaasError::MissingOutputs(
                missing.into_iter().map(str::to_string).collect(),
            )
            .into());
        }

        let ops = self.provider.cloud_config_ops(state, &outputs)?;
        debug!("Generated {} cloud-config ops", ops.len());
        Ok(render_ops(&ops)?)
    }
}
