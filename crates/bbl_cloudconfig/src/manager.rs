//! Cloud-config generation and upload.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use bbl_bosh::{Interpolation, Interpolator};
use bbl_runner::FileIo;
use bbl_state::State;

use crate::director::DirectorClientProvider;
use crate::error::CloudConfigResult;
use crate::ops_generator::OpsGenerator;

/// The provider-neutral cloud config every environment starts from.
pub const BASE_CLOUD_CONFIG: &str = include_str!("../assets/cloud-config.yml");

/// Renders an environment's cloud config and applies it to the director.
#[derive(Clone)]
pub struct Manager {
    interpolator: Arc<dyn Interpolator>,
    files: Arc<dyn FileIo>,
    ops: OpsGenerator,
    clients: Arc<dyn DirectorClientProvider>,
    dir: PathBuf,
}

impl Manager {
    pub fn new(
        interpolator: Arc<dyn Interpolator>,
        files: Arc<dyn FileIo>,
        ops: OpsGenerator,
        clients: Arc<dyn DirectorClientProvider>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            interpolator,
            files,
            ops,
            clients,
            dir: dir.into(),
        }
    }

    /// The environment's cloud config as YAML.
    pub async fn generate(&self, state: &State) -> CloudConfigResult<String> {
        let base = self.dir.join("cloud-config.yml");
        let ops = self.dir.join("ops.yml");

        self.files.write(&base, BASE_CLOUD_CONFIG.as_bytes())?;
        let ops_yaml = self.ops.generate(state).await?;
        self.files.write(&ops, ops_yaml.as_bytes())?;

        let interpolation = Interpolation::new(base).ops_file(ops);
        Ok(self.interpolator.interpolate(&self.dir, &interpolation).await?)
    }

    /// Generate the cloud config and upload it to the director.
    pub async fn update(&self, state: &State) -> CloudConfigResult<()> {
        let client = self.clients.client(state).await?;

        info!("step: generating cloud config");
        let cloud_config = self.generate(state).await?;

        info!("step: applying cloud config");
        client.update_cloud_config(cloud_config.as_bytes()).await
    }
}
