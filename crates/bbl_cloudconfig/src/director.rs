//! Director client seam.
//!
//! [`BoshCliDirectorClient`] talks to the director through the bosh CLI. When
//! the environment has a jumpbox the CLI is told to tunnel through it with
//! `BOSH_ALL_PROXY`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use bbl_bosh::{all_proxy, jumpbox_private_key};
use bbl_runner::{CommandRunner, FileIo, Invocation};
use bbl_state::State;

use crate::error::{CloudConfigError, CloudConfigResult};

/// The director operations bbl needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorClient: Send + Sync {
    async fn update_cloud_config(&self, cloud_config: &[u8]) -> CloudConfigResult<()>;
}

/// Builds a [`DirectorClient`] for an environment's director.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorClientProvider: Send + Sync {
    async fn client(&self, state: &State) -> CloudConfigResult<Box<dyn DirectorClient>>;
}

/// Connection settings for one director.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorTarget {
    pub address: String,
    pub username: String,
    pub password: String,
    pub ca_cert: String,
    /// `BOSH_ALL_PROXY` value, when the director sits behind a jumpbox
    pub all_proxy: Option<String>,
}

/// [`DirectorClient`] backed by the bosh CLI.
pub struct BoshCliDirectorClient {
    runner: Arc<dyn CommandRunner>,
    files: Arc<dyn FileIo>,
    dir: PathBuf,
    target: DirectorTarget,
}

impl BoshCliDirectorClient {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        files: Arc<dyn FileIo>,
        dir: impl Into<PathBuf>,
        target: DirectorTarget,
    ) -> Self {
        Self {
            runner,
            files,
            dir: dir.into(),
            target,
        }
    }

    fn invocation<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut invocation = Invocation::new(args)
            .workdir(&self.dir)
            .env("BOSH_ENVIRONMENT", &self.target.address)
            .env("BOSH_CLIENT", &self.target.username)
            .env("BOSH_CLIENT_SECRET", &self.target.password)
            .env("BOSH_CA_CERT", &self.target.ca_cert)
            .env("BOSH_NON_INTERACTIVE", "true");
        if let Some(proxy) = &self.target.all_proxy {
            invocation = invocation.env("BOSH_ALL_PROXY", proxy);
        }
        invocation
    }
}

#[async_trait]
impl DirectorClient for BoshCliDirectorClient {
    async fn update_cloud_config(&self, cloud_config: &[u8]) -> CloudConfigResult<()> {
        let path = self.dir.join("cloud-config-rendered.yml");
        self.files.write(&path, cloud_config)?;

        info!("Updating cloud config on {}", self.target.address);
        let invocation = self
            .invocation(["update-cloud-config"])
            .path_arg(&path)
            .stream(true);
        let result = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| CloudConfigError::Update(e.to_string()))?;
        result
            .check("bosh", &invocation)
            .map_err(|failure| CloudConfigError::Update(format!("{}: {}", failure, failure.output)))?;
        Ok(())
    }
}

/// Builds [`BoshCliDirectorClient`]s from the state's director record.
#[derive(Clone)]
pub struct BoshCliClientProvider {
    runner: Arc<dyn CommandRunner>,
    files: Arc<dyn FileIo>,
    dir: PathBuf,
}

impl BoshCliClientProvider {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        files: Arc<dyn FileIo>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            files,
            dir: dir.into(),
        }
    }

    /// Connection settings for `state`'s director.
    ///
    /// Writes the jumpbox private key next to the cloud config when the
    /// director is reached through a jumpbox.
    pub fn target(&self, state: &State) -> CloudConfigResult<DirectorTarget> {
        if !state.has_director() {
            return Err(CloudConfigError::NoDirector);
        }

        let all_proxy = if state.jumpbox.url.is_empty() {
            None
        } else {
            let key_path = self.dir.join("jumpbox.key");
            let key = jumpbox_private_key(&state.jumpbox.variables)?;
            self.files.write_private(&key_path, key.as_bytes())?;
            debug!("Tunnelling through jumpbox {}", state.jumpbox.url);
            Some(all_proxy(&state.jumpbox.url, &key_path))
        };

        Ok(DirectorTarget {
            address: state.bosh.director_address.clone(),
            username: state.bosh.director_username.clone(),
            password: state.bosh.director_password.clone(),
            ca_cert: state.bosh.director_ssl_ca.clone(),
            all_proxy,
        })
    }
}

#[async_trait]
impl DirectorClientProvider for BoshCliClientProvider {
    async fn client(&self, state: &State) -> CloudConfigResult<Box<dyn DirectorClient>> {
        let target = self.target(state)?;
        Ok(Box::new(BoshCliDirectorClient::new(
            self.runner.clone(),
            self.files.clone(),
            self.dir.clone(),
            target,
        )))
    }
}
