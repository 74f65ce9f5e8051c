//! bosh CLI executor.
//!
//! Interpolation renders manifests from the compiled-in assets plus the
//! deployment vars; `create-env` and `delete-env` then run against the
//! rendered manifest in the deployment's own directory under `bosh/`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use bbl_runner::{
    extract_version, CommandRunner, ErrorList, FileIo, Invocation, RunOutcome, ToolFailure,
};
use bbl_state::Iaas;

use crate::assets;
use crate::error::{BoshError, BoshResult};

const TOOL: &str = "bosh";

pub const JUMPBOX_DIR: &str = "jumpbox";
pub const DIRECTOR_DIR: &str = "director";

const VARS_STORE: &str = "variables.yml";
const STATE_FILE: &str = "state.json";
const MANIFEST_FILE: &str = "manifest.yml";
const CPI_FILE: &str = "cpi.yml";
const USER_OPS_FILE: &str = "user-ops-file.yml";

/// Printed by bosh CLI binaries built from source.
pub const VERSION_DEV_BUILD: &str = "[DEV BUILD]";

/// `bosh create-env` state, kept opaque.
pub type BoshState = Map<String, Value>;

/// An ops file and the name it is written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpsFile {
    pub name: String,
    pub contents: String,
}

impl OpsFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Ops files applied to the director manifest.
///
/// `base` and `fragments` are applied together in a first interpolation;
/// a non-empty `user` ops file is applied on its own to that result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpsFileSet {
    pub base: OpsFile,
    pub fragments: Vec<OpsFile>,
    pub user: String,
}

impl OpsFileSet {
    /// The IAAS cpi plus the named fragments, looked up in the assets.
    pub fn director(
        iaas: Iaas,
        fragments: &[&str],
        user: impl Into<String>,
    ) -> BoshResult<Self> {
        let fragments = fragments
            .iter()
            .map(|name| {
                assets::director_ops_file(name)
                    .map(|contents| OpsFile::new(*name, contents))
                    .ok_or_else(|| BoshError::UnknownOpsFile(name.to_string()))
            })
            .collect::<BoshResult<Vec<_>>>()?;

        Ok(Self {
            base: OpsFile::new(CPI_FILE, assets::director_cpi(iaas)),
            fragments,
            user: user.into(),
        })
    }
}

/// Inputs for rendering the jumpbox manifest.
#[derive(Debug, Clone)]
pub struct JumpboxInterpolateInput {
    pub iaas: Iaas,
    /// YAML vars file
    pub deployment_vars: String,
    /// Previous vars store, empty on first deploy
    pub variables: String,
}

/// Inputs for rendering the director manifest.
#[derive(Debug, Clone)]
pub struct DirectorInterpolateInput {
    /// YAML vars file
    pub deployment_vars: String,
    /// Previous vars store, empty on first deploy
    pub variables: String,
    pub ops: OpsFileSet,
}

/// A rendered manifest and the vars store bosh filled in while rendering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolateOutput {
    pub variables: String,
    pub manifest: String,
}

/// Inputs for `create-env` and `delete-env`.
#[derive(Debug, Clone)]
pub struct EnvInput {
    pub manifest: String,
    pub variables: String,
    pub state: Option<BoshState>,
    /// Directory under the bosh dir, e.g. [`JUMPBOX_DIR`]
    pub dir: String,
}

/// One `bosh interpolate` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interpolation {
    pub manifest: PathBuf,
    pub vars_store: Option<PathBuf>,
    pub vars_files: Vec<PathBuf>,
    pub ops_files: Vec<PathBuf>,
    /// Fail on variables that have no value
    pub var_errs: bool,
}

impl Interpolation {
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            ..Self::default()
        }
    }

    pub fn vars_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.vars_store = Some(path.into());
        self.var_errs = true;
        self
    }

    pub fn vars_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.vars_files.push(path.into());
        self
    }

    pub fn ops_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ops_files.push(path.into());
        self
    }

    fn invocation(&self) -> Invocation {
        let mut invocation = Invocation::new(["interpolate"]).path_arg(&self.manifest);
        if self.var_errs {
            invocation = invocation.arg("--var-errs");
        }
        if let Some(store) = &self.vars_store {
            invocation = invocation.arg("--vars-store").path_arg(store);
        }
        for file in &self.vars_files {
            invocation = invocation.arg("--vars-file").path_arg(file);
        }
        for file in &self.ops_files {
            invocation = invocation.arg("-o").path_arg(file);
        }
        invocation
    }
}

/// Renders manifests with `bosh interpolate`.
#[async_trait]
pub trait Interpolator: Send + Sync {
    /// Run `interpolation` in `workdir` and return the rendered manifest.
    async fn interpolate(&self, workdir: &Path, interpolation: &Interpolation)
        -> BoshResult<String>;
}

/// Runs the bosh CLI against the state directory's `bosh/` folder.
#[derive(Clone)]
pub struct Executor {
    runner: Arc<dyn CommandRunner>,
    files: Arc<dyn FileIo>,
    bosh_dir: PathBuf,
}

impl Executor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        files: Arc<dyn FileIo>,
        bosh_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            files,
            bosh_dir: bosh_dir.into(),
        }
    }

    pub fn bosh_dir(&self) -> &Path {
        &self.bosh_dir
    }

    /// Render the jumpbox manifest and fill in its vars store.
    pub async fn jumpbox_interpolate(
        &self,
        input: &JumpboxInterpolateInput,
    ) -> BoshResult<InterpolateOutput> {
        let dir = self.bosh_dir.join(JUMPBOX_DIR);
        self.write(&dir, "jumpbox.yml", assets::JUMPBOX_MANIFEST)?;
        self.write(&dir, CPI_FILE, assets::jumpbox_cpi(input.iaas))?;
        self.write(&dir, "jumpbox-deployment-vars.yml", &input.deployment_vars)?;
        if !input.variables.is_empty() {
            self.write(&dir, VARS_STORE, &input.variables)?;
        }

        let interpolation = Interpolation::new(dir.join("jumpbox.yml"))
            .vars_store(dir.join(VARS_STORE))
            .vars_file(dir.join("jumpbox-deployment-vars.yml"))
            .ops_file(dir.join(CPI_FILE));

        info!("Interpolating jumpbox manifest");
        let manifest = self.interpolate(&dir, &interpolation).await?;
        Ok(InterpolateOutput {
            variables: self.files.read_to_string(&dir.join(VARS_STORE))?,
            manifest,
        })
    }

    /// Render the director manifest.
    ///
    /// The base and fragment ops files are applied in one pass. A user ops
    /// file is applied in a second pass over the first pass' result.
    pub async fn director_interpolate(
        &self,
        input: &DirectorInterpolateInput,
    ) -> BoshResult<InterpolateOutput> {
        let dir = self.bosh_dir.join(DIRECTOR_DIR);
        self.write(&dir, "bosh.yml", assets::DIRECTOR_MANIFEST)?;
        self.write(&dir, "deployment-vars.yml", &input.deployment_vars)?;
        if !input.variables.is_empty() {
            self.write(&dir, VARS_STORE, &input.variables)?;
        }

        let ops = &input.ops;
        let mut first = Interpolation::new(dir.join("bosh.yml"))
            .vars_store(dir.join(VARS_STORE))
            .vars_file(dir.join("deployment-vars.yml"));
        for ops_file in std::iter::once(&ops.base).chain(&ops.fragments) {
            self.write(&dir, &ops_file.name, &ops_file.contents)?;
            first = first.ops_file(dir.join(&ops_file.name));
        }

        info!("Interpolating director manifest");
        let mut manifest = self.interpolate(&dir, &first).await?;

        if !ops.user.is_empty() {
            debug!("Applying user ops file to the director manifest");
            self.write(&dir, "bosh-with-ops.yml", &manifest)?;
            self.write(&dir, USER_OPS_FILE, &ops.user)?;

            let second = Interpolation::new(dir.join("bosh-with-ops.yml"))
                .vars_store(dir.join(VARS_STORE))
                .vars_file(dir.join("deployment-vars.yml"))
                .ops_file(dir.join(USER_OPS_FILE));
            manifest = self.interpolate(&dir, &second).await?;
        }

        Ok(InterpolateOutput {
            variables: self.files.read_to_string(&dir.join(VARS_STORE))?,
            manifest,
        })
    }

    /// Run `bosh create-env`.
    ///
    /// The state file is read back whatever the outcome; a failed run carries
    /// the state it left behind.
    pub async fn create_env(&self, input: &EnvInput) -> BoshResult<RunOutcome<BoshState>> {
        self.run_env("create-env", input).await
    }

    /// Run `bosh delete-env`.
    pub async fn delete_env(&self, input: &EnvInput) -> BoshResult<RunOutcome<BoshState>> {
        self.run_env("delete-env", input).await
    }

    /// Installed bosh CLI version, e.g. `2.0.45`.
    pub async fn version(&self) -> BoshResult<String> {
        let invocation = Invocation::new(["-v"]);
        let result = self
            .runner
            .run(&invocation)
            .await?
            .check(TOOL, &invocation)?;

        match extract_version(&result.stdout) {
            Some(version) => Ok(version),
            None if result.stdout.contains(VERSION_DEV_BUILD) => {
                Ok(VERSION_DEV_BUILD.to_string())
            }
            None => Err(BoshError::VersionParse),
        }
    }

    fn write(&self, dir: &Path, name: &str, contents: &str) -> BoshResult<()> {
        self.files.write(&dir.join(name), contents.as_bytes())?;
        Ok(())
    }

    async fn run_env(&self, subcommand: &str, input: &EnvInput) -> BoshResult<RunOutcome<BoshState>> {
        let dir = self.bosh_dir.join(&input.dir);
        if let Some(state) = &input.state {
            let contents = serde_json::to_string(state).map_err(BoshError::State)?;
            self.write(&dir, STATE_FILE, &contents)?;
        }
        self.write(&dir, VARS_STORE, &input.variables)?;
        self.write(&dir, MANIFEST_FILE, &input.manifest)?;

        let invocation = Invocation::new([subcommand])
            .path_arg(&dir.join(MANIFEST_FILE))
            .arg("--vars-store")
            .path_arg(&dir.join(VARS_STORE))
            .arg("--state")
            .path_arg(&dir.join(STATE_FILE))
            .workdir(&dir)
            .stream(true);

        info!("Running bosh {} in {:?}", subcommand, dir);
        let result = self.runner.run(&invocation).await?;
        let state_path = dir.join(STATE_FILE);

        match result.check(TOOL, &invocation) {
            Ok(_) if subcommand == "delete-env" && !self.files.exists(&state_path) => {
                Ok(RunOutcome::Completed(BoshState::new()))
            }
            Ok(_) => Ok(RunOutcome::Completed(self.read_state(&state_path)?)),
            Err(cause) => self.recover(cause, &state_path),
        }
    }

    fn read_state(&self, path: &Path) -> BoshResult<BoshState> {
        let contents = self.files.read_to_string(path)?;
        serde_json::from_str(&contents).map_err(BoshError::State)
    }

    fn recover(&self, cause: ToolFailure, state_path: &Path) -> BoshResult<RunOutcome<BoshState>> {
        match self.read_state(state_path) {
            Ok(partial) => {
                warn!("{}; keeping the state it left behind", cause);
                Ok(RunOutcome::Failed { partial, cause })
            }
            Err(read_err) => Err(BoshError::Unrecoverable {
                causes: ErrorList::new().with(&cause).with(read_err),
            }),
        }
    }
}

#[async_trait]
impl Interpolator for Executor {
    async fn interpolate(
        &self,
        workdir: &Path,
        interpolation: &Interpolation,
    ) -> BoshResult<String> {
        let invocation = interpolation.invocation().workdir(workdir);
        self.runner
            .run(&invocation)
            .await?
            .check(TOOL, &invocation)
            .map(|result| result.stdout)
            .map_err(BoshError::Interpolate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_args() {
        let invocation = Interpolation::new("/bosh/bosh.yml")
            .vars_store("/bosh/variables.yml")
            .vars_file("/bosh/vars.yml")
            .ops_file("/bosh/cpi.yml")
            .ops_file("/bosh/uaa.yml")
            .invocation();

        assert_eq!(
            invocation.args,
            vec![
                "interpolate",
                "/bosh/bosh.yml",
                "--var-errs",
                "--vars-store",
                "/bosh/variables.yml",
                "--vars-file",
                "/bosh/vars.yml",
                "-o",
                "/bosh/cpi.yml",
                "-o",
                "/bosh/uaa.yml",
            ]
        );
    }

    #[test]
    fn test_interpolation_without_vars_store() {
        let invocation = Interpolation::new("cloud-config.yml")
            .ops_file("ops.yml")
            .invocation();

        assert_eq!(
            invocation.args,
            vec!["interpolate", "cloud-config.yml", "-o", "ops.yml"]
        );
    }

    #[test]
    fn test_director_ops_file_set() {
        let ops = OpsFileSet::director(Iaas::Gcp, &["jumpbox-user.yml", "uaa.yml"], "").unwrap();

        assert_eq!(ops.base.name, "cpi.yml");
        assert_eq!(ops.base.contents, assets::director_cpi(Iaas::Gcp));
        assert_eq!(
            ops.fragments.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["jumpbox-user.yml", "uaa.yml"]
        );
        assert!(ops.user.is_empty());
    }

    #[test]
    fn test_unknown_fragment() {
        assert!(matches!(
            OpsFileSet::director(Iaas::Aws, &["nope.yml"], ""),
            Err(BoshError::UnknownOpsFile(_))
        ));
    }
}
