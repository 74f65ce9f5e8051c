//! Terraform executor.
//!
//! Every operation works inside a single terraform directory: the template,
//! inputs and state are written there before terraform is invoked, and the
//! resulting `terraform.tfstate` is read back afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use bbl_iaas::{Outputs, TerraformVars};
use bbl_runner::{
    extract_version, CommandRunner, ErrorList, ExecutionResult, FileIo, Invocation, RunOutcome,
    ToolFailure,
};

use crate::error::{TerraformError, TerraformResult};

const TOOL: &str = "terraform";
pub const TEMPLATE_FILE: &str = "template.tf";
pub const VARS_FILE: &str = "terraform.tfvars";
pub const STATE_FILE: &str = "terraform.tfstate";

/// Inputs for importing one pre-existing resource into terraform state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInput {
    /// Terraform address, e.g. `aws_subnet.bosh_subnet` or `aws_subnet.internal[0]`
    pub address: String,
    /// Provider-side identifier
    pub id: String,
    pub tf_state: String,
    /// Provider configuration for the synthesized template
    pub provider_block: String,
}

#[derive(Debug, Deserialize)]
struct TfOutput {
    #[allow(dead_code)]
    #[serde(default)]
    sensitive: bool,
    #[allow(dead_code)]
    #[serde(default, rename = "type")]
    output_type: serde_json::Value,
    value: serde_json::Value,
}

/// Runs terraform against a working directory.
#[derive(Clone)]
pub struct Executor {
    runner: Arc<dyn CommandRunner>,
    files: Arc<dyn FileIo>,
    terraform_dir: PathBuf,
}

impl Executor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        files: Arc<dyn FileIo>,
        terraform_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            files,
            terraform_dir: terraform_dir.into(),
        }
    }

    pub fn terraform_dir(&self) -> &Path {
        &self.terraform_dir
    }

    /// Create or update infrastructure.
    ///
    /// Returns [`RunOutcome::Failed`] with the state terraform left on disk
    /// when `terraform apply` itself fails.
    pub async fn apply(
        &self,
        inputs: &TerraformVars,
        template: &str,
        prev_tf_state: &str,
    ) -> TerraformResult<RunOutcome<String>> {
        self.prepare(template, prev_tf_state)?;
        self.init().await?;
        self.write(VARS_FILE, &tfvars(inputs))?;

        info!("Running terraform apply in {:?}", self.terraform_dir);
        let invocation = Invocation::new(["apply", "-input=false", "-auto-approve"]).stream(true);
        self.finish(invocation).await
    }

    /// Destroy infrastructure.
    pub async fn destroy(
        &self,
        inputs: &TerraformVars,
        template: &str,
        prev_tf_state: &str,
    ) -> TerraformResult<RunOutcome<String>> {
        self.prepare(template, prev_tf_state)?;
        self.init().await?;

        info!("Running terraform destroy in {:?}", self.terraform_dir);
        let mut invocation = Invocation::new(["destroy", "-force"]).stream(true);
        for (name, value) in inputs {
            invocation = invocation.arg("-var").arg(format!("{}={}", name, value));
        }
        self.finish(invocation).await
    }

    /// Import an existing resource and return the updated state.
    pub async fn import(&self, input: &ImportInput) -> TerraformResult<String> {
        let (resource_type, resource_name) = split_address(&input.address)?;
        let template = format!(
            "{}\nresource {:?} {:?} {{\n}}\n",
            input.provider_block, resource_type, resource_name
        );

        self.write(TEMPLATE_FILE, &template)?;
        self.write(STATE_FILE, &input.tf_state)?;
        self.init().await?;

        info!("Importing {} ({})", input.address, input.id);
        let invocation = Invocation::new(["import", input.address.as_str(), input.id.as_str()]);
        self.run(&invocation)
            .await?
            .check(TOOL, &invocation)
            .map_err(TerraformError::Import)?;

        Ok(self.files.read_to_string(&self.path(STATE_FILE))?)
    }

    /// Value of a single output.
    pub async fn output(&self, tf_state: &str, name: &str) -> TerraformResult<String> {
        self.write(STATE_FILE, tf_state)?;
        self.init().await?;

        let result = self.run_checked(Invocation::new(["output", name])).await?;
        Ok(result
            .stdout
            .strip_suffix('\n')
            .unwrap_or(&result.stdout)
            .to_string())
    }

    /// All outputs, keyed by name.
    pub async fn outputs(&self, tf_state: &str) -> TerraformResult<Outputs> {
        self.write(STATE_FILE, tf_state)?;
        self.init().await?;

        let result = self.run_checked(Invocation::new(["output", "--json"])).await?;
        let raw: BTreeMap<String, TfOutput> =
            serde_json::from_str(&result.stdout).map_err(TerraformError::Outputs)?;

        Ok(raw
            .into_iter()
            .map(|(name, output)| (name, output.value))
            .collect())
    }

    /// Installed terraform version, e.g. `0.11.7`.
    pub async fn version(&self) -> TerraformResult<String> {
        let invocation = Invocation::new(["version"]);
        let result = self
            .runner
            .run(&invocation)
            .await?
            .check(TOOL, &invocation)?;
        extract_version(&result.stdout).ok_or(TerraformError::VersionParse)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.terraform_dir.join(name)
    }

    fn write(&self, name: &str, contents: &str) -> TerraformResult<()> {
        self.files.write(&self.path(name), contents.as_bytes())?;
        Ok(())
    }

    fn prepare(&self, template: &str, prev_tf_state: &str) -> TerraformResult<()> {
        self.write(TEMPLATE_FILE, template)?;
        if !prev_tf_state.is_empty() {
            self.write(STATE_FILE, prev_tf_state)?;
        }
        Ok(())
    }

    async fn init(&self) -> TerraformResult<()> {
        debug!("Running terraform init in {:?}", self.terraform_dir);
        self.run_checked(Invocation::new(["init", "-input=false"]))
            .await?;
        Ok(())
    }

    async fn run(&self, invocation: &Invocation) -> TerraformResult<ExecutionResult> {
        let invocation = invocation.clone().workdir(&self.terraform_dir);
        Ok(self.runner.run(&invocation).await?)
    }

    async fn run_checked(&self, invocation: Invocation) -> TerraformResult<ExecutionResult> {
        Ok(self.run(&invocation).await?.check(TOOL, &invocation)?)
    }

    /// Run `invocation` and classify the result by whether a state file survived.
    async fn finish(&self, invocation: Invocation) -> TerraformResult<RunOutcome<String>> {
        let result = self.run(&invocation).await?;
        let state_path = self.path(STATE_FILE);

        match result.check(TOOL, &invocation) {
            Ok(_) => Ok(RunOutcome::Completed(
                self.files.read_to_string(&state_path)?,
            )),
            Err(cause) => self.recover(cause, &state_path),
        }
    }

    fn recover(
        &self,
        cause: ToolFailure,
        state_path: &Path,
    ) -> TerraformResult<RunOutcome<String>> {
        match self.files.read_to_string(state_path) {
            Ok(partial) => {
                warn!("{}; keeping the state it left behind", cause);
                Ok(RunOutcome::Failed { partial, cause })
            }
            Err(read_err) => Err(TerraformError::Unrecoverable {
                causes: ErrorList::new().with(&cause).with(read_err),
            }),
        }
    }
}

/// Render inputs as a `terraform.tfvars` file.
fn tfvars(inputs: &TerraformVars) -> String {
    inputs
        .iter()
        .map(|(name, value)| format!("{} = \"{}\"", name, escape(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Split `type.name[index]` into `(type, name)`.
fn split_address(address: &str) -> TerraformResult<(&str, &str)> {
    let (resource_type, rest) = address
        .split_once('.')
        .ok_or_else(|| TerraformError::InvalidAddress(address.to_string()))?;
    let name = rest.split('[').next().unwrap_or(rest);
    if resource_type.is_empty() || name.is_empty() {
        return Err(TerraformError::InvalidAddress(address.to_string()));
    }
    Ok((resource_type, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tfvars() {
        let mut inputs = TerraformVars::new();
        inputs.insert("region".into(), "us-west-2".into());
        inputs.insert("env_id".into(), "bbl-env".into());
        inputs.insert("quoted".into(), r#"a "b" c"#.into());

        assert_eq!(
            tfvars(&inputs),
            "env_id = \"bbl-env\"\nquoted = \"a \\\"b\\\" c\"\nregion = \"us-west-2\""
        );
    }

    #[test]
    fn test_split_address() {
        assert_eq!(
            split_address("aws_vpc.vpc").unwrap(),
            ("aws_vpc", "vpc")
        );
        assert_eq!(
            split_address("aws_subnet.internal_subnets[1]").unwrap(),
            ("aws_subnet", "internal_subnets")
        );
        assert!(matches!(
            split_address("aws_vpc"),
            Err(TerraformError::InvalidAddress(_))
        ));
    }
}
