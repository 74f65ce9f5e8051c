//! Destroy command - tear an environment down.

use std::io::BufRead;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use bbl_bosh::BoshError;
use bbl_state::Store;
use bbl_terraform::TerraformError;

use crate::app::App;
use crate::commands::GlobalArgs;
use crate::error::CliError;

#[derive(Args, Debug, Default)]
pub struct DestroyArgs {
    /// Do not ask for confirmation
    #[arg(long)]
    pub no_confirm: bool,

    /// Exit successfully when there is no state file
    #[arg(long)]
    pub skip_if_missing: bool,
}

/// True when there is nothing to destroy and the user asked not to fail.
///
/// Checked before the state is loaded, since a missing environment has no
/// credentials to validate.
pub fn skip(global: &GlobalArgs, args: &DestroyArgs) -> bool {
    if args.skip_if_missing && !Store::new(&global.state_dir).exists() {
        info!("state file not found, and --skip-if-missing flag provided, exiting");
        return true;
    }
    false
}

pub async fn execute(app: &mut App, args: DestroyArgs, input: &mut impl BufRead) -> Result<()> {
    if !app.store().exists() {
        return Err(CliError::NoEnvironment.into());
    }

    if !args.no_confirm && !confirm(&app.state.env_id, input)? {
        info!("exiting");
        return Ok(());
    }

    let bosh = app.bosh()?;
    let outcome = bosh.delete(app.state.clone()).await?;
    app.settle(outcome, BoshError::from)?;

    info!("step: destroying infrastructure");
    let outcome = app.terraform()?.destroy(app.state.clone()).await?;
    app.settle(outcome, TerraformError::from)?;

    app.store()
        .delete()
        .context("Failed to delete state")?;
    info!("step: finished destroying infrastructure");
    Ok(())
}

fn confirm(env_id: &str, input: &mut impl BufRead) -> Result<bool> {
    println!(
        "Are you sure you want to delete infrastructure for {:?}? This operation cannot be undone!",
        env_id
    );

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        warn!("no answer given");
        return Ok(false);
    }
    Ok(matches!(answer.trim().to_lowercase().as_str(), "yes" | "y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::*;
    use bbl_runner::{MockResponse, MockRunner};
    use bbl_state::State;
    use tempfile::tempdir;

    fn deployed_state() -> State {
        let mut state = azure_state().with_env_id("bbl-env");
        state.tf_state = "some-tf-state".into();
        state.bosh.director_address = "https://52.1.2.3:25555".into();
        state.bosh.manifest = "director-manifest".into();
        state.bosh.variables = DIRECTOR_VARS.into();
        state
    }

    #[tokio::test]
    async fn test_destroy_deletes_director_then_infrastructure() {
        let dir = tempdir().unwrap();
        let terraform = terraform_runner();
        let bosh = bosh_runner();
        let mut app = test_app(&dir, deployed_state(), &terraform, &bosh);
        app.save(deployed_state()).unwrap();

        execute(
            &mut app,
            DestroyArgs {
                no_confirm: true,
                ..DestroyArgs::default()
            },
            &mut "".as_bytes(),
        )
        .await
        .unwrap();

        assert_eq!(bosh.subcommands(), vec!["delete-env"]);
        assert_eq!(terraform.subcommands(), vec!["init", "destroy"]);
        assert!(!app.store().exists());
        assert!(!app.store().terraform_dir().exists());
    }

    #[tokio::test]
    async fn test_destroy_stops_when_director_deletion_fails() {
        let dir = tempdir().unwrap();
        let terraform = terraform_runner();
        let bosh = MockRunner::new().respond(
            "delete-env",
            MockResponse::failure(1, "director unreachable")
                .writes_file("state.json", r#"{"current_vm_cid": "vm-1"}"#),
        );
        let mut app = test_app(&dir, deployed_state(), &terraform, &bosh);
        app.save(deployed_state()).unwrap();

        let err = execute(
            &mut app,
            DestroyArgs {
                no_confirm: true,
                ..DestroyArgs::default()
            },
            &mut "".as_bytes(),
        )
        .await
        .unwrap_err();

        assert!(err.downcast_ref::<BoshError>().is_some());
        assert_eq!(terraform.call_count(), 0);
        let saved = app.store().get().unwrap();
        assert_eq!(saved.tf_state, "some-tf-state");
        assert!(saved.bosh.state.is_some());
    }

    #[tokio::test]
    async fn test_destroy_asks_for_confirmation() {
        let dir = tempdir().unwrap();
        let runner = MockRunner::new();
        let mut app = test_app(&dir, deployed_state(), &runner, &runner);
        app.save(deployed_state()).unwrap();

        execute(&mut app, DestroyArgs::default(), &mut "no\n".as_bytes())
            .await
            .unwrap();

        assert_eq!(runner.call_count(), 0);
        assert!(app.store().exists());
    }

    #[tokio::test]
    async fn test_destroy_without_state_fails() {
        let dir = tempdir().unwrap();
        let runner = MockRunner::new();
        let mut app = test_app(&dir, azure_state(), &runner, &runner);

        let err = execute(&mut app, DestroyArgs::default(), &mut "yes\n".as_bytes())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::NoEnvironment)
        ));
    }

    #[test]
    fn test_confirm_answers() {
        assert!(confirm("bbl-env", &mut "yes\n".as_bytes()).unwrap());
        assert!(confirm("bbl-env", &mut "Y\n".as_bytes()).unwrap());
        assert!(!confirm("bbl-env", &mut "nope\n".as_bytes()).unwrap());
        assert!(!confirm("bbl-env", &mut "".as_bytes()).unwrap());
    }
}
