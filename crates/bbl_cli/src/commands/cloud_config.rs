//! Cloud-config command - print the cloud config bbl would apply.

use anyhow::Result;

use crate::app::App;

pub async fn execute(app: &App) -> Result<()> {
    app.require_environment()?;
    let cloud_config = app.cloud_config()?.generate(&app.state).await?;
    println!("{}", cloud_config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_cloud_config_does_not_touch_the_director() {
        let dir = tempdir().unwrap();
        let terraform = terraform_runner();
        let bosh = bosh_runner();
        let mut state = azure_state().with_env_id("bbl-env");
        state.tf_state = "some-tf-state".into();
        let app = test_app(&dir, state, &terraform, &bosh);

        execute(&app).await.unwrap();

        assert_eq!(bosh.subcommands(), vec!["interpolate"]);
        let ops = std::fs::read_to_string(
            app.store().bosh_dir().join("cloudconfig").join("ops.yml"),
        )
        .unwrap();
        assert!(ops.contains("some-network"));
    }
}
