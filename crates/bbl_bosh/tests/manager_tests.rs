//! bosh manager: jumpbox and director lifecycle.

use std::sync::Arc;

use bbl_bosh::{BoshError, Manager};
use bbl_iaas::{provider_for, Outputs};
use bbl_runner::{LocalFs, MockResponse, MockRunner, RunOutcome};
use bbl_state::{Iaas, State};
use serde_json::json;
use tempfile::{tempdir, TempDir};

const DIRECTOR_VARS: &str = "admin_password: some-admin-password
director_ssl:
  ca: some-ca
  certificate: some-certificate
  private_key: some-private-key
";

fn gcp_state() -> State {
    let mut state = State::new().with_iaas(Iaas::Gcp).with_env_id("bbl-env");
    state.gcp.project_id = "some-project".into();
    state.gcp.zone = "us-east1-b".into();
    state.gcp.region = "us-east1".into();
    state.gcp.service_account_key = r#"{"type": "service_account"}"#.into();
    state
}

fn gcp_outputs() -> Outputs {
    Outputs::new()
        .with("external_ip", "35.1.2.3")
        .with("network_name", "some-network")
        .with("subnetwork_name", "some-subnetwork")
        .with("bosh_open_tag_name", "some-open-tag")
        .with("jumpbox_tag_name", "some-jumpbox-tag")
        .with("bosh_director_tag_name", "some-director-tag")
}

fn new_manager(runner: &MockRunner, iaas: Iaas) -> (Manager, TempDir) {
    let dir = tempdir().unwrap();
    let manager = Manager::new(
        Arc::new(runner.clone()),
        Arc::new(LocalFs),
        dir.path().join("bosh"),
        provider_for(iaas),
    );
    (manager, dir)
}

#[tokio::test]
async fn test_create_jumpbox() {
    let runner = MockRunner::new()
        .respond(
            "interpolate",
            MockResponse::success("jumpbox-manifest").writes_file("variables.yml", "jumpbox-vars"),
        )
        .respond(
            "create-env",
            MockResponse::success("").writes_file("state.json", r#"{"current_vm_cid": "vm-1"}"#),
        );
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);

    let state = match manager.create_jumpbox(gcp_state(), &gcp_outputs()).await.unwrap() {
        RunOutcome::Completed(state) => state,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(state.jumpbox.url, "35.1.2.3:22");
    assert_eq!(state.jumpbox.manifest, "jumpbox-manifest");
    assert_eq!(state.jumpbox.variables, "jumpbox-vars");
    assert_eq!(state.jumpbox.state.unwrap()["current_vm_cid"], json!("vm-1"));
    assert_eq!(runner.subcommands(), vec!["interpolate", "create-env"]);
}

#[tokio::test]
async fn test_failed_jumpbox_keeps_partial_state() {
    let runner = MockRunner::new()
        .respond(
            "interpolate",
            MockResponse::success("jumpbox-manifest").writes_file("variables.yml", "jumpbox-vars"),
        )
        .respond(
            "create-env",
            MockResponse::failure(1, "timed out").writes_file("state.json", r#"{"stemcells": []}"#),
        );
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);

    match manager.create_jumpbox(gcp_state(), &gcp_outputs()).await.unwrap() {
        RunOutcome::Failed { partial, cause } => {
            assert_eq!(partial.jumpbox.state.unwrap()["stemcells"], json!([]));
            assert_eq!(partial.jumpbox.variables, "jumpbox-vars");
            assert!(partial.jumpbox.url.is_empty());
            assert_eq!(cause.output, "timed out");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_azure_has_no_jumpbox() {
    let runner = MockRunner::new();
    let (manager, _dir) = new_manager(&runner, Iaas::Azure);

    let outcome = manager
        .create_jumpbox(State::new().with_iaas(Iaas::Azure), &Outputs::new())
        .await
        .unwrap();

    assert!(outcome.is_completed());
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn test_create_director_records_credentials() {
    let runner = MockRunner::new()
        .respond(
            "interpolate",
            MockResponse::success("director-manifest").writes_file("variables.yml", DIRECTOR_VARS),
        )
        .respond(
            "create-env",
            MockResponse::success("").writes_file("state.json", r#"{"director_id": "d-1"}"#),
        );
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);

    let state = match manager.create_director(gcp_state(), &gcp_outputs()).await.unwrap() {
        RunOutcome::Completed(state) => state,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(state.bosh.director_name, "bosh-bbl-env");
    assert_eq!(state.bosh.director_username, "admin");
    assert_eq!(state.bosh.director_password, "some-admin-password");
    assert_eq!(state.bosh.director_ssl_ca, "some-ca");
    assert_eq!(state.bosh.director_ssl_certificate, "some-certificate");
    assert_eq!(state.bosh.director_ssl_private_key, "some-private-key");
    assert_eq!(state.bosh.director_address, "https://10.0.0.6:25555");
    assert_eq!(state.bosh.manifest, "director-manifest");
    assert!(state.has_director());
}

#[tokio::test]
async fn test_create_director_with_user_ops_file() {
    let runner = MockRunner::new()
        .respond(
            "interpolate",
            MockResponse::success("first-pass").writes_file("variables.yml", DIRECTOR_VARS),
        )
        .respond("interpolate", MockResponse::success("with-user-ops"));
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);
    let mut state = gcp_state();
    state.bosh.user_ops_file = "- type: remove\n  path: /foo\n".into();

    let outcome = manager.create_director(state, &gcp_outputs()).await.unwrap();

    assert_eq!(outcome.state().bosh.manifest, "with-user-ops");
    assert_eq!(
        runner.subcommands(),
        vec!["interpolate", "interpolate", "create-env"]
    );
}

#[tokio::test]
async fn test_azure_director_address_uses_external_ip() {
    let runner = MockRunner::new()
        .respond(
            "interpolate",
            MockResponse::success("director-manifest").writes_file("variables.yml", DIRECTOR_VARS),
        )
        .respond(
            "create-env",
            MockResponse::success("").writes_file("state.json", "{}"),
        );
    let (manager, _dir) = new_manager(&runner, Iaas::Azure);
    let outputs = Outputs::new()
        .with("external_ip", "52.1.2.3")
        .with("bosh_network_name", "some-vnet")
        .with("bosh_subnet_name", "some-subnet")
        .with("bosh_resource_group_name", "some-group")
        .with("bosh_storage_account_name", "somestorage")
        .with("bosh_default_security_group", "some-sg");

    let outcome = manager
        .create_director(State::new().with_iaas(Iaas::Azure).with_env_id("bbl-env"), &outputs)
        .await
        .unwrap();

    assert_eq!(outcome.state().bosh.director_address, "https://52.1.2.3:25555");
}

#[tokio::test]
async fn test_missing_output_fails_before_bosh_runs() {
    let runner = MockRunner::new();
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);

    let err = manager
        .create_director(gcp_state(), &Outputs::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BoshError::Iaas(_)));
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn test_incomplete_vars_store_fails_before_create_env() {
    let runner = MockRunner::new().respond(
        "interpolate",
        MockResponse::success("director-manifest")
            .writes_file("variables.yml", "admin_password: some-admin-password\n"),
    );
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);

    let err = manager
        .create_director(gcp_state(), &gcp_outputs())
        .await
        .unwrap_err();

    assert!(matches!(err, BoshError::MissingVariable(ref name) if name == "director_ssl.ca"));
    assert_eq!(runner.subcommands(), vec!["interpolate"]);
}

#[tokio::test]
async fn test_jumpbox_without_external_ip_fails_before_bosh_runs() {
    let runner = MockRunner::new();
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);
    let outputs = Outputs::new().with("network_name", "some-network");

    assert!(manager.create_jumpbox(gcp_state(), &outputs).await.is_err());
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn test_delete_removes_director_then_jumpbox() {
    let runner = MockRunner::new();
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);
    let mut state = gcp_state();
    state.bosh.director_address = "https://10.0.0.6:25555".into();
    state.bosh.state = json!({"director_id": "d-1"}).as_object().cloned();
    state.bosh.user_ops_file = "some-ops".into();
    state.jumpbox.url = "35.1.2.3:22".into();
    state.jumpbox.state = json!({"current_vm_cid": "vm-1"}).as_object().cloned();

    let state = match manager.delete(state).await.unwrap() {
        RunOutcome::Completed(state) => state,
        other => panic!("expected completion, got {:?}", other),
    };

    let deletes = runner.calls_for("delete-env");
    assert_eq!(deletes.len(), 2);
    assert!(deletes[0].workdir.as_ref().unwrap().ends_with("director"));
    assert!(deletes[1].workdir.as_ref().unwrap().ends_with("jumpbox"));
    assert!(!state.bosh.is_deployed());
    assert!(!state.jumpbox.is_deployed());
    assert_eq!(state.bosh.user_ops_file, "some-ops");
}

#[tokio::test]
async fn test_failed_director_delete_keeps_jumpbox() {
    let runner = MockRunner::new().respond(
        "delete-env",
        MockResponse::failure(1, "disk in use").writes_file("state.json", r#"{"disks": ["d"]}"#),
    );
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);
    let mut state = gcp_state();
    state.bosh.state = json!({"director_id": "d-1"}).as_object().cloned();
    state.jumpbox.url = "35.1.2.3:22".into();

    let outcome = manager.delete(state).await.unwrap();

    assert!(!outcome.is_completed());
    assert_eq!(runner.calls_for("delete-env").len(), 1);
    assert_eq!(outcome.state().bosh.state.as_ref().unwrap()["disks"], json!(["d"]));
    assert_eq!(outcome.state().jumpbox.url, "35.1.2.3:22");
}

#[tokio::test]
async fn test_delete_without_deployments_is_a_no_op() {
    let runner = MockRunner::new();
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);

    let outcome = manager.delete(gcp_state()).await.unwrap();

    assert!(outcome.is_completed());
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn test_validate_version() {
    let runner = MockRunner::new().respond("-v", MockResponse::success("version 1.9.0-abc\n"));
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);
    let err = manager.validate_version().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "BOSH version must be at least v2.0.0, found v1.9.0"
    );

    let runner = MockRunner::new().respond("-v", MockResponse::success("version [DEV BUILD]\n"));
    let (manager, _dir) = new_manager(&runner, Iaas::Gcp);
    manager.validate_version().await.unwrap();
}
