//! bosh executor behavior against a mock bosh CLI.

use std::path::Path;
use std::sync::Arc;

use bbl_bosh::{
    BoshError, DirectorInterpolateInput, EnvInput, Executor, JumpboxInterpolateInput, OpsFileSet,
    VERSION_DEV_BUILD,
};
use bbl_runner::{LocalFs, MockResponse, MockRunner, RunOutcome};
use bbl_state::Iaas;
use serde_json::json;
use tempfile::tempdir;

fn executor(runner: &MockRunner, dir: &Path) -> Executor {
    Executor::new(Arc::new(runner.clone()), Arc::new(LocalFs), dir)
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn path_string(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().to_string()
}

fn director_input(user: &str) -> DirectorInterpolateInput {
    DirectorInterpolateInput {
        deployment_vars: "internal_ip: 10.0.0.6\n".into(),
        variables: String::new(),
        ops: OpsFileSet::director(
            Iaas::Gcp,
            &["jumpbox-user.yml", "uaa.yml", "credhub.yml", "gcp-bosh-director-ephemeral-ip-ops.yml"],
            user,
        )
        .unwrap(),
    }
}

#[tokio::test]
async fn test_jumpbox_interpolate() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond(
        "interpolate",
        MockResponse::success("some-manifest").writes_file("variables.yml", "some-vars"),
    );

    let output = executor(&runner, dir.path())
        .jumpbox_interpolate(&JumpboxInterpolateInput {
            iaas: Iaas::Aws,
            deployment_vars: "external_ip: 1.2.3.4\n".into(),
            variables: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(output.manifest, "some-manifest");
    assert_eq!(output.variables, "some-vars");

    let jumpbox = dir.path().join("jumpbox");
    assert_eq!(read(jumpbox.join("jumpbox-deployment-vars.yml")), "external_ip: 1.2.3.4\n");
    assert_eq!(read(jumpbox.join("cpi.yml")), bbl_bosh::assets::jumpbox_cpi(Iaas::Aws));

    let call = &runner.calls_for("interpolate")[0];
    assert_eq!(call.args[1], path_string(jumpbox.join("jumpbox.yml")));
    assert!(call.args.contains(&"--var-errs".to_string()));
    assert_eq!(
        call.flag_value("--vars-store"),
        Some(path_string(jumpbox.join("variables.yml")).as_str())
    );
    assert_eq!(
        call.flag_value("--vars-file"),
        Some(path_string(jumpbox.join("jumpbox-deployment-vars.yml")).as_str())
    );
    assert_eq!(call.flag_values("-o"), vec![path_string(jumpbox.join("cpi.yml"))]);
    assert_eq!(call.workdir.as_deref(), Some(jumpbox.as_path()));
}

#[tokio::test]
async fn test_jumpbox_interpolate_reuses_vars_store() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond("interpolate", MockResponse::success("some-manifest"));

    let output = executor(&runner, dir.path())
        .jumpbox_interpolate(&JumpboxInterpolateInput {
            iaas: Iaas::Gcp,
            deployment_vars: String::new(),
            variables: "jumpbox_ssh: {}\n".into(),
        })
        .await
        .unwrap();

    assert_eq!(output.variables, "jumpbox_ssh: {}\n");
}

#[tokio::test]
async fn test_interpolate_failure_carries_output() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond(
        "interpolate",
        MockResponse::failure(1, "Expected to find variables:\n- external_ip"),
    );

    let err = executor(&runner, dir.path())
        .jumpbox_interpolate(&JumpboxInterpolateInput {
            iaas: Iaas::Gcp,
            deployment_vars: String::new(),
            variables: String::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, BoshError::Interpolate(_)));
    assert!(err.to_string().contains("- external_ip"));
}

#[tokio::test]
async fn test_director_interpolate_applies_fragments_in_order() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond(
        "interpolate",
        MockResponse::success("director-manifest").writes_file("variables.yml", "director-vars"),
    );

    let output = executor(&runner, dir.path())
        .director_interpolate(&director_input(""))
        .await
        .unwrap();

    assert_eq!(output.manifest, "director-manifest");
    assert_eq!(output.variables, "director-vars");
    assert_eq!(runner.call_count(), 1);

    let director = dir.path().join("director");
    let call = &runner.get_calls()[0];
    assert_eq!(call.args[1], path_string(director.join("bosh.yml")));
    assert_eq!(
        call.flag_values("-o"),
        vec![
            path_string(director.join("cpi.yml")),
            path_string(director.join("jumpbox-user.yml")),
            path_string(director.join("uaa.yml")),
            path_string(director.join("credhub.yml")),
            path_string(director.join("gcp-bosh-director-ephemeral-ip-ops.yml")),
        ]
    );
    assert!(read(director.join("gcp-bosh-director-ephemeral-ip-ops.yml"))
        .contains("ephemeral_external_ip"));
}

#[tokio::test]
async fn test_director_interpolate_applies_user_ops_file_second() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new()
        .respond(
            "interpolate",
            MockResponse::success("first-pass").writes_file("variables.yml", "director-vars"),
        )
        .respond("interpolate", MockResponse::success("second-pass"));

    let user_ops = "- type: replace\n  path: /name\n  value: my-director\n";
    let output = executor(&runner, dir.path())
        .director_interpolate(&director_input(user_ops))
        .await
        .unwrap();

    assert_eq!(output.manifest, "second-pass");

    let director = dir.path().join("director");
    let calls = runner.calls_for("interpolate");
    assert_eq!(calls.len(), 2);
    assert!(!calls[0]
        .flag_values("-o")
        .contains(&path_string(director.join("user-ops-file.yml")).as_str()));

    assert_eq!(calls[1].args[1], path_string(director.join("bosh-with-ops.yml")));
    assert_eq!(
        calls[1].flag_values("-o"),
        vec![path_string(director.join("user-ops-file.yml"))]
    );
    assert_eq!(read(director.join("bosh-with-ops.yml")), "first-pass");
    assert_eq!(read(director.join("user-ops-file.yml")), user_ops);
}

#[tokio::test]
async fn test_create_env_returns_state() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond(
        "create-env",
        MockResponse::success("Finished deploying")
            .writes_file("state.json", r#"{"director_id": "some-id"}"#),
    );

    let outcome = executor(&runner, dir.path())
        .create_env(&EnvInput {
            manifest: "some-manifest".into(),
            variables: "some-vars".into(),
            state: None,
            dir: "jumpbox".into(),
        })
        .await
        .unwrap();

    assert!(outcome.is_completed());
    assert_eq!(outcome.state()["director_id"], json!("some-id"));

    let jumpbox = dir.path().join("jumpbox");
    assert_eq!(read(jumpbox.join("manifest.yml")), "some-manifest");
    assert_eq!(read(jumpbox.join("variables.yml")), "some-vars");

    let call = &runner.calls_for("create-env")[0];
    assert_eq!(call.args[1], path_string(jumpbox.join("manifest.yml")));
    assert_eq!(
        call.flag_value("--state"),
        Some(path_string(jumpbox.join("state.json")).as_str())
    );
}

#[tokio::test]
async fn test_create_env_writes_previous_state() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new();
    let previous = json!({"current_vm_cid": "vm-1"}).as_object().cloned();

    let outcome = executor(&runner, dir.path())
        .create_env(&EnvInput {
            manifest: "some-manifest".into(),
            variables: "some-vars".into(),
            state: previous.clone(),
            dir: "director".into(),
        })
        .await
        .unwrap();

    assert_eq!(Some(outcome.state().clone()), previous);
}

#[tokio::test]
async fn test_failed_create_env_returns_on_disk_state() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond(
        "create-env",
        MockResponse::failure(1, "Deploying: timed out")
            .writes_file("state.json", r#"{"current_vm_cid": "vm-2"}"#),
    );

    let outcome = executor(&runner, dir.path())
        .create_env(&EnvInput {
            manifest: "some-manifest".into(),
            variables: "some-vars".into(),
            state: json!({"current_vm_cid": "vm-1"}).as_object().cloned(),
            dir: "director".into(),
        })
        .await
        .unwrap();

    match outcome {
        RunOutcome::Failed { partial, cause } => {
            assert_eq!(partial["current_vm_cid"], json!("vm-2"));
            assert_eq!(cause.command, "create-env");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_create_env_without_state_is_unrecoverable() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond("create-env", MockResponse::failure(1, "bad manifest"));

    let err = executor(&runner, dir.path())
        .create_env(&EnvInput {
            manifest: "some-manifest".into(),
            variables: "some-vars".into(),
            state: None,
            dir: "jumpbox".into(),
        })
        .await
        .unwrap_err();

    match err {
        BoshError::Unrecoverable { causes } => assert_eq!(causes.len(), 2),
        other => panic!("expected unrecoverable error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_delete_env_returns_on_disk_state() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond(
        "delete-env",
        MockResponse::failure(1, "Deleting disk: in use")
            .writes_file("state.json", r#"{"disks": ["disk-1"]}"#),
    );

    let outcome = executor(&runner, dir.path())
        .delete_env(&EnvInput {
            manifest: "some-manifest".into(),
            variables: "some-vars".into(),
            state: json!({"disks": ["disk-1"], "current_vm_cid": "vm-1"})
                .as_object()
                .cloned(),
            dir: "director".into(),
        })
        .await
        .unwrap();

    assert!(!outcome.is_completed());
    assert_eq!(outcome.state().clone(), json!({"disks": ["disk-1"]}).as_object().cloned().unwrap());
}

#[tokio::test]
async fn test_delete_env_without_state_file() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new();

    let outcome = executor(&runner, dir.path())
        .delete_env(&EnvInput {
            manifest: "some-manifest".into(),
            variables: "some-vars".into(),
            state: None,
            dir: "jumpbox".into(),
        })
        .await
        .unwrap();

    assert!(outcome.is_completed());
    assert!(outcome.state().is_empty());
}

#[tokio::test]
async fn test_version() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond(
        "-v",
        MockResponse::success("version 2.0.48-e94aeeda-2018-01-09T23:08:07Z\n\nSucceeded\n"),
    );

    let version = executor(&runner, dir.path()).version().await.unwrap();

    assert_eq!(version, "2.0.48");
}

#[tokio::test]
async fn test_version_dev_build() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond("-v", MockResponse::success("version [DEV BUILD]\n"));

    let version = executor(&runner, dir.path()).version().await.unwrap();

    assert_eq!(version, VERSION_DEV_BUILD);
}

#[tokio::test]
async fn test_version_parse_error() {
    let dir = tempdir().unwrap();
    let runner = MockRunner::new().respond("-v", MockResponse::success("unknown\n"));

    let err = executor(&runner, dir.path()).version().await.unwrap_err();

    assert_eq!(err.to_string(), "BOSH version could not be parsed");
}
