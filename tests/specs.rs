// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end coverage against the built `syncoor`/`syncoord` binaries.
//!
//! `syncoor`'s happy path needs a live enclave engine and container runtime,
//! so this harness only exercises the argument-parsing/exit-code contract for
//! that binary; the coordinator's full HTTP/SSE surface is driven over a real
//! bound socket since that binary has no external-engine dependency.

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Stdio};
use std::time::Duration;

#[test]
fn syncoor_help_exits_successfully() {
    Command::new(cargo_bin("syncoor"))
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn syncoor_rejects_malformed_label_with_exit_code_two() {
    Command::new(cargo_bin("syncoor"))
        .args([
            "--network", "hoodi",
            "--el", "geth",
            "--cl", "teku",
            "--label", "not-a-key-value-pair",
        ])
        .assert()
        .code(2);
}

/// Find a free TCP port by binding then immediately releasing it. There's a
/// narrow race between release and the server's own bind, acceptable for a
/// local test.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("local_addr")
        .port()
}

struct Coordinator {
    child: Child,
    base_url: String,
}

impl Coordinator {
    async fn spawn(token: Option<&str>) -> Self {
        let port = free_port();
        let base_url = format!("http://127.0.0.1:{port}");
        let mut cmd = std::process::Command::new(cargo_bin("syncoord"));
        cmd.args(["--bind", &format!("127.0.0.1:{port}")])
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(token) = token {
            cmd.args(["--token", token]);
        }
        let child = cmd.spawn().expect("spawn syncoord");

        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client
                .get(format!("{base_url}/api/v1/tests"))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Self { child, base_url }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[tokio::test]
async fn syncoord_keepalive_progress_complete_round_trip_over_http() {
    let coordinator = Coordinator::spawn(None).await;
    let client = reqwest::Client::new();

    let keepalive = json!({
        "run_id": "run-e2e-1",
        "network": "hoodi",
        "labels": {},
        "enclave_name": "sync-test-hoodi-geth-teku",
        "execution_client_info": {
            "name": "geth", "client_type": "geth", "image": "geth:latest",
            "entrypoint": [], "cmd": [], "version": null, "env_vars": {}
        },
        "consensus_client_info": {
            "name": "teku", "client_type": "teku", "image": "teku:latest",
            "entrypoint": [], "cmd": [], "version": null, "env_vars": {}
        },
        "system_info": null
    });
    let response = client
        .post(format!("{}/api/v1/tests/keepalive", coordinator.base_url))
        .json(&keepalive)
        .send()
        .await
        .expect("keepalive request");
    assert!(response.status().is_success());

    let progress = json!({"t": 1000, "b": 42, "s": 7, "de": 10, "dc": 20, "pe": 3, "pc": 5});
    let response = client
        .post(format!(
            "{}/api/v1/tests/run-e2e-1/progress",
            coordinator.base_url
        ))
        .json(&progress)
        .send()
        .await
        .expect("progress request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/api/v1/tests/run-e2e-1", coordinator.base_url))
        .send()
        .await
        .expect("detail request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("detail json");
    assert_eq!(body["data"]["run_id"], "run-e2e-1");
    assert!(body["data"]["is_running"].as_bool().unwrap_or(false));

    let complete = json!({"error": null});
    let response = client
        .post(format!(
            "{}/api/v1/tests/run-e2e-1/complete",
            coordinator.base_url
        ))
        .json(&complete)
        .send()
        .await
        .expect("complete request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/api/v1/tests/run-e2e-1", coordinator.base_url))
        .send()
        .await
        .expect("detail after complete");
    let body: Value = response.json().await.expect("detail json");
    assert_eq!(body["data"]["is_complete"], true);
    assert_eq!(body["data"]["is_running"], false);
}

#[tokio::test]
async fn syncoord_rejects_missing_bearer_token_when_configured() {
    let coordinator = Coordinator::spawn(Some("secret-token")).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/v1/tests", coordinator.base_url))
        .send()
        .await
        .expect("unauthenticated request");
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(format!("{}/api/v1/tests", coordinator.base_url))
        .bearer_auth("secret-token")
        .send()
        .await
        .expect("authenticated request");
    assert!(response.status().is_success());
}
