// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the `questline` binary against a mock chain API and a temporary store.

use std::process::Output;

use questline_test_utils::TEST_ADDRESS;
use tempfile::TempDir;
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Cli {
    home: TempDir,
    api: Option<String>,
}

impl Cli {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            api: None,
        }
    }

    fn with_api(server: &MockServer) -> Self {
        Self {
            api: Some(server.uri()),
            ..Self::new()
        }
    }

    async fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_questline"));
        cmd.args(args)
            .current_dir(self.home.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join("config"))
            .env(
                "QUESTLINE_STORAGE_DATABASE_PATH",
                self.home.path().join("questline.db"),
            )
            .env("QUESTLINE_POLLER_INTERVAL_SECS", "1")
            .env("QUESTLINE_POLLER_MAX_WAIT_SECS", "5")
            .env("RUST_LOG", "off");
        if let Some(api) = &self.api {
            cmd.env("QUESTLINE_NETWORK_API_BASE_URL", api);
        }
        cmd.output().await.unwrap()
    }

    async fn json(&self, args: &[&str]) -> (bool, serde_json::Value) {
        let output = self.run(args).await;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let value = serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {stdout}"));
        (output.status.success(), value)
    }
}

async fn mount_tx(server: &MockServer, status: &str, repr: &str) {
    Mock::given(method("GET"))
        .and(path("/extended/v1/tx/0xabc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tx_id": "0xabc",
            "tx_status": status,
            "tx_result": {"hex": "0x", "repr": repr}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn config_prints_defaults_as_json() {
    let (ok, config) = Cli::new().json(&["config", "--json"]).await;
    assert!(ok);
    assert_eq!(config["poller"]["interval_secs"], 1, "env override applied");
    assert_eq!(config["reconcile"]["authority"]["missions"], "chain");
}

#[tokio::test]
async fn invalid_config_file_fails() {
    let cli = Cli::new();
    let file = cli.home.path().join("broken.toml");
    std::fs::write(&file, "[poller]\nintervall_secs = 3\n").unwrap();
    let output = cli.run(&["--config", file.to_str().unwrap(), "config"]).await;
    assert!(!output.status.success());
}

#[tokio::test]
async fn tx_status_reports_abort_code() {
    let server = MockServer::start().await;
    mount_tx(&server, "abort_by_response", "(err u101)").await;

    let (ok, body) = Cli::with_api(&server)
        .json(&["tx-status", "abc", "--json"])
        .await;
    assert!(ok, "a single query succeeds whatever the status");
    assert_eq!(body["tx_id"], "0xabc");
    assert_eq!(body["status"], "abort_by_response");
    assert_eq!(body["settled"], true);
    assert_eq!(body["error_code"], "u101");
}

#[tokio::test]
async fn watch_exits_nonzero_on_abort() {
    let server = MockServer::start().await;
    mount_tx(&server, "abort_by_response", "(err u101)").await;

    let (ok, body) = Cli::with_api(&server)
        .json(&["tx-status", "0xabc", "--watch", "--json"])
        .await;
    assert!(!ok);
    assert_eq!(body["error_code"], "u101");
}

#[tokio::test]
async fn watch_succeeds_on_confirmation() {
    let server = MockServer::start().await;
    mount_tx(&server, "success", "(ok true)").await;

    let (ok, body) = Cli::with_api(&server)
        .json(&["tx-status", "0xabc", "--watch", "--json"])
        .await;
    assert!(ok);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn profile_of_unknown_address_is_null() {
    let (ok, body) = Cli::new().json(&["profile", TEST_ADDRESS, "--json"]).await;
    assert!(ok);
    assert!(body.is_null());
}

#[tokio::test]
async fn bad_address_is_rejected() {
    let (ok, body) = Cli::new().json(&["profile", "not-an-address", "--json"]).await;
    assert!(!ok);
    assert_eq!(body["error"], "codec");
}

#[tokio::test]
async fn reconcile_creates_the_profile() {
    let server = MockServer::start().await;
    let cli = Cli::with_api(&server);

    let (ok, body) = cli.json(&["reconcile", TEST_ADDRESS, "--json"]).await;
    assert!(ok);
    assert_eq!(body["address"], TEST_ADDRESS);
    assert_eq!(body["profile"]["xp"], 0);

    let (ok, stored) = cli.json(&["profile", TEST_ADDRESS, "--json"]).await;
    assert!(ok);
    assert_eq!(stored["address"], TEST_ADDRESS);
}
