//! `bastionctl` runs against the mock appliance with a temporary state file

mod common;

use clap::Parser;
use common::MockBastion;
use serde_json::Value;
use std::path::Path;
use wallix_bastion_provider::cli::{self, state::State, Cli};

const PROVIDER: &str = "provider:\n  ip: bastion.test\n  token: test-key\n  user: admin\n  api_version: v3.12\n";

async fn bastionctl(url: &str, dir: &Path, args: &[&str]) -> anyhow::Result<()> {
    let config = dir.join("bastion.yaml");
    let state = dir.join("state.json");
    let mut argv = vec!["bastionctl"];
    argv.extend_from_slice(args);
    let config = config.to_str().unwrap();
    let state = state.to_str().unwrap();
    argv.extend_from_slice(&["-c", config, "--state", state, "--base-url", url]);
    cli::run(Cli::parse_from(argv)).await
}

fn write_config(dir: &Path, resources: &str) {
    std::fs::write(dir.join("bastion.yaml"), format!("{PROVIDER}{resources}")).unwrap();
}

#[tokio::test]
async fn test_apply_records_state_and_removes_orphans() {
    let (mock, url) = MockBastion::start().await;
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        "resources:\n  cluster.web:\n    cluster_name: web\n    accounts: [admin@local@srv1]\n  \
         cluster.db:\n    cluster_name: db\n    accounts: [dba@local@pg1]\n",
    );

    bastionctl(&url, dir.path(), &["apply"]).await.unwrap();
    let state = State::load(&dir.path().join("state.json")).unwrap();
    assert_eq!(state.addresses(), ["wallix-bastion_cluster.web", "wallix-bastion_cluster.db"]);
    assert_eq!(mock.objects("clusters").await.len(), 2);

    // A second apply only reads
    let before = mock.requests().await.len();
    bastionctl(&url, dir.path(), &["apply"]).await.unwrap();
    let requests = mock.requests().await;
    assert!(requests[before..].iter().all(|r| r.starts_with("GET")), "{requests:?}");

    write_config(
        dir.path(),
        "resources:\n  cluster.web:\n    cluster_name: web\n    accounts: [admin@local@srv1]\n",
    );
    bastionctl(&url, dir.path(), &["apply"]).await.unwrap();
    let state = State::load(&dir.path().join("state.json")).unwrap();
    assert_eq!(state.addresses(), ["wallix-bastion_cluster.web"]);
    let remaining = mock.objects("clusters").await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["cluster_name"], "web");
}

#[tokio::test]
async fn test_import_then_destroy() {
    let (mock, url) = MockBastion::start().await;
    mock.insert("clusters", serde_json::json!({"cluster_name": "ops", "accounts": ["root@local@srv"]}))
        .await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "");

    bastionctl(&url, dir.path(), &["import", "cluster.ops", "ops"]).await.unwrap();
    let state = State::load(&dir.path().join("state.json")).unwrap();
    let ops = state.get("wallix-bastion_cluster.ops").unwrap();
    assert_eq!(ops.attributes["accounts"], serde_json::json!(["root@local@srv"]));

    let err = bastionctl(&url, dir.path(), &["import", "cluster.ops", "ops"]).await.unwrap_err();
    assert!(err.to_string().contains("already managed"));

    bastionctl(&url, dir.path(), &["destroy"]).await.unwrap();
    assert!(mock.objects("clusters").await.is_empty());
    let text = std::fs::read_to_string(dir.path().join("state.json")).unwrap();
    let saved: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(saved["resources"], serde_json::json!([]));
}

#[tokio::test]
async fn test_validate_needs_no_appliance() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "resources:\n  cluster.empty:\n    cluster_name: empty\n");
    // No target kind given
    let err = bastionctl("http://127.0.0.1:9/api", dir.path(), &["validate"]).await.unwrap_err();
    assert!(err.to_string().contains("1 error"));
}
