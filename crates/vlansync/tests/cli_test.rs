//! Integration tests for the `vlansync` CLI binary.
//!
//! Argument parsing, config commands and cache commands run without any
//! network; `sync` tests point the binary at wiremock FortiGate and NetBox
//! servers.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `vlansync` binary with env isolation.
fn vlansync_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vlansync");
    cmd.env("HOME", "/tmp/vlansync-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/vlansync-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("VLANSYNC_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_config(dir: &Path, netbox: &str, fortigate: &str, extra: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[netbox]
url = "{netbox}"
api_token = "nb-secret"
max_retries = 0

[runtime]
log_level = "warn"
{extra}

[[fortigates]]
name = "fg1"
host = "{fortigate}"
api_token = "fg-secret"
"#
        ),
    )
    .unwrap();
    path
}

/// Run the binary off the async runtime so the mock servers keep serving.
async fn run_blocking(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn page(results: serde_json::Value) -> serde_json::Value {
    json!({"count": results.as_array().map_or(0, Vec::len), "next": null, "previous": null, "results": results})
}

fn access_port(id: u64, name: &str, vlan_id: u64, vid: i64) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "mode": {"value": "access", "label": "Access"},
        "untagged_vlan": {"id": vlan_id, "vid": vid, "name": format!("vlan{vid}")},
        "tagged_vlans": []
    })
}

async fn mount_two_port_switch(fortigate: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2/cmdb/switch-controller/managed-switch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": [{
                "switch-id": "SW1",
                "ports": [
                    {"port-name": "port1", "vlan": "vlan10", "allowed-vlans": []},
                    {"port-name": "port2", "vlan": "vlan10", "allowed-vlans": []}
                ]
            }]
        })))
        .mount(fortigate)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = vlansync_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    vlansync_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("sync")
            .and(predicate::str::contains("check"))
            .and(predicate::str::contains("cache"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    vlansync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vlansync"));
}

#[test]
fn test_completions_zsh() {
    vlansync_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_output_format() {
    let output = vlansync_cmd()
        .args(["--output", "xml", "sync"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("possible values"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_sync_without_config_fails() {
    vlansync_cmd()
        .arg("sync")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_config_path_honours_flag() {
    vlansync_cmd()
        .args(["--config", "/etc/vlansync/custom.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/etc/vlansync/custom.toml"));
}

#[test]
fn test_config_path_honours_env() {
    vlansync_cmd()
        .env("VLANSYNC_CONFIG", "/srv/vlansync.yaml")
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/vlansync.yaml"));
}

#[test]
fn test_config_show_redacts_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "https://netbox.example.com", "10.0.0.1", "");

    vlansync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("********")
                .and(predicate::str::contains("nb-secret").not())
                .and(predicate::str::contains("fg-secret").not()),
        );
}

#[test]
fn test_config_validate_ok() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "https://netbox.example.com/", "fg1.example.com", "");

    vlansync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK").and(predicate::str::contains("1 FortiGate")));
}

#[test]
fn test_config_validate_rejects_empty_fortigates() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "[netbox]\nurl = \"https://netbox.example.com\"\napi_token = \"x\"\n",
    )
    .unwrap();

    vlansync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "validate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("fortigates"));
}

// ── Cache commands ──────────────────────────────────────────────────

#[test]
fn test_cache_requires_cache_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "https://netbox.example.com", "fg1", "");

    vlansync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["cache", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("runtime.cache_dir"));
}

#[test]
fn test_cache_list_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("netbox_device_7_interfaces.json"), "[]").unwrap();
    let config = write_config(
        dir.path(),
        "https://netbox.example.com",
        "fg1",
        &format!("cache_dir = {:?}", cache_dir.display().to_string()),
    );

    vlansync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("netbox_device_7_interfaces"));

    vlansync_cmd()
        .arg("--config")
        .arg(&config)
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1"));

    assert!(!cache_dir.join("netbox_device_7_interfaces.json").exists());
}

// ── Sync against mock servers ───────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_missing_device_exits_fatal() {
    let fortigate = MockServer::start().await;
    let netbox = MockServer::start().await;
    mount_two_port_switch(&fortigate).await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
        .mount(&netbox)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &netbox.uri(), &fortigate.uri(), "");

    let mut cmd = vlansync_cmd();
    cmd.arg("--config").arg(&config).arg("sync");
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.lines().any(|l| l == "Missing switch in NetBox: name=SW1"),
        "stderr:\n{stderr}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_full_run_reports_json() {
    let fortigate = MockServer::start().await;
    let netbox = MockServer::start().await;
    mount_two_port_switch(&fortigate).await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/"))
        .and(query_param("name", "SW1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([{"id": 7, "name": "SW1"}]))))
        .mount(&netbox)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dcim/interfaces/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            access_port(1, "port1", 1010, 10),
            access_port(2, "port2", 1020, 20)
        ]))))
        .mount(&netbox)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&netbox)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &netbox.uri(), &fortigate.uri(), "");

    let mut cmd = vlansync_cmd();
    cmd.arg("--config").arg(&config).args(["--output", "json", "sync"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{}", combined_output(&output));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["mode"], "full");
    assert_eq!(report["outcome"], "completed");
    assert_eq!(report["switches"][0]["matched"], json!(["port1"]));
    assert_eq!(report["switches"][0]["mismatches"][0]["port"], "port2");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_budget_exhausted_exits_3() {
    let fortigate = MockServer::start().await;
    let netbox = MockServer::start().await;
    mount_two_port_switch(&fortigate).await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([{"id": 7, "name": "SW1"}]))))
        .mount(&netbox)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dcim/interfaces/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            access_port(1, "port1", 1020, 20),
            access_port(2, "port2", 1020, 20)
        ]))))
        .mount(&netbox)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/ipam/vlans/"))
        .and(query_param("vid", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"id": 1010, "vid": 10, "name": "vlan10"}
        ]))))
        .mount(&netbox)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/dcim/interfaces/1/"))
        .and(body_json(json!({"mode": "access", "untagged_vlan": 1010, "tagged_vlans": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(access_port(1, "port1", 1010, 10)))
        .expect(1)
        .mount(&netbox)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/dcim/interfaces/2/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&netbox)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dcim/interfaces/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(access_port(1, "port1", 1010, 10)))
        .mount(&netbox)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &netbox.uri(), &fortigate.uri(), "");

    let mut cmd = vlansync_cmd();
    cmd.arg("--config")
        .arg(&config)
        .args(["sync", "--switch", "SW1", "--max-updates", "1"]);
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    let text = combined_output(&output);
    assert!(text.contains("budget_exhausted"), "{text}");
    assert!(text.contains("verified"), "{text}");
}
