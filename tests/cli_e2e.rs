//! End-to-end CLI tests for the obplatform binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Binary isolated from the user's config file and environment.
fn obplatform(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("obplatform").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("OBPLATFORM_ENDPOINT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    obplatform(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("behaviors"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    obplatform(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("obplatform"));
}

#[test]
fn test_binary_without_subcommand_fails() {
    let home = TempDir::new().unwrap();
    obplatform(&home).assert().failure();
}

#[test]
fn test_config_show_reports_defaults() {
    let home = TempDir::new().unwrap();
    obplatform(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "endpoint = https://api.ashraeobdatabase.com",
        ))
        .stdout(predicate::str::contains("not found (using defaults)"))
        .stdout(predicate::str::contains("max_poll_attempts = unlimited"));
}

#[test]
fn test_config_show_reads_config_file_and_env_override() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("obplatform");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "endpoint = \"http://file.example\"\npoll_interval_ms = 250\nmax_poll_attempts = 9\n",
    )
    .unwrap();

    obplatform(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("config_file = loaded"))
        .stdout(predicate::str::contains("endpoint = http://file.example"))
        .stdout(predicate::str::contains("poll_interval_ms = 250"))
        .stdout(predicate::str::contains("max_poll_attempts = 9"));

    obplatform(&home)
        .env("OBPLATFORM_ENDPOINT", "http://env.example")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("endpoint = http://env.example"));
}

#[test]
fn test_invalid_config_file_fails() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("custom.toml");
    std::fs::write(&config_path, "concurrency = 4\n").unwrap();

    obplatform(&home)
        .arg("--config")
        .arg(&config_path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_invalid_endpoint_fails() {
    let home = TempDir::new().unwrap();
    obplatform(&home)
        .args(["--endpoint", "not-a-url", "behaviors"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid URL"));
}

#[tokio::test]
async fn test_behaviors_prints_json_listing() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let home = TempDir::new().unwrap();
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/api/v1/behaviors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "Appliance_Usage", "name": "Appliance Usage"}
        ])))
        .mount(&server)
        .await;

    obplatform(&home)
        .args(["-q", "--endpoint", uri.as_str(), "behaviors"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"Appliance_Usage\""));
}

#[tokio::test]
async fn test_studies_prints_behaviors_per_study() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let home = TempDir::new().unwrap();
    let uri = server.uri();

    Mock::given(method("POST"))
        .and(path("/api/v1/studies/behaviors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "1": ["Occupancy_Measurement"]
        })))
        .mount(&server)
        .await;

    obplatform(&home)
        .args(["-q", "--endpoint", uri.as_str(), "studies", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Occupancy_Measurement"));
}

#[tokio::test]
async fn test_health_unhealthy_exits_nonzero() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let home = TempDir::new().unwrap();
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    obplatform(&home)
        .args(["-q", "--endpoint", uri.as_str(), "health"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"healthy\": false"));
}

#[tokio::test]
async fn test_export_writes_archive() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let home = TempDir::new().unwrap();
    let output = home.path().join("data.zip");
    let uri = server.uri();

    Mock::given(method("POST"))
        .and(path("/api/v1/exports"))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", "/api/v1/exports/1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/exports/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK archive".to_vec()))
        .mount(&server)
        .await;

    obplatform(&home)
        .args(["-q", "--endpoint", uri.as_str(), "export"])
        .args(["-b", "Appliance_Usage,Occupancy_Measurement", "-s", "22", "-s", "11"])
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bytes_written\": 10"));

    assert_eq!(std::fs::read(&output).unwrap(), b"PK archive");
}

#[tokio::test]
async fn test_export_to_missing_directory_fails() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let home = TempDir::new().unwrap();
    let output = home.path().join("missing").join("data.zip");
    let uri = server.uri();

    obplatform(&home)
        .args(["-q", "--endpoint", uri.as_str(), "export"])
        .args(["-b", "Appliance_Usage", "-s", "22"])
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid output path"));
}
