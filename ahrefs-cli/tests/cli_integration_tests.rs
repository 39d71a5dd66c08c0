//! End-to-End Integration Tests for the ahrefs binary
//!
//! These tests run the compiled CLI against the mock API server and check
//! exit codes and the rendered envelopes on stdout or in output files.

use std::path::Path;
use std::process::Output;

use ahrefs_cli::test_utils::{MockResponse, MockServer};
use anyhow::Result;
use serde_json::Value;
use tempfile::TempDir;
use tokio::process::Command;

/// Run the CLI with a clean environment rooted in `home`
async fn run_cli(home: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_ahrefs"))
        .args(args)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("AHREFS_API_KEY")
        .env_remove("AHREFS_BASE_URL")
        .env_remove("AHREFS_TIMEOUT")
        .env_remove("RUST_LOG")
        .output()
        .await?;
    Ok(output)
}

fn stdout_json(output: &Output) -> Result<Value> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[tokio::test]
async fn test_list_commands() -> Result<()> {
    let home = TempDir::new()?;
    let output = run_cli(home.path(), &["--list-commands"]).await?;
    assert!(output.status.success());

    let tree = stdout_json(&output)?;
    assert_eq!(tree["name"], "ahrefs");
    let names: Vec<&str> = tree["subcommands"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|sub| sub["name"].as_str())
        .collect();
    assert_eq!(names, vec!["site-explorer", "config", "completion"]);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_prints_url_without_calling_api() -> Result<()> {
    let server = MockServer::start().await?;
    let home = TempDir::new()?;

    let output = run_cli(
        home.path(),
        &[
            "se",
            "backlinks",
            "--target",
            "example.com",
            "--dry-run",
            "--api-key",
            "dry-key",
            "--base-url",
            server.url(),
        ],
    )
    .await?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let expected = format!(
        "Valid request. Would call: GET {}/site-explorer/backlinks?limit=100&mode=domain&target=example.com",
        server.url()
    );
    assert!(stdout.contains(&expected), "unexpected output: {stdout}");
    assert_eq!(server.request_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_api_key_renders_error_envelope() -> Result<()> {
    let home = TempDir::new()?;
    let output = run_cli(
        home.path(),
        &["site-explorer", "domain-rating", "--target", "example.com"],
    )
    .await?;

    assert_eq!(output.status.code(), Some(1));
    let envelope = stdout_json(&output)?;
    assert_eq!(envelope["status"], "error");
    let message = envelope["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("API key is required"));
    Ok(())
}

#[tokio::test]
async fn test_result_written_to_output_file() -> Result<()> {
    let server = MockServer::start().await?;
    server.enqueue(MockResponse::json(
        200,
        r#"{"domain_rating":{"domain_rating":91}}"#,
    ));
    let home = TempDir::new()?;
    let out_file = home.path().join("dr.json");

    let output = Command::new(env!("CARGO_BIN_EXE_ahrefs"))
        .args(["site-explorer", "domain-rating", "--target", "ahrefs.com", "-q", "-o"])
        .arg(&out_file)
        .args(["--base-url", server.url()])
        .env("HOME", home.path())
        .env("AHREFS_API_KEY", "env-key")
        .output()
        .await?;

    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let envelope: Value = serde_json::from_str(&std::fs::read_to_string(&out_file)?)?;
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["data"]["domain_rating"]["domain_rating"], 91);
    assert!(envelope["meta"]["response_time_ms"].is_u64());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header("authorization"), Some("Bearer env-key"));
    Ok(())
}

#[tokio::test]
async fn test_api_error_written_to_output_file() -> Result<()> {
    let server = MockServer::start().await?;
    server.enqueue(MockResponse::json(
        404,
        r#"{"error":{"message":"Target not found"}}"#,
    ));
    let home = TempDir::new()?;
    let out_file = home.path().join("err.json");
    let out_arg = out_file.to_string_lossy().into_owned();

    let output = run_cli(
        home.path(),
        &[
            "se",
            "top-pages",
            "--target",
            "missing.example",
            "--api-key",
            "k",
            "--base-url",
            server.url(),
            "--output",
            &out_arg,
        ],
    )
    .await?;

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(server.request_count(), 1);
    let envelope: Value = serde_json::from_str(&std::fs::read_to_string(&out_file)?)?;
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["error"]["code"], "NOT_FOUND");
    assert_eq!(envelope["error"]["message"], "Target not found");
    assert_eq!(envelope["error"]["status_code"], 404);
    Ok(())
}

#[tokio::test]
async fn test_config_set_key_then_use_it() -> Result<()> {
    let server = MockServer::start().await?;
    let home = TempDir::new()?;
    let config_path = home.path().join("custom.json");
    let config_arg = config_path.to_string_lossy().into_owned();

    let output = run_cli(
        home.path(),
        &["config", "set-key", "abcd1234efgh5678", "--config", &config_arg],
    )
    .await?;
    assert!(output.status.success());
    assert!(config_path.exists());

    let output = run_cli(home.path(), &["config", "show", "--config", &config_arg]).await?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("abcd****5678"));
    assert!(!stdout.contains("abcd1234efgh5678"));

    let output = run_cli(
        home.path(),
        &[
            "config",
            "validate",
            "--config",
            &config_arg,
            "--base-url",
            server.url(),
        ],
    )
    .await?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("API key is valid"));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/subscription-info/limits-and-usage");
    assert_eq!(
        requests[0].header("authorization"),
        Some("Bearer abcd1234efgh5678")
    );
    Ok(())
}

#[tokio::test]
async fn test_completion_script() -> Result<()> {
    let home = TempDir::new()?;
    let output = run_cli(home.path(), &["completion", "bash"]).await?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("ahrefs"));
    Ok(())
}
