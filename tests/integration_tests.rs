//! Integration tests for profile-readme CLI commands
//! These tests run the actual binary and verify its behavior

mod common;

use assert_fs::prelude::*;
use predicates::prelude::*;

use common::*;

#[test]
fn test_cli_help() {
    let env = TestEnvironment::new();
    let output = env.run(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains_all(&stdout, &["update", "list", "init", "version"]);
}

#[test]
fn test_update_help_lists_flags() {
    let env = TestEnvironment::new();
    let output = env.run(&["update", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains_all(
        &stdout,
        &["--org", "--repos", "--branch", "--limit", "--fullname", "--login", "--template", "--dry-run"],
    );
}

#[test]
fn test_version_command() {
    let env = TestEnvironment::new();
    let output = env.run(&["version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("version: {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_update_without_token_fails() {
    let env = TestEnvironment::new();
    let output = env.run(&["update", "--login", "alice"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GH_TOKEN"), "stderr: {}", stderr);
}

#[test]
fn test_update_without_owner_fails() {
    let env = TestEnvironment::new();
    let output = env.command().env("GH_TOKEN", "ghp_test").args(["update"]).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No owner configured"), "stderr: {}", stderr);
}

#[test]
fn test_update_rejects_zero_limit() {
    let env = TestEnvironment::new();
    let output = env
        .command()
        .env("GH_TOKEN", "ghp_test")
        .args(["update", "--login", "alice", "--limit", "0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("limit must be greater than zero"), "stderr: {}", stderr);
}

#[test]
fn test_init_writes_default_config() {
    let env = TestEnvironment::new();
    let dir = assert_fs::TempDir::new().unwrap();
    let config_file = dir.child("nested").child("config.yml");
    let config_path = config_file.path().to_str().unwrap().to_string();

    let output = env.run(&["init", "--config", &config_path]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    config_file.assert(predicate::path::exists());
    config_file.assert(predicate::str::contains("branch: main"));
    config_file.assert(predicate::str::contains("token_env: GH_TOKEN"));

    let again = env.run(&["init", "--config", &config_path]);
    assert!(!again.status.success());
    let stderr = String::from_utf8_lossy(&again.stderr);
    assert!(stderr.contains("--force"), "stderr: {}", stderr);

    let forced = env.run(&["init", "--config", &config_path, "--force"]);
    assert!(forced.status.success());
}

#[test]
fn test_init_uses_xdg_config_home() {
    let env = TestEnvironment::new();
    let output = env.run(&["init"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(env.config_dir.join("config.yml").exists());
}

#[test]
fn test_invalid_config_file_is_reported() {
    let env = TestEnvironment::new();
    let config_path = env.create_test_config("github: [this is: not valid");

    let output = env.run(&["update", "--config", config_path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse config file"), "stderr: {}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dry_run_prints_rendered_readme() {
    let server = wiremock::MockServer::start().await;
    mount_user(&server, "alice").await;
    mount_repo_pages(
        &server,
        "alice",
        vec![vec![repo_json("alice", "site", false), repo_json("alice", "forked", true)]],
    )
    .await;
    mount_commit_search(&server, vec![commit_json("alice", "site", "Add dark mode")]).await;

    let env = TestEnvironment::new();
    let template = env.temp_dir.path().join("README.tpl.md");
    std::fs::write(&template, "Hi {{FULLNAME}} ({{COMMITS}})\n{{NEWEST}}{{NEWEST_COMMITS}}").unwrap();

    let config_path = env.create_test_config(&format!(
        "github:\n  login: alice\n  api_url: {}\nprofile:\n  full_name: Alice Liddell\n  template: {}\nlogging:\n  color: false\n",
        server.uri(),
        template.display()
    ));

    let mut command = env.command();
    command
        .env("GH_TOKEN", "ghp_test")
        .args(["update", "--dry-run", "--config", config_path.to_str().unwrap()]);
    let output = tokio::task::spawn_blocking(move || command.output().unwrap())
        .await
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim_end(),
        "Hi Alice Liddell (1)\n\
         - **[alice/site](https://github.com/alice/site)** site description<br/>\n\
         - **[alice/site](https://github.com/alice/site)** Add dark mode<br/>"
    );

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method != wiremock::http::Method::PUT));
}
