//! Common test utilities and helpers for profile-readme tests
#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Isolated config directory plus a command builder for the binary
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_dir = temp_dir.path().join("profile-readme");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        Self { temp_dir, config_dir }
    }

    pub fn create_test_config(&self, content: &str) -> PathBuf {
        let config_path = self.config_dir.join("config.yml");
        std::fs::write(&config_path, content).expect("Failed to write test config");
        config_path
    }

    /// The binary with tokens stripped and XDG config pointed at the temp dir
    pub fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_profile-readme"));
        command
            .env_remove("GH_TOKEN")
            .env_remove("GITHUB_TOKEN")
            .env_remove("RUST_LOG")
            .env("XDG_CONFIG_HOME", self.temp_dir.path());
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("Failed to execute command")
    }
}

/// Repository JSON as returned by the listing endpoint
pub fn repo_json(owner: &str, name: &str, fork: bool) -> Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "description": format!("{} description", name),
        "fork": fork,
        "archived": false,
        "url": format!("https://api.github.com/repos/{}/{}", owner, name),
        "html_url": format!("https://github.com/{}/{}", owner, name)
    })
}

/// Commit search hit JSON
pub fn commit_json(owner: &str, repo: &str, message: &str) -> Value {
    json!({
        "sha": "0123456789abcdef",
        "commit": {
            "message": message,
            "committer": { "name": owner, "date": "2024-05-20T08:00:00Z" }
        },
        "repository": {
            "name": repo,
            "html_url": format!("https://github.com/{}/{}", owner, repo)
        }
    })
}

/// Contents API JSON for a file, base64 wrapped like the service does
pub fn contents_json(path: &str, content: &str, sha: &str) -> Value {
    json!({
        "type": "file",
        "path": path,
        "sha": sha,
        "encoding": "base64",
        "content": format!("{}\n", STANDARD.encode(content))
    })
}

pub fn error_json(message: &str) -> Value {
    json!({
        "message": message,
        "documentation_url": "https://docs.github.com/rest"
    })
}

pub async fn mount_user(server: &MockServer, login: &str) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": login, "id": 1 })))
        .mount(server)
        .await;
}

/// Serve `pages` of repositories for `owner`, linked through `Link` headers
pub async fn mount_repo_pages(server: &MockServer, owner: &str, pages: Vec<Vec<Value>>) {
    let count = pages.len();
    for (index, items) in pages.into_iter().enumerate() {
        let page = index + 1;
        let mut response = ResponseTemplate::new(200).set_body_json(Value::Array(items));
        if page < count {
            let link = format!(
                "<{}/users/{}/repos?per_page=50&page={}>; rel=\"next\"",
                server.uri(),
                owner,
                page + 1
            );
            response = response.insert_header("link", link.as_str());
        }

        Mock::given(method("GET"))
            .and(path(format!("/users/{}/repos", owner)))
            .and(query_param("page", page.to_string()))
            .respond_with(response)
            .mount(server)
            .await;
    }
}

pub async fn mount_commit_search(server: &MockServer, items: Vec<Value>) {
    let total = items.len();
    Mock::given(method("GET"))
        .and(path("/search/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": total,
            "incomplete_results": false,
            "items": items
        })))
        .mount(server)
        .await;
}

/// Branch listing and head commit of `owner/repo`
pub async fn mount_branch(server: &MockServer, owner: &str, repo: &str, branch: &str, head: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/branches", owner, repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": branch }])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/commits", owner, repo)))
        .and(query_param("sha", branch))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "sha": head }])))
        .mount(server)
        .await;
}

/// Assertion helper for command output
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
