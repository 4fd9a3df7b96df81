use anyhow::{anyhow, bail, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::github::ALL_REPOSITORIES;
use crate::models::{Direction, SortKey};

/// Environment variable consulted when the configured one is unset
pub const FALLBACK_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Main configuration structure for the profile updater
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Repository listing and commit search settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Rendered README settings
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Token resolved from the environment, never written to disk
    #[serde(skip)]
    pub token: Option<String>,
}

/// GitHub settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// Organization whose repositories are listed
    pub org: Option<String>,

    /// User login; overrides `org` as owner and is the commit search author
    pub login: Option<String>,

    /// Repository name prefixes, `["*"]` for all
    #[serde(default = "default_repos")]
    pub repos: Vec<String>,

    /// Branch the README is committed to
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Maximum number of repositories rendered
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default)]
    pub sort: SortKey,

    #[serde(default)]
    pub direction: Direction,

    /// Include forked repositories
    #[serde(default)]
    pub include_forks: bool,

    /// Environment variable holding the token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// API root for GitHub Enterprise (public API if unset)
    pub api_url: Option<String>,
}

/// Profile README settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProfileConfig {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub name: String,
    /// Profile URL, substituted for every `{{URL}}`
    #[serde(default)]
    pub url: String,

    /// Template file; built-in template if unset
    pub template: Option<String>,

    #[serde(default = "default_readme_path")]
    pub readme_path: String,

    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

/// Values given on the command line; `Some` wins over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub org: Option<String>,
    pub login: Option<String>,
    pub repos: Option<Vec<String>>,
    pub branch: Option<String>,
    pub limit: Option<usize>,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub template: Option<String>,
    pub include_forks: bool,
}

// Default value functions
fn default_repos() -> Vec<String> {
    vec![ALL_REPOSITORIES.to_string()]
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_limit() -> usize {
    25
}
fn default_token_env() -> String {
    "GH_TOKEN".to_string()
}
fn default_readme_path() -> String {
    "README.md".to_string()
}
fn default_commit_message() -> String {
    "Update file".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            org: None,
            login: None,
            repos: default_repos(),
            branch: default_branch(),
            limit: default_limit(),
            sort: SortKey::default(),
            direction: Direction::default(),
            include_forks: false,
            token_env: default_token_env(),
            api_url: None,
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            name: String::new(),
            url: String::new(),
            template: None,
            readme_path: default_readme_path(),
            commit_message: default_commit_message(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            color: default_true(),
        }
    }
}

impl Config {
    /// Load from `path`, else the default location if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Self::default_config_path()?;
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        std::fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("profile-readme").join("config.yml"))
    }

    /// Fold command line values over the file values
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        let github = &mut self.github;
        let profile = &mut self.profile;

        if let Some(org) = overrides.org {
            github.org = Some(org);
        }
        if let Some(login) = overrides.login {
            github.login = Some(login);
        }
        if let Some(repos) = overrides.repos {
            github.repos = repos;
        }
        if let Some(branch) = overrides.branch {
            github.branch = branch;
        }
        if let Some(limit) = overrides.limit {
            github.limit = limit;
        }
        if overrides.include_forks {
            github.include_forks = true;
        }
        if let Some(full_name) = overrides.full_name {
            profile.full_name = full_name;
        }
        if let Some(name) = overrides.name {
            profile.name = name;
        }
        if let Some(url) = overrides.url {
            profile.url = url;
        }
        if let Some(template) = overrides.template {
            profile.template = Some(template);
        }
    }

    /// Read the token from the configured variable, then `GITHUB_TOKEN`
    pub fn resolve_token(&mut self) {
        self.token = [self.github.token_env.as_str(), FALLBACK_TOKEN_ENV]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .map(|token| token.trim().to_string())
            .find(|token| !token.is_empty());
    }

    /// Check the settings an update run depends on
    pub fn validate(&mut self) -> Result<()> {
        self.github.repos = self
            .github
            .repos
            .iter()
            .map(|prefix| prefix.trim().to_string())
            .filter(|prefix| !prefix.is_empty())
            .collect();

        if self.github.repos.is_empty() {
            bail!("At least one repository prefix is required (use \"*\" for all repositories)");
        }

        if self.github.limit == 0 {
            bail!("Repository limit must be greater than zero");
        }

        if self.github.branch.trim().is_empty() {
            bail!("Branch name must not be empty");
        }

        self.owner()?;
        Ok(())
    }

    /// Account whose repositories are listed: login wins over org
    pub fn owner(&self) -> Result<&str> {
        non_empty(self.github.login.as_deref())
            .or_else(|| non_empty(self.github.org.as_deref()))
            .ok_or_else(|| anyhow!("No owner configured. Pass --login or --org"))
    }

    /// Author used in the commit search
    pub fn login(&self) -> Result<&str> {
        match non_empty(self.github.login.as_deref()) {
            Some(login) => Ok(login),
            None => self.owner(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
