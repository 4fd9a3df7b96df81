//! Domain snapshots returned by the remote API
//!
//! These are immutable views of remote state. Nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository listing sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Created,
    #[default]
    Updated,
    Pushed,
    FullName,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Created => "created",
            SortKey::Updated => "updated",
            SortKey::Pushed => "pushed",
            SortKey::FullName => "full_name",
        }
    }
}

/// Repository listing sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// A repository as listed by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub description: Option<String>,
    pub fork: bool,
    pub archived: bool,
    /// Canonical web URL
    pub url: String,
}

impl Repository {
    /// Neither a fork nor archived
    pub fn is_active(&self) -> bool {
        !self.fork && !self.archived
    }
}

/// A single hit from the commit search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSearchResult {
    pub repository: String,
    pub message: String,
    pub committer_date: Option<DateTime<Utc>>,
    pub repository_url: String,
}

impl CommitSearchResult {
    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim_end()
    }
}

/// Head commit of a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub sha: String,
}

/// File contents together with the SHA that authorizes overwriting them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    pub sha: String,
}

/// A contents write request. `sha` must come from a read made for this write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdate {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub message: String,
    pub content: String,
    pub sha: String,
}
