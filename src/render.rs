//! Markdown rendering for the profile README
//!
//! Plain placeholder substitution, nothing more. Recognized placeholders:
//!
//! - `{{COMMITS}}`: number of commits found by the search
//! - `{{NEWEST}}`: one line per newest repository
//! - `{{NEWEST_COMMITS}}`: one line per recent commit
//! - `{{FULLNAME}}`, `{{NAME}}`: display names
//! - `{{URL}}`: profile URL, every occurrence replaced

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

use crate::models::{CommitSearchResult, Repository};

/// Commit search lookback
pub const LOOKBACK_WEEKS: i64 = 16;

/// Template used when no template file is configured
pub const DEFAULT_TEMPLATE: &str = r#"### Hi there, I'm {{FULLNAME}} 👋

<sub>**~{{COMMITS}}** commits in the last 16 weeks.</sub>

⚡ Newest projects:

{{NEWEST}}
🔨 Recent commits:

{{NEWEST_COMMITS}}
---

<sub>{{NAME}} · [{{URL}}]({{URL}})</sub>
"#;

/// Values substituted into a template
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    pub commit_count: usize,
    pub newest_repositories: String,
    pub newest_commits: String,
    pub full_name: String,
    pub name: String,
    pub url: String,
}

/// Load a template from disk, expanding `~` and environment variables in the path
pub fn load_template(path: &str) -> Result<String> {
    let expanded = shellexpand::full(path).with_context(|| format!("Failed to expand template path: {}", path))?;
    std::fs::read_to_string(Path::new(expanded.as_ref()))
        .with_context(|| format!("Failed to read template file: {}", expanded))
}

/// `- **[owner/name](url)** description<br/>`
pub fn repository_line(owner: &str, repo: &Repository) -> String {
    format!(
        "- **[{}/{}]({})** {}<br/>\n",
        owner,
        repo.name,
        repo.url,
        repo.description.as_deref().unwrap_or("")
    )
}

/// `- **[owner/repo](url)** message<br/>`, first message line only
pub fn commit_line(owner: &str, commit: &CommitSearchResult) -> String {
    format!(
        "- **[{}/{}]({})** {}<br/>\n",
        owner,
        commit.repository,
        commit.repository_url,
        commit.summary()
    )
}

/// Search query for commits authored by `login` inside the lookback window
pub fn commit_search_query(login: &str, now: DateTime<Utc>) -> String {
    let since = now - Duration::weeks(LOOKBACK_WEEKS);
    format!(
        "author:{} sort:date-desc committer-date:>{}",
        login,
        since.format("%Y-%m-%d")
    )
}

/// Substitute `values` into `template`
pub fn render(template: &str, values: &TemplateValues) -> String {
    // {{NEWEST_COMMITS}} goes first so {{NEWEST}} can never match inside it
    template
        .replacen("{{NEWEST_COMMITS}}", &values.newest_commits, 1)
        .replacen("{{COMMITS}}", &values.commit_count.to_string(), 1)
        .replacen("{{NEWEST}}", &values.newest_repositories, 1)
        .replacen("{{FULLNAME}}", &values.full_name, 1)
        .replacen("{{NAME}}", &values.name, 1)
        .replace("{{URL}}", &values.url)
}
