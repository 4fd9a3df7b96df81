//! Profile README update run
//!
//! One linear pass: list repositories, search recent commits, render the
//! template and push it to the owner's profile repository. Any failure aborts
//! the run; nothing is retried or resumed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ApiError;
use crate::github::GitHubClient;
use crate::models::Repository;
use crate::remote::RemoteApi;
use crate::render::{self, TemplateValues};

/// Outcome of an update run
#[derive(Debug, Clone)]
pub struct UpdateSummary {
    pub owner: String,
    pub repositories: usize,
    pub commits: usize,
    pub document: String,
    pub pushed: bool,
}

/// Renders and pushes the profile README for one owner
pub struct ProfileUpdater<'a, A: RemoteApi> {
    client: &'a GitHubClient<A>,
    config: &'a Config,
    template: String,
    dry_run: bool,
}

impl<'a, A: RemoteApi> ProfileUpdater<'a, A> {
    /// Create an updater; loads the configured template file if any
    pub fn new(client: &'a GitHubClient<A>, config: &'a Config) -> Result<Self> {
        let template = match &config.profile.template {
            Some(path) => render::load_template(path)?,
            None => render::DEFAULT_TEMPLATE.to_string(),
        };

        Ok(Self {
            client,
            config,
            template,
            dry_run: false,
        })
    }

    /// Use `template` instead of the configured one
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Render without pushing
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the update with the current time as the lookback anchor
    pub async fn run(&self) -> Result<UpdateSummary> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<UpdateSummary> {
        let github = &self.config.github;
        let profile = &self.config.profile;
        let owner = self.config.owner()?;
        let login = self.config.login()?;

        let repositories = self
            .client
            .list_repositories_by_name_prefixes(owner, &github.repos, github.sort, github.direction)
            .await
            .with_context(|| format!("Failed to list repositories for {}", owner))?;

        let newest = self.select_newest(owner, &repositories);
        let newest_repositories: String = newest.iter().map(|repo| render::repository_line(owner, repo)).collect();

        for repo in &newest {
            info!(
                repo = %repo.name,
                url = %repo.url,
                description = repo.description.as_deref().unwrap_or(""),
                "newest repository"
            );
        }

        let query = render::commit_search_query(login, now);
        let commits = self
            .client
            .search_commits(&query)
            .await
            .with_context(|| format!("Failed to search commits for {}", login))?;

        for commit in &commits {
            info!(
                repo = %commit.repository,
                summary = commit.summary(),
                date = ?commit.committer_date,
                "recent commit"
            );
        }

        let values = TemplateValues {
            commit_count: commits.len(),
            newest_repositories,
            newest_commits: commits.iter().map(|commit| render::commit_line(owner, commit)).collect(),
            full_name: profile.full_name.clone(),
            name: profile.name.clone(),
            url: profile.url.clone(),
        };
        let document = render::render(&self.template, &values);

        let mut summary = UpdateSummary {
            owner: owner.to_string(),
            repositories: newest.len(),
            commits: commits.len(),
            document,
            pushed: false,
        };

        if self.dry_run {
            info!("Dry run, not pushing {}/{}/{}", owner, owner, profile.readme_path);
            return Ok(summary);
        }

        self.push(owner, &summary.document).await?;
        summary.pushed = true;

        Ok(summary)
    }

    /// Walk the listing in order, skipping the profile repository itself (and
    /// forks unless configured), until `limit` repositories are kept
    fn select_newest<'r>(&self, owner: &str, repositories: &'r [Repository]) -> Vec<&'r Repository> {
        let github = &self.config.github;

        repositories
            .iter()
            .filter(|repo| {
                if repo.name == owner {
                    debug!("Skipping profile repository {}", repo.name);
                    return false;
                }
                if repo.fork && !github.include_forks {
                    debug!("Skipping fork {}", repo.name);
                    return false;
                }
                true
            })
            .take(github.limit)
            .collect()
    }

    async fn push(&self, owner: &str, document: &str) -> Result<()> {
        let github = &self.config.github;
        let profile = &self.config.profile;

        let exists = self
            .client
            .branch_exists(owner, owner, &github.branch)
            .await
            .with_context(|| format!("Failed to look up branch {} of {}/{}", github.branch, owner, owner))?;

        if !exists {
            return Err(ApiError::NotFound(format!("branch {} of {}/{}", github.branch, owner, owner)))
                .with_context(|| format!("Cannot update {}/{}", owner, owner));
        }

        self.client
            .update_file(
                owner,
                owner,
                &github.branch,
                &profile.readme_path,
                document,
                &profile.commit_message,
            )
            .await
            .with_context(|| format!("Failed to update {} in {}/{} on {}", profile.readme_path, owner, owner, github.branch))
    }
}
