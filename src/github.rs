use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{CommitRef, CommitSearchResult, Direction, FileUpdate, Repository, SortKey};
use crate::page::collect_pages;
use crate::remote::{OctocrabApi, RemoteApi};

/// Prefix list meaning "every repository"
pub const ALL_REPOSITORIES: &str = "*";

/// GitHub client facade: pagination, filtering and read-then-write updates
/// on top of a [`RemoteApi`] transport
pub struct GitHubClient<A = OctocrabApi> {
    api: A,
    username: String,
}

impl GitHubClient<OctocrabApi> {
    /// Authenticate with a personal token against the public API or `api_url`
    pub async fn authenticate(token: &str, api_url: Option<&str>) -> ApiResult<Self> {
        if token.trim().is_empty() {
            return Err(ApiError::Auth(
                "no GitHub token found. Set GH_TOKEN (or GITHUB_TOKEN) to a personal access token".to_string(),
            ));
        }

        let api = OctocrabApi::new(token.trim(), api_url)?;
        Self::connect(api).await
    }
}

impl<A: RemoteApi> GitHubClient<A> {
    /// Verify the transport's credentials and wrap it
    pub async fn connect(api: A) -> ApiResult<Self> {
        let username = api.current_user().await?;
        info!("Authenticated as GitHub user: {}", username);
        Ok(Self { api, username })
    }

    /// Get the authenticated username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// List every repository of `owner`, following pagination
    pub async fn list_repositories(
        &self,
        owner: &str,
        sort: SortKey,
        direction: Direction,
    ) -> ApiResult<Vec<Repository>> {
        debug!("Fetching repositories for {} ({} {})", owner, sort.as_str(), direction.as_str());

        let repositories = collect_pages(&format!("list repositories for {}", owner), |page| {
            self.api.list_repositories(owner, sort, direction, page)
        })
        .await?;

        info!("Found {} repositories for {}", repositories.len(), owner);
        Ok(repositories)
    }

    /// Repositories grouped by name prefix, in prefix order.
    ///
    /// `["*"]` returns the unfiltered listing. Overlapping prefixes yield the
    /// same repository once per matching prefix.
    pub async fn list_repositories_by_name_prefixes(
        &self,
        owner: &str,
        prefixes: &[String],
        sort: SortKey,
        direction: Direction,
    ) -> ApiResult<Vec<Repository>> {
        let repositories = self.list_repositories(owner, sort, direction).await?;
        Ok(filter_by_prefixes(repositories, prefixes))
    }

    /// Repositories of `owner` that are neither forks nor archived
    pub async fn get_repository_non_forked_non_archived(&self, owner: &str) -> ApiResult<Vec<Repository>> {
        let repositories = self
            .list_repositories(owner, SortKey::default(), Direction::default())
            .await?;

        let active: Vec<Repository> = repositories.into_iter().filter(Repository::is_active).collect();
        info!("{} active repositories for {}", active.len(), owner);
        Ok(active)
    }

    pub async fn get_repository(&self, owner: &str, repo: &str) -> ApiResult<Repository> {
        let repository = self.api.get_repository(owner, repo).await?;
        info!("Fetched repository {}/{}", owner, repository.name);
        Ok(repository)
    }

    /// Check a branch, falling back to a direct lookup when the listing misses it
    pub async fn branch_exists(&self, owner: &str, repo: &str, branch: &str) -> ApiResult<bool> {
        let branches = collect_pages(&format!("list branches of {}/{}", owner, repo), |page| {
            self.api.list_branches(owner, repo, page)
        })
        .await?;

        if branches.iter().any(|name| name == branch) {
            info!("Branch {} of {}/{} found in listing", branch, owner, repo);
            return Ok(true);
        }

        debug!("Branch {} not listed for {}/{}, trying direct lookup", branch, owner, repo);

        let exists = match self.api.get_branch(owner, repo, branch).await {
            Ok(name) => name == branch,
            Err(ApiError::NotFound(_)) => false,
            Err(e) => return Err(e),
        };

        info!("Branch {} of {}/{} exists: {}", branch, owner, repo, exists);
        Ok(exists)
    }

    /// Head commit of `branch`, or `None` when the branch has no history
    pub async fn get_last_commit(&self, owner: &str, repo: &str, branch: &str) -> ApiResult<Option<CommitRef>> {
        let commits = self.api.list_commits(owner, repo, branch).await?;
        let last = commits.into_iter().next();

        match &last {
            Some(commit) => info!("Head of {}/{}@{} is {}", owner, repo, branch, commit.sha),
            None => info!("{}/{}@{} has no commits", owner, repo, branch),
        }
        Ok(last)
    }

    /// Run a commit search and collect every result page
    pub async fn search_commits(&self, query: &str) -> ApiResult<Vec<CommitSearchResult>> {
        debug!("Searching commits: {}", query);

        let commits = collect_pages(&format!("search commits '{}'", query), |page| {
            self.api.search_commits(query, page)
        })
        .await?;

        info!("Commit search returned {} results", commits.len());
        Ok(commits)
    }

    pub async fn user_email(&self, login: &str) -> ApiResult<Option<String>> {
        let email = self.api.user_email(login).await?;
        info!("Public email of {}: {}", login, email.as_deref().unwrap_or("none"));
        Ok(email)
    }

    /// Overwrite a file on `branch`.
    ///
    /// The file is re-read at the branch head on every call and the write
    /// carries the SHA from that read. A commit landing in between makes the
    /// service reject the write with [`ApiError::Conflict`].
    pub async fn update_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> ApiResult<()> {
        let reference = match self.get_last_commit(owner, repo, branch).await? {
            Some(commit) => commit.sha,
            None => {
                warn!("Branch {} of {}/{} has no commits, reading by name", branch, owner, repo);
                branch.to_string()
            }
        };

        let current = self.api.get_contents(owner, repo, path, &reference).await?;
        debug!("Read {}/{}/{} at {} (sha {})", owner, repo, path, reference, current.sha);

        let update = FileUpdate {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            path: path.to_string(),
            message: message.to_string(),
            content: content.to_string(),
            sha: current.sha,
        };

        self.api.update_contents(&update).await?;

        info!("Updated {}/{}/{} on {}", owner, repo, path, branch);
        Ok(())
    }
}

/// Keep repositories whose name starts with a prefix, one group per prefix
pub fn filter_by_prefixes(repositories: Vec<Repository>, prefixes: &[String]) -> Vec<Repository> {
    if prefixes.first().map(String::as_str) == Some(ALL_REPOSITORIES) {
        return repositories;
    }

    prefixes
        .iter()
        .flat_map(|prefix| {
            repositories
                .iter()
                .filter(move |repo| repo.name.starts_with(prefix.as_str()))
                .cloned()
        })
        .collect()
}
