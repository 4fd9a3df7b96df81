//! Transport seam between the facade and the hosting service
//!
//! [`RemoteApi`] has one method per REST endpoint the updater touches. The
//! production implementation, [`OctocrabApi`], drives an authenticated
//! octocrab client; tests substitute a mock.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use octocrab::{params, Octocrab};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::models::{CommitRef, CommitSearchResult, Direction, FileUpdate, RemoteFile, Repository, SortKey};
use crate::page::Page;

const REPOS_PER_PAGE: u8 = 50;
const BRANCHES_PER_PAGE: u8 = 100;
const COMMITS_PER_SEARCH_PAGE: u8 = 10;

/// Raw access to the hosting service's REST endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Login of the token's owner
    async fn current_user(&self) -> ApiResult<String>;

    async fn list_repositories(
        &self,
        owner: &str,
        sort: SortKey,
        direction: Direction,
        page: u32,
    ) -> ApiResult<Page<Repository>>;

    async fn get_repository(&self, owner: &str, repo: &str) -> ApiResult<Repository>;

    /// Branch names, one page at a time
    async fn list_branches(&self, owner: &str, repo: &str, page: u32) -> ApiResult<Page<String>>;

    /// Name of a single branch looked up directly
    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> ApiResult<String>;

    /// Newest commit of `branch` first; at most one entry
    async fn list_commits(&self, owner: &str, repo: &str, branch: &str) -> ApiResult<Vec<CommitRef>>;

    async fn search_commits(&self, query: &str, page: u32) -> ApiResult<Page<CommitSearchResult>>;

    /// Read a file at `reference` (branch name or commit SHA)
    async fn get_contents(&self, owner: &str, repo: &str, path: &str, reference: &str) -> ApiResult<RemoteFile>;

    async fn update_contents(&self, update: &FileUpdate) -> ApiResult<()>;

    /// Public email of a user, if they expose one
    async fn user_email(&self, login: &str) -> ApiResult<Option<String>>;
}

/// [`RemoteApi`] backed by octocrab
pub struct OctocrabApi {
    client: Octocrab,
}

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct CommitListParams<'a> {
    sha: &'a str,
    per_page: u8,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    sort: &'static str,
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct ContentsParams<'a> {
    #[serde(rename = "ref")]
    reference: &'a str,
}

#[derive(Serialize)]
struct ContentsBody<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

impl From<octocrab::models::Repository> for Repository {
    fn from(repo: octocrab::models::Repository) -> Self {
        Repository {
            name: repo.name,
            description: repo.description,
            fork: repo.fork.unwrap_or(false),
            archived: repo.archived.unwrap_or(false),
            url: repo.html_url.unwrap_or(repo.url).to_string(),
        }
    }
}

impl From<SortKey> for params::repos::Sort {
    fn from(sort: SortKey) -> Self {
        match sort {
            SortKey::Created => params::repos::Sort::Created,
            SortKey::Updated => params::repos::Sort::Updated,
            SortKey::Pushed => params::repos::Sort::Pushed,
            SortKey::FullName => params::repos::Sort::FullName,
        }
    }
}

impl From<Direction> for params::Direction {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => params::Direction::Ascending,
            Direction::Desc => params::Direction::Descending,
        }
    }
}

#[derive(Deserialize)]
struct BranchDto {
    name: String,
}

#[derive(Deserialize)]
struct CommitDto {
    sha: String,
}

#[derive(Deserialize)]
struct SearchCommitDto {
    commit: GitCommitDto,
    repository: SearchRepoDto,
}

#[derive(Deserialize)]
struct GitCommitDto {
    message: String,
    committer: Option<GitActorDto>,
}

#[derive(Deserialize)]
struct GitActorDto {
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct SearchRepoDto {
    name: String,
    html_url: String,
}

impl From<SearchCommitDto> for CommitSearchResult {
    fn from(dto: SearchCommitDto) -> Self {
        CommitSearchResult {
            repository: dto.repository.name,
            message: dto.commit.message,
            committer_date: dto.commit.committer.and_then(|c| c.date),
            repository_url: dto.repository.html_url,
        }
    }
}

#[derive(Deserialize)]
struct ContentDto {
    path: String,
    sha: String,
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Deserialize)]
struct LoginDto {
    login: String,
}

#[derive(Deserialize)]
struct UserDto {
    email: Option<String>,
}

impl OctocrabApi {
    /// Build a client authenticated with `token`, optionally against a non-default API root
    pub fn new(token: &str, base_uri: Option<&str>) -> ApiResult<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(uri) = base_uri {
            builder = builder
                .base_uri(uri)
                .map_err(|e| ApiError::from_octocrab(e, "configure API base URI"))?;
        }

        let client = builder
            .build()
            .map_err(|e| ApiError::from_octocrab(e, "create GitHub client"))?;

        Ok(Self { client })
    }

    fn next_cursor<T>(page: &octocrab::Page<T>, operation: &str) -> ApiResult<Option<u32>> {
        page.next
            .as_ref()
            .map(|uri| Page::<T>::required_cursor(operation, &uri.to_string(), uri.query()))
            .transpose()
    }
}

/// Decode a contents payload into text
fn decode_content(dto: ContentDto, operation: &str) -> ApiResult<RemoteFile> {
    let raw = dto
        .content
        .ok_or_else(|| ApiError::Protocol(format!("{}: response has no content (is {} a directory?)", operation, dto.path)))?;

    let content = match dto.encoding.as_deref() {
        Some("base64") | None => {
            let compact: String = raw.split_whitespace().collect();
            let bytes = STANDARD
                .decode(compact)
                .map_err(|e| ApiError::Protocol(format!("{}: invalid base64 content: {}", operation, e)))?;
            String::from_utf8(bytes)
                .map_err(|e| ApiError::Protocol(format!("{}: content is not UTF-8: {}", operation, e)))?
        }
        Some(other) => {
            return Err(ApiError::Protocol(format!("{}: unsupported encoding {}", operation, other)));
        }
    };

    Ok(RemoteFile {
        path: dto.path,
        content,
        sha: dto.sha,
    })
}

#[async_trait]
impl RemoteApi for OctocrabApi {
    async fn current_user(&self) -> ApiResult<String> {
        let user: LoginDto = self
            .client
            .get("/user", None::<&()>)
            .await
            .map_err(|e| ApiError::from_octocrab(e, "get authenticated user"))?;
        Ok(user.login)
    }

    async fn list_repositories(
        &self,
        owner: &str,
        sort: SortKey,
        direction: Direction,
        page: u32,
    ) -> ApiResult<Page<Repository>> {
        let operation = format!("list repositories for {}", owner);

        let response = self
            .client
            .users(owner)
            .repos()
            .sort(sort)
            .direction(direction)
            .per_page(REPOS_PER_PAGE)
            .page(page)
            .send()
            .await
            .map_err(|e| ApiError::from_octocrab(e, &operation))?;

        let next = Self::next_cursor(&response, &operation)?;
        Ok(Page::new(response.items.into_iter().map(Repository::from).collect(), next))
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> ApiResult<Repository> {
        let repository = self
            .client
            .repos(owner, repo)
            .get()
            .await
            .map_err(|e| ApiError::from_octocrab(e, &format!("get repository {}/{}", owner, repo)))?;
        Ok(repository.into())
    }

    async fn list_branches(&self, owner: &str, repo: &str, page: u32) -> ApiResult<Page<String>> {
        let operation = format!("list branches of {}/{}", owner, repo);
        let params = PageParams {
            per_page: BRANCHES_PER_PAGE,
            page,
        };

        let response: octocrab::Page<BranchDto> = self
            .client
            .get(format!("/repos/{}/{}/branches", owner, repo), Some(&params))
            .await
            .map_err(|e| ApiError::from_octocrab(e, &operation))?;

        let next = Self::next_cursor(&response, &operation)?;
        Ok(Page::new(response.items.into_iter().map(|b| b.name).collect(), next))
    }

    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> ApiResult<String> {
        let dto: BranchDto = self
            .client
            .get(format!("/repos/{}/{}/branches/{}", owner, repo, branch), None::<&()>)
            .await
            .map_err(|e| ApiError::from_octocrab(e, &format!("get branch {} of {}/{}", branch, owner, repo)))?;
        Ok(dto.name)
    }

    async fn list_commits(&self, owner: &str, repo: &str, branch: &str) -> ApiResult<Vec<CommitRef>> {
        let params = CommitListParams { sha: branch, per_page: 1 };

        let result: Result<Vec<CommitDto>, _> = self
            .client
            .get(format!("/repos/{}/{}/commits", owner, repo), Some(&params))
            .await;

        match result.map_err(|e| ApiError::from_octocrab(e, &format!("list commits of {}/{}@{}", owner, repo, branch))) {
            Ok(commits) => Ok(commits.into_iter().map(|c| CommitRef { sha: c.sha }).collect()),
            // An empty repository answers 409 instead of an empty list
            Err(ApiError::Conflict(msg)) => {
                debug!("treating conflict as empty history: {}", msg);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn search_commits(&self, query: &str, page: u32) -> ApiResult<Page<CommitSearchResult>> {
        let operation = format!("search commits '{}'", query);
        let params = SearchParams {
            q: query,
            sort: "author-date",
            per_page: COMMITS_PER_SEARCH_PAGE,
            page,
        };

        let response: octocrab::Page<SearchCommitDto> = self
            .client
            .get("/search/commits", Some(&params))
            .await
            .map_err(|e| ApiError::from_octocrab(e, &operation))?;

        let next = Self::next_cursor(&response, &operation)?;
        Ok(Page::new(
            response.items.into_iter().map(CommitSearchResult::from).collect(),
            next,
        ))
    }

    async fn get_contents(&self, owner: &str, repo: &str, path: &str, reference: &str) -> ApiResult<RemoteFile> {
        let operation = format!("get contents {}/{}/{}@{}", owner, repo, path, reference);
        let params = ContentsParams { reference };

        let dto: ContentDto = self
            .client
            .get(format!("/repos/{}/{}/contents/{}", owner, repo, path), Some(&params))
            .await
            .map_err(|e| ApiError::from_octocrab(e, &operation))?;

        decode_content(dto, &operation)
    }

    async fn update_contents(&self, update: &FileUpdate) -> ApiResult<()> {
        let body = ContentsBody {
            message: &update.message,
            content: STANDARD.encode(update.content.as_bytes()),
            sha: &update.sha,
            branch: &update.branch,
        };

        let _: serde_json::Value = self
            .client
            .put(
                format!("/repos/{}/{}/contents/{}", update.owner, update.repo, update.path),
                Some(&body),
            )
            .await
            .map_err(|e| {
                ApiError::from_octocrab(
                    e,
                    &format!(
                        "update contents {}/{}/{} on {}",
                        update.owner, update.repo, update.path, update.branch
                    ),
                )
            })?;

        Ok(())
    }

    async fn user_email(&self, login: &str) -> ApiResult<Option<String>> {
        let user: UserDto = self
            .client
            .get(format!("/users/{}", login), None::<&()>)
            .await
            .map_err(|e| ApiError::from_octocrab(e, &format!("get user {}", login)))?;
        Ok(user.email.filter(|email| !email.is_empty()))
    }
}
