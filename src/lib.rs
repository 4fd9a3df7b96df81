//! profile-readme - GitHub Profile README Updater
//!
//! Renders a markdown profile README from an account's newest repositories
//! and recent commits, then commits it back to the `<owner>/<owner>`
//! profile repository through the GitHub contents API.
//!
//! ## Modules
//!
//! - [`config`]: Configuration file, command line overrides and validation
//! - [`github`]: GitHub API facade (pagination, filtering, read-then-write updates)
//! - [`remote`]: Transport seam and the octocrab-backed implementation
//! - [`render`]: Template placeholders and fragment formatting
//! - [`update`]: The end-to-end update run

pub mod config;
pub mod error;
pub mod github;
pub mod models;
pub mod page;
pub mod remote;
pub mod render;
pub mod update;

pub use config::Config;
pub use error::ApiError;
pub use github::GitHubClient;
pub use update::{ProfileUpdater, UpdateSummary};
