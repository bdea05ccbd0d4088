pub(crate) mod client;
pub(crate) mod issue;
pub(crate) mod release;
pub(crate) mod repository;

use async_trait::async_trait;

pub use client::GithubClient;
pub use issue::*;
pub use release::Release;
pub use repository::{GithubRepo, Repository};

/// The GitHub operations a release run needs, for one repository.
///
/// [`GithubRepo`] talks to the REST API; tests substitute an in-memory
/// implementation.
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Fails with [`NotFound`](crate::errors::NotFound) if the repository
    /// has no published release.
    async fn latest_release(&self) -> anyhow::Result<Release>;

    /// Pull requests GitHub associates with a commit. May be empty.
    async fn pulls_for_commit(&self, sha: &str) -> anyhow::Result<Vec<PullRequest>>;

    async fn is_pull_request_merged(&self, number: u64) -> anyhow::Result<bool>;

    /// Fails with [`NotFound`](crate::errors::NotFound) if there is no issue
    /// or pull request with this number.
    async fn get_issue(&self, number: u64) -> anyhow::Result<Issue>;

    /// All comments on an issue or pull request conversation.
    async fn list_comments(&self, number: u64) -> anyhow::Result<Vec<Comment>>;

    async fn post_comment(&self, number: u64, body: &str) -> anyhow::Result<Comment>;
}
