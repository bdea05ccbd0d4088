use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing as log;

use super::{Comment, GithubApi, GithubClient, Issue, PullRequest, Release};

/// An `owner/name` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Repository {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => anyhow::bail!("expected a repository like `owner/name`, got `{s}`"),
        }
    }
}

impl Repository {
    fn url(&self, client: &GithubClient) -> String {
        format!("{}/repos/{}/{}", client.api_url, self.owner, self.name)
    }
}

/// The GitHub API, scoped to one repository.
#[derive(Clone)]
pub struct GithubRepo {
    client: GithubClient,
    repository: Repository,
}

impl GithubRepo {
    pub fn new(client: GithubClient, repository: Repository) -> Self {
        GithubRepo { client, repository }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    fn url(&self) -> String {
        self.repository.url(&self.client)
    }
}

#[async_trait]
impl GithubApi for GithubRepo {
    async fn latest_release(&self) -> anyhow::Result<Release> {
        let url = format!("{}/releases/latest", self.url());
        let release: Release = self
            .client
            .json(self.client.get(&url))
            .await
            .with_context(|| format!("{} failed to get the latest release", self.repository))?;
        log::info!(
            "latest release of {}: {} ({})",
            self.repository,
            release.display_name(),
            release.tag_name
        );
        Ok(release)
    }

    async fn pulls_for_commit(&self, sha: &str) -> anyhow::Result<Vec<PullRequest>> {
        let url = format!("{}/commits/{sha}/pulls", self.url());
        let pulls: Vec<PullRequest> = self
            .client
            .json(self.client.get(&url))
            .await
            .with_context(|| format!("{} failed to get pulls for commit {sha}", self.repository))?;
        log::info!("commit {sha}: {} pull requests found", pulls.len());
        Ok(pulls)
    }

    async fn is_pull_request_merged(&self, number: u64) -> anyhow::Result<bool> {
        let url = format!("{}/pulls/{number}/merge", self.url());
        let status = self
            .client
            .status(self.client.get(&url))
            .await
            .with_context(|| format!("{} failed to check if #{number} is merged", self.repository))?;
        log::debug!("merge check for #{number}: {status}");
        match status {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => anyhow::bail!(
                "{} unexpected status checking if #{number} is merged: {status}",
                self.repository
            ),
        }
    }

    async fn get_issue(&self, number: u64) -> anyhow::Result<Issue> {
        let url = format!("{}/issues/{number}", self.url());
        self.client
            .json(self.client.get(&url))
            .await
            .with_context(|| format!("{} failed to get issue {number}", self.repository))
    }

    async fn list_comments(&self, number: u64) -> anyhow::Result<Vec<Comment>> {
        const PER_PAGE: usize = 100;
        let mut comments = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}/issues/{number}/comments?page={page}&per_page={PER_PAGE}",
                self.url()
            );
            let new: Vec<Comment> = self
                .client
                .json(self.client.get(&url))
                .await
                .with_context(|| {
                    format!("{} failed to list comments on #{number}", self.repository)
                })?;
            let last_page = new.len() < PER_PAGE;
            comments.extend(new);
            if last_page {
                break;
            }
            page += 1;
        }
        log::debug!("#{number}: {} comments found", comments.len());
        Ok(comments)
    }

    async fn post_comment(&self, number: u64, body: &str) -> anyhow::Result<Comment> {
        #[derive(serde::Serialize)]
        struct PostComment<'a> {
            body: &'a str,
        }
        let url = format!("{}/issues/{number}/comments", self.url());
        let comment: Comment = self
            .client
            .json(self.client.post(&url).json(&PostComment { body }))
            .await
            .with_context(|| format!("{} failed to post comment on #{number}", self.repository))?;
        log::info!("commented on #{number}: {}", comment.html_url);
        Ok(comment)
    }
}
