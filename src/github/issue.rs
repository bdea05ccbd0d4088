use std::fmt;

use chrono::Utc;

use crate::utils::opt_string;

/// Which object space a number belongs to.
///
/// GitHub serves pull requests from the issues endpoints too, so an
/// "issue" fetched by number may turn out to be a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Issue,
    PullRequest,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Issue => "issue",
            EntityKind::PullRequest => "pull request",
        })
    }
}

/// An issue, as returned by `GET /repos/{owner}/{repo}/issues/{number}`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub body: String,
    /// The common URL for viewing this issue.
    ///
    /// Example: `https://github.com/octocat/Hello-World/issues/1347`
    #[serde(default)]
    pub html_url: String,
    /// Present (with a few URLs we don't need) only when the number belongs
    /// to a pull request.
    #[serde(default)]
    pub pull_request: Option<PullRequestLink>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct PullRequestLink {
    #[serde(default)]
    pub html_url: Option<String>,
}

impl Issue {
    pub fn kind(&self) -> EntityKind {
        if self.pull_request.is_some() {
            EntityKind::PullRequest
        } else {
            EntityKind::Issue
        }
    }

    pub fn is_pr(&self) -> bool {
        self.kind() == EntityKind::PullRequest
    }
}

/// A pull request, as listed by `GET /repos/{owner}/{repo}/commits/{sha}/pulls`.
///
/// `merged_at` is informational only; merge status is always confirmed with
/// a separate request before a pull request is notified.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub body: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub merged_at: Option<chrono::DateTime<Utc>>,
}

impl PartialEq for PullRequest {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(deserialize_with = "opt_string")]
    pub body: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct User {
    pub login: String,
    pub id: u64,
}
