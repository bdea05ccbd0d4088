//! Posts the "now released" comments.
//!
//! Each target (the pull request, then every issue it closes) goes through:
//!
//! ```text
//! unchecked -> checked, marker found    -> skipped
//! unchecked -> checked, no marker       -> queued -> posted | failed
//!                                       -> deferred (comment limit reached)
//! ```
//!
//! The check for a target always completes before its post is queued, so a
//! comment left by a concurrent or earlier run is seen as late as possible.
//! Nothing is retried; a failed target stays failed for this run.

use std::fmt;

use tracing as log;

use crate::fanout::{FanOut, Failure};
use crate::github::{GithubApi, Issue, PullRequest, Release};
use crate::messages;

/// Something that can receive a release comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    PullRequest(u64),
    /// An issue, and the pull request that closed it.
    Issue { number: u64, pull_request: u64 },
}

impl Target {
    pub fn number(&self) -> u64 {
        match *self {
            Target::PullRequest(number) => number,
            Target::Issue { number, .. } => number,
        }
    }

    fn message(&self, release: &Release) -> String {
        match *self {
            Target::PullRequest(_) => messages::pull_request_message(release),
            Target::Issue { pull_request, .. } => messages::issue_message(pull_request, release),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::PullRequest(number) => write!(f, "pull request #{number}"),
            Target::Issue { number, .. } => write!(f, "issue #{number}"),
        }
    }
}

/// What happened to each target of one [`Notifier::dispatch`] call.
#[derive(Debug, Default)]
pub struct DispatchResult {
    /// Comments GitHub confirmed as created.
    pub posted: u64,
    pub already_notified: Vec<Target>,
    /// Not posted because the run's comment limit was used up.
    pub deferred: Vec<Target>,
    /// Targets whose check or post failed. Nothing was posted for a failed
    /// check.
    pub failures: Vec<Failure<Target>>,
}

/// Returns `true` if any comment on `number` carries the notifier tag,
/// whoever wrote it.
pub async fn has_notification<G: GithubApi + ?Sized>(
    github: &G,
    number: u64,
) -> anyhow::Result<bool> {
    log::info!("checking if #{number} already has a release comment");
    let comments = github.list_comments(number).await?;
    match comments.iter().find(|c| messages::is_notification(c)) {
        Some(comment) => {
            log::info!("comment {} was created by a previous run", comment.html_url);
            Ok(true)
        }
        None => Ok(false),
    }
}

pub struct Notifier<'a, G: ?Sized> {
    github: &'a G,
    fanout: &'a FanOut,
    /// Posts left before the run's limit; `None` means unlimited.
    remaining: Option<u64>,
}

impl<'a, G> Notifier<'a, G>
where
    G: GithubApi + ?Sized,
{
    pub fn new(github: &'a G, fanout: &'a FanOut) -> Self {
        Notifier {
            github,
            fanout,
            remaining: None,
        }
    }

    /// Caps the number of posts attempted across all `dispatch` calls.
    pub fn with_limit(mut self, maximum_comments: u64) -> Self {
        self.remaining = Some(maximum_comments);
        self
    }

    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    pub async fn already_notified(&self, number: u64) -> anyhow::Result<bool> {
        has_notification(self.github, number).await
    }

    /// Comments on the pull request and its linked issues, skipping any
    /// that already carry a release comment.
    pub async fn dispatch(
        &mut self,
        pr: &PullRequest,
        issues: &[Issue],
        release: &Release,
    ) -> DispatchResult {
        let github = self.github;
        let mut result = DispatchResult::default();

        let targets: Vec<Target> = std::iter::once(Target::PullRequest(pr.number))
            .chain(issues.iter().map(|issue| Target::Issue {
                number: issue.number,
                pull_request: pr.number,
            }))
            .collect();

        let checked = self
            .fanout
            .settle_all("release comment check", targets, |target| async move {
                has_notification(github, target.number()).await
            })
            .await;
        result.failures.extend(checked.failures);

        let mut queued = Vec::new();
        for (target, notified) in checked.successes {
            if notified {
                log::info!("skipping {target}: already notified");
                result.already_notified.push(target);
                continue;
            }
            match &mut self.remaining {
                Some(0) => {
                    log::warn!("skipping {target}: comment limit reached");
                    result.deferred.push(target);
                }
                Some(remaining) => {
                    *remaining -= 1;
                    queued.push(target);
                }
                None => queued.push(target),
            }
        }

        let posted = self
            .fanout
            .settle_all("release comment", queued, |target| {
                let body = target.message(release);
                async move { github.post_comment(target.number(), &body).await }
            })
            .await;
        for failure in &posted.failures {
            log::error!("could not comment on {}: {:?}", failure.key, failure.error);
        }
        result.posted = posted.successes.len() as u64;
        result.failures.extend(posted.failures);
        result
    }
}
