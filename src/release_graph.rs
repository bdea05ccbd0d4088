//! Works out what a release contains: the merged pull requests between the
//! previous tag and the release tag, and the issues each of them closes.

use itertools::Itertools;
use tracing as log;

use crate::errors::is_not_found;
use crate::fanout::FanOut;
use crate::git::RevisionHistory;
use crate::github::{EntityKind, GithubApi, Issue, PullRequest, Release};
use crate::issue_links::parse_issue_numbers;
use crate::utils::dedup;

pub struct ReleaseGraph<'a, G: ?Sized, H: ?Sized> {
    github: &'a G,
    history: &'a H,
    fanout: &'a FanOut,
}

impl<'a, G, H> ReleaseGraph<'a, G, H>
where
    G: GithubApi + ?Sized,
    H: RevisionHistory + ?Sized,
{
    pub fn new(github: &'a G, history: &'a H, fanout: &'a FanOut) -> Self {
        ReleaseGraph {
            github,
            history,
            fanout,
        }
    }

    /// Merged pull requests that landed between the previous tag and this
    /// release, each listed once.
    ///
    /// Failing to resolve the previous tag or the commit range is fatal.
    /// Any individual lookup failing only drops what it would have
    /// contributed.
    pub async fn pull_requests_for_release(
        &self,
        release: &Release,
    ) -> anyhow::Result<Vec<PullRequest>> {
        log::info!("getting pull requests for release: {}", release.display_name());

        let tag = &release.tag_name;
        let previous_tag = self.history.previous_tag(tag)?;
        let commits = self.history.commits_between(&previous_tag, tag)?;
        log::info!(
            "{} commits between {previous_tag} and {tag}: [{}]",
            commits.len(),
            commits.iter().format(",")
        );

        let github = self.github;
        let candidates: Vec<PullRequest> = self
            .fanout
            .settle_all("pull request lookup", commits, |sha| async move {
                github.pulls_for_commit(&sha).await
            })
            .await
            .values()
            .into_iter()
            .flatten()
            .collect();
        let candidates = dedup(candidates);
        log::info!(
            "candidate pull requests: [{}]",
            candidates.iter().map(|pr| format!("#{}", pr.number)).format(",")
        );

        // A pull request can be associated with a commit without being what
        // merged it (e.g. one PR linked to close another), so confirm each.
        let numbers = candidates.iter().map(|pr| pr.number).collect();
        let merged = self
            .fanout
            .settle_all("merge check", numbers, |number| async move {
                github.is_pull_request_merged(number).await
            })
            .await;
        let merged_numbers: Vec<u64> = merged
            .successes
            .into_iter()
            .filter_map(|(number, merged)| merged.then_some(number))
            .collect();

        let (merged, unmerged): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|pr| merged_numbers.contains(&pr.number));
        for pr in &unmerged {
            log::info!("pull request #{} ignored because it was not merged", pr.number);
        }
        Ok(merged)
    }

    /// Issues the pull request description says it closes, in the order
    /// they are first mentioned.
    ///
    /// References that can't be fetched (nonexistent, in another
    /// repository, transient errors) and references to pull requests are
    /// dropped.
    pub async fn linked_issues(&self, pr: &PullRequest) -> Vec<Issue> {
        log::info!("getting linked issues for pull request: #{}", pr.number);

        let numbers = dedup(parse_issue_numbers(&pr.body.to_lowercase()));
        log::info!(
            "issue numbers found: [{}]",
            numbers.iter().map(|n| format!("#{n}")).format(",")
        );

        let github = self.github;
        let fetched = self
            .fanout
            .settle_all("issue lookup", numbers, |number| async move {
                github.get_issue(number).await
            })
            .await;
        for failure in &fetched.failures {
            if is_not_found(&failure.error) {
                log::info!("#{} does not exist in this repository, skipping", failure.key);
            }
        }

        fetched
            .values()
            .into_iter()
            .filter(|issue| {
                let kind = issue.kind();
                let keep = kind == EntityKind::Issue;
                if !keep {
                    log::info!("#{} is a {kind}, not an issue", issue.number);
                }
                keep
            })
            .collect()
    }
}
