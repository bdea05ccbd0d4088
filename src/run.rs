//! One release cycle: find the latest release, work out what it shipped and
//! comment on it.

use anyhow::Context;
use tracing as log;
use tracing::Instrument;

use crate::config::{Config, Mode};
use crate::fanout::FanOut;
use crate::git::{RevisionHistory, SystemGit};
use crate::github::{GithubApi, GithubClient, GithubRepo, Release};
use crate::notifier::Notifier;
use crate::release_graph::ReleaseGraph;

/// Totals for one run, for logging and the action output.
#[derive(Debug)]
pub struct RunSummary {
    pub release: Release,
    pub pull_requests: usize,
    /// Comments GitHub confirmed as created.
    pub posted: u64,
    pub already_notified: usize,
    pub deferred: usize,
    pub failures: usize,
}

/// Comments on everything the latest release shipped, posting at most
/// `maximum_comments` comments.
///
/// Pull requests are handled one after another so that an issue closed by
/// two of them is checked again after the first comment lands.
pub async fn notify_latest_release<G, H>(
    github: &G,
    history: &H,
    fanout: &FanOut,
    maximum_comments: u64,
) -> anyhow::Result<RunSummary>
where
    G: GithubApi + ?Sized,
    H: RevisionHistory + ?Sized,
{
    let release = github
        .latest_release()
        .await
        .context("could not find a release to comment about")?;
    let graph = ReleaseGraph::new(github, history, fanout);
    let pull_requests = graph
        .pull_requests_for_release(&release)
        .await
        .with_context(|| format!("failed to find what changed in {}", release.tag_name))?;

    let mut notifier = Notifier::new(github, fanout).with_limit(maximum_comments);
    let mut summary = RunSummary {
        pull_requests: pull_requests.len(),
        release,
        posted: 0,
        already_notified: 0,
        deferred: 0,
        failures: 0,
    };
    for pr in &pull_requests {
        let issues = graph.linked_issues(pr).await;
        let result = notifier.dispatch(pr, &issues, &summary.release).await;
        summary.posted += result.posted;
        summary.already_notified += result.already_notified.len();
        summary.deferred += result.deferred.len();
        summary.failures += result.failures.len();
    }

    log::info!(
        "release {}: {} pull requests, {} comments posted, {} already notified, {} deferred, {} failed",
        summary.release.tag_name,
        summary.pull_requests,
        summary.posted,
        summary.already_notified,
        summary.deferred,
        summary.failures,
    );
    Ok(summary)
}

/// Runs the configured mode against GitHub and the local checkout, and
/// returns the number of comments posted.
pub async fn run(config: &Config) -> anyhow::Result<u64> {
    let span = log::info_span!("run", repository = %config.repository, mode = %config.mode);
    async {
        log::info!("options: maximum comments {}", config.maximum_comments);
        if config.mode != Mode::Latest {
            anyhow::bail!("only the `latest` mode is currently supported");
        }
        if config.is_debug_token() {
            log::info!("debug token has been provided, exiting early");
            return Ok(0);
        }

        let history = SystemGit::open(&config.workspace)?;
        log::debug!("reading history from {}", history.path().display());
        let mut client = GithubClient::new(config.token.clone(), config.api_url.clone());
        client.set_retry_rate_limit(config.retry_rate_limit);
        let github = GithubRepo::new(client, config.repository.clone());
        log::debug!("commenting on {}", github.repository());
        let fanout = FanOut::new(config.concurrency, Some(config.request_timeout));

        let summary =
            notify_latest_release(&github, &history, &fanout, config.maximum_comments).await?;
        Ok(summary.posted)
    }
    .instrument(span)
    .await
}
