//! Run configuration.
//!
//! Every setting can come from a flag or from the environment GitHub Actions
//! provides to an action (`GITHUB_*` variables and `INPUT_*` for the
//! action's inputs). The resulting [`Config`] is passed down explicitly;
//! nothing reads the environment after startup.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use secrecy::{ExposeSecret, SecretString};

use crate::github::Repository;

pub const DEFAULT_MAXIMUM_COMMENTS: u64 = 50;

/// A token that makes the run report zero comments and stop before touching
/// git or GitHub. Used to smoke-test the action's wiring.
pub const DEBUG_TOKEN: &str = "DEBUG_TOKEN";

/// Which releases to comment about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Only the latest published release.
    Latest,
    /// Every release, oldest first. Not implemented yet.
    All,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "continuous" => Ok(Mode::Latest),
            "all" => Ok(Mode::All),
            other => Err(format!(
                "unknown mode `{other}`, expected `latest` or `all`"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Mode::Latest => "latest",
            Mode::All => "all",
        })
    }
}

/// Comments on the pull requests and issues shipped in a GitHub release.
#[derive(Parser)]
#[command(version, about)]
pub struct Args {
    /// Repository to comment on, as `owner/name`.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Repository,

    /// Local checkout of the repository, with full history and tags.
    #[arg(long, env = "GITHUB_WORKSPACE")]
    workspace: PathBuf,

    /// GitHub token used for API calls (falls back to `GITHUB_TOKEN`).
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// `latest` to comment about the latest release only.
    #[arg(long, env = "INPUT_MODE", default_value = "latest")]
    mode: Mode,

    /// Most comments to post in one run; 0 means the default.
    #[arg(long, env = "INPUT_MAXIMUM-COMMENTS")]
    maximum_comments: Option<u64>,

    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    api_url: String,

    /// Requests kept in flight at once for each batch of lookups.
    #[arg(long, env = "RELEASE_NOTIFIER_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Seconds before a single GitHub request is abandoned.
    #[arg(long, env = "RELEASE_NOTIFIER_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    /// Sleep and retry when GitHub's rate limit is hit.
    #[arg(long)]
    retry_rate_limit: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub repository: Repository,
    pub workspace: PathBuf,
    pub token: SecretString,
    pub mode: Mode,
    pub maximum_comments: u64,
    pub api_url: String,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub retry_rate_limit: bool,
}

impl Config {
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let token = args
            .token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("no GitHub token: pass --token or set GITHUB_TOKEN"))?;

        Ok(Config {
            repository: args.repository,
            workspace: args.workspace,
            token: SecretString::from(token),
            mode: args.mode,
            maximum_comments: match args.maximum_comments {
                None | Some(0) => DEFAULT_MAXIMUM_COMMENTS,
                Some(n) => n,
            },
            api_url: args.api_url,
            concurrency: args.concurrency.max(1),
            request_timeout: Duration::from_secs(args.request_timeout),
            retry_rate_limit: args.retry_rate_limit,
        })
    }

    pub fn is_debug_token(&self) -> bool {
        self.token.expose_secret() == DEBUG_TOKEN
    }
}
