//! Reads the commit and tag graph of the local checkout.
//!
//! The checkout is never fetched or modified here. It must already carry the
//! full history and tags (in GitHub Actions, `actions/checkout` with
//! `fetch-depth: 0`), otherwise the previous tag cannot be described.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Context;
use tracing as log;

use crate::errors::NotFound;

/// A full commit hash.
pub type CommitSha = String;

/// The questions the release pipeline asks of revision history.
pub trait RevisionHistory: Send + Sync {
    /// The nearest tag reachable from the parent of `tag`.
    ///
    /// Fails with [`NotFound`] if `tag` is the first tag, or if the history
    /// is too shallow to reach an older one.
    fn previous_tag(&self, tag: &str) -> anyhow::Result<String>;

    /// Commits reachable from `to` but not from `from`, newest first.
    ///
    /// Empty when both tags point at the same commit.
    fn commits_between(&self, from: &str, to: &str) -> anyhow::Result<Vec<CommitSha>>;
}

/// Revision history read by running the system `git`.
#[derive(Debug, Clone)]
pub struct SystemGit {
    repo_path: PathBuf,
}

impl SystemGit {
    /// Opens the repository at `path`, failing if it isn't a git checkout.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let git = SystemGit {
            repo_path: path.to_path_buf(),
        };
        let output = git
            .run(&["rev-parse", "--git-dir"])
            .with_context(|| format!("failed to inspect {}", path.display()))?;
        if !output.status.success() {
            anyhow::bail!(
                "{} is not a git checkout: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(git)
    }

    pub fn path(&self) -> &Path {
        &self.repo_path
    }

    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_path);
        // Don't let a user's pager or locale leak into parsed output.
        cmd.env("GIT_PAGER", "cat").env("LC_ALL", "C");
        cmd
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<Output> {
        log::trace!("git {}", args.join(" "));
        self.git_cmd()
            .args(args)
            .output()
            .with_context(|| format!("failed to execute `git {}`", args.join(" ")))
    }

    /// Runs git and returns trimmed stdout, failing on a non-zero exit.
    fn stdout(&self, args: &[&str]) -> anyhow::Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            anyhow::bail!(
                "`git {}` failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8(output.stdout)
            .context("git output was not utf-8")?
            .trim()
            .to_string())
    }

    fn is_shallow(&self) -> bool {
        self.stdout(&["rev-parse", "--is-shallow-repository"])
            .is_ok_and(|out| out == "true")
    }
}

impl RevisionHistory for SystemGit {
    fn previous_tag(&self, tag: &str) -> anyhow::Result<String> {
        let parent = format!("{tag}^");
        let output = self.run(&["describe", "--tags", "--abbrev=0", &parent])?;
        if output.status.success() {
            let previous = String::from_utf8_lossy(&output.stdout).trim().to_string();
            log::debug!("previous tag of {tag} is {previous}");
            return Ok(previous);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut reason = format!("no tag before {tag} ({})", stderr.trim());
        if self.is_shallow() {
            reason.push_str("; the checkout is shallow, fetch the full history and tags first");
        }
        Err(NotFound(reason).into())
    }

    fn commits_between(&self, from: &str, to: &str) -> anyhow::Result<Vec<CommitSha>> {
        let range = format!("{from}..{to}");
        let out = self.stdout(&["rev-list", &range])?;
        Ok(out.lines().map(str::to_string).collect())
    }
}
