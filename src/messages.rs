//! Comment bodies posted on released pull requests and issues.
//!
//! Every body starts with an HTML comment holding [`NOTIFIER_TAG`]. GitHub
//! doesn't render it, and it is how a later run recognizes a target it (or
//! any earlier deployment) already commented on. The wording around it can
//! change freely; the tag must not.

use crate::github::{Comment, Release};

pub const NOTIFIER_TAG: &str = "__GITHUB_RELEASE_NOTIFIER__";

/// Where readers of a comment are sent to report a wrong notification.
pub const BUG_REPORT_URL: &str = "https://github.com/Chriscbr/github-release-notifier";

fn marker_line() -> String {
    format!("<!-- {NOTIFIER_TAG} -->")
}

pub fn is_notification(comment: &Comment) -> bool {
    comment.body.contains(NOTIFIER_TAG)
}

pub fn pull_request_message(release: &Release) -> String {
    format!(
        "{marker}
The changes in this pull request are now available in release [{name}]({url})! \
If you have further questions, please open a new issue that references this PR.

If this message has appeared incorrectly, please post a bug report on {BUG_REPORT_URL}. Thanks!",
        marker = marker_line(),
        name = release.display_name(),
        url = release.html_url,
    )
}

pub fn issue_message(pr_number: u64, release: &Release) -> String {
    format!(
        "{marker}
This issue has been resolved by pull request #{pr_number}, and the changes are now available \
in release [{name}]({url}). If the problem isn't resolved, please @mention a maintainer or open \
a new issue that references this one.

If this message has appeared incorrectly, please post a bug report on {BUG_REPORT_URL}. Thanks!",
        marker = marker_line(),
        name = release.display_name(),
        url = release.html_url,
    )
}
