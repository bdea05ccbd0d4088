//! Errors handling

use std::fmt;

/// Something the run asked for does not exist.
///
/// Produced by the GitHub client for any 404 response, and by the git
/// resolver when no tag precedes the release tag. Callers that need to tell
/// this apart from other failures should use [`is_not_found`], which looks
/// through any context attached on the way up.
#[derive(Debug)]
pub struct NotFound(pub String);

impl std::error::Error for NotFound {}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "not found: {}", self.0)
    }
}

pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<NotFound>())
}
