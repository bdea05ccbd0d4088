use chrono::Utc;

/// A published release, as returned by `GET /repos/{owner}/{repo}/releases/latest`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Release {
    pub tag_name: String,
    /// GitHub allows releases without a title.
    #[serde(default)]
    pub name: Option<String>,
    /// The common URL for viewing this release.
    ///
    /// Example: `https://github.com/octocat/Hello-World/releases/tag/v1.0.0`
    pub html_url: String,
    #[serde(default)]
    pub published_at: Option<chrono::DateTime<Utc>>,
}

impl Release {
    /// The release title, or its tag when it has none.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.tag_name,
        }
    }
}

#[test]
fn display_name_falls_back_to_tag() {
    let release: Release = serde_json::from_str(
        r#"{"tag_name": "v1.1.0", "name": null, "html_url": "https://github.com/o/r/releases/tag/v1.1.0"}"#,
    )
    .unwrap();
    assert_eq!(release.display_name(), "v1.1.0");

    let release: Release = serde_json::from_str(
        r#"{"tag_name": "v1.1.0", "name": "Autumn release", "html_url": "u", "published_at": "2024-01-01T00:00:00Z"}"#,
    )
    .unwrap();
    assert_eq!(release.display_name(), "Autumn release");
}
