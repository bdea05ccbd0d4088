//! Full runs: a real git checkout with tags, and the fake GitHub API.

use std::process::Command;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;

use release_notifier::config::{Config, Mode};
use release_notifier::messages::NOTIFIER_TAG;
use release_notifier::run::run;

use crate::common::{
    CommentStore, Events, HttpServerHandle, Method, Response, TestBuilder, TestRepo,
    comment_routes,
};

/// `v1.0.0`, then three commits and `v1.1.0`. The middle commit is pull
/// request #42, which closes issues #10 and #11.
fn release_repo() -> (TestRepo, String) {
    let repo = TestRepo::new();
    repo.commit("initial");
    repo.tag("v1.0.0");
    repo.commit("c1");
    let merge = repo.commit("Merge pull request #42");
    repo.commit("c3");
    repo.tag("v1.1.0");
    (repo, merge)
}

fn serve(merge_sha: String, store: &CommentStore, events: &Events) -> HttpServerHandle {
    let builder = TestBuilder::default()
        .api_handler(
            Method::GET,
            "repos/octocat/hello-world/releases/latest",
            |_| {
                Response::new().json(json!({
                    "tag_name": "v1.1.0",
                    "name": "v1.1.0",
                    "html_url": "https://github.com/octocat/hello-world/releases/tag/v1.1.0",
                }))
            },
        )
        .api_handler(
            Method::GET,
            "repos/octocat/hello-world/commits/{sha}/pulls",
            move |req| {
                if req.components["sha"] == merge_sha {
                    Response::new().json(json!([{
                        "number": 42,
                        "title": "Fix crashes",
                        "body": "Fixes #10 and closes #11",
                        "html_url": "https://github.com/octocat/hello-world/pull/42",
                    }]))
                } else {
                    Response::new().json(json!([]))
                }
            },
        )
        .api_handler(
            Method::GET,
            "repos/octocat/hello-world/pulls/{number}/merge",
            |req| match req.number("number") {
                42 => Response::new().status(204),
                _ => Response::not_found(),
            },
        )
        .api_handler(
            Method::GET,
            "repos/octocat/hello-world/issues/{number}",
            |req| match req.number("number") {
                n @ (10 | 11) => Response::new().json(json!({
                    "number": n,
                    "title": format!("Bug {n}"),
                    "body": null,
                    "html_url": format!("https://github.com/octocat/hello-world/issues/{n}"),
                })),
                _ => Response::not_found(),
            },
        );
    comment_routes(builder, store).serve(events.clone())
}

fn config(repo: &TestRepo, server: &HttpServerHandle) -> Config {
    Config {
        repository: "octocat/hello-world".parse().unwrap(),
        workspace: repo.path().to_path_buf(),
        token: SecretString::from("sekrit-token"),
        mode: Mode::Latest,
        maximum_comments: 50,
        api_url: server.url(),
        concurrency: 4,
        request_timeout: Duration::from_secs(10),
        retry_rate_limit: false,
    }
}

#[tokio::test]
async fn notifies_once_per_release() {
    let (repo, merge) = release_repo();
    let store = CommentStore::default();
    let events = Events::new();
    let server = serve(merge, &store, &events);
    let config = config(&repo, &server);

    assert_eq!(run(&config).await.unwrap(), 3);
    for number in [42, 10, 11] {
        let bodies = store.bodies(number);
        assert_eq!(bodies.len(), 1, "#{number}: {bodies:?}");
        assert!(bodies[0].contains(NOTIFIER_TAG));
        assert!(
            bodies[0].contains("https://github.com/octocat/hello-world/releases/tag/v1.1.0")
        );
    }
    assert!(store.bodies(11)[0].contains("#42"));

    assert_eq!(run(&config).await.unwrap(), 0);
    for number in [42, 10, 11] {
        assert_eq!(store.bodies(number).len(), 1);
    }
}

#[tokio::test]
async fn maximum_comments_caps_the_run() {
    let (repo, merge) = release_repo();
    let store = CommentStore::default();
    let events = Events::new();
    let server = serve(merge, &store, &events);
    let mut config = config(&repo, &server);
    config.maximum_comments = 1;

    assert_eq!(run(&config).await.unwrap(), 1);
    assert_eq!(store.bodies(42).len(), 1);
    // The rest are picked up by the next run.
    assert_eq!(run(&config).await.unwrap(), 1);
    assert_eq!(run(&config).await.unwrap(), 1);
    assert_eq!(run(&config).await.unwrap(), 0);
}

#[tokio::test]
async fn all_mode_is_rejected() {
    let (repo, merge) = release_repo();
    let store = CommentStore::default();
    let events = Events::new();
    let server = serve(merge, &store, &events);
    let mut config = config(&repo, &server);
    config.mode = Mode::All;

    assert!(run(&config).await.is_err());
    events.assert_eq(&[]);
}

#[test]
fn debug_token_reports_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output_file = dir.path().join("output");
    let output = Command::new(env!("CARGO_BIN_EXE_release-notifier"))
        .args([
            "--repository",
            "octocat/hello-world",
            "--workspace",
            "/nonexistent",
            "--token",
            "DEBUG_TOKEN",
        ])
        .env_remove("INPUT_MODE")
        .env_remove("INPUT_MAXIMUM-COMMENTS")
        .env("GITHUB_OUTPUT", &output_file)
        .env("DISABLE_COLOR", "1")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0");
    let written = std::fs::read_to_string(&output_file).unwrap();
    assert_eq!(written.trim(), "total-comments=0");
}
