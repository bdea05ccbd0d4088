//! `GithubRepo` tests.
//!
//! These tests exercise the REST calls against a fake API served by
//! [`HttpServer`](super::common::HttpServer): each test registers the routes
//! it needs, runs one operation and checks both the result and the requests
//! that were made.

use secrecy::SecretString;
use serde_json::json;

use release_notifier::errors::is_not_found;
use release_notifier::github::{EntityKind, GithubApi, GithubClient, GithubRepo};

use crate::common::{
    CommentStore, Events, HttpServerHandle, Method, Response, TestBuilder, comment_routes,
};

fn repo(server: &HttpServerHandle) -> GithubRepo {
    let client = GithubClient::new(SecretString::from("sekrit-token"), server.url());
    GithubRepo::new(client, "octocat/hello-world".parse().unwrap())
}

#[tokio::test]
async fn latest_release() {
    let events = Events::new();
    let server = TestBuilder::default()
        .api_handler(
            Method::GET,
            "repos/octocat/hello-world/releases/latest",
            |req| {
                assert_eq!(req.headers["authorization"], "token sekrit-token");
                assert_eq!(req.headers["user-agent"], "release-notifier");
                Response::new().json(json!({
                    "tag_name": "v1.1.0",
                    "name": null,
                    "html_url": "https://github.com/octocat/hello-world/releases/tag/v1.1.0",
                    "published_at": "2024-03-01T12:00:00Z",
                    "draft": false,
                }))
            },
        )
        .serve(events.clone());

    let gh = repo(&server);
    assert_eq!(gh.repository().to_string(), "octocat/hello-world");
    let release = gh.latest_release().await.unwrap();
    assert_eq!(release.tag_name, "v1.1.0");
    assert_eq!(release.display_name(), "v1.1.0");
    events.assert_eq(&[(Method::GET, "/repos/octocat/hello-world/releases/latest")]);
}

#[tokio::test]
async fn no_release_is_not_found() {
    let events = Events::new();
    let server = TestBuilder::default().serve(events.clone());

    let err = repo(&server).latest_release().await.unwrap_err();
    assert!(is_not_found(&err), "{err:?}");
}

#[tokio::test]
async fn pulls_for_commit() {
    let events = Events::new();
    let server = TestBuilder::default()
        .api_handler(
            Method::GET,
            "repos/octocat/hello-world/commits/{sha}/pulls",
            |req| {
                assert_eq!(req.components["sha"], "abc123");
                Response::new().json(json!([{
                    "number": 42,
                    "title": "Fix the crash",
                    "body": "Fixes #10 and closes #11",
                    "html_url": "https://github.com/octocat/hello-world/pull/42",
                    "merged_at": "2024-02-28T09:00:00Z",
                    "state": "closed",
                }]))
            },
        )
        .serve(events.clone());

    let pulls = repo(&server).pulls_for_commit("abc123").await.unwrap();
    assert_eq!(pulls.len(), 1);
    assert_eq!(pulls[0].number, 42);
    assert_eq!(pulls[0].body, "Fixes #10 and closes #11");
}

#[tokio::test]
async fn merge_check() {
    let events = Events::new();
    let server = TestBuilder::default()
        .api_handler(
            Method::GET,
            "repos/octocat/hello-world/pulls/{number}/merge",
            |req| match req.number("number") {
                42 => Response::new().status(204),
                43 => Response::not_found(),
                _ => Response::new().status(500),
            },
        )
        .serve(events.clone());

    let gh = repo(&server);
    assert!(gh.is_pull_request_merged(42).await.unwrap());
    assert!(!gh.is_pull_request_merged(43).await.unwrap());
    assert!(gh.is_pull_request_merged(44).await.is_err());
}

#[tokio::test]
async fn get_issue_and_pull_request() {
    let events = Events::new();
    let server = TestBuilder::default()
        .api_handler(
            Method::GET,
            "repos/octocat/hello-world/issues/{number}",
            |req| match req.number("number") {
                10 => Response::new().json(json!({
                    "number": 10,
                    "title": "Crash on start",
                    "body": null,
                    "html_url": "https://github.com/octocat/hello-world/issues/10",
                })),
                12 => Response::new().json(json!({
                    "number": 12,
                    "title": "Another fix",
                    "body": "",
                    "html_url": "https://github.com/octocat/hello-world/pull/12",
                    "pull_request": {"html_url": "https://github.com/octocat/hello-world/pull/12"},
                })),
                _ => Response::not_found(),
            },
        )
        .serve(events.clone());

    let gh = repo(&server);
    assert_eq!(gh.get_issue(10).await.unwrap().kind(), EntityKind::Issue);
    assert_eq!(
        gh.get_issue(12).await.unwrap().kind(),
        EntityKind::PullRequest
    );
    let err = gh.get_issue(99).await.unwrap_err();
    assert!(is_not_found(&err), "{err:?}");
}

#[tokio::test]
async fn list_comments_follows_pages() {
    let events = Events::new();
    let store = CommentStore::default();
    for i in 0..150 {
        store.add(7, &format!("comment {i}"), "someone");
    }
    let server = comment_routes(TestBuilder::default(), &store).serve(events.clone());

    let comments = repo(&server).list_comments(7).await.unwrap();
    assert_eq!(comments.len(), 150);
    assert_eq!(comments[149].body, "comment 149");
    assert_eq!(
        events.count(Method::GET, "/repos/octocat/hello-world/issues/7/comments"),
        2
    );
}

#[tokio::test]
async fn post_comment() {
    let events = Events::new();
    let store = CommentStore::default();
    let server = comment_routes(TestBuilder::default(), &store).serve(events.clone());

    let comment = repo(&server).post_comment(10, "hello").await.unwrap();
    assert_eq!(comment.body, "hello");
    assert_eq!(store.bodies(10), vec!["hello".to_string()]);
    events.assert_eq(&[(Method::POST, "/repos/octocat/hello-world/issues/10/comments")]);
}

#[tokio::test]
async fn server_error_is_reported() {
    let events = Events::new();
    let server = TestBuilder::default()
        .api_handler(
            Method::GET,
            "repos/octocat/hello-world/commits/{sha}/pulls",
            |_| {
                Response::new()
                    .status(502)
                    .json(json!({"message": "Bad Gateway"}))
            },
        )
        .serve(events.clone());

    let err = repo(&server).pulls_for_commit("abc123").await.unwrap_err();
    assert!(!is_not_found(&err));
    assert!(format!("{err:#}").contains("Bad Gateway"), "{err:#}");
}

#[tokio::test]
async fn permission_denied_is_not_retried() {
    let events = Events::new();
    let server = TestBuilder::default()
        .api_handler(
            Method::POST,
            "repos/octocat/hello-world/issues/{number}/comments",
            |_| {
                let mut resp = Response::new()
                    .status(403)
                    .json(json!({"message": "Resource not accessible by integration"}));
                resp.headers.push("X-RateLimit-Remaining: 4999".to_string());
                resp.headers.push("X-RateLimit-Reset: 99999999999".to_string());
                resp
            },
        )
        .serve(events.clone());

    let mut client = GithubClient::new(SecretString::from("sekrit-token"), server.url());
    client.set_retry_rate_limit(true);
    let gh = GithubRepo::new(client, "octocat/hello-world".parse().unwrap());

    let err = tokio::time::timeout(std::time::Duration::from_secs(10), gh.post_comment(10, "hi"))
        .await
        .expect("a permission error must not wait for the rate limit reset")
        .unwrap_err();
    assert!(format!("{err:#}").contains("not accessible"), "{err:#}");
    events.assert_eq(&[(Method::POST, "/repos/octocat/hello-world/issues/10/comments")]);
}
