use std::time::{Duration, SystemTime};

use anyhow::Context;
use bytes::Bytes;
use futures::{FutureExt, future::BoxFuture};
use reqwest::header::{AUTHORIZATION, HeaderMap, USER_AGENT};
use reqwest::{Client, Request, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing as log;

use crate::errors::NotFound;

#[derive(Clone)]
pub struct GithubClient {
    token: SecretString,
    client: Client,
    pub(crate) api_url: String,
    /// If `true`, requests will sleep if it hits GitHub's rate limit.
    retry_rate_limit: bool,
}

impl GithubClient {
    pub fn new(token: SecretString, api_url: String) -> Self {
        GithubClient {
            client: Client::new(),
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
            retry_rate_limit: false,
        }
    }

    /// Sets whether or not this client will retry when it hits GitHub's rate limit.
    ///
    /// Just beware that the retry may take a long time (like 30 minutes,
    /// depending on various factors).
    pub fn set_retry_rate_limit(&mut self, retry: bool) {
        self.retry_rate_limit = retry;
    }

    /// Sends the request and returns its status, without treating error
    /// statuses as failures.
    ///
    /// Used for endpoints that answer yes/no with 204/404.
    pub(crate) async fn status(&self, req: RequestBuilder) -> anyhow::Result<StatusCode> {
        let resp = self.execute(req).await?;
        Ok(resp.status())
    }

    async fn execute(&self, req: RequestBuilder) -> anyhow::Result<Response> {
        const MAX_ATTEMPTS: u32 = 2;
        log::debug!("send_req with {:?}", req);
        let req_dbg = format!("{req:?}");
        let req = req
            .build()
            .with_context(|| format!("building reqwest {req_dbg}"))?;

        let first = req
            .try_clone()
            .with_context(|| format!("request cannot be retried {req_dbg}"))?;
        let mut resp = self
            .client
            .execute(first)
            .await
            .with_context(|| format!("failed to send {req_dbg}"))?;
        if self.retry_rate_limit
            && let Some(sleep) = Self::needs_retry(&resp)
        {
            resp = self.retry(req, sleep, MAX_ATTEMPTS).await?;
        }
        Ok(resp)
    }

    async fn send_req(&self, req: RequestBuilder) -> anyhow::Result<Bytes> {
        let req_dbg = format!("{req:?}");
        let resp = self.execute(req).await?;
        let status = resp.status();
        let url = resp.url().to_string();
        let maybe_err = resp.error_for_status_ref().err();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read response body {req_dbg}"))?;
        if status == StatusCode::NOT_FOUND {
            return Err(NotFound(url).into());
        }
        if let Some(e) = maybe_err {
            return Err(anyhow::Error::new(e))
                .with_context(|| format!("response: {}", String::from_utf8_lossy(&body)));
        }

        Ok(body)
    }

    fn needs_retry(resp: &Response) -> Option<Duration> {
        Self::rate_limit_sleep(resp.status(), resp.headers())
    }

    /// How long to wait before retrying a response that hit the rate limit,
    /// or `None` if it failed for any other reason.
    fn rate_limit_sleep(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
        const REMAINING: &str = "X-RateLimit-Remaining";
        const RESET: &str = "X-RateLimit-Reset";

        if !matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS) {
            return None;
        }

        // Every response carries the remaining count; only an exhausted
        // quota makes a 403 a rate limit rather than a permission error.
        let remaining = headers.get(REMAINING)?.to_str().ok()?;
        if remaining.trim() != "0" {
            return None;
        }

        let reset_time = headers.get(RESET)?.to_str().ok()?.parse::<u64>().ok()?;
        Some(Duration::from_secs(Self::calc_sleep(reset_time) + 10))
    }

    fn calc_sleep(reset_time: u64) -> u64 {
        let epoch_time = SystemTime::UNIX_EPOCH
            .elapsed()
            .map(|d| d.as_secs())
            .unwrap_or_default();
        reset_time.saturating_sub(epoch_time)
    }

    fn retry(
        &self,
        req: Request,
        sleep: Duration,
        remaining_attempts: u32,
    ) -> BoxFuture<'_, anyhow::Result<Response>> {
        log::warn!(
            "Retrying after {} seconds, remaining attempts {}",
            sleep.as_secs(),
            remaining_attempts,
        );

        async move {
            tokio::time::sleep(sleep).await;

            let attempt = req.try_clone().context("request cannot be retried")?;
            let resp = self.client.execute(attempt).await?;
            if let Some(sleep) = Self::needs_retry(&resp)
                && remaining_attempts > 0
            {
                return self.retry(req, sleep, remaining_attempts - 1).await;
            }

            Ok(resp)
        }
        .boxed()
    }

    pub async fn json<T>(&self, req: RequestBuilder) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.send_req(req).await?;
        crate::deserialize_payload(&body)
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        log::trace!("get {:?}", url);
        self.client.get(url).configure(self)
    }

    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        log::trace!("post {:?}", url);
        self.client.post(url).configure(self)
    }
}

trait RequestSend: Sized {
    fn configure(self, g: &GithubClient) -> Self;
}

impl RequestSend for RequestBuilder {
    fn configure(self, g: &GithubClient) -> RequestBuilder {
        let mut req = self
            .header(USER_AGENT, "release-notifier")
            .header("Accept", "application/vnd.github+json");
        match reqwest::header::HeaderValue::from_maybe_shared(format!(
            "token {}",
            g.token.expose_secret()
        )) {
            Ok(mut auth) => {
                auth.set_sensitive(true);
                req = req.header(AUTHORIZATION, auth);
            }
            Err(e) => log::error!("token is not a valid header value: {e}"),
        }
        req
    }
}
