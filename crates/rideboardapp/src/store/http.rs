//! Shared HTTP plumbing for hosted stores.
//!
//! Maps transport outcomes onto the store error taxonomy:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | 2xx | `Ok(HttpReply)` with the parsed JSON body (`None` if empty) |
//! | 4xx | `RemoteRejected { status, message }`, never retried |
//! | 5xx | retried, then `RemoteUnavailable` |
//! | connect/timeout/body error | retried, then `RemoteUnavailable` |
//!
//! Only idempotent methods are retried. A `POST` is sent exactly once: a create that
//! timed out may still have been applied, and the repository reconciles that case itself.

use crate::error::{RideboardError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 120,
        }
    }
}

#[derive(Debug)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: Option<Value>,
}

pub struct HttpClient {
    client: reqwest::Client,
    headers: HeaderMap,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, headers: HeaderMap, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RideboardError::Config(format!("cannot build http client: {e}")))?;
        Ok(Self {
            client,
            headers,
            retry,
        })
    }

    pub async fn get(&self, url: &str) -> Result<HttpReply> {
        self.send(Method::GET, url, None, HeaderMap::new()).await
    }

    pub async fn post(&self, url: &str, body: &Value, extra: HeaderMap) -> Result<HttpReply> {
        self.send(Method::POST, url, Some(body), extra).await
    }

    pub async fn put(&self, url: &str, body: &Value) -> Result<HttpReply> {
        self.send(Method::PUT, url, Some(body), HeaderMap::new())
            .await
    }

    pub async fn delete(&self, url: &str) -> Result<HttpReply> {
        self.send(Method::DELETE, url, None, HeaderMap::new()).await
    }

    #[instrument(name = "store_http_send", skip(self, body, extra))]
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        extra: HeaderMap,
    ) -> Result<HttpReply> {
        let max_attempts = if method == Method::POST {
            1
        } else {
            self.retry.max_attempts.max(1)
        };
        let mut headers = self.headers.clone();
        headers.extend(extra);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut req = self
                .client
                .request(method.clone(), url)
                .headers(headers.clone());
            if let Some(body) = body {
                req = req.json(body);
            }

            let failure = match req.send().await {
                Ok(resp) if resp.status().is_success() => {
                    let status = resp.status();
                    match resp.text().await {
                        Ok(text) => return parse_body(status, &text),
                        Err(e) => format!("read body failed: {e}"),
                    }
                }
                Ok(resp) if resp.status().is_client_error() => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err(RideboardError::rejected(
                        status.as_u16(),
                        summarize(&text, status),
                    ));
                }
                Ok(resp) => format!("status={} url={url}", resp.status()),
                Err(e) => format!("request failed url={url}: {e}"),
            };

            if attempt >= max_attempts {
                return Err(RideboardError::RemoteUnavailable(failure));
            }
            debug!(attempt, %failure, "retrying store request");
            tokio::time::sleep(Duration::from_millis(
                self.retry.base_backoff_ms.saturating_mul(attempt as u64),
            ))
            .await;
        }
    }
}

fn parse_body(status: StatusCode, text: &str) -> Result<HttpReply> {
    if text.trim().is_empty() {
        return Ok(HttpReply { status, body: None });
    }
    let body = serde_json::from_str(text).map_err(|e| {
        RideboardError::rejected(status.as_u16(), format!("unexpected payload: {e}"))
    })?;
    Ok(HttpReply {
        status,
        body: Some(body),
    })
}

fn summarize(text: &str, status: StatusCode) -> String {
    let text = text.trim();
    if text.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("client error")
            .to_string();
    }
    text.chars().take(200).collect()
}

/// Adds a static header. Invalid values are a configuration error.
pub fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| RideboardError::Config(format!("invalid {name} header: {e}")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

pub fn insert_bearer(headers: &mut HeaderMap, token: &str) -> Result<()> {
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| RideboardError::Config(format!("invalid auth header: {e}")))?;
    headers.insert(AUTHORIZATION, value);
    Ok(())
}

/// Strips trailing slashes and checks the endpoint parses as a URL.
pub fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed)
        .map_err(|e| RideboardError::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_trimmed_and_validated() {
        assert_eq!(
            normalize_endpoint("https://example.test/api/").unwrap(),
            "https://example.test/api"
        );
        assert!(matches!(
            normalize_endpoint("not a url"),
            Err(RideboardError::Config(_))
        ));
    }

    #[test]
    fn empty_success_body_is_none() {
        let reply = parse_body(StatusCode::CREATED, "  ").unwrap();
        assert!(reply.body.is_none());
    }

    #[test]
    fn garbage_success_body_is_rejected() {
        assert!(matches!(
            parse_body(StatusCode::OK, "<html>"),
            Err(RideboardError::RemoteRejected { status: 200, .. })
        ));
    }

    #[test]
    fn header_names_must_be_lowercase_static() {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "apikey", "k").unwrap();
        insert_bearer(&mut headers, "k").unwrap();
        assert_eq!(headers.len(), 2);
        assert!(insert_header(&mut headers, "apikey", "bad\nvalue").is_err());
    }
}
