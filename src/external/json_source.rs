use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// An HTTP endpoint plus the static headers sent with every request to it.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: &'static str,
    pub url: Url,
    pub headers: HeaderMap,
}

impl Endpoint {
    /// Parses `url`, accepting only absolute http(s) URLs.
    pub fn new(name: &'static str, url: &str, headers: HeaderMap) -> Result<Self, IndicatorError> {
        let url = Url::parse(url)
            .map_err(|e| IndicatorError::InvalidUrl(format!("{}: {}", url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(Self { name, url, headers }),
            other => Err(IndicatorError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                url, other
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("bad status: HTTP {0}")]
    BadStatus(u16),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unexpected response shape: {0}")]
    Extract(String),
}

#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, IndicatorError>;
}

/// `JsonSource` backed by a shared `reqwest::Client`.
///
/// Yahoo Finance rejects requests without a browser-like User-Agent, so one is
/// set on the client and sent with every request.
pub struct HttpJsonSource {
    client: reqwest::Client,
}

impl HttpJsonSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, IndicatorError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| IndicatorError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl JsonSource for HttpJsonSource {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, IndicatorError> {
        let resp = self
            .client
            .get(endpoint.url.clone())
            .headers(endpoint.headers.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IndicatorError::Timeout
                } else {
                    IndicatorError::Network(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            return Err(IndicatorError::BadStatus(resp.status().as_u16()));
        }

        resp.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                IndicatorError::Timeout
            } else {
                IndicatorError::Decode(e.to_string())
            }
        })
    }
}
