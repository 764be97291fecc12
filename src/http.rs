//! HTTP client wrapper for Graph and token endpoint requests.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::{Result, UploadError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Status and body of a completed request.
///
/// Non-success statuses are returned rather than turned into errors so each
/// caller can map them to its own failure kind.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client for making requests to the drive service.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default timeout.
    pub fn new() -> Result<Self> {
        Self::build(DEFAULT_TIMEOUT, None)
    }

    /// Create a new HTTP client with a custom timeout and optional proxy.
    ///
    /// # Arguments
    /// * `timeout` - Per-request timeout
    /// * `proxy` - Proxy URL (e.g., "http://proxy:8080" or "socks5://proxy:1080")
    pub fn build(timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| UploadError::InvalidInput(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;
        Ok(Self { client })
    }

    /// POST a url-encoded form.
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse> {
        let response = self.client.post(url).form(form).send().await?;
        Self::finish(response).await
    }

    /// POST a JSON body with a bearer token.
    pub async fn post_json(&self, url: &str, token: &str, body: &Value) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;
        Self::finish(response).await
    }

    /// GET with a bearer token.
    pub async fn get(&self, url: &str, token: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).bearer_auth(token).send().await?;
        Self::finish(response).await
    }

    /// PUT raw bytes with a `Content-Range` header.
    ///
    /// Upload session URLs are pre-authorised, so no bearer token is sent.
    pub async fn put_range(
        &self,
        url: &str,
        content_range: &str,
        data: Vec<u8>,
    ) -> Result<HttpResponse> {
        let response = self
            .client
            .put(url)
            .header("Content-Range", content_range)
            .body(data)
            .send()
            .await?;
        Self::finish(response).await
    }

    /// DELETE without authentication (upload session URLs).
    pub async fn delete(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.delete(url).send().await?;
        Self::finish(response).await
    }

    async fn finish(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
