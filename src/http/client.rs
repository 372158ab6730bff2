//! Default HTTP client
//!
//! JSON-aware `reqwest` wrapper: sends `Accept: application/json`, marks
//! bodies as JSON, fails on non-2xx and parses the response body.

use super::{FetchOptions, HttpClient, HttpResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const JSON_CONTENT_TYPE: &str = "application/json";

const DEFAULT_USER_AGENT: &str = concat!("msjsonapi/", env!("CARGO_PKG_VERSION"));

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Builder for [`ReqwestClient`]
#[derive(Debug, Clone)]
pub struct ReqwestClientBuilder {
    user_agent: String,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl Default for ReqwestClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
            timeout: None,
        }
    }
}

impl ReqwestClientBuilder {
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Header sent with every request unless the request sets it itself
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ReqwestClient> {
        let mut builder = Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(ReqwestClient {
            client,
            default_headers: self.headers,
        })
    }
}

/// HTTP client wrapper for JSON:API services
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
    default_headers: Vec<(String, String)>,
}

impl ReqwestClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ReqwestClientBuilder {
        ReqwestClientBuilder::default()
    }

    /// Header set by the request or by the client defaults (case-insensitive)
    fn has_header(&self, options: &FetchOptions, name: &str) -> bool {
        options.has_header(name)
            || self
                .default_headers
                .iter()
                .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<HttpResponse> {
        tracing::debug!("{} {}", options.method, url);

        let mut request = self.client.request(options.method.clone(), url);

        if !self.has_header(&options, ACCEPT.as_str()) {
            request = request.header(ACCEPT, JSON_CONTENT_TYPE);
        }
        if options.body.is_some() && !self.has_header(&options, CONTENT_TYPE.as_str()) {
            request = request.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        }
        for (name, value) in &self.default_headers {
            if !options.has_header(name) {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            let excerpt = sanitize_for_log(&body);
            tracing::error!("API error: {} - {}", status, excerpt);
            return Err(Error::Status {
                status: status.as_u16(),
                body: excerpt,
            });
        }

        // Handle empty response
        let json = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body)?
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            json,
        })
    }
}
