//! HTTP transport used by the provider
//!
//! The provider never talks to the network directly. Every request goes
//! through an [`HttpClient`], so callers can swap in their own transport
//! (authentication, retries, tracing headers) without touching the
//! request-building code.
//!
//! # Module Structure
//!
//! - [`client`] - Default [`HttpClient`] backed by `reqwest`
//!
//! # Example
//!
//! ```ignore
//! use microservices_jsonapi::http::{FetchOptions, HttpClient, ReqwestClient};
//!
//! async fn example() -> microservices_jsonapi::Result<()> {
//!     let client = ReqwestClient::new()?;
//!     let response = client.fetch("http://posts.local/posts/1", FetchOptions::get()).await?;
//!     println!("{}", response.json);
//!     Ok(())
//! }
//! ```

pub mod client;

pub use client::{ReqwestClient, ReqwestClientBuilder};
pub use reqwest::header::HeaderMap;
pub use reqwest::Method;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Per-request options handed to an [`HttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub method: Method,
    /// Serialized JSON body, if any.
    pub body: Option<String>,
    /// Extra request headers as `(name, value)` pairs.
    pub headers: Vec<(String, String)>,
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::new(Method::GET, None)
    }

    pub fn post(body: String) -> Self {
        Self::new(Method::POST, Some(body))
    }

    pub fn patch(body: String) -> Self {
        Self::new(Method::PATCH, Some(body))
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE, None)
    }

    fn new(method: Method, body: Option<String>) -> Self {
        Self {
            method,
            body,
            headers: Vec::new(),
        }
    }

    /// Add a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Check whether a header was set (case-insensitive)
    pub fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// A successful (2xx) response with its body parsed as JSON.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Parsed body; `Value::Null` when the body was empty.
    pub json: Value,
}

/// Transport that performs one HTTP exchange.
///
/// Implementations must fail on network errors and on any non-2xx status,
/// and must return the body parsed as JSON otherwise.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<HttpResponse> {
        (**self).fetch(url, options).await
    }
}
