//! Resource to service URL mapping

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body sent for each sub-request of `update_many`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateManyBody {
    /// `{data: {id, type, attributes}}`, same envelope as a single update
    #[default]
    Envelope,
    /// The bare record, for services that expect the unwrapped payload
    Raw,
}

/// Immutable mapping from resource name to the base URL of its service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MicroServiceConfig {
    resources: BTreeMap<String, String>,
}

impl MicroServiceConfig {
    /// Build the mapping, rejecting base URLs that are not absolute http(s) URLs.
    ///
    /// Base URLs are normalised: trailing slashes are dropped, so
    /// `http://h/posts/` is stored as `http://h/posts`. List and create requests
    /// then go to `http://h/posts?...` and `http://h/posts`, and single-record
    /// requests to `http://h/posts/{id}`.
    pub fn new<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut resources = BTreeMap::new();
        for (resource, url) in entries {
            let resource = resource.into();
            let url = url.into();
            let parsed = match url::Url::parse(&url) {
                Ok(parsed) => parsed,
                Err(source) => {
                    return Err(Error::InvalidBaseUrl {
                        resource,
                        url,
                        source,
                    })
                }
            };
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::UnsupportedScheme {
                    scheme: parsed.scheme().to_string(),
                    resource,
                    url,
                });
            }
            resources.insert(resource, url.trim_end_matches('/').to_string());
        }
        Ok(Self { resources })
    }

    /// Base URL for `resource`
    pub fn base_url(&self, resource: &str) -> Result<&str> {
        self.resources
            .get(resource)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownResource(resource.to_string()))
    }

    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
