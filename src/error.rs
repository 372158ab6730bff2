//! Error types for provider operations.

use thiserror::Error;

/// Errors that can occur while talking to a resource service.
///
/// The provider never recovers from any of these: whatever the HTTP client
/// reports is handed back to the caller unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// The resource name has no base URL in the mapping.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// A base URL in the mapping is not an absolute URL.
    #[error("Invalid base URL for resource {resource}: {url}")]
    InvalidBaseUrl {
        resource: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A base URL parses but is not served over http or https.
    #[error("Unsupported scheme '{scheme}' in base URL for resource {resource}: {url}")]
    UnsupportedScheme {
        resource: String,
        url: String,
        scheme: String,
    },

    /// The request could not be sent or its body could not be read.
    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("API request failed: {status}")]
    Status { status: u16, body: String },

    /// A body was not valid JSON, or a request body could not be encoded.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON payload lacks the fields needed to unwrap it.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedResponse {
            message: message.into(),
        }
    }

    /// HTTP status of the failed response, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Format a provider error for display.
///
/// Maps status codes onto short messages and never echoes a response body.
pub fn describe_error(error: &Error) -> String {
    match error {
        Error::UnknownResource(name) => {
            format!("No service URL configured for resource '{}'.", name)
        }
        Error::InvalidBaseUrl { resource, url, .. } => {
            format!("Base URL '{}' for resource '{}' is not valid.", url, resource)
        }
        Error::UnsupportedScheme { resource, url, .. } => format!(
            "Base URL '{}' for resource '{}' must start with http:// or https://.",
            url, resource
        ),
        Error::Status { status, .. } => match status {
            400 => "Invalid request. Check your parameters.".to_string(),
            401 => "Authentication failed.".to_string(),
            403 => "Permission denied.".to_string(),
            404 => "Resource not found.".to_string(),
            409 => "Resource conflict. The record may already exist or be in use.".to_string(),
            422 => "The service rejected the submitted data.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            500..=599 => "Service temporarily unavailable. Please try again.".to_string(),
            other => format!("Request failed with status {}.", other),
        },
        Error::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        Error::Json(_) => "The service returned invalid JSON.".to_string(),
        Error::MalformedResponse { message } => {
            let sanitized: String = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(80)
                .collect();
            format!("Unexpected response shape: {}", sanitized)
        }
    }
}
