//! Error types for PDL lookups.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP error information captured from reqwest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorInfo {
    /// Error message.
    pub message: String,
    /// HTTP status code (if available).
    pub status_code: Option<u16>,
    /// Whether the error was a connection failure.
    pub is_connect: bool,
    /// Whether the error happened while sending the request.
    pub is_request: bool,
}

impl From<&reqwest::Error> for HttpErrorInfo {
    fn from(err: &reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status_code: err.status().map(|status| status.as_u16()),
            is_connect: err.is_connect(),
            is_request: err.is_request(),
        }
    }
}

/// Position of a GraphQL error within the query document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlErrorLocation {
    /// Line number (1-based).
    #[serde(default)]
    pub line: Option<u32>,
    /// Column number (1-based).
    #[serde(default)]
    pub column: Option<u32>,
}

/// GraphQL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphqlPathSegment {
    /// Field name.
    Key(String),
    /// Array index.
    Index(i64),
}

/// Registry-specific error metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlErrorExtensions {
    /// Machine-readable code, e.g. `not_found` or `unauthorized`.
    #[serde(default)]
    pub code: Option<String>,
    /// Error classification, e.g. `ExecutionAborted`.
    #[serde(default)]
    pub classification: String,
}

/// GraphQL error record returned inside a 2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlError {
    /// Human-readable error message.
    pub message: String,
    /// Location(s) within the query.
    #[serde(default)]
    pub locations: Vec<GraphqlErrorLocation>,
    /// Path within the response where the error occurred.
    #[serde(default)]
    pub path: Option<Vec<GraphqlPathSegment>>,
    /// Extensions metadata.
    #[serde(default)]
    pub extensions: Option<GraphqlErrorExtensions>,
}

/// Error returned by the access token provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TokenError {
    message: String,
}

impl TokenError {
    /// Create a token error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error type for PDL client operations.
#[derive(Debug, Clone, Error)]
pub enum PdlError {
    /// The registry rejected the request (HTTP 4xx).
    #[error("PDL rejected the request with status {status}: {body}")]
    ClientRequest {
        /// HTTP status code.
        status: StatusCode,
        /// Response body (truncated if needed).
        body: String,
    },

    /// The registry kept failing (HTTP 5xx) until retries ran out.
    #[error("PDL responded with status {status}: {body}")]
    ServerResponse {
        /// HTTP status code.
        status: StatusCode,
        /// Response body (truncated if needed).
        body: String,
    },

    /// Non-success status outside the 4xx and 5xx ranges.
    #[error("unexpected HTTP status {status} from PDL")]
    UnexpectedStatus {
        /// HTTP status code.
        status: StatusCode,
        /// Response body (truncated if needed).
        body: String,
    },

    /// Connect, request or socket timeout.
    #[error("request to PDL timed out: {message}")]
    Timeout {
        /// Details.
        message: String,
    },

    /// Other HTTP/network error.
    #[error("HTTP error: {0:?}")]
    Http(HttpErrorInfo),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(String),

    /// GraphQL errors returned by the registry.
    #[error("PDL returned {} GraphQL error(s): {}", .errors.len(), first_message(.errors))]
    Graphql {
        /// Every error record from the response.
        errors: Vec<GraphqlError>,
    },

    /// The access token provider failed.
    #[error("access token unavailable: {0}")]
    Token(#[from] TokenError),

    /// A query document could not be resolved at construction.
    #[error("query document '{name}' not found")]
    QueryNotFound {
        /// Document name.
        name: String,
    },

    /// Invalid client configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// Details.
        message: String,
    },
}

fn first_message(errors: &[GraphqlError]) -> &str {
    errors.first().map_or("", |err| err.message.as_str())
}

impl From<reqwest::Error> for PdlError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                message: err.to_string(),
            }
        } else {
            Self::Http(HttpErrorInfo::from(&err))
        }
    }
}

impl From<serde_json::Error> for PdlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl PdlError {
    /// Returns `true` if the transport may retry after this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ServerResponse { .. } => true,
            Self::Http(info) => info.is_connect || info.is_request,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::ClientRequest { status, .. }
            | Self::ServerResponse { status, .. }
            | Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// GraphQL error records, if this is an application-level failure.
    #[must_use]
    pub fn graphql_errors(&self) -> Option<&[GraphqlError]> {
        match self {
            Self::Graphql { errors } => Some(errors),
            _ => None,
        }
    }

    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status.is_client_error() {
            Self::ClientRequest { status, body }
        } else if status.is_server_error() {
            Self::ServerResponse { status, body }
        } else {
            Self::UnexpectedStatus { status, body }
        }
    }
}

/// Result type for PDL operations.
pub type PdlResult<T> = Result<T, PdlError>;
