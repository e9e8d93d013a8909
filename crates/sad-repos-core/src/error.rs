//! Error taxonomy for the sad-repos pipeline.
//!
//! Each remote collaborator has its own error enum so callers can tell a
//! failed commit listing apart from a failed sentiment batch. Nothing in the
//! pipeline retries; the first error for a repository is returned as-is.

use thiserror::Error;

/// Longest slice of a response body carried inside an error.
pub const BODY_EXCERPT_LEN: usize = 512;

/// Truncate a response body for inclusion in an error message.
pub(crate) fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Errors raised while paging through a repository's commit history.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Credentials were rejected (HTTP 401/403)
    #[error("not authorized to list commits for {repo} (HTTP {status}): {body}")]
    Unauthorized {
        repo: String,
        status: u16,
        body: String,
    },

    /// Any other non-success status
    #[error("listing commits for {repo} failed with HTTP {status}: {body}")]
    Status {
        repo: String,
        status: u16,
        body: String,
    },

    /// Connection, TLS or body read failure
    #[error("transport error while listing commits for {repo}: {source}")]
    Transport {
        repo: String,
        #[source]
        source: reqwest::Error,
    },

    /// The listing could not be understood
    #[error("malformed commit listing for {repo}: {reason}")]
    MalformedResponse { repo: String, reason: String },
}

/// Errors raised while batching messages or analysing a batch.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to serialize batch: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("sentiment service request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("sentiment service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed sentiment response: {source}\nbody: {body}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("invalid confidence {value:?} in result {index}: {reason}")]
    InvalidConfidence {
        index: usize,
        value: String,
        reason: String,
    },

    #[error("sentiment service returned {actual} results for a batch of {expected} messages")]
    ResultCountMismatch { expected: usize, actual: usize },
}

/// Errors in user-supplied settings, raised before any network call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("confidence must be between 0-100 inclusively, got {value}")]
    InvalidThreshold { value: f32 },

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Any failure of a repository analysis.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for sad-repos operations.
pub type Result<T> = std::result::Result<T, AnalyzeError>;
