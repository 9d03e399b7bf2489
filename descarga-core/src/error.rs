//! Error type shared by every client operation.

use std::time::Duration;

use descarga_model::{QueryId, ValidationError};
use thiserror::Error;
use uuid::Uuid;

use crate::transport::TransportError;

/// Everything a client operation can fail with.
#[derive(Error, Debug)]
pub enum DescargaError {
    /// Missing credentials or inconsistent search parameters.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The service does not know the query.
    #[error("no query exists with id {0}")]
    NotFound(QueryId),

    /// The summary was requested before the service could produce it.
    #[error("query {0} is not ready yet")]
    NotReady(QueryId),

    /// Results or XML requested while the query is still running.
    #[error("query {0} has not finished")]
    NotFinished(QueryId),

    /// Page past the last one of the summary.
    #[error("not enough results to show page {page}, total pages: {pages}")]
    InsufficientResults {
        /// Requested page.
        page: u32,
        /// Pages available.
        pages: u32,
    },

    /// The service has no document with that folio.
    #[error("no XML found for document {0}")]
    XmlNotFound(Uuid),

    /// The archive endpoint did not answer 200.
    #[error("archive unavailable (HTTP {status}), the query has possibly not finished")]
    ZipUnavailable {
        /// Status the service answered with.
        status: u16,
    },

    /// Rejected by the service, or the referenced query could not be validated.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Service message, or the cause rendered as text.
        message: String,
        /// Local failure behind the rejection, if any.
        #[source]
        cause: Option<Box<DescargaError>>,
    },

    /// Zero, or longer than the configured maximum.
    #[error("poll interval {0:?} is out of range")]
    InvalidPollInterval(Duration),

    /// Non-200 answer where a payload was expected.
    #[error("unexpected response from download service (HTTP {status}): {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Raw body, for diagnostics.
        body: String,
    },

    /// Payload did not match the expected shape.
    #[error("failed to decode service payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local file error while saving an archive.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request never got an answer.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DescargaError {
    /// Structured error payload returned by the service.
    pub fn rejected(message: impl Into<String>) -> Self {
        DescargaError::InvalidQuery {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap a local failure as an invalid query.
    pub fn invalid_query(cause: DescargaError) -> Self {
        DescargaError::InvalidQuery {
            message: cause.to_string(),
            cause: Some(Box::new(cause)),
        }
    }

    /// Whether the failure happened below HTTP status handling.
    pub fn is_transport(&self) -> bool {
        matches!(self, DescargaError::Transport(_))
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, DescargaError>;
