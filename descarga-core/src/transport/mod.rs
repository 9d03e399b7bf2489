//! Seam between the lifecycle engine and the network.
//!
//! The engine only ever describes *what* it wants ([`ApiRequest`]) and
//! interprets raw status codes and bodies itself; [`HttpTransport`] is the
//! production implementation, tests plug in scripted ones.

mod http;
mod routes;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use descarga_model::{Credentials, MediaType, QueryId};
use futures::stream::BoxStream;
use thiserror::Error;
use uuid::Uuid;

pub use http::HttpTransport;
pub use routes::{Endpoint, HttpMethod};

/// Failure to exchange a request with the service at all.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, timeout or body errors from the HTTP client.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service root does not form a valid URL.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// Any other transport-specific failure.
    #[error("transport failure: {0}")]
    Other(String),
}

/// One remote operation.
#[derive(Debug, Clone)]
pub enum ApiRequest {
    /// Create a query; `body` is the encoded search envelope.
    Submit {
        /// Contract credentials, sent as headers.
        credentials: Credentials,
        /// JSON search envelope.
        body: String,
    },
    /// Run an existing query again.
    Repeat {
        /// Query to repeat.
        id: QueryId,
        /// Contract credentials, sent as headers.
        credentials: Credentials,
    },
    /// Status and found-count. Doubles as the existence probe.
    Progress(QueryId),
    /// Totals and page count of a finished query.
    Summary(QueryId),
    /// One page of result metadata.
    Page {
        /// Query the page belongs to.
        id: QueryId,
        /// 1-based page number.
        page: u32,
    },
    /// A single document in the given representation.
    Document {
        /// Fiscal folio of the document.
        cfdi: Uuid,
        /// Requested representation.
        media_type: MediaType,
    },
    /// Zip archive with every document of a query.
    Archive(QueryId),
}

/// Status code and fully buffered text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl ApiResponse {
    /// Response with the given status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The service signals success with a plain 200 only.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Chunked archive body.
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Status code and a body that is consumed incrementally.
pub struct ArchiveResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body chunks, read until exhausted.
    pub stream: ByteStream,
}

impl fmt::Debug for ArchiveResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Sends [`ApiRequest`]s to the download service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request and buffer the whole body as text.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;

    /// Issue a request and hand back the body as a byte stream.
    async fn download(&self, request: ApiRequest) -> Result<ArchiveResponse, TransportError>;
}
