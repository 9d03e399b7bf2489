//! Client-side lifecycle engine for the bulk CFDI download service.
//!
//! A [`DescargaClient`] submits or looks up remote queries and hands back
//! [`QueryHandle`]s. Each handle polls the service lazily and freezes its
//! progress once the query finishes. Queries registered with a listener are
//! swept by a single [`StatusPoller`] task that reports each distinct status
//! transition exactly once.

pub mod client;
pub mod codec;
pub mod error;
pub mod listener;
pub mod poller;
pub mod query;
pub mod transport;

pub use client::DescargaClient;
pub use error::{DescargaError, Result};
pub use listener::{QueryProgressListener, SharedListener};
pub use poller::{StatusPoller, TickSummary};
pub use query::QueryHandle;
pub use transport::{
    ApiRequest, ApiResponse, ArchiveResponse, ByteStream, Endpoint, HttpTransport, Transport,
    TransportError,
};

pub use descarga_config::ClientConfig;
pub use descarga_model::{
    CfdiKind, CfdiMeta, CfdiStatus, Credentials, DocumentDirection, DocumentStatus, DocumentType,
    FiscalEntity, MediaType, Progress, QueryId, QueryStatus, SearchParams, Service, Summary,
    ValidationError,
};
