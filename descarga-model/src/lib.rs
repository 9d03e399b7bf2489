//! Plain data types for the CFDI bulk download client: query ids, statuses, search parameters and result rows.
#![allow(missing_docs)]

pub mod cfdi;
pub mod credentials;
pub mod error;
pub mod ids;
pub mod media_type;
pub mod params;
pub mod status;
pub mod summary;

// Flat re-exports; most callers only need these.
pub use cfdi::{CfdiKind, CfdiMeta, CfdiStatus, FiscalEntity};
pub use credentials::Credentials;
pub use error::{ValidationError, Result as ModelResult};
pub use ids::QueryId;
pub use media_type::MediaType;
pub use params::{
    DocumentDirection, DocumentStatus, DocumentType, SearchParams,
    SearchParamsBuilder, Service,
};
pub use status::{Progress, QueryStatus, UnknownStatus};
pub use summary::Summary;
