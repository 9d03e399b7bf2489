//! Configuration for the Descarga client.
//!
//! Centralizes the defaults for the service endpoint, HTTP timeouts and the
//! status polling cadence, plus loading of the contract credentials used to
//! authenticate against the download service. Both the library consumers and
//! `descargactl` read their settings through here so there is a single source
//! of truth for defaults and validation rules.

pub mod client;
pub mod constants;
pub mod credentials;
pub mod error;

pub use client::{ClientConfig, ClientConfigSource};
pub use credentials::{contract_credentials_with, load_contract_credentials};
pub use error::ConfigLoadError;
