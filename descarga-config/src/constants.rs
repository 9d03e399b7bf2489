//! Defaults and environment variable names.

pub const DEFAULT_BASE_URL: &str =
    "https://www.csfacturacion.com/webservices/csdescargasat/v3";

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 15_000;
/// Upper bound for the status polling period (one day).
pub const MAX_POLL_INTERVAL_MS: u64 = 86_400_000;

pub const ENV_CONFIG_PATH: &str = "DESCARGA_CONFIG_PATH";
pub const ENV_CONFIG_JSON: &str = "DESCARGA_CONFIG_JSON";
pub const ENV_BASE_URL: &str = "DESCARGA_BASE_URL";
pub const ENV_POLL_INTERVAL: &str = "DESCARGA_POLL_INTERVAL";

pub const ENV_CONTRACT_RFC: &str = "DESCARGA_RFC";
pub const ENV_CONTRACT_PASSWORD: &str = "DESCARGA_PASSWORD";
