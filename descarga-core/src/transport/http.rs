use std::time::Duration;

use async_trait::async_trait;
use descarga_config::ClientConfig;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, header};
use tracing::{debug, info};
use url::Url;

use super::routes::HttpMethod;
use super::{ApiRequest, ApiResponse, ArchiveResponse, Transport, TransportError};

const HEADER_RFC: &str = "rfc";
const HEADER_PASSWORD: &str = "password";

/// reqwest-backed [`Transport`] talking to the real service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Build the HTTP client from the connection settings of `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        // Validate once so every later join is a plain concatenation.
        Url::parse(&config.base_url)?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("descarga/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(base_url = %config.base_url, "creating download service transport");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
        })
    }

    /// Service root without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a request.
    pub fn url_for(&self, request: &ApiRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }

    fn prepare(&self, request: &ApiRequest) -> RequestBuilder {
        let url = self.url_for(request);
        let builder = match request.method() {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        let builder = builder.header(header::ACCEPT, request.accept().as_mime());

        match request {
            ApiRequest::Submit { credentials, body } => builder
                .header(HEADER_RFC, credentials.user())
                .header(HEADER_PASSWORD, credentials.password())
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.clone()),
            ApiRequest::Repeat { credentials, .. } => builder
                .header(HEADER_RFC, credentials.user())
                .header(HEADER_PASSWORD, credentials.password()),
            _ => builder,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let endpoint = request.endpoint();
        let response = self
            .prepare(&request)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(?endpoint, status, bytes = body.len(), "service response");

        Ok(ApiResponse { status, body })
    }

    async fn download(&self, request: ApiRequest) -> Result<ArchiveResponse, TransportError> {
        let endpoint = request.endpoint();
        // No overall timeout: archives can take far longer than a JSON call.
        let response = self.prepare(&request).send().await?;

        let status = response.status().as_u16();
        debug!(?endpoint, status, "streaming service response");

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from))
            .boxed();

        Ok(ArchiveResponse { status, stream })
    }
}
