//! [`DescargaClient`], the entry point for submitting and following queries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use descarga_config::ClientConfig;
use descarga_model::{Credentials, Progress, QueryId, QueryStatus, SearchParams, ValidationError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{DescargaError, Result};
use crate::listener::SharedListener;
use crate::poller::StatusPoller;
use crate::query::QueryHandle;
use crate::transport::{ApiRequest, HttpTransport, Transport};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Entry point for submitting, looking up and repeating remote queries.
///
/// Owns the background [`StatusPoller`] task, which starts on construction and
/// stops on [`DescargaClient::shutdown`] or drop. Construct inside a Tokio
/// runtime.
pub struct DescargaClient {
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    poller: Arc<StatusPoller>,
    shutdown_token: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DescargaClient {
    /// Client backed by [`HttpTransport`]. `credentials` are the contract
    /// credentials of the download service, not the SAT ones.
    pub fn new(config: &ClientConfig, credentials: Credentials) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(Arc::new(transport), credentials, config.poll_interval())
    }

    /// Client over any [`Transport`]. Fails with
    /// [`DescargaError::InvalidPollInterval`] before any task is
    /// spawned when `poll_interval` is zero or longer than a day.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        poll_interval: Duration,
    ) -> Result<Self> {
        let poller = Arc::new(StatusPoller::new(poll_interval)?);
        let shutdown_token = CancellationToken::new();
        let worker = Arc::clone(&poller).spawn(shutdown_token.child_token());

        Ok(Self {
            credentials,
            transport,
            poller,
            shutdown_token,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// The background poller, for inspection.
    pub fn poller(&self) -> &Arc<StatusPoller> {
        &self.poller
    }

    /// Create a new remote query.
    pub async fn submit(&self, parameters: SearchParams) -> Result<QueryHandle> {
        self.ensure_credentials()?;
        parameters.validate()?;

        let response = self
            .transport
            .send(ApiRequest::Submit {
                credentials: self.credentials.clone(),
                body: codec::encode_submit(&parameters),
            })
            .await?;
        let id = codec::decode_submit(&response).inspect_err(|err| {
            warn!(error = %err, "query submission rejected");
        })?;

        info!(query = %id, "query submitted");
        Ok(QueryHandle::new(
            id,
            Some(parameters),
            Arc::clone(&self.transport),
        ))
    }

    /// Submit, then make sure `listener` hears about the new query: reported
    /// right away when already finished, tracked by the poller otherwise.
    pub async fn submit_with_listener(
        &self,
        parameters: SearchParams,
        listener: SharedListener,
    ) -> Result<QueryHandle> {
        let handle = self.submit(parameters).await?;
        let progress = handle.progress().await?;
        self.track(&handle, progress.status, listener).await;
        Ok(handle)
    }

    /// Handle for an existing query. Fails with
    /// [`DescargaError::InvalidQuery`] if the service does not know `id`.
    pub async fn lookup(&self, id: QueryId) -> Result<QueryHandle> {
        let (handle, _) = self.probe(id).await?;
        Ok(handle)
    }

    /// Like [`DescargaClient::lookup`], then makes sure `listener` hears about
    /// the query at least once.
    ///
    /// A query asking to be repeated is repeated right away and the returned
    /// handle is the new attempt. A running query is tracked by the poller. A
    /// finished one is reported synchronously before this returns.
    pub async fn lookup_with_listener(
        &self,
        id: QueryId,
        listener: SharedListener,
    ) -> Result<QueryHandle> {
        let (handle, progress) = self.probe(id).await?;

        if progress.status.is_repeat() {
            info!(query = %id, "query asks to be repeated");
            return self.repeat_with_listener(id, listener).await;
        }

        self.track(&handle, progress.status, listener).await;
        Ok(handle)
    }

    /// Ask the service to run an existing query again.
    pub async fn repeat(&self, id: QueryId) -> Result<QueryHandle> {
        self.ensure_credentials()?;
        self.probe(id).await?;

        let response = self
            .transport
            .send(ApiRequest::Repeat {
                id,
                credentials: self.credentials.clone(),
            })
            .await?;
        codec::decode_repeat(&response).inspect_err(|err| {
            warn!(query = %id, error = %err, "repeat request rejected");
        })?;

        info!(query = %id, "query repeated");
        Ok(QueryHandle::new(id, None, Arc::clone(&self.transport)))
    }

    /// Repeat, then track the fresh attempt. A fresh attempt that again asks
    /// to be repeated is reported to `listener` and not repeated a second
    /// time.
    pub async fn repeat_with_listener(
        &self,
        id: QueryId,
        listener: SharedListener,
    ) -> Result<QueryHandle> {
        let handle = self.repeat(id).await?;
        let progress = handle.progress().await?;
        self.track(&handle, progress.status, listener).await;
        Ok(handle)
    }

    /// Stop the poller and wait for it to exit. Tracked queries are discarded.
    pub async fn shutdown(&self) {
        info!("shutting down download client");
        self.shutdown_token.cancel();

        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker {
            match tokio::time::timeout(SHUTDOWN_GRACE, worker).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("status poller task failed: {:?}", e),
                Err(_) => warn!("status poller timed out during shutdown"),
            }
        }
    }

    fn ensure_credentials(&self) -> Result<()> {
        if self.credentials.is_complete() {
            Ok(())
        } else {
            Err(ValidationError::MissingContractCredentials.into())
        }
    }

    /// Existence check; the first progress poll doubles as the probe.
    async fn probe(&self, id: QueryId) -> Result<(QueryHandle, Progress)> {
        let handle = QueryHandle::new(id, None, Arc::clone(&self.transport));
        match handle.progress().await {
            Ok(progress) => Ok((handle, progress)),
            Err(DescargaError::UnexpectedStatus { status, .. }) => {
                warn!(query = %id, status, "query not found");
                Err(DescargaError::invalid_query(DescargaError::NotFound(id)))
            }
            Err(err) => Err(err),
        }
    }

    async fn track(&self, handle: &QueryHandle, status: QueryStatus, listener: SharedListener) {
        if status.is_finished() || status.is_repeat() {
            debug!(query = %handle.id(), %status, "query already settled, notifying directly");
            listener.on_status_changed(status, handle);
        } else {
            self.poller
                .register(handle.clone(), listener, status)
                .await;
        }
    }
}

impl Drop for DescargaClient {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

impl fmt::Debug for DescargaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescargaClient")
            .field("credentials", &self.credentials)
            .field("poller", &self.poller)
            .field("shut_down", &self.shutdown_token.is_cancelled())
            .finish_non_exhaustive()
    }
}
