//! Handle over one remote query and its cached state.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use descarga_model::{CfdiMeta, MediaType, Progress, QueryId, SearchParams, Summary};
use futures::StreamExt;
use once_cell::sync::OnceCell;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::codec;
use crate::error::{DescargaError, Result};
use crate::transport::{ApiRequest, Transport};

/// Client-side view of one remote query.
///
/// Cheap to clone; clones share the same caches. Progress is polled on demand
/// until a finished status is seen, after which it is frozen and the service
/// is never asked again. The summary is fetched once.
#[derive(Clone)]
pub struct QueryHandle {
    inner: Arc<QueryInner>,
}

struct QueryInner {
    id: QueryId,
    parameters: Option<SearchParams>,
    transport: Arc<dyn Transport>,
    frozen_progress: OnceCell<Progress>,
    summary: OnceCell<Summary>,
}

impl QueryHandle {
    /// `parameters` is `None` for handles obtained by lookup or repeat; the
    /// service does not echo them back.
    pub fn new(
        id: QueryId,
        parameters: Option<SearchParams>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(QueryInner {
                id,
                parameters,
                transport,
                frozen_progress: OnceCell::new(),
                summary: OnceCell::new(),
            }),
        }
    }

    /// Remote id of the query.
    pub fn id(&self) -> QueryId {
        self.inner.id
    }

    /// Search parameters, when this handle came from a submit.
    pub fn parameters(&self) -> Option<&SearchParams> {
        self.inner.parameters.as_ref()
    }

    /// Progress as last frozen, without touching the network.
    pub fn cached_progress(&self) -> Option<Progress> {
        self.inner.frozen_progress.get().copied()
    }

    /// Current status and found-count. Frozen after the first finished
    /// answer; later calls return it without a request.
    pub async fn progress(&self) -> Result<Progress> {
        if let Some(progress) = self.inner.frozen_progress.get() {
            return Ok(*progress);
        }

        let response = self
            .inner
            .transport
            .send(ApiRequest::Progress(self.id()))
            .await?;
        let progress = codec::decode_progress(&response)?;
        debug!(query = %self.id(), status = %progress.status, found = progress.found, "polled progress");

        if progress.status.is_finished() {
            // A racing poll may have frozen first; keep whichever landed.
            return Ok(*self.inner.frozen_progress.get_or_init(|| progress));
        }
        Ok(progress)
    }

    /// Shorthand over [`QueryHandle::progress`].
    pub async fn is_finished(&self) -> Result<bool> {
        Ok(self.progress().await?.status.is_finished())
    }

    /// True when the query finished without results: authentication failure,
    /// rate limiting or a service-side failure.
    pub async fn is_failed(&self) -> Result<bool> {
        Ok(self.progress().await?.status.is_failed())
    }

    /// True when the service asks for the query to be repeated.
    pub async fn is_to_repeat(&self) -> Result<bool> {
        Ok(self.progress().await?.status.is_repeat())
    }

    /// Fails with [`DescargaError::NotReady`] until the service can summarize
    /// the query; that failure is not remembered.
    pub async fn summary(&self) -> Result<Summary> {
        if let Some(summary) = self.inner.summary.get() {
            return Ok(*summary);
        }

        let response = self
            .inner
            .transport
            .send(ApiRequest::Summary(self.id()))
            .await?;
        if !response.is_ok() {
            debug!(query = %self.id(), status = response.status, "summary not ready");
            return Err(DescargaError::NotReady(self.id()));
        }
        let summary = codec::decode_summary(&response)?;

        Ok(*self.inner.summary.get_or_init(|| summary))
    }

    /// Whether the summary counts at least one document.
    pub async fn has_results(&self) -> Result<bool> {
        Ok(self.summary().await?.has_results())
    }

    /// One page of result metadata, starting at 1. Pages are not cached.
    pub async fn results(&self, page: u32) -> Result<Vec<CfdiMeta>> {
        self.ensure_finished().await?;

        let summary = self.summary().await?;
        if !summary.contains_page(page) {
            return Err(DescargaError::InsufficientResults {
                page,
                pages: summary.pages,
            });
        }

        let response = self
            .inner
            .transport
            .send(ApiRequest::Page {
                id: self.id(),
                page,
            })
            .await?;
        codec::decode_page(&response)
    }

    /// XML of one document of this query. `Ok(None)` when the service has the
    /// document but no XML content for it.
    pub async fn xml(&self, cfdi: Uuid) -> Result<Option<String>> {
        self.ensure_finished().await?;

        let response = self
            .inner
            .transport
            .send(ApiRequest::Document {
                cfdi,
                media_type: MediaType::Xml,
            })
            .await?;
        if !response.is_ok() {
            return Err(DescargaError::XmlNotFound(cfdi));
        }

        Ok(codec::normalize_xml(&response.body))
    }

    /// [`QueryHandle::xml`] for a result row.
    pub async fn xml_for(&self, cfdi: &CfdiMeta) -> Result<Option<String>> {
        self.xml(cfdi.folio).await
    }

    /// Stream the query's archive into `destination`, returning the number of
    /// bytes written.
    ///
    /// The file is only created once the service answers 200. A failure
    /// mid-stream leaves a partial file behind.
    pub async fn download_zip(&self, destination: impl AsRef<Path>) -> Result<u64> {
        let destination = destination.as_ref();
        let response = self
            .inner
            .transport
            .download(ApiRequest::Archive(self.id()))
            .await?;
        if response.status != 200 {
            return Err(DescargaError::ZipUnavailable {
                status: response.status,
            });
        }

        let mut stream = response.stream;
        let mut file = File::create(destination).await?;
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(query = %self.id(), bytes = written, path = %destination.display(), "archive downloaded");
        Ok(written)
    }

    async fn ensure_finished(&self) -> Result<()> {
        if self.is_finished().await? {
            Ok(())
        } else {
            Err(DescargaError::NotFinished(self.id()))
        }
    }
}

impl fmt::Debug for QueryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHandle")
            .field("id", &self.inner.id)
            .field("has_parameters", &self.inner.parameters.is_some())
            .field("frozen_progress", &self.inner.frozen_progress.get())
            .field("summary", &self.inner.summary.get())
            .finish()
    }
}

impl PartialEq for QueryHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for QueryHandle {}
