//! Callbacks for status transitions of tracked queries.

use std::sync::Arc;

use descarga_model::QueryStatus;

use crate::error::DescargaError;
use crate::query::QueryHandle;

/// Receives status transitions of tracked queries.
///
/// Callbacks run on the poller task, which is paused while they execute, so
/// keep them short and hand heavy work off to another task.
pub trait QueryProgressListener: Send + Sync {
    /// The query moved to `status`. Called at most once per distinct
    /// transition; after a finished status the query is no longer tracked.
    fn on_status_changed(&self, status: QueryStatus, query: &QueryHandle);

    /// Tracking stopped because the status could not be fetched.
    fn on_tracking_lost(&self, query: &QueryHandle, error: &DescargaError) {
        let _ = (query, error);
    }
}

impl<F> QueryProgressListener for F
where
    F: Fn(QueryStatus, &QueryHandle) + Send + Sync,
{
    fn on_status_changed(&self, status: QueryStatus, query: &QueryHandle) {
        self(status, query)
    }
}

/// Listener as held by the poller.
pub type SharedListener = Arc<dyn QueryProgressListener>;
