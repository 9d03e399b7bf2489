use std::sync::Arc;

use anyhow::bail;
use descarga_core::{DescargaError, QueryHandle, QueryProgressListener, SharedListener};
use descarga_model::QueryStatus;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

#[derive(Debug)]
pub enum WatchEvent {
    Changed(QueryStatus),
    Lost(String),
}

struct ChannelListener {
    tx: UnboundedSender<WatchEvent>,
}

impl QueryProgressListener for ChannelListener {
    fn on_status_changed(&self, status: QueryStatus, _query: &QueryHandle) {
        let _ = self.tx.send(WatchEvent::Changed(status));
    }

    fn on_tracking_lost(&self, _query: &QueryHandle, error: &DescargaError) {
        let _ = self.tx.send(WatchEvent::Lost(error.to_string()));
    }
}

/// Listener forwarding every notification into a channel the CLI can await.
pub fn channel() -> (SharedListener, UnboundedReceiver<WatchEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(ChannelListener { tx }), rx)
}

/// Print transitions until the query finishes, asks to be repeated, or the
/// user interrupts. Returns the last status seen.
pub async fn follow(
    query: &QueryHandle,
    mut events: UnboundedReceiver<WatchEvent>,
) -> anyhow::Result<Option<QueryStatus>> {
    let mut last = None;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(WatchEvent::Changed(status)) => {
                    println!("{}  {}", query.id(), status);
                    last = Some(status);
                    if status.is_finished() || status.is_repeat() {
                        break;
                    }
                }
                Some(WatchEvent::Lost(reason)) => {
                    bail!("lost track of query {}: {reason}", query.id());
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, no longer watching {}", query.id());
                break;
            }
        }
    }
    Ok(last)
}
