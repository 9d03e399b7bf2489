#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use descarga_core::{
    ApiRequest, ApiResponse, ArchiveResponse, Credentials, DescargaClient, Endpoint, QueryId,
    QueryStatus, Transport, TransportError,
};
use futures::StreamExt;
use uuid::Uuid;

enum Scripted {
    Reply(ApiResponse),
    Fail(String),
}

struct ScriptedArchive {
    status: u16,
    chunks: Vec<Result<Bytes, String>>,
}

/// Transport that replays canned responses per endpoint and records every
/// request. The last response queued for an endpoint is replayed forever.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<Endpoint, VecDeque<Scripted>>>,
    archives: Mutex<VecDeque<ScriptedArchive>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, endpoint: Endpoint, status: u16, body: impl Into<String>) -> &Self {
        self.queue(endpoint, Scripted::Reply(ApiResponse::new(status, body)))
    }

    pub fn progress(&self, status: QueryStatus) -> &Self {
        self.reply(Endpoint::Progress, 200, progress_body(status, 0))
    }

    pub fn fail(&self, endpoint: Endpoint, message: &str) -> &Self {
        self.queue(endpoint, Scripted::Fail(message.to_string()))
    }

    pub fn archive(&self, status: u16, chunks: &[&'static str]) -> &Self {
        self.push_archive(status, chunks, None)
    }

    /// Archive whose stream breaks after `chunks`.
    pub fn broken_archive(&self, chunks: &[&'static str], message: &str) -> &Self {
        self.push_archive(200, chunks, Some(message))
    }

    fn push_archive(&self, status: u16, chunks: &[&'static str], failure: Option<&str>) -> &Self {
        let mut chunks: Vec<Result<Bytes, String>> = chunks
            .iter()
            .map(|&chunk| Ok(Bytes::from_static(chunk.as_bytes())))
            .collect();
        if let Some(message) = failure {
            chunks.push(Err(message.to_string()));
        }
        self.archives
            .lock()
            .unwrap()
            .push_back(ScriptedArchive { status, chunks });
        self
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.endpoint() == endpoint)
            .count()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn queue(&self, endpoint: Endpoint, scripted: Scripted) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(scripted);
        self
    }

    fn next(&self, endpoint: Endpoint) -> Result<ApiResponse, TransportError> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies
            .get_mut(&endpoint)
            .filter(|queue| !queue.is_empty())
            .ok_or_else(|| TransportError::Other(format!("nothing scripted for {endpoint:?}")))?;

        let scripted = if queue.len() > 1 {
            queue.pop_front()
        } else {
            None
        };
        let current = scripted.as_ref().or_else(|| queue.front());

        match current {
            Some(Scripted::Reply(response)) => Ok(response.clone()),
            Some(Scripted::Fail(message)) => Err(TransportError::Other(message.clone())),
            None => Err(TransportError::Other(format!("nothing scripted for {endpoint:?}"))),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let endpoint = request.endpoint();
        self.requests.lock().unwrap().push(request);
        self.next(endpoint)
    }

    async fn download(&self, request: ApiRequest) -> Result<ArchiveResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let archive = self
            .archives
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Other("no archive scripted".into()))?;

        let stream = futures::stream::iter(
            archive
                .chunks
                .into_iter()
                .map(|chunk| chunk.map_err(TransportError::Other)),
        )
        .boxed();

        Ok(ArchiveResponse {
            status: archive.status,
            stream,
        })
    }
}

pub fn progress_body(status: QueryStatus, found: u64) -> String {
    format!(r#"{{"estado":"{}","encontrados":{found}}}"#, status.as_str())
}

pub fn summary_body(total: u64, pages: u32) -> String {
    format!(r#"{{"total":{total},"paginas":{pages},"xmlFaltantes":false,"cancelados":0}}"#)
}

pub fn random_id() -> QueryId {
    QueryId(Uuid::new_v4())
}

pub fn contract() -> Credentials {
    Credentials::new("CSF010101AAA", "contract-secret")
}

pub fn client(transport: &Arc<ScriptedTransport>) -> DescargaClient {
    DescargaClient::with_transport(transport.clone(), contract(), Duration::from_secs(15)).unwrap()
}

/// Listener that records every status it is told about.
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<QueryStatus>>,
    lost: Mutex<usize>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<QueryStatus> {
        self.seen.lock().unwrap().clone()
    }

    pub fn lost(&self) -> usize {
        *self.lost.lock().unwrap()
    }
}

impl descarga_core::QueryProgressListener for Recorder {
    fn on_status_changed(&self, status: QueryStatus, _query: &descarga_core::QueryHandle) {
        self.seen.lock().unwrap().push(status);
    }

    fn on_tracking_lost(&self, _query: &descarga_core::QueryHandle, _error: &descarga_core::DescargaError) {
        *self.lost.lock().unwrap() += 1;
    }
}
