mod support;

use std::sync::Arc;
use std::time::Duration;

use descarga_core::{Endpoint, QueryHandle, QueryStatus, StatusPoller, TickSummary};
use support::{Recorder, ScriptedTransport, random_id};
use tokio_util::sync::CancellationToken;

fn handle(transport: &Arc<ScriptedTransport>) -> QueryHandle {
    QueryHandle::new(random_id(), None, transport.clone())
}

#[tokio::test]
async fn only_transitions_are_reported() {
    let transport = ScriptedTransport::new();
    transport
        .progress(QueryStatus::Waiting)
        .progress(QueryStatus::Waiting)
        .progress(QueryStatus::InProgress)
        .progress(QueryStatus::Completed);
    let poller = StatusPoller::new(Duration::from_secs(15)).unwrap();
    let recorder = Recorder::new();
    let query = handle(&transport);
    let id = query.id();

    poller
        .register(query, recorder.clone(), QueryStatus::Waiting)
        .await;
    for _ in 0..4 {
        poller.tick().await;
    }

    assert_eq!(
        recorder.seen(),
        vec![QueryStatus::InProgress, QueryStatus::Completed]
    );
    assert!(!poller.is_tracking(id).await);
    assert_eq!(poller.tracked_count().await, 0);
    assert_eq!(transport.calls(Endpoint::Progress), 4);
}

#[tokio::test]
async fn finished_entries_are_removed_after_the_sweep() {
    let finished = ScriptedTransport::new();
    finished.progress(QueryStatus::AuthFailed);
    let running = ScriptedTransport::new();
    running.progress(QueryStatus::Downloading);

    let poller = StatusPoller::new(Duration::from_secs(15)).unwrap();
    let recorder = Recorder::new();
    poller
        .register(handle(&finished), recorder.clone(), QueryStatus::Waiting)
        .await;
    poller
        .register(handle(&running), recorder.clone(), QueryStatus::Waiting)
        .await;

    let summary = poller.tick().await;

    assert_eq!(
        summary,
        TickSummary {
            polled: 2,
            notified: 2,
            dropped: 1
        }
    );
    // Registration order is scan order.
    assert_eq!(
        recorder.seen(),
        vec![QueryStatus::AuthFailed, QueryStatus::Downloading]
    );
    assert_eq!(poller.tracked_count().await, 1);
}

#[tokio::test]
async fn unreachable_query_is_dropped_and_reported_lost() {
    let transport = ScriptedTransport::new();
    transport.fail(Endpoint::Progress, "timed out");
    let poller = StatusPoller::new(Duration::from_secs(15)).unwrap();
    let recorder = Recorder::new();

    poller
        .register(handle(&transport), recorder.clone(), QueryStatus::InProgress)
        .await;
    let summary = poller.tick().await;

    assert_eq!(summary.dropped, 1);
    assert_eq!(recorder.lost(), 1);
    assert!(recorder.seen().is_empty());
    assert_eq!(poller.tracked_count().await, 0);

    // Never retried once dropped.
    poller.tick().await;
    assert_eq!(transport.calls(Endpoint::Progress), 1);
}

#[tokio::test(start_paused = true)]
async fn background_task_sweeps_on_its_interval() {
    let transport = ScriptedTransport::new();
    transport
        .progress(QueryStatus::InProgress)
        .progress(QueryStatus::Completed);
    let poller = Arc::new(StatusPoller::new(Duration::from_secs(15)).unwrap());
    let recorder = Recorder::new();
    poller
        .register(handle(&transport), recorder.clone(), QueryStatus::Waiting)
        .await;

    let shutdown = CancellationToken::new();
    let worker = Arc::clone(&poller).spawn(shutdown.clone());

    // No sweep before the first full interval.
    tokio::time::sleep(Duration::from_secs(14)).await;
    assert_eq!(transport.calls(Endpoint::Progress), 0);

    tokio::time::sleep(Duration::from_secs(17)).await;
    assert_eq!(
        recorder.seen(),
        vec![QueryStatus::InProgress, QueryStatus::Completed]
    );
    assert_eq!(poller.tracked_count().await, 0);

    shutdown.cancel();
    worker.await.expect("poller task exits cleanly");
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_outstanding_entries() {
    let transport = ScriptedTransport::new();
    transport.progress(QueryStatus::Waiting);
    let poller = Arc::new(StatusPoller::new(Duration::from_secs(15)).unwrap());
    poller
        .register(handle(&transport), Recorder::new(), QueryStatus::Waiting)
        .await;

    let shutdown = CancellationToken::new();
    let worker = Arc::clone(&poller).spawn(shutdown.clone());
    shutdown.cancel();
    worker.await.expect("poller task exits cleanly");

    assert_eq!(poller.tracked_count().await, 0);
    assert_eq!(transport.calls(Endpoint::Progress), 0);
}
