// crates/monitor/tests/session.rs
//! End-to-end session tests: a mock REST server for the snapshot fetch and
//! an in-process WebSocket server for the stream, racing for real.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

use autologin_client::ApiClient;
use autologin_monitor::{MonitorEvent, MonitorSession, NavState, REDIRECT_DELAY};
use autologin_types::JobStatus;

/// One-connection WebSocket server driven by `serve`.
async fn spawn_ws_server<F, Fut>(serve: F) -> String
where
    F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(socket).await.unwrap();
        serve(ws).await;
    });
    format!("ws://{addr}")
}

/// Read until the consumer's close frame, then exit. Keeps the connection
/// alive without generating events.
async fn hold_open(mut ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) {
    while let Some(Ok(frame)) = ws.next().await {
        if matches!(frame, Message::Close(_)) {
            break;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn full_monitoring_lifecycle_fires_navigation() {
    let mut api = mockito::Server::new_async().await;
    api.mock("GET", "/api/job/abc123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"abc123","status":"pending","totalAccounts":50}"#)
        .create_async()
        .await;

    // The stream waits for the snapshot to land before it starts talking, so
    // the ordering in this test is deterministic: snapshot first, then logs,
    // then the two replacements.
    let (go_tx, go_rx) = oneshot::channel::<()>();
    let ws_base = spawn_ws_server(|mut ws| async move {
        go_rx.await.unwrap();
        for frame in [
            r#"{"type":"log","data":{"level":"info","message":"parsing accounts"}}"#,
            r#"{"type":"log","data":{"level":"info","message":"workers started"}}"#,
            r#"{"type":"log","data":{"level":"warn","message":"user_7 throttled"}}"#,
            r#"{"id":"abc123","status":"processing","successCount":5,"totalAccounts":50}"#,
            r#"{"id":"abc123","status":"completed","successCount":48,"failCount":2,"totalAccounts":50,"endTime":"2026-02-05T12:05:00Z"}"#,
        ] {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        hold_open(ws).await;
    })
    .await;

    let client = ApiClient::new(api.url());
    let mut session = MonitorSession::open(&client, &ws_base, "abc123").await.unwrap();
    assert!(session.current().is_none());

    let mut go_tx = Some(go_tx);
    let mut completed_at = None;
    let navigation = loop {
        let event = session.next_event().await.expect("sources not exhausted");
        match event {
            MonitorEvent::SnapshotApplied(job) => {
                assert_eq!(job.status, JobStatus::Pending);
                assert_eq!(job.total_accounts, 50);
                go_tx.take().unwrap().send(()).unwrap();
            }
            MonitorEvent::JobUpdated(job) if job.status == JobStatus::Completed => {
                completed_at = Some(tokio::time::Instant::now());
            }
            MonitorEvent::JobUpdated(_) | MonitorEvent::LogAppended(_) => {}
            MonitorEvent::Navigate(navigation) => break navigation,
            other => panic!("unexpected event: {other:?}"),
        }
    };

    assert_eq!(navigation.job_id, "abc123");
    assert_eq!(session.nav_state(), NavState::Fired);

    // Fired one redirect delay after the completed replacement was applied.
    let elapsed = tokio::time::Instant::now() - completed_at.expect("saw completed");
    assert!(elapsed >= REDIRECT_DELAY);
    assert!(elapsed < REDIRECT_DELAY + Duration::from_millis(200));

    // Reconciled view is the last payload, whole-value.
    let job = session.current().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.success_count, 48);
    assert_eq!(job.fail_count, 2);
    assert!(job.end_time.is_some());

    // Three log events, in arrival order.
    let messages: Vec<&str> = session.logs().iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["parsing accounts", "workers started", "user_7 throttled"]);

    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn late_stale_snapshot_overwrites_stream_state() {
    let mut api = mockito::Server::new_async().await;
    // Body delayed in real time so the stream's completed replacement is
    // processed first — the out-of-order completion the design accepts.
    api.mock("GET", "/api/job/abc123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(300));
            w.write_all(br#"{"id":"abc123","status":"pending","totalAccounts":50}"#)
        })
        .create_async()
        .await;

    let ws_base = spawn_ws_server(|mut ws| async move {
        ws.send(Message::Text(
            r#"{"id":"abc123","status":"completed","successCount":48,"failCount":2}"#.into(),
        ))
        .await
        .unwrap();
        hold_open(ws).await;
    })
    .await;

    let client = ApiClient::new(api.url());
    let mut session = MonitorSession::open(&client, &ws_base, "abc123").await.unwrap();

    let mut saw_update = false;
    loop {
        match session.next_event().await.expect("sources not exhausted") {
            MonitorEvent::JobUpdated(job) => {
                assert_eq!(job.status, JobStatus::Completed);
                saw_update = true;
            }
            MonitorEvent::SnapshotApplied(job) => {
                assert!(saw_update, "stream should land before the delayed snapshot");
                assert_eq!(job.status, JobStatus::Pending);
                break;
            }
            MonitorEvent::Navigate(_) => {} // armed by the completed frame
            other => panic!("unexpected event: {other:?}"),
        }
    }

    // Last write wins: the stale pending snapshot is the visible view now.
    let job = session.current().unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.success_count, 0);

    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn snapshot_failure_does_not_freeze_the_stream() {
    let mut api = mockito::Server::new_async().await;
    api.mock("GET", "/api/job/abc123")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"Job not found"}"#)
        .create_async()
        .await;

    let ws_base = spawn_ws_server(|mut ws| async move {
        for frame in [
            r#"{"type":"log","data":{"level":"info","message":"still streaming"}}"#,
            r#"{"id":"abc123","status":"processing","successCount":1}"#,
        ] {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        ws.send(Message::Close(None)).await.unwrap();
    })
    .await;

    let client = ApiClient::new(api.url());
    let mut session = MonitorSession::open(&client, &ws_base, "abc123").await.unwrap();

    let mut saw_snapshot_failure = false;
    let mut saw_log = false;
    let mut saw_update = false;
    let mut saw_closed = false;
    while let Some(event) = session.next_event().await {
        match event {
            MonitorEvent::SnapshotFailed(e) => {
                assert!(e.to_string().contains("not found"));
                saw_snapshot_failure = true;
            }
            MonitorEvent::LogAppended(_) => saw_log = true,
            MonitorEvent::JobUpdated(_) => saw_update = true,
            MonitorEvent::StreamClosed => saw_closed = true,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    assert!(saw_snapshot_failure);
    assert!(saw_log);
    assert!(saw_update);
    assert!(saw_closed);

    // Partial state stays visible after the channel errors and closes.
    assert_eq!(session.logs().len(), 1);
    assert_eq!(session.current().unwrap().status, JobStatus::Processing);
    assert_eq!(session.nav_state(), NavState::Idle);
}

#[tokio::test(start_paused = true)]
async fn stream_failure_is_reported_once_then_frozen() {
    let mut api = mockito::Server::new_async().await;
    api.mock("GET", "/api/job/abc123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"abc123","status":"processing","successCount":3}"#)
        .create_async()
        .await;

    let (go_tx, go_rx) = oneshot::channel::<()>();
    let ws_base = spawn_ws_server(|mut ws| async move {
        go_rx.await.unwrap();
        ws.send(Message::Text(
            r#"{"type":"log","data":{"level":"error","message":"engine crashed"}}"#.into(),
        ))
        .await
        .unwrap();
        // Abrupt drop, no close handshake.
        use tokio::io::AsyncWriteExt;
        let _ = ws.get_mut().shutdown().await;
    })
    .await;

    let client = ApiClient::new(api.url());
    let mut session = MonitorSession::open(&client, &ws_base, "abc123").await.unwrap();

    let mut go_tx = Some(go_tx);
    let mut failures = 0;
    while let Some(event) = session.next_event().await {
        match event {
            MonitorEvent::SnapshotApplied(_) => go_tx.take().unwrap().send(()).unwrap(),
            MonitorEvent::LogAppended(_) => {}
            MonitorEvent::StreamFailed(_) => failures += 1,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    // Exactly one failure report, no reconnection, then exhaustion. The last
    // known state survives.
    assert_eq!(failures, 1);
    assert_eq!(session.logs().len(), 1);
    assert_eq!(session.current().unwrap().success_count, 3);
}

#[tokio::test(start_paused = true)]
async fn teardown_before_delay_cancels_navigation() {
    let mut api = mockito::Server::new_async().await;
    api.mock("GET", "/api/job/abc123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"abc123","status":"completed","successCount":48,"endTime":"2026-02-05T12:05:00Z"}"#)
        .create_async()
        .await;

    let (closed_tx, closed_rx) = oneshot::channel::<()>();
    let ws_base = spawn_ws_server(|ws| async move {
        hold_open(ws).await;
        let _ = closed_tx.send(());
    })
    .await;

    let client = ApiClient::new(api.url());
    let mut session = MonitorSession::open(&client, &ws_base, "abc123").await.unwrap();

    // The snapshot itself reports completed: the controller arms.
    match session.next_event().await.unwrap() {
        MonitorEvent::SnapshotApplied(job) => assert_eq!(job.status, JobStatus::Completed),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(session.nav_state(), NavState::Armed);

    // Tear down well before the 3000 ms elapse.
    session.shutdown();
    assert_eq!(session.nav_state(), NavState::Cancelled);

    // The server sees the close frame: the connection was released, not
    // leaked. (No timeout here: with the clock paused a virtual timeout
    // would elapse before the real socket roundtrip finishes.)
    closed_rx.await.expect("stream should be closed on teardown");

    // And no stray navigation ever fires.
    tokio::time::sleep(REDIRECT_DELAY * 2).await;
    assert!(session.next_event().await.is_none());
    assert_eq!(session.nav_state(), NavState::Cancelled);
}
