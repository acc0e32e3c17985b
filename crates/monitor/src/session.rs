// crates/monitor/src/session.rs
//! One monitoring session: the single logical task queue for one job id.

use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use autologin_client::{ApiClient, EventStream, FetchError, StreamError, StreamEvent};
use autologin_types::{Job, LogEvent, StreamMessage};

use crate::navigation::{NavState, Navigation, NavigationController};
use crate::store::JobStateStore;

/// What happened on the session's event loop, in processing order.
#[derive(Debug)]
pub enum MonitorEvent {
    /// The one-shot snapshot fetch resolved and was applied.
    SnapshotApplied(Job),
    /// The snapshot fetch failed. Terminal for that channel — no retry —
    /// but the stream keeps feeding the session.
    SnapshotFailed(FetchError),
    /// A stream job replacement was applied.
    JobUpdated(Job),
    /// A stream log event was appended to the buffer.
    LogAppended(LogEvent),
    /// The server closed the stream cleanly.
    StreamClosed,
    /// The stream failed; the session is frozen at its last known state.
    StreamFailed(StreamError),
    /// The delayed results-view navigation fired.
    Navigate(Navigation),
}

enum Source {
    Snapshot(Result<Job, FetchError>),
    Stream(Option<StreamEvent>),
    Nav(Option<Navigation>),
}

/// Owns every resource of one monitoring session: the reconciliation store,
/// the stream connection, the pending snapshot fetch, and the navigation
/// timer.
///
/// The snapshot fetch and the stream race; both post their completions to
/// [`MonitorSession::next_event`], the only place state mutates — one
/// logical task queue, one writer, arbitrary interleaving between the two
/// sources. Teardown ([`MonitorSession::shutdown`] or drop) releases the
/// socket and the timer deterministically.
pub struct MonitorSession {
    job_id: String,
    store: JobStateStore,
    nav: NavigationController,
    nav_rx: mpsc::UnboundedReceiver<Navigation>,
    nav_delivered: bool,
    stream: EventStream,
    stream_done: bool,
    snapshot_rx: Option<oneshot::Receiver<Result<Job, FetchError>>>,
}

impl MonitorSession {
    /// Start monitoring `job_id`: kick off the snapshot fetch and open the
    /// stream concurrently. Fails only if the stream cannot connect; a
    /// doomed fetch surfaces later as [`MonitorEvent::SnapshotFailed`].
    pub async fn open(
        client: &ApiClient,
        ws_base: &str,
        job_id: &str,
    ) -> Result<Self, StreamError> {
        let (snap_tx, snap_rx) = oneshot::channel();
        let fetch_client = client.clone();
        let fetch_id = job_id.to_string();
        tokio::spawn(async move {
            // Receiver dropped means the session is already gone.
            let _ = snap_tx.send(fetch_client.fetch_job(&fetch_id).await);
        });

        let stream = EventStream::connect(ws_base, job_id).await?;
        let (nav, nav_rx) = NavigationController::new();

        info!(job_id, "monitoring session opened");

        Ok(Self {
            job_id: job_id.to_string(),
            store: JobStateStore::new(),
            nav,
            nav_rx,
            nav_delivered: false,
            stream,
            stream_done: false,
            snapshot_rx: Some(snap_rx),
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// The reconciled view (absent until the first update lands).
    pub fn current(&self) -> Option<&Job> {
        self.store.current()
    }

    pub fn logs(&self) -> &[LogEvent] {
        self.store.logs()
    }

    pub fn nav_state(&self) -> NavState {
        self.nav.state()
    }

    /// Wait for the next completion from any source, apply it, and report
    /// it. Returns `None` once every source is exhausted: snapshot resolved,
    /// stream ended, and no navigation can still fire.
    pub async fn next_event(&mut self) -> Option<MonitorEvent> {
        loop {
            if self.exhausted() {
                return None;
            }

            let picked = {
                let snapshot_rx = &mut self.snapshot_rx;
                let stream = &mut self.stream;
                let stream_done = self.stream_done;
                let nav_rx = &mut self.nav_rx;

                tokio::select! {
                    result = async {
                        match snapshot_rx.as_mut() {
                            Some(rx) => rx.await,
                            None => std::future::pending().await,
                        }
                    } => {
                        *snapshot_rx = None;
                        // A dropped fetch task counts as a transport-side loss.
                        Source::Snapshot(result.unwrap_or_else(|_| {
                            Err(FetchError::BadResponse("snapshot fetch task dropped".into()))
                        }))
                    }
                    event = async {
                        if stream_done {
                            std::future::pending().await
                        } else {
                            stream.next().await
                        }
                    } => Source::Stream(event),
                    nav = nav_rx.recv() => Source::Nav(nav),
                }
            };

            match picked {
                Source::Snapshot(Ok(job)) => {
                    self.store.apply_initial_snapshot(job.clone());
                    self.nav.observe(&job);
                    return Some(MonitorEvent::SnapshotApplied(job));
                }
                Source::Snapshot(Err(e)) => {
                    warn!(job_id = %self.job_id, error = %e, "snapshot fetch failed");
                    return Some(MonitorEvent::SnapshotFailed(e));
                }
                Source::Stream(Some(StreamEvent::Message(StreamMessage::Log(event)))) => {
                    self.store
                        .apply_stream_message(StreamMessage::Log(event.clone()));
                    return Some(MonitorEvent::LogAppended(event));
                }
                Source::Stream(Some(StreamEvent::Message(StreamMessage::Snapshot(job)))) => {
                    self.store
                        .apply_stream_message(StreamMessage::Snapshot(job.clone()));
                    self.nav.observe(&job);
                    return Some(MonitorEvent::JobUpdated(job));
                }
                Source::Stream(Some(StreamEvent::Closed)) => {
                    self.stream_done = true;
                    return Some(MonitorEvent::StreamClosed);
                }
                Source::Stream(Some(StreamEvent::Error(e))) => {
                    // Surfaced once; the session stays frozen at its last
                    // known state. Already-buffered logs and the current job
                    // view remain readable.
                    self.stream_done = true;
                    return Some(MonitorEvent::StreamFailed(e));
                }
                Source::Stream(None) => {
                    self.stream_done = true;
                }
                Source::Nav(Some(navigation)) => {
                    self.nav_delivered = true;
                    return Some(MonitorEvent::Navigate(navigation));
                }
                Source::Nav(None) => {
                    self.nav_delivered = true;
                }
            }
        }
    }

    /// True when no source can produce another event.
    fn exhausted(&self) -> bool {
        let nav_pending = match self.nav.state() {
            NavState::Armed => true,
            NavState::Fired => !self.nav_delivered,
            NavState::Idle | NavState::Cancelled => false,
        };
        self.snapshot_rx.is_none() && self.stream_done && !nav_pending
    }

    /// Tear the session down: release the stream connection, then the
    /// pending navigation timer. Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        self.stream.close();
        self.nav.cancel();
        info!(job_id = %self.job_id, "monitoring session closed");
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        self.stream.close();
        self.nav.cancel();
    }
}
