// crates/client/src/stream.rs
//! Long-lived WebSocket stream of job updates.
//!
//! One connection per monitoring session, keyed by job id. Messages arrive in
//! strict order; connection-level failure is reported once and the stream
//! stays down — no automatic reconnection. Recovery is the caller's problem
//! (in practice: the user reloads), which keeps failure handling a single
//! policy instead of hidden retry loops.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use autologin_types::StreamMessage;

use crate::error::StreamError;

/// What the reader task hands to the consumer, in arrival order.
#[derive(Debug)]
pub enum StreamEvent {
    /// A well-formed frame, already translated off the wire.
    Message(StreamMessage),
    /// The server closed the connection cleanly.
    Closed,
    /// The connection failed. At most one of these per stream.
    Error(StreamError),
}

/// Handle to one per-job stream connection.
///
/// Dropping the handle (or calling [`EventStream::close`]) signals the reader
/// task to shut the socket down; the release is deterministic, not
/// best-effort.
pub struct EventStream {
    job_id: String,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    close_tx: Option<oneshot::Sender<()>>,
}

impl EventStream {
    /// Open the stream for `job_id` against `ws_base` (e.g. `ws://host:8080`).
    pub async fn connect(ws_base: &str, job_id: &str) -> Result<Self, StreamError> {
        let url = format!("{}/ws/{job_id}", ws_base.trim_end_matches('/'));
        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|source| StreamError::Connect { source })?;

        info!(job_id, %url, "job stream connected");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = oneshot::channel();

        tokio::spawn(read_loop(ws, events_tx, close_rx, job_id.to_string()));

        Ok(Self {
            job_id: job_id.to_string(),
            events: events_rx,
            close_tx: Some(close_tx),
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Next event in arrival order; `None` once the reader task has exited
    /// and the channel drained.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Release the connection. Idempotent; also invoked on drop.
    pub fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            // Reader may already be gone after an error; that's fine.
            let _ = tx.send(());
            debug!(job_id = %self.job_id, "job stream close requested");
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.close();
    }
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn read_loop(
    ws: WsStream,
    events_tx: mpsc::UnboundedSender<StreamEvent>,
    mut close_rx: oneshot::Receiver<()>,
    job_id: String,
) {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                let _ = sink.send(Message::Close(None)).await;
                debug!(job_id, "job stream closed by consumer");
                return;
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match StreamMessage::parse(text.as_str()) {
                            Ok(msg) => {
                                if events_tx.send(StreamEvent::Message(msg)).is_err() {
                                    // Consumer gone; nothing left to deliver to.
                                    return;
                                }
                            }
                            Err(e) => {
                                warn!(job_id, error = %e, "dropping malformed stream frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        let _ = events_tx.send(StreamEvent::Closed);
                        return;
                    }
                    Some(Ok(_)) => {} // ping/pong/binary: not part of the protocol
                    Some(Err(source)) => {
                        let _ = events_tx.send(StreamEvent::Error(StreamError::Protocol { source }));
                        return;
                    }
                    None => {
                        let _ = events_tx.send(StreamEvent::Error(StreamError::UnexpectedClose));
                        return;
                    }
                }
            }
        }
    }
}
