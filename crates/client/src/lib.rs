// crates/client/src/lib.rs
//! HTTP and WebSocket clients for the autologin batch server.
//!
//! [`ApiClient`] covers the one-shot surface (submit, snapshot fetch,
//! download links); [`EventStream`] covers the long-lived per-job stream.
//! Neither retries: every failure is surfaced once and is terminal for the
//! current view.

pub mod api;
pub mod error;
pub mod stream;

pub use api::{ApiClient, ResultKind, SubmitRequest};
pub use error::{FetchError, StreamError, SubmitError};
pub use stream::{EventStream, StreamEvent};
