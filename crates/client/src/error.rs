// crates/client/src/error.rs
use thiserror::Error;

/// Failures submitting a new job. No partial job exists after any of these;
/// the caller must not open a monitoring session.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("account file is required")]
    MissingFile,

    #[error("worker count {0} out of range 1-10")]
    InvalidWorkers(u32),

    #[error("server rejected upload ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
    },

    #[error("upload transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed upload response: {0}")]
    BadResponse(String),
}

/// Failures fetching a job snapshot or the job list. Not-found is distinct
/// from transport trouble; both are terminal for the current view.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("job not found: {id}")]
    NotFound { id: String },

    #[error("server error ({status}) fetching {what}")]
    Http { status: u16, what: &'static str },

    #[error("fetch transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed fetch response: {0}")]
    BadResponse(String),
}

/// Failures on the job event stream. Reported at most once per connection;
/// there is no automatic reconnection — recovery means the user reloads.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream connect failed: {source}")]
    Connect {
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("stream protocol error: {source}")]
    Protocol {
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("stream closed unexpectedly")]
    UnexpectedClose,
}
