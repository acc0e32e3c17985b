// crates/client/src/api.rs
//! One-shot HTTP surface: job submission, snapshot fetches, download links.

use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, info};

use autologin_types::Job;

use crate::error::{FetchError, SubmitError};

/// Inclusive worker-count bounds accepted by the server.
pub const MIN_WORKERS: u32 = 1;
pub const MAX_WORKERS: u32 = 10;

/// Which result file a download link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Success,
    Fail,
}

impl ResultKind {
    fn as_str(self) -> &'static str {
        match self {
            ResultKind::Success => "success",
            ResultKind::Fail => "fail",
        }
    }
}

/// A new-job submission: the account file, worker count, optional proxy list.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub workers: u32,
    pub proxy: Option<(String, Vec<u8>)>,
}

impl SubmitRequest {
    pub fn new(file_name: impl Into<String>, file_bytes: Vec<u8>, workers: u32) -> Self {
        Self {
            file_name: file_name.into(),
            file_bytes,
            workers,
            proxy: None,
        }
    }

    pub fn with_proxy(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.proxy = Some((name.into(), bytes));
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    job_id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the batch server's REST API.
///
/// Holds one `reqwest::Client`; cheap to clone. Every operation is a single
/// request with no retry — failures are terminal for the caller's view.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a batch of account logins. Returns the server-assigned job id.
    ///
    /// Input validation happens before any bytes go on the wire, so a
    /// rejected request never leaves a partial job behind.
    pub async fn submit(&self, request: SubmitRequest) -> Result<String, SubmitError> {
        if request.file_bytes.is_empty() {
            return Err(SubmitError::MissingFile);
        }
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&request.workers) {
            return Err(SubmitError::InvalidWorkers(request.workers));
        }

        let mut form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(request.file_bytes).file_name(request.file_name.clone()),
            )
            .text("workers", request.workers.to_string());

        if let Some((name, bytes)) = request.proxy {
            form = form.part("proxy", multipart::Part::bytes(bytes).file_name(name));
        }

        debug!(file = %request.file_name, workers = request.workers, "submitting job");

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|source| SubmitError::Transport { source })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| "no error detail".to_string());
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::BadResponse(e.to_string()))?;

        info!(job_id = %body.job_id, "job submitted");
        Ok(body.job_id)
    }

    /// Fetch the current snapshot of one job.
    pub async fn fetch_job(&self, id: &str) -> Result<Job, FetchError> {
        let response = self
            .http
            .get(format!("{}/api/job/{id}", self.base_url))
            .send()
            .await
            .map_err(|source| FetchError::Transport { source })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { id: id.to_string() });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                what: "job",
            });
        }

        response
            .json::<Job>()
            .await
            .map_err(|e| FetchError::BadResponse(e.to_string()))
    }

    /// Fetch all job summaries, in whatever order the server chose.
    pub async fn fetch_jobs(&self) -> Result<Vec<Job>, FetchError> {
        let response = self
            .http
            .get(format!("{}/api/jobs", self.base_url))
            .send()
            .await
            .map_err(|source| FetchError::Transport { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                what: "jobs",
            });
        }

        response
            .json::<Vec<Job>>()
            .await
            .map_err(|e| FetchError::BadResponse(e.to_string()))
    }

    /// Build the download link for a job's result file. The file body itself
    /// is not processed here.
    pub fn download_url(&self, kind: ResultKind, id: &str) -> String {
        format!("{}/api/download/{}/{id}", self.base_url, kind.as_str())
    }
}
