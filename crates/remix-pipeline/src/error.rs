/// Error taxonomy for the remix pipeline
use thiserror::Error;

/// Errors surfaced by upload, submission, polling, and download.
///
/// `Status` is the only transient variant: the poller logs it and keeps
/// polling. Everything else aborts the operation that produced it and is
/// recovered by the user re-triggering the action.
#[derive(Debug, Error)]
pub enum RemixError {
    /// Server rejected the upload signing request. Carries the
    /// server-supplied message verbatim.
    #[error("upload signing rejected: {0}")]
    UploadSigning(String),

    /// Transfer of file bytes to storage failed (non-2xx).
    #[error("upload transfer failed: {0}")]
    UploadTransfer(String),

    /// Job create/start endpoint failed or returned a malformed body.
    #[error("job submission failed: {0}")]
    Submission(String),

    /// Status endpoint unreachable or unparsable. Transient by design.
    #[error("status query failed: {0}")]
    Status(String),

    /// Backend explicitly reported job failure. Terminal.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// Output download failed or job has no output yet.
    #[error("download failed: {0}")]
    Download(String),

    /// Invalid local input (empty filename, missing file).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RemixError>;
