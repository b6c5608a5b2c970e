/// Remix backends abstraction
///
/// The service has been observed speaking two API flavors: a signed-URL
/// flow (`/upload/sign` + `/tasks/*`) and a multipart flow (`/upload` +
/// `/process/*`). Both live behind one trait so the rest of the client
/// never cares which one is deployed.
pub mod process;
pub mod tasks;

use crate::asset::{RemoteAsset, UploadedAsset};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::job::{JobId, JobUpdate};
use crate::style::{OutputFormat, StylePreset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use process::ProcessBackend;
pub use tasks::TasksBackend;

/// Backend API flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Signed-URL uploads, `/tasks/*` job endpoints.
    Tasks,
    /// Multipart uploads, `/process/*` job endpoints.
    Process,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tasks => write!(f, "tasks"),
            Self::Process => write!(f, "process"),
        }
    }
}

/// Everything the backend needs to start one remix job.
///
/// At least one style signal (preset or free text) should be present for a
/// meaningful result; the backend is the judge of that, not this client.
#[derive(Debug, Clone)]
pub struct RemixRequest {
    /// Uploaded original track.
    pub original: RemoteAsset,

    /// Optional uploaded style-reference track.
    pub reference: Option<RemoteAsset>,

    /// Free-text style description.
    pub style_text: Option<String>,

    /// Preset remix style.
    pub preset: Option<StylePreset>,

    /// Target BPM.
    pub target_bpm: Option<u32>,

    /// Requested output container.
    pub output_format: OutputFormat,
}

/// Remix backend trait.
#[async_trait::async_trait]
pub trait RemixBackend: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// API flavor.
    fn kind(&self) -> BackendKind;

    /// Check the backend is reachable.
    async fn is_available(&self) -> Result<bool>;

    /// Transfer one local file, returning its stable remote reference.
    async fn upload(&self, asset: &UploadedAsset) -> Result<RemoteAsset>;

    /// Start a remix job. Returns immediately with the job id.
    async fn submit(&self, request: &RemixRequest) -> Result<JobId>;

    /// Fetch the current job status.
    async fn status(&self, id: &JobId) -> Result<JobUpdate>;

    /// Download the finished output to `dest`, returning the written path.
    async fn download(&self, output: &str, dest: &Path) -> Result<PathBuf>;
}

/// Backend factory for creating backend instances.
///
/// Returns `Arc` rather than `Box`: the poller task holds a second reference
/// for the lifetime of its polling loop.
pub struct BackendFactory;

impl BackendFactory {
    /// Create backend from config.
    pub fn create(config: &ClientConfig) -> Result<Arc<dyn RemixBackend>> {
        match config.backend {
            BackendKind::Tasks => Ok(Arc::new(TasksBackend::new(config)?)),
            BackendKind::Process => Ok(Arc::new(ProcessBackend::new(config)?)),
        }
    }
}
