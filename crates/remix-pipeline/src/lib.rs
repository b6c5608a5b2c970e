/// DJ Composer remix pipeline client
///
/// Talks to the remote remix service: uploads audio, submits processing
/// jobs, polls their status at a fixed cadence, and downloads the finished
/// output. All analysis and mixing is remote; this crate owns only the
/// client-side workflow.
pub mod asset;
pub mod backends;
pub mod config;
pub mod error;
pub mod job;
pub mod poller;
pub mod preview;
pub mod style;

pub use asset::{RemoteAsset, UploadedAsset};
pub use backends::{BackendFactory, BackendKind, RemixBackend, RemixRequest};
pub use config::{ClientConfig, DEFAULT_POLL_INTERVAL_MS};
pub use error::{RemixError, Result};
pub use job::{Job, JobId, JobStatus, JobUpdate};
pub use poller::{JobPoller, PollerHandle};
pub use preview::{generate_previews, PresetPreview};
pub use style::{OutputFormat, StylePreset, StyleSelection};
