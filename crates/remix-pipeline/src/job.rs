/// Remix job lifecycle tracking
///
/// A `Job` is one backend-side unit of processing work. The client only ever
/// learns about it through status polls; this module owns the rules for
/// folding raw status responses into a monotone job snapshot.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque job identifier assigned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job status. Moves pending -> running -> {succeeded | failed} and never
/// backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Ordering rank used to reject backward transitions.
    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Succeeded | Self::Failed => 2,
        }
    }

    /// Map the union of status strings observed across backend variants.
    /// Unknown strings are treated as still pending.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "queued" | "pending" => Self::Pending,
            "started" | "starting" | "running" | "processing" => Self::Running,
            "finished" | "complete" | "completed" | "succeeded" => Self::Succeeded,
            "failed" | "error" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// One raw status observation, as reported by a backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobUpdate {
    /// Status string already mapped to the client enum.
    pub status: Option<JobStatus>,

    /// Raw progress value; may exceed 100 or regress, callers clamp.
    pub progress: Option<f64>,

    /// Output reference (absolute URL or output filename).
    pub output: Option<String>,

    /// Error message on failure.
    pub error: Option<String>,

    /// Detected tempo of the source, reported on success.
    pub bpm: Option<f64>,

    /// Detected musical key, reported on success.
    pub key: Option<String>,

    /// Output format the backend actually rendered.
    pub output_format: Option<String>,
}

/// Client-side job snapshot. Mutated only through [`Job::apply`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,

    /// Display progress, 0-100, monotonically non-decreasing.
    pub progress: u8,

    /// Output reference, set when the backend reports success.
    pub output: Option<String>,

    /// Error message, set when the backend reports failure.
    pub error: Option<String>,

    /// Source analysis metadata reported with the result.
    pub bpm: Option<f64>,
    pub key: Option<String>,

    /// Output format the backend actually rendered, reported on success.
    pub output_format: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// New pending job for a freshly submitted id.
    pub fn new(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            output: None,
            error: None,
            bpm: None,
            key: None,
            output_format: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fold one status observation into the snapshot.
    ///
    /// Enforces the lifecycle invariants: progress is clamped to 0-100 and
    /// never decreases, status never moves backward, success forces progress
    /// to 100, and a terminal snapshot ignores everything further.
    pub fn apply(&mut self, update: JobUpdate) {
        if self.is_terminal() {
            return;
        }

        if let Some(p) = update.progress {
            let clamped = p.clamp(0.0, 100.0) as u8;
            self.progress = self.progress.max(clamped);
        }

        if let Some(status) = update.status {
            if status.rank() > self.status.rank() {
                self.status = status;
            }
        }

        match self.status {
            JobStatus::Succeeded => {
                self.progress = 100;
                if update.output.is_some() {
                    self.output = update.output;
                }
                self.bpm = update.bpm.or(self.bpm);
                self.key = update.key.or(self.key.take());
                self.output_format = update.output_format.or(self.output_format.take());
            }
            JobStatus::Failed => {
                self.error = update.error.or(self.error.take());
            }
            _ => {}
        }

        self.updated_at = Utc::now();
    }
}
