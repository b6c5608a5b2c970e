/// Three-step remix wizard state machine
///
/// Upload -> SelectStyle -> Generate, with a generation sub-state nested in
/// the last step. The wizard owns the session's assets, style selection,
/// active job, and the poller handle driving it; forward transitions are
/// guarded, backward transitions and reset always succeed. Everything here
/// is in-memory for one session; reset discards it all.
use remix_pipeline::{
    Job, JobStatus, OutputFormat, PollerHandle, RemixBackend, RemixError, RemixRequest,
    StylePreset, StyleSelection, UploadedAsset,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum WizardError {
    /// A guarded transition was attempted without its precondition.
    #[error("blocked: {0}")]
    Blocked(&'static str),

    #[error(transparent)]
    Pipeline(#[from] RemixError),

    /// Download requested before the job completed.
    #[error("no completed output to download")]
    NotComplete,
}

/// Wizard step. Linear, 1-2-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Upload,
    SelectStyle,
    Generate,
}

impl Step {
    /// 1-based step number for display.
    pub fn number(&self) -> u8 {
        match self {
            Self::Upload => 1,
            Self::SelectStyle => 2,
            Self::Generate => 3,
        }
    }
}

/// Generation sub-state inside step 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Idle,
    Generating,
    Complete,
}

/// One remix session.
pub struct Wizard {
    backend: Arc<dyn RemixBackend>,
    poll_interval: Duration,

    step: Step,
    original: Option<UploadedAsset>,
    reference: Option<UploadedAsset>,
    selection: StyleSelection,
    output_format: OutputFormat,
    require_style_text: bool,

    generation: Generation,
    job: Option<Job>,
    poller: Option<PollerHandle>,
    last_error: Option<String>,
}

impl Wizard {
    pub fn new(backend: Arc<dyn RemixBackend>, poll_interval: Duration) -> Self {
        Self {
            backend,
            poll_interval,
            step: Step::Upload,
            original: None,
            reference: None,
            selection: StyleSelection::default(),
            output_format: OutputFormat::default(),
            require_style_text: true,
            generation: Generation::Idle,
            job: None,
            poller: None,
            last_error: None,
        }
    }

    /// Flow variant where the free-text description is optional and step 1
    /// only needs the original track.
    pub fn with_optional_style_text(mut self) -> Self {
        self.require_style_text = false;
        self
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn selection(&self) -> &StyleSelection {
        &self.selection
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn original(&self) -> Option<&UploadedAsset> {
        self.original.as_ref()
    }

    pub fn reference(&self) -> Option<&UploadedAsset> {
        self.reference.as_ref()
    }

    /// Select the original track. Only meaningful on step 1; replacing the
    /// file discards any previous upload of it.
    pub fn set_original(&mut self, path: impl Into<PathBuf>) -> Result<(), WizardError> {
        if self.step != Step::Upload {
            return Err(WizardError::Blocked("file selection happens on step 1"));
        }
        self.original = Some(UploadedAsset::from_path(path)?);
        Ok(())
    }

    /// Select the optional style-reference track.
    pub fn set_reference(&mut self, path: impl Into<PathBuf>) -> Result<(), WizardError> {
        if self.step != Step::Upload {
            return Err(WizardError::Blocked("file selection happens on step 1"));
        }
        self.reference = Some(UploadedAsset::from_path(path)?);
        Ok(())
    }

    pub fn clear_reference(&mut self) {
        if self.step == Step::Upload {
            self.reference = None;
        }
    }

    pub fn set_style_text(&mut self, text: impl Into<String>) {
        self.selection.style_text = text.into();
    }

    pub fn select_preset(&mut self, preset: StylePreset) {
        self.selection.preset = Some(preset);
        if self.selection.target_bpm.is_none() {
            self.selection.target_bpm = Some(preset.bpm());
        }
    }

    pub fn set_target_bpm(&mut self, bpm: u32) {
        self.selection.target_bpm = Some(bpm);
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    /// Guard for step 1 -> 2.
    pub fn can_advance_to_style(&self) -> bool {
        let text_ok = !self.require_style_text || !self.selection.style_text.trim().is_empty();
        self.original.is_some() && text_ok
    }

    /// Step 1 -> 2: upload any not-yet-uploaded assets, then advance.
    ///
    /// Uploads are sequential, original first; a failure on the original
    /// aborts before the reference is attempted, the wizard stays on step 1
    /// and nothing about the session changes. Assets that already carry a
    /// remote reference are never re-uploaded.
    pub async fn advance_to_style(&mut self) -> Result<(), WizardError> {
        if self.step != Step::Upload {
            return Err(WizardError::Blocked("not on step 1"));
        }
        if !self.can_advance_to_style() {
            return Err(WizardError::Blocked(
                "original track and style description are required",
            ));
        }

        let backend = self.backend.clone();
        if let Some(original) = self.original.as_mut() {
            if let Err(e) = ensure_uploaded(&backend, original).await {
                self.last_error = Some(surface_message(&e));
                return Err(e.into());
            }
        }
        if let Some(reference) = self.reference.as_mut() {
            if let Err(e) = ensure_uploaded(&backend, reference).await {
                self.last_error = Some(surface_message(&e));
                return Err(e.into());
            }
        }

        self.last_error = None;
        self.step = Step::SelectStyle;
        Ok(())
    }

    /// Guard for step 2 -> 3.
    pub fn can_advance_to_generate(&self) -> bool {
        self.selection.preset.is_some()
    }

    /// Step 2 -> 3: clears any previous job and enters the idle sub-state.
    pub fn advance_to_generate(&mut self) -> Result<(), WizardError> {
        if self.step != Step::SelectStyle {
            return Err(WizardError::Blocked("not on step 2"));
        }
        if !self.can_advance_to_generate() {
            return Err(WizardError::Blocked("a preset style must be selected"));
        }

        self.cancel_poller();
        self.job = None;
        self.generation = Generation::Idle;
        self.step = Step::Generate;
        Ok(())
    }

    /// Explicit back navigation. Unguarded; discards forward state but keeps
    /// uploaded asset references so nothing is re-uploaded later.
    pub fn back(&mut self) {
        match self.step {
            Step::Generate => {
                self.cancel_poller();
                self.job = None;
                self.generation = Generation::Idle;
                self.step = Step::SelectStyle;
            }
            Step::SelectStyle => {
                self.step = Step::Upload;
            }
            Step::Upload => {}
        }
    }

    /// Reset from any state: cancel polling, drop all entities, back to
    /// step 1.
    pub fn reset(&mut self) {
        self.cancel_poller();
        self.step = Step::Upload;
        self.original = None;
        self.reference = None;
        self.selection = StyleSelection::default();
        self.output_format = OutputFormat::default();
        self.generation = Generation::Idle;
        self.job = None;
        self.last_error = None;
    }

    /// Submit the remix job and start polling it.
    ///
    /// Any prior poller is cancelled before the new one starts; only one
    /// job is ever live per session. On submission failure the sub-state
    /// stays idle.
    pub async fn start_generation(&mut self) -> Result<watch::Receiver<Job>, WizardError> {
        if self.step != Step::Generate {
            return Err(WizardError::Blocked("not on step 3"));
        }
        if self.generation == Generation::Generating {
            return Err(WizardError::Blocked("a job is already generating"));
        }

        let original = self
            .original
            .as_ref()
            .and_then(|a| a.remote.clone())
            .ok_or(WizardError::Blocked("original track was never uploaded"))?;
        let reference = self.reference.as_ref().and_then(|a| a.remote.clone());

        let request = RemixRequest {
            original,
            reference,
            style_text: if self.selection.style_text.trim().is_empty() {
                None
            } else {
                Some(self.selection.style_text.clone())
            },
            preset: self.selection.preset,
            target_bpm: self.selection.effective_bpm(),
            output_format: self.output_format,
        };

        // Cancel before replace.
        self.cancel_poller();

        let id = match self.backend.submit(&request).await {
            Ok(id) => id,
            Err(e) => {
                self.generation = Generation::Idle;
                self.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };
        log::info!("remix job {} submitted", id);

        let handle =
            remix_pipeline::JobPoller::spawn(self.backend.clone(), id.clone(), self.poll_interval);
        let rx = handle.subscribe();
        self.job = Some(Job::new(id));
        self.poller = Some(handle);
        self.generation = Generation::Generating;
        self.last_error = None;

        Ok(rx)
    }

    /// Pull the latest poller snapshot into the wizard and settle the
    /// generation sub-state. Call after each observed update.
    pub fn refresh(&mut self) {
        let Some(poller) = self.poller.as_ref() else {
            return;
        };

        let snapshot = poller.latest();
        match snapshot.status {
            JobStatus::Succeeded => {
                self.generation = Generation::Complete;
                self.job = Some(snapshot);
                self.cancel_poller();
            }
            JobStatus::Failed => {
                // Failure returns the sub-state to idle; no download
                // affordance is offered.
                self.last_error = snapshot.error.clone();
                self.generation = Generation::Idle;
                self.job = Some(snapshot);
                self.cancel_poller();
            }
            _ => {
                self.job = Some(snapshot);
            }
        }
    }

    /// Suggested filename for the finished remix. The extension follows the
    /// format the backend says it rendered, falling back to the requested one.
    pub fn download_filename(&self) -> String {
        let style = self
            .selection
            .preset
            .map(|p| p.id())
            .unwrap_or("mix");
        let ext = self
            .job
            .as_ref()
            .and_then(|j| j.output_format.as_deref())
            .unwrap_or_else(|| self.output_format.ext());
        format!("dj_remix_{}.{}", style, ext)
    }

    /// Output reference of the completed job, if any.
    pub fn output_ref(&self) -> Option<&str> {
        if self.generation != Generation::Complete {
            return None;
        }
        self.job.as_ref().and_then(|j| j.output.as_deref())
    }

    /// Download the completed remix into `dest_dir`.
    pub async fn download(&self, dest_dir: &Path) -> Result<PathBuf, WizardError> {
        let output = self.output_ref().ok_or(WizardError::NotComplete)?;
        let dest = dest_dir.join(self.download_filename());
        Ok(self.backend.download(output, &dest).await?)
    }

    fn cancel_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }
}

/// User-facing message for an upload error: the server's own words where we
/// have them, the full error otherwise.
fn surface_message(e: &RemixError) -> String {
    match e {
        RemixError::UploadSigning(m) | RemixError::UploadTransfer(m) => m.clone(),
        other => other.to_string(),
    }
}

/// Upload `asset` unless it already has a remote reference.
async fn ensure_uploaded(
    backend: &Arc<dyn RemixBackend>,
    asset: &mut UploadedAsset,
) -> Result<(), RemixError> {
    if asset.is_uploaded() {
        return Ok(());
    }
    let remote = backend.upload(asset).await?;
    asset.remote = Some(remote);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_numbering() {
        assert_eq!(Step::Upload.number(), 1);
        assert_eq!(Step::SelectStyle.number(), 2);
        assert_eq!(Step::Generate.number(), 3);
    }

    #[test]
    fn test_surface_message_prefers_server_words() {
        let e = RemixError::UploadSigning("bad filename".to_string());
        assert_eq!(surface_message(&e), "bad filename");

        let e = RemixError::Submission("boom".to_string());
        assert_eq!(surface_message(&e), "job submission failed: boom");
    }
}
