/// Per-style preview generation
///
/// Batch-generates one short preview per preset so a user can hear each
/// style before committing. Each preview is an ordinary job with the
/// ordinary submit-then-poll lifecycle; the batch runs sequentially, one
/// active poller at a time.
use crate::asset::RemoteAsset;
use crate::backends::{RemixBackend, RemixRequest};
use crate::error::Result;
use crate::job::Job;
use crate::poller::JobPoller;
use crate::style::{OutputFormat, StylePreset};
use std::sync::Arc;
use std::time::Duration;

/// Terminal job for one preset's preview.
#[derive(Debug, Clone)]
pub struct PresetPreview {
    pub preset: StylePreset,
    pub job: Job,
}

/// Generate a preview job for every preset in `presets`, polling each to a
/// terminal state before submitting the next.
pub async fn generate_previews(
    backend: Arc<dyn RemixBackend>,
    original: &RemoteAsset,
    presets: &[StylePreset],
    poll_interval: Duration,
) -> Result<Vec<PresetPreview>> {
    let mut previews = Vec::with_capacity(presets.len());

    for &preset in presets {
        let request = RemixRequest {
            original: original.clone(),
            reference: None,
            style_text: None,
            preset: Some(preset),
            target_bpm: Some(preset.bpm()),
            output_format: OutputFormat::Mp3,
        };

        let id = backend.submit(&request).await?;
        log::info!("preview job {} submitted for style {}", id, preset);

        let handle = JobPoller::spawn(backend.clone(), id, poll_interval);
        let job = handle.wait().await;
        previews.push(PresetPreview { preset, job });
    }

    Ok(previews)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::UploadedAsset;
    use crate::backends::BackendKind;
    use crate::job::{JobId, JobStatus, JobUpdate};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double that finishes every job on the first poll and records
    /// the presets it was asked for.
    struct InstantBackend {
        submissions: std::sync::Mutex<Vec<String>>,
        jobs: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RemixBackend for InstantBackend {
        fn name(&self) -> &str {
            "instant"
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Tasks
        }

        async fn is_available(&self) -> Result<bool> {
            Ok(true)
        }

        async fn upload(&self, _asset: &UploadedAsset) -> Result<RemoteAsset> {
            Ok(RemoteAsset::Url("https://x/uploads/a.mp3".into()))
        }

        async fn submit(&self, request: &RemixRequest) -> Result<JobId> {
            let n = self.jobs.fetch_add(1, Ordering::SeqCst);
            self.submissions
                .lock()
                .unwrap()
                .push(request.preset.map(|p| p.id().to_string()).unwrap_or_default());
            Ok(JobId(format!("preview-{}", n)))
        }

        async fn status(&self, id: &JobId) -> Result<JobUpdate> {
            Ok(JobUpdate {
                status: Some(JobStatus::Succeeded),
                progress: Some(100.0),
                output: Some(format!("https://x/{}.mp3", id)),
                ..Default::default()
            })
        }

        async fn download(&self, _output: &str, dest: &Path) -> Result<PathBuf> {
            Ok(dest.to_path_buf())
        }
    }

    #[tokio::test]
    async fn test_one_preview_job_per_preset() {
        let backend = Arc::new(InstantBackend {
            submissions: std::sync::Mutex::new(Vec::new()),
            jobs: AtomicUsize::new(0),
        });

        let previews = generate_previews(
            backend.clone(),
            &RemoteAsset::Url("https://x/uploads/a.mp3".into()),
            &StylePreset::ALL,
            Duration::from_millis(5),
        )
        .await
        .unwrap();

        assert_eq!(previews.len(), 4);
        for preview in &previews {
            assert_eq!(preview.job.status, JobStatus::Succeeded);
            assert!(preview.job.output.is_some());
        }

        let submitted = backend.submissions.lock().unwrap().clone();
        assert_eq!(submitted, vec!["house", "techno", "trance", "drum-n-bass"]);
    }
}
