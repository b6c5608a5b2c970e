/// Fixed-interval job status polling
///
/// One poller drives one job. It queries the backend at a fixed cadence,
/// folds each response into a monotone [`Job`] snapshot published through a
/// watch channel, and stops on the first terminal status. There is no
/// backoff and no attempt ceiling; a stuck backend is polled until the
/// handle is cancelled or dropped.
use crate::backends::RemixBackend;
use crate::job::{Job, JobId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawns polling tasks for submitted jobs.
pub struct JobPoller;

impl JobPoller {
    /// Start polling `id` every `interval`.
    ///
    /// The returned handle owns the task: cancelling or dropping it stops
    /// the loop, so a poller can never outlive the state that owns it.
    pub fn spawn(
        backend: Arc<dyn RemixBackend>,
        id: JobId,
        interval: Duration,
    ) -> PollerHandle {
        let (tx, rx) = watch::channel(Job::new(id.clone()));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut job = Job::new(id.clone());

            loop {
                ticker.tick().await;

                let update = match backend.status(&id).await {
                    Ok(update) => update,
                    Err(e) => {
                        // Transient by design: tolerate network blips and
                        // keep polling.
                        log::warn!("status poll for job {} failed: {}", id, e);
                        continue;
                    }
                };

                job.apply(update);
                let terminal = job.is_terminal();
                if tx.send(job.clone()).is_err() {
                    // Nobody is listening anymore.
                    break;
                }
                if terminal {
                    break;
                }
            }
        });

        PollerHandle { rx, task }
    }
}

/// Owned, cancellable handle to a running poller.
pub struct PollerHandle {
    rx: watch::Receiver<Job>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Latest published job snapshot.
    pub fn latest(&self) -> Job {
        self.rx.borrow().clone()
    }

    /// Subscribe to job snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Job> {
        self.rx.clone()
    }

    /// Stop polling. Idempotent; safe to call after the loop has already
    /// finished.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// True once the polling loop has exited (terminal status or cancel).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit and return the final snapshot.
    pub async fn wait(mut self) -> Job {
        let _ = (&mut self.task).await;
        self.rx.borrow().clone()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        // Scoped cleanup: no orphaned timers survive their owner.
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{RemoteAsset, UploadedAsset};
    use crate::backends::{BackendKind, RemixRequest};
    use crate::error::{RemixError, Result};
    use crate::job::{JobStatus, JobUpdate};
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend double that replays a fixed script of status responses and
    /// counts how often it was asked.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<JobUpdate>>>,
        polls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<JobUpdate>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                polls: AtomicUsize::new(0),
            })
        }

        fn poll_count(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl RemixBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
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

        async fn submit(&self, _request: &RemixRequest) -> Result<JobId> {
            Ok(JobId("scripted".into()))
        }

        async fn status(&self, _id: &JobId) -> Result<JobUpdate> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            match script.pop_front() {
                Some(next) => next,
                // Script exhausted: report a stuck running job.
                None => Ok(JobUpdate {
                    status: Some(JobStatus::Running),
                    progress: Some(50.0),
                    ..Default::default()
                }),
            }
        }

        async fn download(&self, _output: &str, dest: &Path) -> Result<PathBuf> {
            Ok(dest.to_path_buf())
        }
    }

    fn running(progress: f64) -> Result<JobUpdate> {
        Ok(JobUpdate {
            status: Some(JobStatus::Running),
            progress: Some(progress),
            ..Default::default()
        })
    }

    fn finished(output: &str) -> Result<JobUpdate> {
        Ok(JobUpdate {
            status: Some(JobStatus::Succeeded),
            output: Some(output.to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_poller_reaches_terminal_and_stops() {
        let backend = ScriptedBackend::new(vec![
            running(45.0),
            finished("https://x/out.mp3"),
        ]);
        let interval = Duration::from_millis(10);

        let handle = JobPoller::spawn(backend.clone(), JobId("j1".into()), interval);
        let job = handle.wait().await;

        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.progress, 100);
        assert_eq!(job.output.as_deref(), Some("https://x/out.mp3"));

        // No further requests once terminal.
        let polls = backend.poll_count();
        tokio::time::sleep(interval * 5).await;
        assert_eq!(backend.poll_count(), polls);
        assert_eq!(polls, 2);
    }

    #[tokio::test]
    async fn test_transient_status_errors_are_swallowed() {
        let backend = ScriptedBackend::new(vec![
            running(10.0),
            Err(RemixError::Status("connection reset".into())),
            running(60.0),
            finished("https://x/out.mp3"),
        ]);

        let handle = JobPoller::spawn(
            backend.clone(),
            JobId("j2".into()),
            Duration::from_millis(5),
        );
        let job = handle.wait().await;

        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(backend.poll_count(), 4);
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let backend = ScriptedBackend::new(vec![
            running(30.0),
            Ok(JobUpdate {
                status: Some(JobStatus::Failed),
                error: Some("decode error".into()),
                ..Default::default()
            }),
        ]);

        let handle = JobPoller::spawn(
            backend.clone(),
            JobId("j3".into()),
            Duration::from_millis(5),
        );
        let job = handle.wait().await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("decode error"));
        assert_ne!(job.progress, 100);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_and_stops_polling() {
        let backend = ScriptedBackend::new(vec![]);
        let interval = Duration::from_millis(10);

        let handle = JobPoller::spawn(backend.clone(), JobId("j4".into()), interval);
        tokio::time::sleep(interval * 3).await;

        handle.cancel();
        handle.cancel();
        tokio::time::sleep(interval).await;
        assert!(handle.is_finished());

        let polls = backend.poll_count();
        tokio::time::sleep(interval * 5).await;
        assert_eq!(backend.poll_count(), polls);
    }

    #[tokio::test]
    async fn test_drop_aborts_the_loop() {
        let backend = ScriptedBackend::new(vec![]);
        let interval = Duration::from_millis(10);

        {
            let _handle = JobPoller::spawn(backend.clone(), JobId("j5".into()), interval);
            tokio::time::sleep(interval * 3).await;
        }

        let polls = backend.poll_count();
        tokio::time::sleep(interval * 5).await;
        assert_eq!(backend.poll_count(), polls);
    }
}
