use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Counts ingest batches running in the background.
#[derive(Debug, Default)]
pub struct IngestJobs {
    active: AtomicUsize,
    started: AtomicUsize,
}

impl IngestJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Spawns `job` with a monitor task that releases the slot once the job
    /// ends, including when it panics or is cancelled. The returned handle
    /// resolves to `false` in that case.
    pub fn spawn<F>(self: &Arc<Self>, job: F) -> JoinHandle<bool>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Counted before the job can run.
        self.active.fetch_add(1, Ordering::SeqCst);
        self.started.fetch_add(1, Ordering::SeqCst);

        let handle = tokio::spawn(job);
        let jobs = Arc::clone(self);
        tokio::spawn(async move {
            let finished = match handle.await {
                Ok(()) => true,
                Err(err) => {
                    tracing::error!("[regtree] Ingest task panicked or was cancelled: {}", err);
                    false
                }
            };
            jobs.active.fetch_sub(1, Ordering::SeqCst);
            finished
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finished_job_releases_its_slot() {
        let jobs = Arc::new(IngestJobs::new());
        let monitor = jobs.spawn(async {});
        assert!(monitor.await.unwrap());
        assert_eq!(jobs.active(), 0);
        assert_eq!(jobs.started(), 1);
    }

    #[tokio::test]
    async fn panicking_job_still_releases_its_slot() {
        let jobs = Arc::new(IngestJobs::new());
        let (release, wait) = tokio::sync::oneshot::channel::<()>();
        let monitor = jobs.spawn(async move {
            let _ = wait.await;
            panic!("document blew up");
        });
        assert_eq!(jobs.active(), 1);

        release.send(()).unwrap();
        assert!(!monitor.await.unwrap());
        assert_eq!(jobs.active(), 0);
    }
}
