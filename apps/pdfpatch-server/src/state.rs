//! Shared application state

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pdfpatch_core::MutationOptions;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    jobs: Arc<Semaphore>,
    max_jobs: usize,
    /// Per-request processing timeout in milliseconds
    pub timeout_ms: u64,
    /// Options used when a request does not carry its own
    pub options: MutationOptions,
}

impl AppState {
    pub fn new(max_jobs: usize, timeout_ms: u64, options: MutationOptions) -> Self {
        let max_jobs = max_jobs.max(1);
        Self {
            jobs: Arc::new(Semaphore::new(max_jobs)),
            max_jobs,
            timeout_ms,
            options,
        }
    }

    /// Run blocking PDF work on the blocking pool, holding a job slot.
    ///
    /// Returns `Busy` when every slot is taken. On timeout the caller gets an
    /// error but the job keeps its slot until it finishes.
    pub async fn run_job<T, F>(&self, job: F) -> Result<T, ServerError>
    where
        F: FnOnce() -> Result<T, ServerError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .jobs
            .clone()
            .try_acquire_owned()
            .map_err(|_| ServerError::Busy(self.max_jobs))?;

        let handle = tokio::task::spawn_blocking(move || {
            let result = job();
            drop(permit);
            result
        });

        with_timeout(self.timeout_ms, handle).await
    }
}

async fn with_timeout<T>(
    timeout_ms: u64,
    handle: impl Future<Output = Result<Result<T, ServerError>, tokio::task::JoinError>>,
) -> Result<T, ServerError> {
    match tokio::time::timeout(Duration::from_millis(timeout_ms), handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ServerError::Internal(format!(
            "PDF task panicked: {}",
            join_error
        ))),
        Err(_elapsed) => {
            warn!("PDF job exceeded {}ms", timeout_ms);
            Err(ServerError::Timeout(timeout_ms))
        }
    }
}
