//! Bounded pool for synchronous collaborator calls.
//!
//! Some model SDKs and retrieval backends only expose blocking calls. Running them on the
//! async scheduler would stall every in-flight query, so they are moved onto tokio's blocking
//! threads through [`WorkerPool::run`]. A semaphore caps how many of those jobs run at once;
//! callers past the cap wait asynchronously for a permit.
//!
//! ```rust
//! use agentrelay::worker_pool::WorkerPool;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let pool = WorkerPool::new(2);
//! let answer = pool.run(|| 6 * 7).await.unwrap();
//! assert_eq!(answer, 42);
//! # }
//! ```

use crate::agentrelay::config::{RouterConfig, DEFAULT_MAX_BLOCKING_WORKERS};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Failures raised by the pool itself (not by the job).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerPoolError {
    /// The pool's semaphore was closed.
    Closed,
    /// The job panicked or was aborted on its blocking thread.
    Panicked(String),
}

impl fmt::Display for WorkerPoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerPoolError::Closed => write!(f, "Worker pool is closed"),
            WorkerPoolError::Panicked(msg) => write!(f, "Worker job failed: {}", msg),
        }
    }
}

impl Error for WorkerPoolError {}

/// Semaphore-bounded front for `tokio::task::spawn_blocking`.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool that runs at most `size` jobs concurrently (minimum 1).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Pool sized by [`RouterConfig::max_blocking_workers`].
    pub fn from_config(config: &RouterConfig) -> Self {
        WorkerPool::new(config.max_blocking_workers)
    }

    /// Maximum number of concurrently running jobs.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on a blocking thread once a permit is free and return its output.
    pub async fn run<F, T>(&self, job: F) -> Result<T, WorkerPoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| WorkerPoolError::Closed)?;

        let handle = tokio::task::spawn_blocking(move || {
            // Held for the lifetime of the job, released when the closure returns.
            let _permit = permit;
            job()
        });

        handle
            .await
            .map_err(|e| WorkerPoolError::Panicked(e.to_string()))
    }

    /// Stop handing out permits; queued and future `run` calls fail with [`WorkerPoolError::Closed`].
    pub fn close(&self) {
        self.permits.close();
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        WorkerPool::new(DEFAULT_MAX_BLOCKING_WORKERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_job_and_returns_value() {
        let pool = WorkerPool::new(1);
        assert_eq!(pool.run(|| "done".to_string()).await.unwrap(), "done");
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrency_never_exceeds_size() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let pool = pool.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_panicking_job_is_reported() {
        let pool = WorkerPool::new(1);
        let result: Result<(), _> = pool.run(|| panic!("boom")).await;
        assert!(matches!(result, Err(WorkerPoolError::Panicked(_))));
        // The permit is released even though the job panicked.
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_jobs() {
        let pool = WorkerPool::new(1);
        pool.close();
        assert_eq!(pool.run(|| 1).await, Err(WorkerPoolError::Closed));
    }
}
