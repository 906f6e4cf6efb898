//! Event executors.
//!
//! The dispatcher never runs listener code on the read loop. It hands every
//! delivery job to the session's [`EventExecutor`], which is chosen once at
//! construction:
//!
//! - [`ConcurrentExecutor`]: every job is spawned as its own task. Jobs may
//!   overlap and finish in any order.
//! - [`OrderedExecutor`]: jobs go into an unbounded FIFO consumed by a single
//!   worker task, so job *n + 1* starts only after job *n* has finished.
//!   Submission never blocks the read loop.

use std::fmt;
use std::str::FromStr;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A unit of work submitted to an executor.
pub type Job = BoxFuture<'static, ()>;

/// Runs delivery jobs.
pub trait EventExecutor: Send + Sync + fmt::Debug {
    /// Schedules `job`. Must return without waiting for the job.
    fn execute(&self, job: Job);
}

/// How listener jobs are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One worker, strict arrival order.
    #[default]
    Ordered,
    /// One task per job, no ordering.
    Concurrent,
}

impl ExecutionMode {
    /// Builds the executor for this mode.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn executor(self) -> Box<dyn EventExecutor> {
        match self {
            Self::Ordered => Box::new(OrderedExecutor::new()),
            Self::Concurrent => Box::new(ConcurrentExecutor),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordered => f.write_str("ordered"),
            Self::Concurrent => f.write_str("concurrent"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ordered" => Ok(Self::Ordered),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(format!(
                "unknown execution mode '{other}', expected 'ordered' or 'concurrent'"
            )),
        }
    }
}

// =============================================================================
// Concurrent
// =============================================================================

/// Spawns one task per job.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentExecutor;

impl EventExecutor for ConcurrentExecutor {
    fn execute(&self, job: Job) {
        tokio::spawn(job);
    }
}

// =============================================================================
// Ordered
// =============================================================================

/// Runs jobs one at a time, in submission order.
///
/// The worker exits once the executor is dropped and the queue is drained.
#[derive(Debug)]
pub struct OrderedExecutor {
    queue: mpsc::UnboundedSender<Job>,
}

impl OrderedExecutor {
    /// Starts the worker task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (queue, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
            debug!("Ordered executor worker stopped");
        });
        Self { queue }
    }
}

impl EventExecutor for OrderedExecutor {
    fn execute(&self, job: Job) {
        if self.queue.send(job).is_err() {
            warn!("Ordered executor worker is gone, dropping job");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::FutureExt;
    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ordered_runs_jobs_serially() {
        let executor = OrderedExecutor::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = oneshot::channel();

        for i in 0..5u64 {
            let log = Arc::clone(&log);
            executor.execute(
                async move {
                    log.lock().push(format!("start {i}"));
                    // Earlier jobs sleep longer; order must still hold.
                    tokio::time::sleep(Duration::from_millis(50 - i * 10)).await;
                    log.lock().push(format!("end {i}"));
                }
                .boxed(),
            );
        }
        executor.execute(
            async move {
                let _ = done_tx.send(());
            }
            .boxed(),
        );

        done_rx.await.unwrap();
        let expected: Vec<String> = (0..5)
            .flat_map(|i| [format!("start {i}"), format!("end {i}")])
            .collect();
        assert_eq!(*log.lock(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_jobs_overlap() {
        let executor = ConcurrentExecutor;
        let log = Arc::new(Mutex::new(Vec::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        for (i, delay) in [(0, 30u64), (1, 10)] {
            let (log, tx) = (Arc::clone(&log), tx.clone());
            executor.execute(
                async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    log.lock().push(i);
                    let _ = tx.send(());
                }
                .boxed(),
            );
        }

        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        assert_eq!(*log.lock(), vec![1, 0]);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Ordered".parse::<ExecutionMode>(), Ok(ExecutionMode::Ordered));
        assert_eq!(
            "concurrent".parse::<ExecutionMode>(),
            Ok(ExecutionMode::Concurrent)
        );
        assert!("parallel".parse::<ExecutionMode>().is_err());
        assert_eq!(ExecutionMode::default().to_string(), "ordered");
    }
}
