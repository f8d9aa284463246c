//! Chunked data-parallel execution engine.
//!
//! A range is split into contiguous chunks, chunk work is farmed out to an
//! [`Executor`], and the per-chunk results are merged into one deterministic
//! outcome. Three drivers sit on top of the executor:
//!
//! - [`Partitioner`] for fan-out/fan-in work whose chunks are independent,
//! - [`ScanPartitioner`] for prefix computations that need a sequential
//!   combine pass between two parallel passes,
//! - [`CancellationToken`] for search-style early exit shared by all chunks.
//!
//! Algorithms are written as a sequential/parallel strategy pair and picked at
//! runtime from an [`ExecutionPolicy`] by [`dispatch`]:
//!
//! ```no_run
//! use par_partition::{algorithms, ExecutionPolicy};
//!
//! let data: Vec<u64> = (0 .. 1_000_000).collect();
//! let policy = ExecutionPolicy::parallel();
//! let found = algorithms::find(&policy, data, 4242).get().unwrap();
//! assert_eq!(found, Some(4242));
//! ```

extern crate num_cpus;

use std::sync::{Arc, OnceLock};

use crossbeam::channel::{self, Receiver};

pub mod algorithms;
pub mod cancellation;
pub mod chunk;
pub mod config;
pub mod cursor;
pub mod dispatch;
pub mod error;
pub mod par;
pub mod partitioner;
pub mod policy;
pub mod result;
pub mod scan;
pub mod seq;

pub use cancellation::{Better, CancellationToken, Greater, Less};
pub use chunk::{ChunkDescriptor, ChunkSpan};
pub use config::{ChunkingConfig, ExecutorConfig};
pub use cursor::{Cursor, SharedSlice};
pub use dispatch::{dispatch, Algorithm};
pub use error::{ChunkFailure, ExecutionError, ExecutorError, JobError};
pub use partitioner::Partitioner;
pub use policy::{Blocking, ExecutionPolicy, Mode};
pub use result::{AlgorithmResult, FutureHandle};
pub use scan::{PartitionScanResult, ScanPartitioner};

/// Unit of work handed to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to the executor a policy runs on.
pub type ExecutorHandle = Arc<dyn Executor>;

/// Completion signal of one submitted [`Job`].
///
/// The signal fires when the job returns or unwinds.
pub struct Completion {
    done: Receiver<()>,
}

impl Completion {
    /// Wraps `job` so that its completion is observable.
    pub fn track(job: Job) -> (Job, Completion) {
        let (done_tx, done_rx) = channel::bounded::<()>(1);
        let tracked = Box::new(move || {
            // the signal is the sender going away, so unwinding counts too
            let _done = done_tx;
            job();
        });
        (tracked, Completion { done: done_rx })
    }

    /// A completion that has already fired.
    pub fn resolved() -> Completion {
        let (_, done_rx) = channel::bounded::<()>(1);
        Completion { done: done_rx }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.done.try_recv(), Err(channel::TryRecvError::Disconnected))
    }

    /// Blocks until the job has finished.
    pub fn wait(self) {
        while self.done.recv().is_ok() { }
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.done
    }
}

/// Runs chunk work somewhere: inline, on a worker pool, or anywhere else that can
/// signal completion.
pub trait Executor: Send + Sync {
    /// How many jobs may make progress at the same time.
    fn concurrency(&self) -> usize;

    fn submit(&self, job: Job) -> Result<Completion, ExecutorError>;

    /// Blocks until every completion in `completions` has fired.
    fn wait_all(&self, completions: Vec<Completion>) {
        for completion in completions {
            completion.wait();
        }
    }
}

/// Process-wide parallel executor sized from [`ExecutorConfig::from_env`].
///
/// Falls back to the inline executor if no worker thread can be spawned.
pub fn default_executor() -> ExecutorHandle {
    static DEFAULT: OnceLock<ExecutorHandle> = OnceLock::new();
    DEFAULT
        .get_or_init(|| {
            match par::ParallelExecutor::from_config(&ExecutorConfig::from_env()).start() {
                Ok(executor) =>
                    Arc::new(executor) as ExecutorHandle,
                Err(error) => {
                    tracing::error!(%error, "falling back to inline execution");
                    Arc::new(seq::SequentialExecutor::new()) as ExecutorHandle
                },
            }
        })
        .clone()
}
