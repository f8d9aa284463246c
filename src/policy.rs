use std::fmt;
use std::sync::Arc;

use super::{default_executor, ChunkingConfig, ExecutorHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Sequential,
    Parallel,
    /// Same execution as [`Mode::Parallel`]; chunk closures must not rely on
    /// element order within a chunk either.
    ParallelUnsequenced,
}

impl Mode {
    pub fn is_parallel(self) -> bool {
        !matches!(self, Mode::Sequential)
    }
}

/// Whether an algorithm call blocks for its result or returns a deferred handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blocking {
    Blocking,
    Task,
}

/// How an algorithm should run: mode, result delivery, chunking and executor.
///
/// Policies are immutable values; the builder methods return modified copies.
#[derive(Clone)]
pub struct ExecutionPolicy {
    mode: Mode,
    blocking: Blocking,
    chunk_hint: Option<usize>,
    chunking: ChunkingConfig,
    executor: ExecutorHandle,
}

impl ExecutionPolicy {
    pub fn new(mode: Mode, executor: ExecutorHandle) -> ExecutionPolicy {
        ExecutionPolicy {
            mode,
            blocking: Blocking::Blocking,
            chunk_hint: None,
            chunking: ChunkingConfig::default(),
            executor,
        }
    }

    /// Runs on the calling thread.
    pub fn sequential() -> ExecutionPolicy {
        ExecutionPolicy::new(Mode::Sequential, Arc::new(super::seq::SequentialExecutor::new()))
    }

    /// Runs on the process-wide default executor.
    pub fn parallel() -> ExecutionPolicy {
        ExecutionPolicy::new(Mode::Parallel, default_executor())
    }

    pub fn parallel_unsequenced() -> ExecutionPolicy {
        ExecutionPolicy::new(Mode::ParallelUnsequenced, default_executor())
    }

    /// Same policy, delivering results through a [`FutureHandle`](super::FutureHandle).
    pub fn task(&self) -> ExecutionPolicy {
        ExecutionPolicy { blocking: Blocking::Task, ..self.clone() }
    }

    pub fn blocking(&self) -> ExecutionPolicy {
        ExecutionPolicy { blocking: Blocking::Blocking, ..self.clone() }
    }

    /// Fixed number of elements per chunk; 0 restores automatic chunking.
    pub fn with_chunk_size(&self, chunk_size: usize) -> ExecutionPolicy {
        let chunk_hint = if chunk_size == 0 { None } else { Some(chunk_size) };
        ExecutionPolicy { chunk_hint, ..self.clone() }
    }

    pub fn with_chunking(&self, chunking: ChunkingConfig) -> ExecutionPolicy {
        ExecutionPolicy { chunking, ..self.clone() }
    }

    pub fn with_executor(&self, executor: ExecutorHandle) -> ExecutionPolicy {
        ExecutionPolicy { executor, ..self.clone() }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn blocking_mode(&self) -> Blocking {
        self.blocking
    }

    pub fn is_task(&self) -> bool {
        self.blocking == Blocking::Task
    }

    pub fn chunk_hint(&self) -> Option<usize> {
        self.chunk_hint
    }

    pub fn chunking(&self) -> ChunkingConfig {
        self.chunking
    }

    pub fn executor(&self) -> &ExecutorHandle {
        &self.executor
    }

    pub fn concurrency(&self) -> usize {
        self.executor.concurrency().max(1)
    }
}

impl fmt::Debug for ExecutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPolicy")
            .field("mode", &self.mode)
            .field("blocking", &self.blocking)
            .field("chunk_hint", &self.chunk_hint)
            .field("chunking", &self.chunking)
            .field("concurrency", &self.executor.concurrency())
            .finish()
    }
}
