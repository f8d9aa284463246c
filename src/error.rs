use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("executor was not started")]
    NotStarted,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("executor job queue is disconnected")]
    Disconnected,
}

/// What a chunk closure reports when it cannot produce its result.
///
/// `From<TryReserveError>` lets closures write `buf.try_reserve(n)?` and have an
/// allocation failure classified as resource exhaustion.
#[derive(Debug)]
pub enum ChunkFailure<E> {
    Failed(E),
    ResourceExhausted(TryReserveError),
}

impl<E> From<TryReserveError> for ChunkFailure<E> {
    fn from(error: TryReserveError) -> Self {
        ChunkFailure::ResourceExhausted(error)
    }
}

/// A failure attributed to a single chunk.
#[derive(Debug, Error)]
pub enum JobError<E> {
    #[error("chunk #{chunk} failed: {error}")]
    Failed { chunk: usize, error: E },
    #[error("chunk #{chunk} ran out of memory: {source}")]
    ResourceExhausted { chunk: usize, source: TryReserveError },
    #[error("chunk #{chunk} panicked: {message}")]
    Panicked { chunk: usize, message: String },
}

impl<E> JobError<E> {
    pub(crate) fn from_failure(chunk: usize, failure: ChunkFailure<E>) -> JobError<E> {
        match failure {
            ChunkFailure::Failed(error) => JobError::Failed { chunk, error },
            ChunkFailure::ResourceExhausted(source) => JobError::ResourceExhausted { chunk, source },
        }
    }

    pub fn chunk(&self) -> usize {
        match *self {
            JobError::Failed { chunk, .. } |
            JobError::ResourceExhausted { chunk, .. } |
            JobError::Panicked { chunk, .. } =>
                chunk,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError<E> {
    #[error("executor failure: {0}")]
    Executor(#[from] ExecutorError),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(#[source] TryReserveError),
    #[error("{0}")]
    Job(JobError<E>),
    #[error("{} chunks failed", .0.len())]
    Several(Vec<JobError<E>>),
    #[error("{0}")]
    Sequential(E),
}

impl<E> ExecutionError<E> {
    /// Folds the failures collected from one parallel pass into a single error.
    ///
    /// Returns `None` if nothing failed. Failures are ordered by chunk index so the
    /// surfaced value does not depend on completion order.
    pub(crate) fn from_job_errors(mut errors: Vec<JobError<E>>) -> Option<ExecutionError<E>> {
        if errors.is_empty() {
            return None;
        }
        errors.sort_by_key(JobError::chunk);

        if errors.iter().all(|e| matches!(e, JobError::ResourceExhausted { .. })) {
            if let Some(JobError::ResourceExhausted { source, .. }) = errors.into_iter().next() {
                return Some(ExecutionError::ResourceExhausted(source));
            }
            return None;
        }

        if errors.len() == 1 {
            errors.pop().map(ExecutionError::Job)
        } else {
            Some(ExecutionError::Several(errors))
        }
    }

    /// Chunk-level failures carried by this error, if any.
    pub fn job_errors(&self) -> &[JobError<E>] {
        match self {
            ExecutionError::Job(error) => std::slice::from_ref(error),
            ExecutionError::Several(errors) => errors,
            _ => &[],
        }
    }

    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, ExecutionError::ResourceExhausted(..))
    }
}
