use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel;
use tracing::{debug, trace, warn};

use super::chunk::{self, ChunkDescriptor};
use super::par::panic_message;
use super::{AlgorithmResult, ChunkFailure, Cursor, ExecutionError, ExecutionPolicy, ExecutorError, ExecutorHandle, JobError};

/// Runs `chunk_fn` once per item on `executor` and returns the outputs in item
/// order.
///
/// Once any item fails no further item is started: items still queued are
/// skipped, items already running finish and their outcome is collected.
pub(crate) fn run_chunks<I, R, E, F>(executor: &ExecutorHandle, items: Vec<I>, chunk_fn: Arc<F>) ->
    Result<Vec<R>, ExecutionError<E>>
    where I: Send + 'static,
          R: Send + 'static,
          E: Send + 'static,
          F: Fn(I) -> Result<R, ChunkFailure<E>> + Send + Sync + 'static
{
    let total = items.len();
    let mut outputs: Vec<Option<R>> = Vec::new();
    outputs.try_reserve_exact(total).map_err(ExecutionError::ResourceExhausted)?;
    outputs.resize_with(total, || None);

    let (tx, rx) = channel::unbounded();
    let failed = Arc::new(AtomicBool::new(false));
    let mut completions = Vec::with_capacity(total);
    let mut submit_error = None;

    for (chunk_index, item) in items.into_iter().enumerate() {
        if failed.load(Ordering::Acquire) {
            debug!(submitted = chunk_index, total, "chunk failed, not submitting the rest");
            break;
        }
        let tx = tx.clone();
        let job_failed = failed.clone();
        let chunk_fn = chunk_fn.clone();
        let job = Box::new(move || {
            if job_failed.load(Ordering::Acquire) {
                trace!(chunk = chunk_index, "chunk skipped");
                return;
            }
            trace!(chunk = chunk_index, "chunk started");
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| chunk_fn(item))) {
                Ok(Ok(output)) =>
                    Ok(output),
                Ok(Err(failure)) =>
                    Err(JobError::from_failure(chunk_index, failure)),
                Err(payload) =>
                    Err(JobError::Panicked { chunk: chunk_index, message: panic_message(&*payload) }),
            };
            if outcome.is_err() {
                job_failed.store(true, Ordering::Release);
            }
            let _ = tx.send((chunk_index, outcome));
        });
        match executor.submit(job) {
            Ok(completion) =>
                completions.push(completion),
            Err(error) => {
                failed.store(true, Ordering::Release);
                submit_error = Some(error);
                break;
            },
        }
    }
    drop(tx);
    executor.wait_all(completions);

    let mut errors = Vec::new();
    for (chunk_index, outcome) in rx.try_iter() {
        match outcome {
            Ok(output) => outputs[chunk_index] = Some(output),
            Err(error) => errors.push(error),
        }
    }
    if let Some(error) = ExecutionError::from_job_errors(errors) {
        warn!(failed = error.job_errors().len(), total, "parallel pass failed");
        return Err(error);
    }
    if let Some(error) = submit_error {
        warn!(%error, total, "parallel pass aborted");
        return Err(error.into());
    }
    outputs
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(ExecutionError::Executor(ExecutorError::Disconnected))
}

/// Effective chunk size: the policy's hint wins over the algorithm's, 0 means
/// automatic.
pub(crate) fn effective_chunk_size(policy: &ExecutionPolicy, chunk_size_hint: usize) -> Option<usize> {
    policy.chunk_hint().or(Some(chunk_size_hint).filter(|&size| size > 0))
}

pub(crate) fn restrict<P>(first: P, count: usize) -> P where P: Cursor {
    if first.len() > count {
        first.split_at(count).0
    } else {
        first
    }
}

/// Fan-out/fan-in driver for chunks that do not depend on each other.
pub struct Partitioner;

impl Partitioner {
    /// Splits the first `count` elements of `first` into chunks, runs
    /// `chunk_fn(start, count)` for each and hands the outputs, in chunk order,
    /// to `combine_fn`.
    pub fn call<P, R, T, E, F, G>(policy: &ExecutionPolicy,
                                  first: P,
                                  count: usize,
                                  chunk_size_hint: usize,
                                  chunk_fn: F,
                                  combine_fn: G) -> AlgorithmResult<T, E>
        where P: Cursor,
              R: Send + 'static,
              T: Send + 'static,
              E: Send + 'static,
              F: Fn(P, usize) -> Result<R, ChunkFailure<E>> + Send + Sync + 'static,
              G: FnOnce(Vec<R>) -> T + Send + 'static
    {
        Partitioner::call_with_index(
            policy,
            first,
            count,
            chunk_size_hint,
            move |chunk: ChunkDescriptor<P>| chunk_fn(chunk.start, chunk.count),
            combine_fn)
    }

    /// Like [`call`](Partitioner::call), but every chunk also learns its
    /// `base_index` in the whole range.
    ///
    /// An empty range never reaches the executor: `combine_fn` gets an empty
    /// collection right away.
    pub fn call_with_index<P, R, T, E, F, G>(policy: &ExecutionPolicy,
                                             first: P,
                                             count: usize,
                                             chunk_size_hint: usize,
                                             chunk_fn: F,
                                             combine_fn: G) -> AlgorithmResult<T, E>
        where P: Cursor,
              R: Send + 'static,
              T: Send + 'static,
              E: Send + 'static,
              F: Fn(ChunkDescriptor<P>) -> Result<R, ChunkFailure<E>> + Send + Sync + 'static,
              G: FnOnce(Vec<R>) -> T + Send + 'static
    {
        let first = restrict(first, count);
        let count = first.len();
        if count == 0 {
            return AlgorithmResult::resolved(policy.blocking_mode(), Ok(combine_fn(Vec::new())));
        }

        let executor = policy.executor().clone();
        let concurrency = policy.concurrency();
        let chunking = policy.chunking();
        let chunk_size = effective_chunk_size(policy, chunk_size_hint);
        AlgorithmResult::drive(policy, move || {
            let spans = chunk::plan(count, chunk_size, concurrency, &chunking)
                .map_err(ExecutionError::ResourceExhausted)?;
            let chunks = chunk::split(first, &spans).map_err(ExecutionError::ResourceExhausted)?;
            debug!(count, chunks = chunks.len(), "partitioned range");

            let outputs = run_chunks(&executor, chunks, Arc::new(chunk_fn))?;
            Ok(combine_fn(outputs))
        })
    }
}
