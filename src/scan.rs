//! Four-stage driver for prefix computations.
//!
//! 1. every chunk computes its local result and its total, in parallel;
//! 2. the chunk totals are folded left to right from `init`, sequentially,
//!    giving the prefix every chunk starts from;
//! 3. every chunk rewrites its local result from its prefix, in parallel;
//! 4. the rewritten chunks are handed to `finalize_fn`.
//!
//! Stage 2 only starts once all stage-1 outputs are in, and no stage-3 work is
//! submitted before stage 2 has finished. The combine operation must be
//! associative: with a non-associative operation the output depends on where
//! chunk boundaries fall.

use std::sync::Arc;

use tracing::debug;

use super::chunk::{self, ChunkDescriptor};
use super::partitioner::{effective_chunk_size, restrict, run_chunks};
use super::{AlgorithmResult, ChunkFailure, Cursor, ExecutionError, ExecutionPolicy};

/// Output of stage 1 for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionScanResult<L, T> {
    /// Chunk-local result, rewritten in stage 3
    pub local: L,
    /// Combined value of all elements of the chunk
    pub total: T,
}

pub struct ScanPartitioner;

impl ScanPartitioner {
    /// Runs the scan pipeline over the first `count` elements of `first`.
    ///
    /// `finalize_fn` receives the chunk boundary prefixes (one per chunk plus
    /// the grand total, so `prefixes[0]` is `init`) and the stage-3 locals in
    /// chunk order. An empty range submits no chunk work: `finalize_fn` gets
    /// `[init]` and no locals.
    #[allow(clippy::too_many_arguments)]
    pub fn call<P, T, L, R, E, F1, Op, F3, F4>(policy: &ExecutionPolicy,
                                               first: P,
                                               count: usize,
                                               init: T,
                                               stage1_fn: F1,
                                               combine_op: Op,
                                               stage3_fn: F3,
                                               finalize_fn: F4) -> AlgorithmResult<R, E>
        where P: Cursor + Clone,
              T: Clone + Send + Sync + 'static,
              L: Send + 'static,
              R: Send + 'static,
              E: Send + 'static,
              F1: Fn(ChunkDescriptor<P>) -> Result<PartitionScanResult<L, T>, ChunkFailure<E>> + Send + Sync + 'static,
              Op: Fn(&T, &T) -> T + Send + Sync + 'static,
              F3: Fn(ChunkDescriptor<P>, L, &T) -> Result<L, ChunkFailure<E>> + Send + Sync + 'static,
              F4: FnOnce(Vec<T>, Vec<L>) -> R + Send + 'static
    {
        let first = restrict(first, count);
        let count = first.len();
        if count == 0 {
            return AlgorithmResult::resolved(policy.blocking_mode(), Ok(finalize_fn(vec![init], Vec::new())));
        }

        let executor = policy.executor().clone();
        let concurrency = policy.concurrency();
        let chunking = policy.chunking();
        let chunk_size = effective_chunk_size(policy, 0);
        AlgorithmResult::drive(policy, move || {
            let spans = chunk::plan(count, chunk_size, concurrency, &chunking)
                .map_err(ExecutionError::ResourceExhausted)?;
            let chunks = chunk::split(first, &spans).map_err(ExecutionError::ResourceExhausted)?;
            debug!(count, chunks = chunks.len(), "scan stage 1: local pass");

            let stage1_outputs = run_chunks(&executor, chunks.clone(), Arc::new(stage1_fn))?;

            debug!(chunks = stage1_outputs.len(), "scan stage 2: combining chunk totals");
            let mut prefixes = Vec::new();
            prefixes.try_reserve_exact(stage1_outputs.len() + 1).map_err(ExecutionError::ResourceExhausted)?;
            let mut items = Vec::new();
            items.try_reserve_exact(stage1_outputs.len()).map_err(ExecutionError::ResourceExhausted)?;
            let mut accumulated = init;
            for (chunk, PartitionScanResult { local, total }) in chunks.into_iter().zip(stage1_outputs) {
                let next = combine_op(&accumulated, &total);
                prefixes.push(accumulated.clone());
                items.push((chunk, local, accumulated));
                accumulated = next;
            }
            prefixes.push(accumulated);

            debug!(chunks = items.len(), "scan stage 3: final pass");
            let stage3_fn = Arc::new(move |(chunk, local, offset): (ChunkDescriptor<P>, L, T)| stage3_fn(chunk, local, &offset));
            let locals = run_chunks(&executor, items, stage3_fn)?;

            debug!(chunks = locals.len(), "scan stage 4: finalize");
            Ok(finalize_fn(prefixes, locals))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use proptest::prelude::*;

    use super::{PartitionScanResult, ScanPartitioner};
    use super::super::par::ParallelExecutor;
    use super::super::{AlgorithmResult, ChunkDescriptor, ChunkFailure, ExecutionError, ExecutionPolicy, JobError, Mode,
                       SharedSlice};

    fn policy(workers: usize, chunk_size: usize) -> ExecutionPolicy {
        ExecutionPolicy::new(Mode::Parallel, Arc::new(ParallelExecutor::new(workers).start().unwrap()))
            .with_chunk_size(chunk_size)
    }

    /// Inclusive scan of `data` built directly on the partitioner.
    fn scan<T, Op>(policy: &ExecutionPolicy, data: Vec<T>, init: T, op: Op) -> AlgorithmResult<(Vec<T>, Vec<T>)>
        where T: Clone + Send + Sync + 'static, Op: Fn(&T, &T) -> T + Send + Sync + 'static
    {
        let op = Arc::new(op);
        let stage1_op = op.clone();
        let stage3_op = op.clone();
        let combine_op = op.clone();
        let data = SharedSlice::from(data);
        let count = data.len();
        ScanPartitioner::call(
            policy,
            data,
            count,
            init,
            move |chunk: ChunkDescriptor<SharedSlice<T>>| {
                let mut local: Vec<T> = Vec::with_capacity(chunk.count);
                for value in chunk.start.iter() {
                    let next = match local.last() {
                        Some(previous) => stage1_op(previous, value),
                        None => value.clone(),
                    };
                    local.push(next);
                }
                let total = local[local.len() - 1].clone();
                Ok::<_, ChunkFailure<Infallible>>(PartitionScanResult { local, total })
            },
            move |a: &T, b: &T| combine_op(a, b),
            move |_chunk, local: Vec<T>, offset: &T| Ok(local.iter().map(|v| stage3_op(offset, v)).collect()),
            |prefixes: Vec<T>, locals: Vec<Vec<T>>| (locals.into_iter().flatten().collect(), prefixes))
    }

    fn sequential_scan(data: &[i64], init: i64) -> Vec<i64> {
        data.iter()
            .scan(init, |acc, &v| {
                *acc += v;
                Some(*acc)
            })
            .collect()
    }

    #[test]
    fn running_sum_over_two_chunks() {
        let (output, prefixes) = scan(&policy(2, 3), vec![1, 2, 3, 4, 5, 6], 0, |a: &i64, b: &i64| a + b).get().unwrap();
        assert_eq!(output, vec![1, 3, 6, 10, 15, 21]);
        assert_eq!(prefixes, vec![0, 6, 21]);
    }

    #[test]
    fn init_is_folded_into_every_chunk() {
        let (output, _) = scan(&policy(2, 2), vec![1, 1, 1, 1, 1], 100, |a: &i64, b: &i64| a + b).get().unwrap();
        assert_eq!(output, vec![101, 102, 103, 104, 105]);
    }

    #[test]
    fn single_element_is_a_degenerate_pipeline() {
        let (output, prefixes) = scan(&policy(2, 0), vec![7], 5, |a: &i64, b: &i64| a + b).get().unwrap();
        assert_eq!(output, vec![12]);
        assert_eq!(prefixes, vec![5, 12]);
    }

    #[test]
    fn empty_range_skips_stages() {
        let stage_ran = Arc::new(AtomicBool::new(false));
        let flag1 = stage_ran.clone();
        let flag3 = stage_ran.clone();
        let result = ScanPartitioner::call(
            &policy(2, 0),
            0 .. 0,
            0,
            42u32,
            move |_chunk| -> Result<PartitionScanResult<(), u32>, ChunkFailure<Infallible>> {
                flag1.store(true, Ordering::SeqCst);
                Ok(PartitionScanResult { local: (), total: 0 })
            },
            |a: &u32, b: &u32| a + b,
            move |_chunk, local: (), _offset: &u32| {
                flag3.store(true, Ordering::SeqCst);
                Ok(local)
            },
            |prefixes: Vec<u32>, locals: Vec<()>| (prefixes, locals.len()));
        assert_eq!(result.get().unwrap(), (vec![42], 0));
        assert!(!stage_ran.load(Ordering::SeqCst));
    }

    #[test]
    fn order_matters_for_non_commutative_operators() {
        let words: Vec<String> = "a b c d e f g".split(' ').map(str::to_string).collect();
        let (output, _) = scan(&policy(3, 2), words, String::new(), |a: &String, b: &String| format!("{}{}", a, b))
            .get()
            .unwrap();
        assert_eq!(output, vec!["a", "ab", "abc", "abcd", "abcde", "abcdef", "abcdefg"]);
    }

    #[test]
    fn stage1_failure_skips_remaining_stages() {
        let stage3_runs = Arc::new(AtomicUsize::new(0));
        let finalized = Arc::new(AtomicBool::new(false));
        let local_runs = stage3_runs.clone();
        let local_finalized = finalized.clone();
        let result = ScanPartitioner::call(
            &policy(2, 4),
            0 .. 16,
            16,
            0usize,
            |chunk: ChunkDescriptor<std::ops::Range<usize>>| {
                if chunk.base_index == 8 {
                    return Err(ChunkFailure::Failed("bad chunk"));
                }
                Ok(PartitionScanResult { local: (), total: chunk.count })
            },
            |a: &usize, b: &usize| a + b,
            move |_chunk, local: (), _offset: &usize| {
                local_runs.fetch_add(1, Ordering::SeqCst);
                Ok(local)
            },
            move |_prefixes: Vec<usize>, _locals: Vec<()>| local_finalized.store(true, Ordering::SeqCst));
        match result.get() {
            Err(ExecutionError::Job(JobError::Failed { chunk: 2, error: "bad chunk" })) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(stage3_runs.load(Ordering::SeqCst), 0);
        assert!(!finalized.load(Ordering::SeqCst));
    }

    #[test]
    fn deferred_scan_resolves_later() {
        let result = scan(&policy(2, 10).task(), (1 ..= 100).collect(), 0, |a: &i64, b: &i64| a + b);
        assert!(result.is_deferred());
        let (output, prefixes) = result.get().unwrap();
        assert_eq!(output.last(), Some(&5050));
        assert_eq!(prefixes.len(), 11);
    }

    proptest! {
        #[test]
        fn matches_sequential_scan_for_any_chunking(
            data in prop::collection::vec(-1000i64 .. 1000, 1 .. 400),
            chunk_size in 0usize .. 50,
            init in -100i64 .. 100,
        ) {
            let expected = sequential_scan(&data, init);
            let (output, prefixes) = scan(&policy(3, chunk_size), data, init, |a: &i64, b: &i64| a + b).get().unwrap();
            prop_assert_eq!(&output, &expected);
            prop_assert_eq!(prefixes.last(), expected.last());
        }
    }
}
