use std::convert::Infallible;
use std::marker::PhantomData;
use std::ops::Range;

use crate::{Algorithm, AlgorithmResult, CancellationToken, ChunkDescriptor, ChunkFailure, Cursor, ExecutionPolicy,
            Greater, Partitioner, SharedSlice};

/// Leftmost position of `first` where `matches` holds, passed through `finish`.
///
/// `matches` gets the chunk cursor and an offset inside it. A chunk stops once a
/// match at or before its current position is known; chunks left of a match
/// keep scanning, so the reported position is the leftmost one whatever the
/// completion order.
pub(crate) fn first_match<P, O, E, F, G>(policy: &ExecutionPolicy, first: P, count: usize, matches: F, finish: G) ->
    AlgorithmResult<O, E>
    where P: Cursor,
          O: Send + 'static,
          E: Send + 'static,
          F: Fn(&P, usize) -> Result<bool, E> + Send + Sync + 'static,
          G: FnOnce(Option<usize>) -> O + Send + 'static
{
    let tok = CancellationToken::new(usize::MAX);
    let chunk_tok = tok.clone();
    Partitioner::call_with_index(
        policy,
        first,
        count,
        0,
        move |chunk: ChunkDescriptor<P>| -> Result<(), ChunkFailure<E>> {
            for offset in 0 .. chunk.count {
                let index = chunk.base_index + offset;
                if chunk_tok.was_cancelled_at(&index) {
                    break;
                }
                if matches(&chunk.start, offset).map_err(ChunkFailure::Failed)? {
                    chunk_tok.cancel(index);
                    break;
                }
            }
            Ok(())
        },
        move |_: Vec<()>| finish(Some(tok.get_result()).filter(|&index| index != usize::MAX)))
}

/// Rightmost position of `first` where `matches` holds.
fn last_match<P, F>(policy: &ExecutionPolicy, first: P, count: usize, matches: F) -> AlgorithmResult<Option<usize>>
    where P: Cursor,
          F: Fn(&P, usize) -> bool + Send + Sync + 'static
{
    let tok = CancellationToken::with_compare(-1isize, Greater);
    let chunk_tok = tok.clone();
    Partitioner::call_with_index(
        policy,
        first,
        count,
        0,
        move |chunk: ChunkDescriptor<P>| -> Result<(), ChunkFailure<Infallible>> {
            for offset in (0 .. chunk.count).rev() {
                let index = (chunk.base_index + offset) as isize;
                if chunk_tok.was_cancelled_at(&index) {
                    break;
                }
                if matches(&chunk.start, offset) {
                    chunk_tok.cancel(index);
                    break;
                }
            }
            Ok(())
        },
        move |_: Vec<()>| usize::try_from(tok.get_result()).ok())
}

/// Position of the first element equal to a value.
pub struct Find<T>(PhantomData<fn(T)>);

impl<T> Algorithm for Find<T> where T: PartialEq + Send + Sync + 'static {
    const NAME: &'static str = "find";

    type Args = (SharedSlice<T>, T);
    type Output = Option<usize>;
    type Error = Infallible;

    fn sequential((data, value): (SharedSlice<T>, T)) -> Result<Option<usize>, Infallible> {
        Ok(data.iter().position(|item| *item == value))
    }

    fn parallel(policy: &ExecutionPolicy, (data, value): (SharedSlice<T>, T)) -> AlgorithmResult<Option<usize>> {
        let count = data.len();
        first_match(policy, data, count, move |chunk: &SharedSlice<T>, offset| Ok(chunk[offset] == value), |found| found)
    }
}

pub fn find<T, S>(policy: &ExecutionPolicy, data: S, value: T) -> AlgorithmResult<Option<usize>>
    where S: Into<SharedSlice<T>>,
          T: PartialEq + Send + Sync + 'static
{
    <Find<T> as Algorithm>::run(policy, (data.into(), value))
}

/// Position of the first element satisfying a predicate.
pub struct FindIf<T, F>(PhantomData<fn(T, F)>);

impl<T, F> Algorithm for FindIf<T, F>
    where T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    const NAME: &'static str = "find_if";

    type Args = (SharedSlice<T>, F);
    type Output = Option<usize>;
    type Error = Infallible;

    fn sequential((data, pred): (SharedSlice<T>, F)) -> Result<Option<usize>, Infallible> {
        Ok(data.iter().position(pred))
    }

    fn parallel(policy: &ExecutionPolicy, (data, pred): (SharedSlice<T>, F)) -> AlgorithmResult<Option<usize>> {
        let count = data.len();
        first_match(policy, data, count, move |chunk: &SharedSlice<T>, offset| Ok(pred(&chunk[offset])), |found| found)
    }
}

pub fn find_if<T, S, F>(policy: &ExecutionPolicy, data: S, pred: F) -> AlgorithmResult<Option<usize>>
    where S: Into<SharedSlice<T>>,
          T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    <FindIf<T, F> as Algorithm>::run(policy, (data.into(), pred))
}

pub fn find_if_not<T, S, F>(policy: &ExecutionPolicy, data: S, pred: F) -> AlgorithmResult<Option<usize>>
    where S: Into<SharedSlice<T>>,
          T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    find_if(policy, data, move |item: &T| !pred(item))
}

/// Like [`FindIf`], with a predicate that may fail.
///
/// Under a parallel policy a failure stops the search; failures from several
/// chunks are all reported.
pub struct TryFindIf<T, E, F>(PhantomData<fn(T, E, F)>);

impl<T, E, F> Algorithm for TryFindIf<T, E, F>
    where T: Send + Sync + 'static,
          E: Send + 'static,
          F: Fn(&T) -> Result<bool, E> + Send + Sync + 'static
{
    const NAME: &'static str = "try_find_if";

    type Args = (SharedSlice<T>, F);
    type Output = Option<usize>;
    type Error = E;

    fn sequential((data, pred): (SharedSlice<T>, F)) -> Result<Option<usize>, E> {
        for (index, item) in data.iter().enumerate() {
            if pred(item)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    fn parallel(policy: &ExecutionPolicy, (data, pred): (SharedSlice<T>, F)) -> AlgorithmResult<Option<usize>, E> {
        let count = data.len();
        first_match(policy, data, count, move |chunk: &SharedSlice<T>, offset| pred(&chunk[offset]), |found| found)
    }
}

pub fn try_find_if<T, E, S, F>(policy: &ExecutionPolicy, data: S, pred: F) -> AlgorithmResult<Option<usize>, E>
    where S: Into<SharedSlice<T>>,
          T: Send + Sync + 'static,
          E: Send + 'static,
          F: Fn(&T) -> Result<bool, E> + Send + Sync + 'static
{
    <TryFindIf<T, E, F> as Algorithm>::run(policy, (data.into(), pred))
}

/// Start of the last occurrence of a subsequence.
///
/// An empty subsequence, or one longer than the data, is never found.
pub struct FindEnd<T>(PhantomData<fn(T)>);

impl<T> Algorithm for FindEnd<T> where T: PartialEq + Send + Sync + 'static {
    const NAME: &'static str = "find_end";

    type Args = (SharedSlice<T>, SharedSlice<T>);
    type Output = Option<usize>;
    type Error = Infallible;

    fn sequential((data, needle): (SharedSlice<T>, SharedSlice<T>)) -> Result<Option<usize>, Infallible> {
        if needle.is_empty() || needle.len() > data.len() {
            return Ok(None);
        }
        Ok(data.windows(needle.len()).rposition(|window| window == &needle[..]))
    }

    fn parallel(policy: &ExecutionPolicy, (data, needle): (SharedSlice<T>, SharedSlice<T>)) ->
        AlgorithmResult<Option<usize>>
    {
        let width = needle.len();
        if width == 0 || width > data.len() {
            return AlgorithmResult::resolved(policy.blocking_mode(), Ok(None));
        }
        // chunks range over candidate start positions
        let positions = 0 .. data.len() - width + 1;
        let count = Cursor::len(&positions);
        last_match(policy, positions, count, move |chunk: &Range<usize>, offset| {
            let start = chunk.start + offset;
            data[start .. start + width] == needle[..]
        })
    }
}

pub fn find_end<T, S, N>(policy: &ExecutionPolicy, data: S, needle: N) -> AlgorithmResult<Option<usize>>
    where S: Into<SharedSlice<T>>,
          N: Into<SharedSlice<T>>,
          T: PartialEq + Send + Sync + 'static
{
    <FindEnd<T> as Algorithm>::run(policy, (data.into(), needle.into()))
}

/// Position of the first element equal to any of a set of candidates.
pub struct FindFirstOf<T>(PhantomData<fn(T)>);

impl<T> Algorithm for FindFirstOf<T> where T: PartialEq + Send + Sync + 'static {
    const NAME: &'static str = "find_first_of";

    type Args = (SharedSlice<T>, SharedSlice<T>);
    type Output = Option<usize>;
    type Error = Infallible;

    fn sequential((data, candidates): (SharedSlice<T>, SharedSlice<T>)) -> Result<Option<usize>, Infallible> {
        Ok(data.iter().position(|item| candidates.contains(item)))
    }

    fn parallel(policy: &ExecutionPolicy, (data, candidates): (SharedSlice<T>, SharedSlice<T>)) ->
        AlgorithmResult<Option<usize>>
    {
        if candidates.is_empty() {
            return AlgorithmResult::resolved(policy.blocking_mode(), Ok(None));
        }
        let count = data.len();
        first_match(
            policy,
            data,
            count,
            move |chunk: &SharedSlice<T>, offset| Ok(candidates.contains(&chunk[offset])),
            |found| found)
    }
}

pub fn find_first_of<T, S, C>(policy: &ExecutionPolicy, data: S, candidates: C) -> AlgorithmResult<Option<usize>>
    where S: Into<SharedSlice<T>>,
          C: Into<SharedSlice<T>>,
          T: PartialEq + Send + Sync + 'static
{
    <FindFirstOf<T> as Algorithm>::run(policy, (data.into(), candidates.into()))
}

/// First position where two sequences differ.
///
/// Only the common prefix length is compared; if no element in it differs the
/// result is that length.
pub struct Mismatch<T>(PhantomData<fn(T)>);

impl<T> Algorithm for Mismatch<T> where T: PartialEq + Send + Sync + 'static {
    const NAME: &'static str = "mismatch";

    type Args = (SharedSlice<T>, SharedSlice<T>);
    type Output = usize;
    type Error = Infallible;

    fn sequential((left, right): (SharedSlice<T>, SharedSlice<T>)) -> Result<usize, Infallible> {
        let common = left.len().min(right.len());
        Ok(left.iter().zip(right.iter()).position(|(a, b)| a != b).unwrap_or(common))
    }

    fn parallel(policy: &ExecutionPolicy, (left, right): (SharedSlice<T>, SharedSlice<T>)) -> AlgorithmResult<usize> {
        let zipped = (left, right);
        let common = Cursor::len(&zipped);
        first_match(
            policy,
            zipped,
            common,
            |(left, right): &(SharedSlice<T>, SharedSlice<T>), offset| Ok(left[offset] != right[offset]),
            move |found| found.unwrap_or(common))
    }
}

pub fn mismatch<T, L, R>(policy: &ExecutionPolicy, left: L, right: R) -> AlgorithmResult<usize>
    where L: Into<SharedSlice<T>>,
          R: Into<SharedSlice<T>>,
          T: PartialEq + Send + Sync + 'static
{
    <Mismatch<T> as Algorithm>::run(policy, (left.into(), right.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use proptest::prelude::*;

    use super::{find, find_end, find_first_of, find_if, find_if_not, mismatch, try_find_if};
    use super::super::testing::policies;
    use crate::{ExecutionError, ExecutionPolicy, JobError, Mode};
    use crate::par::ParallelExecutor;

    #[test]
    fn find_reports_leftmost_match() {
        let data: Vec<u32> = (0 .. 500).map(|i| i % 100).collect();
        for policy in policies() {
            assert_eq!(find(&policy, data.clone(), 42).get().unwrap(), Some(42), "{:?}", policy);
            assert_eq!(find(&policy, data.clone(), 1000).get().unwrap(), None, "{:?}", policy);
        }
    }

    #[test]
    fn find_on_empty_data() {
        for policy in policies() {
            assert_eq!(find(&policy, Vec::<u8>::new(), 0).get().unwrap(), None);
        }
    }

    #[test]
    fn find_if_and_negation() {
        let data = vec![2, 4, 6, 7, 8, 9];
        for policy in policies() {
            assert_eq!(find_if(&policy, data.clone(), |x: &i32| x % 2 == 1).get().unwrap(), Some(3));
            assert_eq!(find_if_not(&policy, data.clone(), |x: &i32| x % 2 == 0).get().unwrap(), Some(3));
            assert_eq!(find_if(&policy, data.clone(), |x: &i32| *x > 100).get().unwrap(), None);
        }
    }

    #[test]
    fn later_chunks_stop_after_early_match() {
        let executor = Arc::new(ParallelExecutor::new(1).start().unwrap());
        let policy = ExecutionPolicy::new(Mode::Parallel, executor).with_chunk_size(10);
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = checks.clone();
        let found = find_if(&policy, vec![1u8; 1000], move |_: &u8| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        assert_eq!(found.get().unwrap(), Some(0));
        assert!(checks.load(Ordering::SeqCst) < 1000);
    }

    #[test]
    fn try_find_if_reports_predicate_failures() {
        let data: Vec<i64> = (0 .. 64).collect();
        let sequential = try_find_if(&ExecutionPolicy::sequential(), data.clone(), |x: &i64| {
            if *x == 10 { Err("ten") } else { Ok(false) }
        });
        match sequential.get() {
            Err(ExecutionError::Sequential("ten")) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        let executor = Arc::new(ParallelExecutor::new(2).start().unwrap());
        let policy = ExecutionPolicy::new(Mode::Parallel, executor).with_chunk_size(16);
        let parallel = try_find_if(&policy, data.clone(), |x: &i64| {
            if *x == 40 { Err("forty") } else { Ok(false) }
        });
        match parallel.get() {
            Err(ExecutionError::Job(JobError::Failed { chunk: 2, error: "forty" })) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        let found = try_find_if(&policy, data, |x: &i64| Ok::<_, String>(*x == 33));
        assert_eq!(found.get().unwrap(), Some(33));
    }

    #[test]
    fn find_end_reports_last_occurrence() {
        let data = vec![1, 2, 3, 1, 2, 3, 1, 2, 4];
        for policy in policies() {
            assert_eq!(find_end(&policy, data.clone(), vec![1, 2, 3]).get().unwrap(), Some(3), "{:?}", policy);
            assert_eq!(find_end(&policy, data.clone(), vec![1, 2]).get().unwrap(), Some(6));
            assert_eq!(find_end(&policy, data.clone(), vec![3, 3]).get().unwrap(), None);
            assert_eq!(find_end(&policy, data.clone(), Vec::new()).get().unwrap(), None);
            assert_eq!(find_end(&policy, vec![1, 2], vec![1, 2, 3]).get().unwrap(), None);
        }
    }

    #[test]
    fn find_first_of_any_candidate() {
        let data = "parallel partitioner".chars().collect::<Vec<_>>();
        for policy in policies() {
            assert_eq!(find_first_of(&policy, data.clone(), vec!['z', 't', 'l']).get().unwrap(), Some(4));
            assert_eq!(find_first_of(&policy, data.clone(), vec!['x']).get().unwrap(), None);
            assert_eq!(find_first_of(&policy, data.clone(), Vec::new()).get().unwrap(), None);
        }
    }

    #[test]
    fn mismatch_compares_common_prefix() {
        for policy in policies() {
            assert_eq!(mismatch(&policy, vec![1, 2, 3, 4], vec![1, 2, 0, 4]).get().unwrap(), 2);
            assert_eq!(mismatch(&policy, vec![1, 2, 3], vec![1, 2, 3, 4, 5]).get().unwrap(), 3);
            assert_eq!(mismatch(&policy, Vec::<u8>::new(), vec![1]).get().unwrap(), 0);
        }
    }

    proptest! {
        #[test]
        fn parallel_find_matches_sequential(
            data in prop::collection::vec(0u16 .. 50, 0 .. 600),
            target in 0u16 .. 60,
        ) {
            let expected = data.iter().position(|&x| x == target);
            for policy in policies() {
                prop_assert_eq!(find(&policy, data.clone(), target).get().unwrap(), expected);
            }
        }

        #[test]
        fn parallel_find_end_matches_sequential(
            data in prop::collection::vec(0u8 .. 3, 0 .. 300),
            needle in prop::collection::vec(0u8 .. 3, 1 .. 4),
        ) {
            let expected = if needle.len() > data.len() {
                None
            } else {
                data.windows(needle.len()).rposition(|window| window == &needle[..])
            };
            for policy in policies() {
                prop_assert_eq!(find_end(&policy, data.clone(), needle.clone()).get().unwrap(), expected);
            }
        }
    }
}
