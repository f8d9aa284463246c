use std::convert::Infallible;
use std::marker::PhantomData;
use std::ops::Range;

use crate::{Algorithm, AlgorithmResult, CancellationToken, ChunkFailure, ExecutionPolicy, Partitioner, SharedSlice};

/// Number of elements equal to `value` in the sorted `data`.
fn occurrences<T: Ord>(data: &[T], value: &T) -> usize {
    let lower = data.partition_point(|item| item < value);
    let upper = data.partition_point(|item| item <= value);
    upper - lower
}

/// Whether the sorted `haystack` contains every element of the sorted `needles`,
/// counting repeats: `[1, 1]` is not included in `[1, 2]`.
pub struct Includes<T>(PhantomData<fn(T)>);

impl<T> Algorithm for Includes<T> where T: Ord + Send + Sync + 'static {
    const NAME: &'static str = "includes";

    type Args = (SharedSlice<T>, SharedSlice<T>);
    type Output = bool;
    type Error = Infallible;

    fn sequential((haystack, needles): (SharedSlice<T>, SharedSlice<T>)) -> Result<bool, Infallible> {
        let mut rest = &haystack[..];
        for needle in needles.iter() {
            let skip = rest.partition_point(|item| item < needle);
            match rest.get(skip) {
                Some(item) if item == needle => rest = &rest[skip + 1 ..],
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Chunks cover `needles`. Each distinct value is checked once, by the
    /// chunk holding the first element of its run.
    fn parallel(policy: &ExecutionPolicy, (haystack, needles): (SharedSlice<T>, SharedSlice<T>)) ->
        AlgorithmResult<bool>
    {
        let tok = CancellationToken::flag();
        let chunk_tok = tok.clone();
        let count = needles.len();
        Partitioner::call(
            policy,
            0 .. count,
            count,
            0,
            move |indices: Range<usize>, _count| -> Result<(), ChunkFailure<Infallible>> {
                for i in indices {
                    if chunk_tok.was_cancelled() {
                        break;
                    }
                    let value = &needles[i];
                    if i > 0 && needles[i - 1] == *value {
                        continue;
                    }
                    if occurrences(&haystack, value) < occurrences(&needles[i ..], value) {
                        chunk_tok.cancel(());
                        break;
                    }
                }
                Ok(())
            },
            move |_: Vec<()>| !tok.was_cancelled())
    }
}

/// Both inputs must be sorted ascending. An empty `needles` is always
/// included.
pub fn includes<T, A, B>(policy: &ExecutionPolicy, haystack: A, needles: B) -> AlgorithmResult<bool>
    where A: Into<SharedSlice<T>>,
          B: Into<SharedSlice<T>>,
          T: Ord + Send + Sync + 'static
{
    <Includes<T> as Algorithm>::run(policy, (haystack.into(), needles.into()))
}
