use std::convert::Infallible;
use std::marker::PhantomData;
use std::sync::Arc;

use itertools::Itertools;

use crate::{Algorithm, AlgorithmResult, ChunkFailure, ExecutionPolicy, Partitioner, SharedSlice};

/// Folds `data` with an associative operation, starting from `init`.
///
/// Chunk partials are combined left to right, so the operation does not need
/// to be commutative.
pub struct Reduce<T, Op>(PhantomData<fn(T, Op)>);

impl<T, Op> Algorithm for Reduce<T, Op>
    where T: Clone + Send + Sync + 'static,
          Op: Fn(&T, &T) -> T + Send + Sync + 'static
{
    const NAME: &'static str = "reduce";

    type Args = (SharedSlice<T>, T, Op);
    type Output = T;
    type Error = Infallible;

    fn sequential((data, init, op): (SharedSlice<T>, T, Op)) -> Result<T, Infallible> {
        Ok(data.iter().fold(init, |acc, item| op(&acc, item)))
    }

    fn parallel(policy: &ExecutionPolicy, (data, init, op): (SharedSlice<T>, T, Op)) -> AlgorithmResult<T> {
        <TransformReduce<T, T, Op, fn(&T) -> T> as Algorithm>::parallel(policy, (data, init, op, T::clone))
    }
}

/// Maps every element with `transform`, then reduces the images like
/// [`Reduce`].
pub struct TransformReduce<T, U, Op, F>(PhantomData<fn(T, U, Op, F)>);

impl<T, U, Op, F> Algorithm for TransformReduce<T, U, Op, F>
    where T: Send + Sync + 'static,
          U: Send + 'static,
          Op: Fn(&U, &U) -> U + Send + Sync + 'static,
          F: Fn(&T) -> U + Send + Sync + 'static
{
    const NAME: &'static str = "transform_reduce";

    type Args = (SharedSlice<T>, U, Op, F);
    type Output = U;
    type Error = Infallible;

    fn sequential((data, init, op, transform): (SharedSlice<T>, U, Op, F)) -> Result<U, Infallible> {
        Ok(data.iter().fold(init, |acc, item| op(&acc, &transform(item))))
    }

    fn parallel(policy: &ExecutionPolicy, (data, init, op, transform): (SharedSlice<T>, U, Op, F)) -> AlgorithmResult<U> {
        let count = data.len();
        let op = Arc::new(op);
        let chunk_op = op.clone();
        Partitioner::call(
            policy,
            data,
            count,
            0,
            move |chunk: SharedSlice<T>, _count| {
                let mut items = chunk.iter().map(|item| transform(item));
                let partial = items.next().map(|first| items.fold(first, |acc, image| chunk_op(&acc, &image)));
                Ok::<_, ChunkFailure<Infallible>>(partial)
            },
            move |partials: Vec<Option<U>>| partials.into_iter().flatten().fold(init, |acc, partial| op(&acc, &partial)))
    }
}

/// Sorts the elements; equal elements keep no particular order.
///
/// Chunks are sorted independently and k-way merged by the combine step.
pub struct Sort<T>(PhantomData<fn(T)>);

impl<T> Algorithm for Sort<T> where T: Ord + Send + 'static {
    const NAME: &'static str = "sort";

    type Args = Vec<T>;
    type Output = Vec<T>;
    type Error = Infallible;

    fn sequential(mut data: Vec<T>) -> Result<Vec<T>, Infallible> {
        data.sort_unstable();
        Ok(data)
    }

    fn parallel(policy: &ExecutionPolicy, data: Vec<T>) -> AlgorithmResult<Vec<T>> {
        let count = data.len();
        Partitioner::call(
            policy,
            data,
            count,
            0,
            |mut run: Vec<T>, _count| {
                run.sort_unstable();
                Ok::<_, ChunkFailure<Infallible>>(run)
            },
            |runs: Vec<Vec<T>>| runs.into_iter().kmerge().collect())
    }
}

pub fn reduce<T, S, Op>(policy: &ExecutionPolicy, data: S, init: T, op: Op) -> AlgorithmResult<T>
    where S: Into<SharedSlice<T>>,
          T: Clone + Send + Sync + 'static,
          Op: Fn(&T, &T) -> T + Send + Sync + 'static
{
    <Reduce<T, Op> as Algorithm>::run(policy, (data.into(), init, op))
}

pub fn transform_reduce<T, U, S, Op, F>(policy: &ExecutionPolicy, data: S, init: U, op: Op, transform: F) ->
    AlgorithmResult<U>
    where S: Into<SharedSlice<T>>,
          T: Send + Sync + 'static,
          U: Send + 'static,
          Op: Fn(&U, &U) -> U + Send + Sync + 'static,
          F: Fn(&T) -> U + Send + Sync + 'static
{
    <TransformReduce<T, U, Op, F> as Algorithm>::run(policy, (data.into(), init, op, transform))
}

/// Takes the data by value: chunks sort disjoint owned runs.
pub fn sort<T>(policy: &ExecutionPolicy, data: Vec<T>) -> AlgorithmResult<Vec<T>> where T: Ord + Send + 'static {
    <Sort<T> as Algorithm>::run(policy, data)
}
