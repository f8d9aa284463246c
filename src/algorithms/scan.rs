//! Prefix scans on top of [`ScanPartitioner`].
//!
//! Chunk totals are carried as `Option<T>` so an operation without a known
//! identity element still has a value for "nothing combined yet".

use std::convert::Infallible;
use std::iter;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{Algorithm, AlgorithmResult, ChunkDescriptor, ChunkFailure, ExecutionPolicy, PartitionScanResult,
            ScanPartitioner, SharedSlice};

/// Running combination of the chunk's elements, starting from its first one.
fn local_scan<T, Op>(chunk: &[T], op: &Op) -> Result<PartitionScanResult<Vec<T>, Option<T>>, ChunkFailure<Infallible>>
    where T: Clone, Op: Fn(&T, &T) -> T
{
    let mut local: Vec<T> = Vec::new();
    local.try_reserve_exact(chunk.len())?;
    for item in chunk {
        let next = match local.last() {
            Some(previous) => op(previous, item),
            None => item.clone(),
        };
        local.push(next);
    }
    let total = local.last().cloned();
    Ok(PartitionScanResult { local, total })
}

fn combine_totals<T, Op>(acc: &Option<T>, total: &Option<T>, op: &Op) -> Option<T>
    where T: Clone, Op: Fn(&T, &T) -> T
{
    match (acc, total) {
        (Some(acc), Some(total)) => Some(op(acc, total)),
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (None, None) => None,
    }
}

fn concat<T>(locals: Vec<Vec<T>>, count: usize) -> Vec<T> {
    let mut output = Vec::with_capacity(count);
    for local in locals {
        output.extend(local);
    }
    output
}

/// `out[i] = op(init, x[0], ..., x[i])`.
pub struct InclusiveScan<T, Op>(PhantomData<fn(T, Op)>);

impl<T, Op> Algorithm for InclusiveScan<T, Op>
    where T: Clone + Send + Sync + 'static,
          Op: Fn(&T, &T) -> T + Send + Sync + 'static
{
    const NAME: &'static str = "inclusive_scan";

    type Args = (SharedSlice<T>, T, Op);
    type Output = Vec<T>;
    type Error = Infallible;

    fn sequential((data, init, op): (SharedSlice<T>, T, Op)) -> Result<Vec<T>, Infallible> {
        let mut output = Vec::with_capacity(data.len());
        let mut acc = init;
        for item in data.iter() {
            acc = op(&acc, item);
            output.push(acc.clone());
        }
        Ok(output)
    }

    fn parallel(policy: &ExecutionPolicy, (data, init, op): (SharedSlice<T>, T, Op)) -> AlgorithmResult<Vec<T>> {
        let count = data.len();
        let op = Arc::new(op);
        let (stage1_op, combine_op, stage3_op) = (op.clone(), op.clone(), op);
        ScanPartitioner::call(
            policy,
            data,
            count,
            Some(init),
            move |chunk: ChunkDescriptor<SharedSlice<T>>| local_scan(&chunk.start, &*stage1_op),
            move |acc: &Option<T>, total: &Option<T>| combine_totals(acc, total, &*combine_op),
            move |_chunk, local: Vec<T>, offset: &Option<T>| match offset {
                Some(offset) => Ok(local.iter().map(|value| stage3_op(offset, value)).collect()),
                None => Ok(local),
            },
            move |_prefixes, locals| concat(locals, count))
    }
}

/// `out[0] = init`, `out[i] = op(init, x[0], ..., x[i - 1])`.
pub struct ExclusiveScan<T, Op>(PhantomData<fn(T, Op)>);

impl<T, Op> Algorithm for ExclusiveScan<T, Op>
    where T: Clone + Send + Sync + 'static,
          Op: Fn(&T, &T) -> T + Send + Sync + 'static
{
    const NAME: &'static str = "exclusive_scan";

    type Args = (SharedSlice<T>, T, Op);
    type Output = Vec<T>;
    type Error = Infallible;

    fn sequential((data, init, op): (SharedSlice<T>, T, Op)) -> Result<Vec<T>, Infallible> {
        let mut output = Vec::with_capacity(data.len());
        let mut acc = init;
        for item in data.iter() {
            let next = op(&acc, item);
            output.push(acc);
            acc = next;
        }
        Ok(output)
    }

    fn parallel(policy: &ExecutionPolicy, (data, init, op): (SharedSlice<T>, T, Op)) -> AlgorithmResult<Vec<T>> {
        let count = data.len();
        let op = Arc::new(op);
        let (stage1_op, combine_op, stage3_op) = (op.clone(), op.clone(), op);
        ScanPartitioner::call(
            policy,
            data,
            count,
            Some(init),
            move |chunk: ChunkDescriptor<SharedSlice<T>>| local_scan(&chunk.start, &*stage1_op),
            move |acc: &Option<T>, total: &Option<T>| combine_totals(acc, total, &*combine_op),
            move |_chunk, local: Vec<T>, offset: &Option<T>| match offset {
                Some(offset) => {
                    // the chunk's offset leads and its own total drops out
                    let kept = local.len().saturating_sub(1);
                    let shifted = local[.. kept].iter().map(|value| stage3_op(offset, value));
                    Ok(iter::once(offset.clone()).chain(shifted).collect())
                },
                None => Ok(local),
            },
            move |_prefixes, locals| concat(locals, count))
    }
}

pub fn inclusive_scan<T, S, Op>(policy: &ExecutionPolicy, data: S, init: T, op: Op) -> AlgorithmResult<Vec<T>>
    where S: Into<SharedSlice<T>>,
          T: Clone + Send + Sync + 'static,
          Op: Fn(&T, &T) -> T + Send + Sync + 'static
{
    <InclusiveScan<T, Op> as Algorithm>::run(policy, (data.into(), init, op))
}

pub fn exclusive_scan<T, S, Op>(policy: &ExecutionPolicy, data: S, init: T, op: Op) -> AlgorithmResult<Vec<T>>
    where S: Into<SharedSlice<T>>,
          T: Clone + Send + Sync + 'static,
          Op: Fn(&T, &T) -> T + Send + Sync + 'static
{
    <ExclusiveScan<T, Op> as Algorithm>::run(policy, (data.into(), init, op))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{exclusive_scan, inclusive_scan};
    use super::super::testing::policies;

    #[test]
    fn inclusive_running_sum() {
        for policy in policies() {
            let output = inclusive_scan(&policy, vec![1, 2, 3, 4, 5, 6], 0, |a: &i32, b: &i32| a + b).get().unwrap();
            assert_eq!(output, vec![1, 3, 6, 10, 15, 21], "{:?}", policy);
        }
    }

    #[test]
    fn exclusive_running_sum() {
        for policy in policies() {
            let output = exclusive_scan(&policy, vec![1, 2, 3, 4, 5, 6], 10, |a: &i32, b: &i32| a + b).get().unwrap();
            assert_eq!(output, vec![10, 11, 13, 16, 20, 25], "{:?}", policy);
        }
    }

    #[test]
    fn empty_scans() {
        for policy in policies() {
            assert!(inclusive_scan(&policy, Vec::<u8>::new(), 0, |a: &u8, b: &u8| a + b).get().unwrap().is_empty());
            assert!(exclusive_scan(&policy, Vec::<u8>::new(), 0, |a: &u8, b: &u8| a + b).get().unwrap().is_empty());
        }
    }

    #[test]
    fn scans_keep_operand_order() {
        let letters: Vec<String> = "abcdefghij".chars().map(String::from).collect();
        for policy in policies() {
            let concat = |a: &String, b: &String| format!("{}{}", a, b);
            let inclusive = inclusive_scan(&policy, letters.clone(), ">".to_string(), concat).get().unwrap();
            assert_eq!(inclusive.first().map(String::as_str), Some(">a"));
            assert_eq!(inclusive.last().map(String::as_str), Some(">abcdefghij"));
            let exclusive = exclusive_scan(&policy, letters.clone(), ">".to_string(), concat).get().unwrap();
            assert_eq!(exclusive[0], ">");
            assert_eq!(exclusive[9], ">abcdefghi");
        }
    }

    proptest! {
        #[test]
        fn parallel_scans_match_sequential(
            data in prop::collection::vec(-1000i64 .. 1000, 0 .. 400),
            init in -50i64 .. 50,
        ) {
            let mut inclusive = Vec::new();
            let mut exclusive = Vec::new();
            let mut acc = init;
            for value in &data {
                exclusive.push(acc);
                acc += value;
                inclusive.push(acc);
            }
            for policy in policies() {
                prop_assert_eq!(&inclusive_scan(&policy, data.clone(), init, |a: &i64, b: &i64| a + b).get().unwrap(), &inclusive);
                prop_assert_eq!(&exclusive_scan(&policy, data.clone(), init, |a: &i64, b: &i64| a + b).get().unwrap(), &exclusive);
            }
        }
    }
}
