use std::convert::Infallible;
use std::marker::PhantomData;

use crate::{Algorithm, AlgorithmResult, CancellationToken, ChunkFailure, ExecutionPolicy, Partitioner, SharedSlice};

/// Whether any element of `data` satisfies `pred`, reported as `found` if so.
///
/// The first hit raises a flag token and every chunk stops scanning.
fn any_match<T, F>(policy: &ExecutionPolicy, data: SharedSlice<T>, pred: F, found: bool) -> AlgorithmResult<bool>
    where T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    let tok = CancellationToken::flag();
    let chunk_tok = tok.clone();
    let count = data.len();
    Partitioner::call(
        policy,
        data,
        count,
        0,
        move |chunk: SharedSlice<T>, _count| -> Result<(), ChunkFailure<Infallible>> {
            for item in chunk.iter() {
                if chunk_tok.was_cancelled() {
                    break;
                }
                if pred(item) {
                    chunk_tok.cancel(());
                    break;
                }
            }
            Ok(())
        },
        move |_: Vec<()>| tok.was_cancelled() == found)
}

pub struct AnyOf<T, F>(PhantomData<fn(T, F)>);

impl<T, F> Algorithm for AnyOf<T, F>
    where T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    const NAME: &'static str = "any_of";

    type Args = (SharedSlice<T>, F);
    type Output = bool;
    type Error = Infallible;

    fn sequential((data, pred): (SharedSlice<T>, F)) -> Result<bool, Infallible> {
        Ok(data.iter().any(pred))
    }

    fn parallel(policy: &ExecutionPolicy, (data, pred): (SharedSlice<T>, F)) -> AlgorithmResult<bool> {
        any_match(policy, data, pred, true)
    }
}

pub struct AllOf<T, F>(PhantomData<fn(T, F)>);

impl<T, F> Algorithm for AllOf<T, F>
    where T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    const NAME: &'static str = "all_of";

    type Args = (SharedSlice<T>, F);
    type Output = bool;
    type Error = Infallible;

    fn sequential((data, pred): (SharedSlice<T>, F)) -> Result<bool, Infallible> {
        Ok(data.iter().all(pred))
    }

    fn parallel(policy: &ExecutionPolicy, (data, pred): (SharedSlice<T>, F)) -> AlgorithmResult<bool> {
        any_match(policy, data, move |item: &T| !pred(item), false)
    }
}

pub struct NoneOf<T, F>(PhantomData<fn(T, F)>);

impl<T, F> Algorithm for NoneOf<T, F>
    where T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    const NAME: &'static str = "none_of";

    type Args = (SharedSlice<T>, F);
    type Output = bool;
    type Error = Infallible;

    fn sequential((data, pred): (SharedSlice<T>, F)) -> Result<bool, Infallible> {
        Ok(!data.iter().any(pred))
    }

    fn parallel(policy: &ExecutionPolicy, (data, pred): (SharedSlice<T>, F)) -> AlgorithmResult<bool> {
        any_match(policy, data, pred, false)
    }
}

/// Number of elements satisfying a predicate.
pub struct CountIf<T, F>(PhantomData<fn(T, F)>);

impl<T, F> Algorithm for CountIf<T, F>
    where T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    const NAME: &'static str = "count_if";

    type Args = (SharedSlice<T>, F);
    type Output = usize;
    type Error = Infallible;

    fn sequential((data, pred): (SharedSlice<T>, F)) -> Result<usize, Infallible> {
        Ok(data.iter().filter(|item| pred(item)).count())
    }

    fn parallel(policy: &ExecutionPolicy, (data, pred): (SharedSlice<T>, F)) -> AlgorithmResult<usize> {
        let count = data.len();
        Partitioner::call(
            policy,
            data,
            count,
            0,
            move |chunk: SharedSlice<T>, _count| Ok::<_, ChunkFailure<Infallible>>(chunk.iter().filter(|item| pred(item)).count()),
            |counts: Vec<usize>| counts.into_iter().sum())
    }
}

pub fn any_of<T, S, F>(policy: &ExecutionPolicy, data: S, pred: F) -> AlgorithmResult<bool>
    where S: Into<SharedSlice<T>>,
          T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    <AnyOf<T, F> as Algorithm>::run(policy, (data.into(), pred))
}

/// True for empty data.
pub fn all_of<T, S, F>(policy: &ExecutionPolicy, data: S, pred: F) -> AlgorithmResult<bool>
    where S: Into<SharedSlice<T>>,
          T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    <AllOf<T, F> as Algorithm>::run(policy, (data.into(), pred))
}

pub fn none_of<T, S, F>(policy: &ExecutionPolicy, data: S, pred: F) -> AlgorithmResult<bool>
    where S: Into<SharedSlice<T>>,
          T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    <NoneOf<T, F> as Algorithm>::run(policy, (data.into(), pred))
}

pub fn count_if<T, S, F>(policy: &ExecutionPolicy, data: S, pred: F) -> AlgorithmResult<usize>
    where S: Into<SharedSlice<T>>,
          T: Send + Sync + 'static,
          F: Fn(&T) -> bool + Send + Sync + 'static
{
    <CountIf<T, F> as Algorithm>::run(policy, (data.into(), pred))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{all_of, any_of, count_if, none_of};
    use super::super::testing::policies;

    #[test]
    fn boolean_predicates() {
        let data: Vec<u32> = (1 ..= 200).collect();
        for policy in policies() {
            assert!(any_of(&policy, data.clone(), |x: &u32| *x == 150).get().unwrap(), "{:?}", policy);
            assert!(!any_of(&policy, data.clone(), |x: &u32| *x > 200).get().unwrap());
            assert!(all_of(&policy, data.clone(), |x: &u32| *x > 0).get().unwrap());
            assert!(!all_of(&policy, data.clone(), |x: &u32| *x < 200).get().unwrap());
            assert!(none_of(&policy, data.clone(), |x: &u32| *x == 0).get().unwrap());
            assert!(!none_of(&policy, data.clone(), |x: &u32| *x == 1).get().unwrap());
        }
    }

    #[test]
    fn empty_data_is_vacuous() {
        for policy in policies() {
            assert!(!any_of(&policy, Vec::<u8>::new(), |_: &u8| true).get().unwrap());
            assert!(all_of(&policy, Vec::<u8>::new(), |_: &u8| false).get().unwrap());
            assert!(none_of(&policy, Vec::<u8>::new(), |_: &u8| true).get().unwrap());
            assert_eq!(count_if(&policy, Vec::<u8>::new(), |_: &u8| true).get().unwrap(), 0);
        }
    }

    proptest! {
        #[test]
        fn parallel_counts_match_sequential(
            data in prop::collection::vec(any::<i32>(), 0 .. 800),
            modulus in 1i32 .. 10,
        ) {
            let expected = data.iter().filter(|x| *x % modulus == 0).count();
            for policy in policies() {
                let counted = count_if(&policy, data.clone(), move |x: &i32| x % modulus == 0).get().unwrap();
                prop_assert_eq!(counted, expected);
                let any = any_of(&policy, data.clone(), move |x: &i32| x % modulus == 0).get().unwrap();
                prop_assert_eq!(any, expected > 0);
            }
        }
    }
}
