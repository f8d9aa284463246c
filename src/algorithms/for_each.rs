use std::convert::Infallible;
use std::marker::PhantomData;

use crate::{Algorithm, AlgorithmResult, ChunkFailure, ExecutionPolicy, Partitioner, SharedSlice};

/// Calls `f` on every element for its side effects.
///
/// No order between chunks is guaranteed; inside a chunk elements are visited
/// front to back.
pub struct ForEach<T, F>(PhantomData<fn(T, F)>);

impl<T, F> Algorithm for ForEach<T, F>
    where T: Send + Sync + 'static,
          F: Fn(&T) + Send + Sync + 'static
{
    const NAME: &'static str = "for_each";

    type Args = (SharedSlice<T>, F);
    type Output = ();
    type Error = Infallible;

    fn sequential((data, f): (SharedSlice<T>, F)) -> Result<(), Infallible> {
        data.iter().for_each(f);
        Ok(())
    }

    fn parallel(policy: &ExecutionPolicy, (data, f): (SharedSlice<T>, F)) -> AlgorithmResult<()> {
        let count = data.len();
        Partitioner::call(
            policy,
            data,
            count,
            0,
            move |chunk: SharedSlice<T>, _count| {
                chunk.iter().for_each(&f);
                Ok::<_, ChunkFailure<Infallible>>(())
            },
            |_: Vec<()>| ())
    }
}

pub fn for_each<T, S, F>(policy: &ExecutionPolicy, data: S, f: F) -> AlgorithmResult<()>
    where S: Into<SharedSlice<T>>,
          T: Send + Sync + 'static,
          F: Fn(&T) + Send + Sync + 'static
{
    <ForEach<T, F> as Algorithm>::run(policy, (data.into(), f))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::for_each;
    use super::super::testing::policies;

    #[test]
    fn visits_every_element_once() {
        let data: Vec<usize> = (0 .. 1000).collect();
        for policy in policies() {
            let seen = Arc::new(Mutex::new(vec![0u8; data.len()]));
            let local_seen = seen.clone();
            for_each(&policy, data.clone(), move |i: &usize| local_seen.lock().unwrap()[*i] += 1).get().unwrap();
            assert!(seen.lock().unwrap().iter().all(|&hits| hits == 1), "{:?}", policy);
        }
    }

    #[test]
    fn accumulates_side_effects() {
        for policy in policies() {
            let sum = Arc::new(AtomicUsize::new(0));
            let local_sum = sum.clone();
            for_each(&policy, vec![1usize; 257], move |x: &usize| {
                local_sum.fetch_add(*x, Ordering::Relaxed);
            }).get().unwrap();
            assert_eq!(sum.load(Ordering::Relaxed), 257);
        }
    }

    #[test]
    fn empty_data_calls_nothing() {
        for policy in policies() {
            for_each(&policy, Vec::<u8>::new(), |_: &u8| panic!("called on empty data")).get().unwrap();
        }
    }
}
