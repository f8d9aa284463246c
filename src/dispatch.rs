use tracing::debug_span;

use super::{AlgorithmResult, ExecutionError, ExecutionPolicy, Mode};

/// Picks the strategy `policy` asks for.
///
/// Sequential policies run `sequential` on the calling thread; its outcome is
/// wrapped per the policy's blocking mode (a task policy gets an already
/// resolved handle). Any other mode hands `args` to `parallel`.
pub fn dispatch<A, T, E, S, P>(policy: &ExecutionPolicy, sequential: S, parallel: P, args: A) -> AlgorithmResult<T, E>
    where S: FnOnce(A) -> Result<T, E>,
          P: FnOnce(&ExecutionPolicy, A) -> AlgorithmResult<T, E>
{
    match policy.mode() {
        Mode::Sequential =>
            AlgorithmResult::resolved(policy.blocking_mode(), sequential(args).map_err(ExecutionError::Sequential)),
        Mode::Parallel | Mode::ParallelUnsequenced =>
            parallel(policy, args),
    }
}

/// A sequential/parallel strategy pair.
///
/// Both strategies must produce the same logical result for the same input.
pub trait Algorithm {
    const NAME: &'static str;

    type Args;
    type Output;
    type Error;

    /// Single-threaded baseline.
    fn sequential(args: Self::Args) -> Result<Self::Output, Self::Error>;

    fn parallel(policy: &ExecutionPolicy, args: Self::Args) -> AlgorithmResult<Self::Output, Self::Error>;

    fn run(policy: &ExecutionPolicy, args: Self::Args) -> AlgorithmResult<Self::Output, Self::Error> {
        let span = debug_span!("algorithm", name = Self::NAME, mode = ?policy.mode(), task = policy.is_task());
        let _enter = span.enter();
        dispatch(policy, Self::sequential, Self::parallel, args)
    }
}
