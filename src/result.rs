use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use super::{Blocking, ExecutionError, ExecutionPolicy, ExecutorError};

enum State<T> {
    Ready(T),
    Pending(Receiver<thread::Result<T>>),
    Panicked(Box<dyn std::any::Any + Send>),
}

/// Deferred value produced by a task-mode call.
///
/// A panic raised while the value was being produced is re-raised by
/// [`get`](FutureHandle::get), matching what a blocking call would have done.
pub struct FutureHandle<T> {
    state: State<T>,
}

impl<T> FutureHandle<T> {
    /// A handle that is already resolved to `value`.
    pub fn ready(value: T) -> FutureHandle<T> {
        FutureHandle { state: State::Ready(value) }
    }

    pub(crate) fn pending() -> (Sender<thread::Result<T>>, FutureHandle<T>) {
        let (tx, rx) = channel::bounded(1);
        (tx, FutureHandle { state: State::Pending(rx) })
    }

    pub fn is_ready(&self) -> bool {
        match &self.state {
            State::Pending(rx) => !rx.is_empty(),
            _ => true,
        }
    }

    /// Waits at most `timeout` for the value; returns whether it is available.
    pub fn wait_timeout(&mut self, timeout: Duration) -> bool {
        let outcome = match &self.state {
            State::Pending(rx) => rx.recv_timeout(timeout),
            _ => return true,
        };
        match outcome {
            Ok(Ok(value)) =>
                self.state = State::Ready(value),
            Ok(Err(payload)) =>
                self.state = State::Panicked(payload),
            Err(RecvTimeoutError::Timeout) =>
                return false,
            Err(RecvTimeoutError::Disconnected) =>
                (),
        }
        true
    }

    /// Blocks until the value is available.
    pub fn get(self) -> Result<T, ExecutorError> {
        match self.state {
            State::Ready(value) =>
                Ok(value),
            State::Panicked(payload) =>
                panic::resume_unwind(payload),
            State::Pending(rx) => match rx.recv() {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(payload)) => panic::resume_unwind(payload),
                Err(_) => Err(ExecutorError::Disconnected),
            },
        }
    }
}

/// Uniform return type of every algorithm: the outcome itself for blocking
/// policies, a handle to it for task policies.
pub enum AlgorithmResult<T, E = Infallible> {
    Immediate(Result<T, ExecutionError<E>>),
    Deferred(FutureHandle<Result<T, ExecutionError<E>>>),
}

impl<T, E> AlgorithmResult<T, E> {
    /// Wraps an outcome that is already known in the variant `blocking` asks for.
    pub fn resolved(blocking: Blocking, outcome: Result<T, ExecutionError<E>>) -> AlgorithmResult<T, E> {
        match blocking {
            Blocking::Blocking => AlgorithmResult::Immediate(outcome),
            Blocking::Task => AlgorithmResult::Deferred(FutureHandle::ready(outcome)),
        }
    }

    /// Runs `driver` as `policy` asks: on the calling thread when blocking, as a
    /// job on the policy's executor otherwise.
    pub(crate) fn drive<F>(policy: &ExecutionPolicy, driver: F) -> AlgorithmResult<T, E>
        where F: FnOnce() -> Result<T, ExecutionError<E>> + Send + 'static,
              T: Send + 'static,
              E: Send + 'static
    {
        if !policy.is_task() {
            return AlgorithmResult::Immediate(driver());
        }

        let (tx, handle) = FutureHandle::pending();
        let job = Box::new(move || {
            let _ = tx.send(panic::catch_unwind(AssertUnwindSafe(driver)));
        });
        match policy.executor().submit(job) {
            Ok(_completion) =>
                AlgorithmResult::Deferred(handle),
            Err(error) =>
                AlgorithmResult::Deferred(FutureHandle::ready(Err(error.into()))),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, AlgorithmResult::Deferred(..))
    }

    pub fn is_ready(&self) -> bool {
        match self {
            AlgorithmResult::Immediate(..) => true,
            AlgorithmResult::Deferred(handle) => handle.is_ready(),
        }
    }

    pub fn wait_timeout(&mut self, timeout: Duration) -> bool {
        match self {
            AlgorithmResult::Immediate(..) => true,
            AlgorithmResult::Deferred(handle) => handle.wait_timeout(timeout),
        }
    }

    /// The outcome, waiting for it if deferred.
    pub fn get(self) -> Result<T, ExecutionError<E>> {
        match self {
            AlgorithmResult::Immediate(outcome) => outcome,
            AlgorithmResult::Deferred(handle) => handle.get()?,
        }
    }
}
