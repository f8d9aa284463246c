use super::{Completion, Executor, ExecutorError, Job};

/// Runs every submitted job inline, on the submitting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn new() -> SequentialExecutor {
        SequentialExecutor
    }
}

impl Executor for SequentialExecutor {
    fn concurrency(&self) -> usize {
        1
    }

    fn submit(&self, job: Job) -> Result<Completion, ExecutorError> {
        job();
        Ok(Completion::resolved())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread;

    use super::SequentialExecutor;
    use super::super::Executor;

    #[test]
    fn jobs_run_on_submitting_thread_in_order() {
        let executor = SequentialExecutor::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let caller = thread::current().id();
        for i in 0 .. 5 {
            let seen = seen.clone();
            let completion = executor
                .submit(Box::new(move || {
                    assert_eq!(thread::current().id(), caller);
                    seen.lock().unwrap().push(i);
                }))
                .unwrap();
            assert!(completion.is_complete());
        }
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }
}
