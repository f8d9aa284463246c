use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error};

use super::{Completion, Executor, ExecutorConfig, ExecutorError, Job};

enum Command {
    Job(Job),
    Stop,
}

struct Slave {
    thread: Option<thread::JoinHandle<()>>,
}

impl Slave {
    fn spawn(name: String, rx: Receiver<Command>) -> Result<Slave, io::Error> {
        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || slave_loop(rx))?;
        Ok(Slave {
            thread: Some(thread),
        })
    }
}

impl Drop for Slave {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            // the last executor handle may be released by one of its own jobs
            if thread.thread().id() == thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                error!("parallel executor slave terminated abnormally");
            }
        }
    }
}

fn slave_loop(rx: Receiver<Command>) {
    while let Ok(command) = rx.recv() {
        match command {
            Command::Job(job) =>
                run_job(job),
            Command::Stop =>
                break,
        }
    }
}

fn run_job(job: Job) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        error!(message = %panic_message(&*payload), "job panicked on executor thread");
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Fixed-size pool of slave threads pulling jobs from one shared queue.
///
/// Threads blocked in [`Executor::wait_all`] keep executing queued jobs while
/// they wait, so a job may itself submit work and wait for it without starving
/// the pool.
pub struct ParallelExecutor {
    slaves_count: usize,
    thread_name: String,
    slaves: Vec<Slave>,
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl ParallelExecutor {
    pub fn new(slaves_count: usize) -> ParallelExecutor {
        ParallelExecutor::with_thread_name(slaves_count, ExecutorConfig::default().thread_name)
    }

    pub fn from_config(config: &ExecutorConfig) -> ParallelExecutor {
        ParallelExecutor::with_thread_name(config.resolve_workers(), config.thread_name.clone())
    }

    fn with_thread_name(slaves_count: usize, thread_name: String) -> ParallelExecutor {
        let (tx, rx) = channel::unbounded();
        ParallelExecutor {
            slaves_count: slaves_count.max(1),
            thread_name,
            slaves: Vec::new(),
            tx,
            rx,
        }
    }

    /// Spawns the slave threads.
    pub fn start(mut self) -> Result<Self, ExecutorError> {
        for slave_id in self.slaves.len() .. self.slaves_count {
            let name = format!("{} #{}", self.thread_name, slave_id);
            let slave = Slave::spawn(name, self.rx.clone()).map_err(ExecutorError::Spawn)?;
            self.slaves.push(slave);
        }
        debug!(slaves = self.slaves.len(), "parallel executor started");
        Ok(self)
    }

    pub fn slaves_count(&self) -> usize {
        self.slaves_count
    }
}

impl Default for ParallelExecutor {
    fn default() -> ParallelExecutor {
        ParallelExecutor::new(num_cpus::get())
    }
}

impl Executor for ParallelExecutor {
    fn concurrency(&self) -> usize {
        self.slaves_count
    }

    fn submit(&self, job: Job) -> Result<Completion, ExecutorError> {
        if self.slaves.is_empty() {
            return Err(ExecutorError::NotStarted);
        }
        let (job, completion) = Completion::track(job);
        self.tx.send(Command::Job(job)).map_err(|_| ExecutorError::Disconnected)?;
        Ok(completion)
    }

    fn wait_all(&self, completions: Vec<Completion>) {
        for completion in completions {
            let mut done = false;
            let mut helping = true;
            while !done && helping {
                channel::select! {
                    recv(completion.receiver()) -> _ =>
                        done = true,
                    recv(self.rx) -> command => match command {
                        Ok(Command::Job(job)) =>
                            run_job(job),
                        Ok(Command::Stop) => {
                            // not ours to consume: hand it back to the slaves
                            let _ = self.tx.send(Command::Stop);
                            helping = false;
                        },
                        Err(_) =>
                            helping = false,
                    },
                }
            }
            if !done {
                completion.wait();
            }
        }
    }
}

impl Drop for ParallelExecutor {
    fn drop(&mut self) {
        for _ in 0 .. self.slaves.len() {
            let _ = self.tx.send(Command::Stop);
        }
        self.slaves.clear();
        debug!("parallel executor stopped");
    }
}
