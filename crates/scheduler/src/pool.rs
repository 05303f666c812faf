//! Bounded worker pool over an unbounded FIFO queue
//!
//! A fixed number of worker threads pull boxed closures off a shared queue
//! in strict submission order. There is no priority ordering inside a pool;
//! keeping heavy work from starving light work is done by running separate
//! pools, not by scheduling across them.

use log::{info, warn};
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A queued unit of work.
pub type PoolTask = Box<dyn FnOnce() + Send + 'static>;

/// Configuration for a worker pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads to spawn
    pub num_workers: usize,

    /// Maximum time a worker waits for work before re-checking shutdown.
    /// Default: 50ms.
    pub poll_interval: Duration,
}

impl PoolConfig {
    /// Create a configuration with the given worker count.
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Set the poll interval for workers.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

struct PoolShared {
    queue: Mutex<VecDeque<PoolTask>>,
    shutdown: AtomicBool,
    poll_interval: Duration,
}

/// Fixed-size thread pool with an unbounded FIFO work queue.
///
/// Tasks run in submission order across the pool's threads. `shutdown()`
/// stops the workers and joins them; tasks still queued at that point are
/// dropped without running.
pub struct WorkerPool {
    label: String,
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn a pool's worker threads.
    ///
    /// The label names the pool in logs and thread names.
    pub fn new(label: impl Into<String>, config: PoolConfig) -> Self {
        let label = label.into();
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            shutdown: AtomicBool::new(false),
            poll_interval: config.poll_interval,
        });

        let workers = (0..config.num_workers)
            .map(|n| {
                let shared = shared.clone();
                thread::Builder::new()
                    .name(format!("{label}-worker-{n}"))
                    .spawn(move || worker_loop(shared))
                    .expect("Failed to spawn worker thread")
            })
            .collect();

        info!("worker pool '{label}' started with {} threads", config.num_workers);
        Self {
            label,
            shared,
            workers: Mutex::new(workers),
        }
    }

    /// Queue a task for execution.
    ///
    /// Returns `false` (dropping the task) if the pool has been shut down.
    pub fn submit(&self, task: PoolTask) -> bool {
        if self.is_shut_down() {
            warn!("worker pool '{}' is shut down, rejecting task", self.label);
            return false;
        }
        self.shared.queue.lock().unwrap().push_back(task);
        true
    }

    /// Number of tasks waiting to run.
    pub fn queue_depth(&self) -> usize {
        self.shared.queue.lock().unwrap().len()
    }

    /// Whether `shutdown()` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.load(Ordering::Acquire)
    }

    /// Stop the workers and join them.
    ///
    /// Running tasks finish; queued tasks are discarded. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        let handles: Vec<JoinHandle<()>> = self.workers.lock().unwrap().drain(..).collect();
        for handle in handles {
            handle.join().ok();
        }
        let dropped = {
            let mut queue = self.shared.queue.lock().unwrap();
            let n = queue.len();
            queue.clear();
            n
        };
        info!("worker pool '{}' shut down, {dropped} queued tasks dropped", self.label);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<PoolShared>) {
    loop {
        if shared.shutdown.load(Ordering::Acquire) {
            return;
        }

        let task = shared.queue.lock().unwrap().pop_front();
        match task {
            Some(task) => task(),
            None => thread::sleep(shared.poll_interval),
        }
    }
}
