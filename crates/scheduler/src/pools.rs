//! Process-scoped pool set
//!
//! The process runs two independently sized pools: a wider one for general
//! data requests (mostly short metadata calls) and a narrower one dedicated
//! to thumbnail fetches, which are I/O- and decode-heavy and must not
//! starve metadata traffic. Pools are created lazily on first use and
//! recreated if a previous instance was shut down. The set is injected into
//! the components that need it rather than reached for as a global.

use crate::pool::{PoolConfig, WorkerPool};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sizing for the pool set.
#[derive(Debug, Clone)]
pub struct PoolSetConfig {
    /// Worker count for the general data pool. Default: 6.
    pub data_workers: usize,

    /// Worker count for the thumbnail pool. Default: 3.
    pub thumbnail_workers: usize,

    /// Poll interval for all workers. Default: 50ms.
    pub poll_interval: Duration,
}

impl Default for PoolSetConfig {
    fn default() -> Self {
        Self {
            data_workers: 6,
            thumbnail_workers: 3,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl PoolSetConfig {
    /// Create a configuration with default sizes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data pool worker count.
    pub fn with_data_workers(mut self, workers: usize) -> Self {
        self.data_workers = workers;
        self
    }

    /// Set the thumbnail pool worker count.
    pub fn with_thumbnail_workers(mut self, workers: usize) -> Self {
        self.thumbnail_workers = workers;
        self
    }

    /// Set the worker poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Handle to the process's two worker pools.
///
/// Safe to share via `Arc`; accessors hand back a live pool, creating or
/// recreating it as needed. `shutdown_all()` is the defined teardown point.
pub struct PoolSet {
    config: PoolSetConfig,
    data: Mutex<Option<Arc<WorkerPool>>>,
    thumbnails: Mutex<Option<Arc<WorkerPool>>>,
}

impl PoolSet {
    /// Create a pool set; no threads are spawned until first use.
    pub fn new(config: PoolSetConfig) -> Self {
        Self {
            config,
            data: Mutex::new(None),
            thumbnails: Mutex::new(None),
        }
    }

    /// The general data request pool.
    pub fn data_pool(&self) -> Arc<WorkerPool> {
        Self::live_pool(&self.data, "data", self.config.data_workers, self.config.poll_interval)
    }

    /// The dedicated thumbnail fetch pool.
    pub fn thumbnail_pool(&self) -> Arc<WorkerPool> {
        Self::live_pool(
            &self.thumbnails,
            "thumbnails",
            self.config.thumbnail_workers,
            self.config.poll_interval,
        )
    }

    /// Shut down both pools and join their workers. Later accessor calls
    /// spawn fresh pools.
    pub fn shutdown_all(&self) {
        for slot in [&self.data, &self.thumbnails] {
            if let Some(pool) = slot.lock().unwrap().take() {
                pool.shutdown();
            }
        }
    }

    fn live_pool(
        slot: &Mutex<Option<Arc<WorkerPool>>>,
        label: &str,
        workers: usize,
        poll_interval: Duration,
    ) -> Arc<WorkerPool> {
        let mut guard = slot.lock().unwrap();
        match guard.as_ref() {
            Some(pool) if !pool.is_shut_down() => pool.clone(),
            _ => {
                let config = PoolConfig::new(workers).with_poll_interval(poll_interval);
                let pool = Arc::new(WorkerPool::new(label, config));
                *guard = Some(pool.clone());
                pool
            }
        }
    }
}

impl Default for PoolSet {
    fn default() -> Self {
        Self::new(PoolSetConfig::default())
    }
}
