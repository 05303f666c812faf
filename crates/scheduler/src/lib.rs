//! Cloudshelf Scheduler Library
//!
//! Bounded FIFO worker pools with cooperative cancellation.
//!
//! This crate provides the execution substrate for the fetch pipeline: a
//! fixed-size worker pool over an unbounded FIFO queue, a cancellation
//! token checked at task start and before delivery, and the process-scoped
//! pair of pools (general data requests and thumbnail fetches) that keeps
//! heavy thumbnail work from starving short metadata calls.
//!
//! # Example
//!
//! ```
//! use cloudshelf_scheduler::{PoolSet, PoolSetConfig, CancellationToken};
//!
//! let pools = PoolSet::new(PoolSetConfig::default());
//! let token = CancellationToken::new();
//!
//! let worker_token = token.clone();
//! pools.thumbnail_pool().submit(Box::new(move || {
//!     if worker_token.is_cancelled() {
//!         return; // superseded before it started
//!     }
//!     // ... fetch and deliver ...
//! }));
//!
//! pools.shutdown_all();
//! ```

mod cancel;
mod pool;
mod pools;

pub use cancel::CancellationToken;
pub use pool::{PoolConfig, PoolTask, WorkerPool};
pub use pools::{PoolSet, PoolSetConfig};
