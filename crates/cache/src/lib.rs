//! Cloudshelf Cache Library
//!
//! Flat on-disk thumbnail cache keyed by item id and content fingerprint.

pub mod config;
pub mod disk;
pub mod key;

pub use config::{ConfigError, ThumbCacheConfig};
pub use disk::{CacheError, ThumbCacheStats, ThumbnailDiskCache};
pub use key::{ThumbKey, THUMBNAIL_EXTENSION};
