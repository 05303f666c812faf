//! Flat on-disk thumbnail cache
//!
//! Entries are whole thumbnail files in a single directory, named by the
//! [`ThumbKey`](crate::key::ThumbKey). A hit is a file that exists with
//! non-zero length; anything else is a miss. Entries are never invalidated
//! in place — a new item version gets a new name — so the only reclamation
//! is the bulk clear run at startup. Writes go through a same-directory
//! temp file, are verified non-empty, then renamed into place, so readers
//! never observe a partial entry.

use crate::key::{ThumbKey, THUMBNAIL_EXTENSION};
use log::{debug, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Cache operation failure.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Underlying filesystem failure
    #[error("cache I/O failure: {0}")]
    Io(#[from] io::Error),

    /// A publish was handed zero bytes; an empty file would read as a miss
    /// but shadow the real fetch forever
    #[error("refusing to publish empty cache entry")]
    EmptyWrite,
}

/// Hit/miss/write counters for one cache instance.
#[derive(Debug, Clone, Default)]
pub struct ThumbCacheStats {
    /// Probes that found a valid entry
    pub hits: u64,

    /// Probes that found nothing (or an empty file)
    pub misses: u64,

    /// Entries published
    pub writes: u64,
}

impl ThumbCacheStats {
    /// Hit rate in `0.0..=1.0`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Shared handle to the flat thumbnail cache directory.
///
/// Clone-shared across fetch tasks. No internal lock guards the files
/// themselves: names embed the content fingerprint, so two writers can only
/// collide when publishing identical content.
#[derive(Clone)]
pub struct ThumbnailDiskCache {
    cache_dir: PathBuf,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    writes: Arc<AtomicU64>,
}

impl ThumbnailDiskCache {
    /// Open (and create if missing) a cache directory.
    pub fn open(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            writes: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Open the cache described by a configuration, bulk-clearing it first
    /// when the configuration says to. This is the startup entry point.
    pub fn from_config(config: &crate::config::ThumbCacheConfig) -> Result<Self, CacheError> {
        let cache = Self::open(&config.cache_dir)?;
        if config.clear_on_start {
            cache.clear_all()?;
        }
        Ok(cache)
    }

    /// The cache directory path.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path a key's entry would occupy, whether or not it exists yet.
    pub fn entry_path(&self, key: &ThumbKey) -> PathBuf {
        key.path_in(&self.cache_dir)
    }

    /// Whether a valid entry exists for the key. Counts toward stats.
    pub fn contains(&self, key: &ThumbKey) -> bool {
        let valid = is_valid_entry(&self.entry_path(key));
        if valid {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        valid
    }

    /// Read a valid entry's bytes, or `None` on miss. Counts toward stats.
    pub fn read(&self, key: &ThumbKey) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.entry_path(key);
        if !is_valid_entry(&path) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        if bytes.is_empty() {
            // Raced a concurrent truncation; treat as the miss it is.
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!("cache hit for {}", key.file_name());
        Ok(Some(bytes))
    }

    /// Publish bytes as the entry for a key.
    ///
    /// Writes to a same-directory temp file, verifies non-zero length, then
    /// renames into place so a reader can never see a partial entry.
    pub fn publish(&self, key: &ThumbKey, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        if bytes.is_empty() {
            return Err(CacheError::EmptyWrite);
        }

        let final_path = self.entry_path(key);
        let tmp_path = final_path.with_extension(format!("{THUMBNAIL_EXTENSION}.part"));

        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }

        let written = fs::metadata(&tmp_path)?.len();
        if written == 0 {
            fs::remove_file(&tmp_path).ok();
            return Err(CacheError::EmptyWrite);
        }

        if let Err(err) = fs::rename(&tmp_path, &final_path) {
            fs::remove_file(&tmp_path).ok();
            return Err(err.into());
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!("published {} ({} bytes)", key.file_name(), written);
        Ok(final_path)
    }

    /// Remove a key's entry if present.
    ///
    /// Not an eviction path: this exists for entries that turned out to be
    /// undecodable, which would otherwise shadow the real fetch until the
    /// next startup clear.
    pub fn discard(&self, key: &ThumbKey) -> Result<(), CacheError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => {
                debug!("discarded cache entry {}", key.file_name());
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Bulk-clear every cache entry. Run at startup; there is no per-entry
    /// eviction.
    pub fn clear_all(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!("failed to clear cache entry {:?}: {err}", path.file_name());
                    return Err(err.into());
                }
            }
        }
        debug!("bulk-cleared {removed} cache entries");
        Ok(removed)
    }

    /// Snapshot of the hit/miss/write counters.
    pub fn stats(&self) -> ThumbCacheStats {
        ThumbCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

/// A valid entry exists and has non-zero length.
fn is_valid_entry(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file() && meta.len() > 0).unwrap_or(false)
}
