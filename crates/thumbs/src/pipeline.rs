//! Thumbnail fetch pipeline
//!
//! Entry point for "this slot just became visible, get its thumbnail".
//! Cache hits decode and deliver without touching a worker pool; misses
//! become cancellable fetch jobs on the thumbnail pool. Every delivery path
//! re-verifies the slot binding, so a task whose slot was rebound mid-fetch
//! finishes silently instead of writing a stale image into a reused slot.
//!
//! Failures never leave the pipeline: a failed fetch ends as a placeholder
//! delivery plus a remembered failed key, and the caller re-requests when
//! the slot next becomes visible.

use crate::binding::{BindingTicket, BindingTracker, SlotId};
use crate::icons::{DefaultIconResolver, ExtensionIconResolver, PlaceholderIcon};
use crate::request::{RequestKey, ThumbnailVariant};
use cloudshelf_cache::{CacheError, ThumbKey, ThumbnailDiskCache};
use cloudshelf_core::RemoteItem;
use cloudshelf_scheduler::{CancellationToken, PoolSet, WorkerPool};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Fetch pipeline failure.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure; not retried automatically
    #[error("thumbnail transport failure: {0}")]
    Transport(String),

    /// Could not persist the fetched bytes; the in-memory image is still
    /// delivered for this display pass
    #[error("thumbnail cache write failure: {0}")]
    CacheWrite(#[from] CacheError),

    /// Fetched bytes are not a decodable image
    #[error("thumbnail decode failure: {0}")]
    Decode(String),
}

/// Remote thumbnail transport collaborator: downloads an item's thumbnail
/// bytes into a target file path.
pub trait ThumbnailTransport: Send + Sync {
    /// Download the thumbnail for `item_id` into `dest`.
    fn fetch(&self, item_id: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Decoded RGBA8 thumbnail ready for the display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedThumb {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Tightly packed RGBA8 pixels, row-major
    pub rgba: Vec<u8>,
}

/// Display-layer collaborator receiving per-slot deliveries.
///
/// Called only from the UI-owning executor.
pub trait SlotPresenter: Send + Sync {
    /// Show a decoded thumbnail in a slot.
    fn show_thumbnail(&self, slot: SlotId, thumb: DecodedThumb);

    /// Show a placeholder icon in a slot.
    fn show_placeholder(&self, slot: SlotId, icon: PlaceholderIcon);
}

/// The single execution context that owns all display-slot writes.
///
/// Worker threads never touch slots directly; they post delivery closures
/// here.
pub trait UiExecutor: Send + Sync {
    /// Run `work` on the UI-owning execution context.
    fn post(&self, work: Box<dyn FnOnce() + Send + 'static>);
}

/// Executor that runs work immediately on the calling thread.
///
/// For tests and headless hosts, where no dedicated thread owns display
/// state.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl UiExecutor for InlineExecutor {
    fn post(&self, work: Box<dyn FnOnce() + Send + 'static>) {
        work();
    }
}

/// Lifecycle of one fetch task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Built but not yet queued
    Created,

    /// Waiting in the thumbnail pool
    Queued,

    /// Executing on a worker
    Running,

    /// Delivered (or resolved from cache)
    Completed,

    /// Superseded or slot released; nothing was delivered
    Cancelled,

    /// Fetch or decode failed; placeholder delivered
    Failed,
}

/// Observable handle to one fetch task's state.
#[derive(Clone)]
pub struct TaskHandle {
    state: Arc<Mutex<TaskState>>,
}

impl TaskHandle {
    fn new(state: TaskState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        *self.state.lock().unwrap()
    }

    fn set(&self, state: TaskState) {
        *self.state.lock().unwrap() = state;
    }
}

// Staging downloads get unique names so concurrent fetches of the same
// item version never clobber each other's partial file.
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Thumbnail fetch pipeline.
///
/// Shared by value-clone of its `Arc`ed internals across the display layer
/// and worker threads.
pub struct ThumbnailPipeline {
    cache: ThumbnailDiskCache,
    transport: Arc<dyn ThumbnailTransport>,
    presenter: Arc<dyn SlotPresenter>,
    ui: Arc<dyn UiExecutor>,
    icons: Arc<dyn DefaultIconResolver>,
    pools: Arc<PoolSet>,
    bindings: Arc<BindingTracker>,
    failed: Arc<Mutex<HashSet<RequestKey>>>,
}

impl ThumbnailPipeline {
    /// Create a pipeline with the default extension-based icon resolver.
    pub fn new(
        cache: ThumbnailDiskCache,
        transport: Arc<dyn ThumbnailTransport>,
        presenter: Arc<dyn SlotPresenter>,
        ui: Arc<dyn UiExecutor>,
        pools: Arc<PoolSet>,
    ) -> Self {
        Self {
            cache,
            transport,
            presenter,
            ui,
            icons: Arc::new(ExtensionIconResolver),
            pools,
            bindings: Arc::new(BindingTracker::new()),
            failed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Replace the icon resolver.
    pub fn with_icon_resolver(mut self, icons: Arc<dyn DefaultIconResolver>) -> Self {
        self.icons = icons;
        self
    }

    /// Request a thumbnail for `item` into display slot `slot`.
    ///
    /// Binds the slot to this request (superseding and cancelling any task
    /// previously bound to it), then either resolves from cache without
    /// scheduling network work or queues a fetch job on the thumbnail pool.
    pub fn request(&self, item: &RemoteItem, variant: ThumbnailVariant, slot: SlotId) -> TaskHandle {
        let handle = TaskHandle::new(TaskState::Created);
        let icon = self.icons.icon_for(item);

        if !item.kind.supports_thumbnail() {
            // Folders and synthetic rows only ever show their icon.
            self.bindings.release(slot);
            let presenter = self.presenter.clone();
            self.ui.post(Box::new(move || presenter.show_placeholder(slot, icon)));
            handle.set(TaskState::Completed);
            return handle;
        }

        let key = RequestKey::new(item, variant);
        let thumb_key = ThumbKey::for_item(item);
        let (ticket, token) = self.bindings.bind(slot, key.clone());

        match self.cache.read(&thumb_key) {
            Ok(Some(bytes)) => match decode(&bytes, variant) {
                Ok(thumb) => {
                    self.failed.lock().unwrap().remove(&key);
                    self.deliver_thumbnail(ticket, thumb);
                    handle.set(TaskState::Completed);
                    return handle;
                }
                Err(err) => {
                    // Corrupt entry. Drop it before queueing the fetch, or
                    // the job's own cache probe would hand back the same
                    // undecodable bytes instead of re-downloading.
                    warn!("cached thumbnail for {} undecodable: {err}", item.id);
                    if let Err(err) = self.cache.discard(&thumb_key) {
                        warn!("could not drop corrupt entry for {}: {err}", item.id);
                    }
                }
            },
            Ok(None) => {}
            Err(err) => warn!("cache probe failed for {}: {err}", item.id),
        }

        // Placeholder first, so a recycled slot never keeps the previous
        // row's image while the fetch is in flight.
        self.deliver_placeholder(ticket, icon);

        let job = FetchJob {
            item_id: item.id.clone(),
            key,
            thumb_key,
            variant,
            ticket,
            token,
            handle: handle.clone(),
            icon,
            cache: self.cache.clone(),
            transport: self.transport.clone(),
            presenter: self.presenter.clone(),
            ui: self.ui.clone(),
            bindings: self.bindings.clone(),
            failed: self.failed.clone(),
        };

        handle.set(TaskState::Queued);
        self.submit_job(job, &self.pools.thumbnail_pool());
        handle
    }

    /// Queue a fetch job on a pool, resolving it like any other failed
    /// fetch when the pool was shut down out from under us: remember the
    /// key, drop the binding, and show the placeholder.
    fn submit_job(&self, job: FetchJob, pool: &WorkerPool) {
        let handle = job.handle.clone();
        let key = job.key.clone();
        let icon = job.icon;
        let slot = job.ticket.slot();
        if !pool.submit(Box::new(move || job.run())) {
            self.failed.lock().unwrap().insert(key);
            handle.set(TaskState::Failed);
            self.bindings.release(slot);
            let presenter = self.presenter.clone();
            self.ui.post(Box::new(move || presenter.show_placeholder(slot, icon)));
        }
    }

    /// Cancellation hook for slot recycling: drops the slot's binding and
    /// cancels whichever task owned it.
    pub fn release_slot(&self, slot: SlotId) {
        self.bindings.release(slot);
    }

    /// Whether the last attempt for this item/variant failed. Callers use
    /// this to re-request when the slot next becomes visible.
    pub fn had_failed(&self, item: &RemoteItem, variant: ThumbnailVariant) -> bool {
        self.failed.lock().unwrap().contains(&RequestKey::new(item, variant))
    }

    /// The underlying disk cache.
    pub fn cache(&self) -> &ThumbnailDiskCache {
        &self.cache
    }

    /// Number of slots currently bound to a task.
    pub fn live_bindings(&self) -> usize {
        self.bindings.live_bindings()
    }

    fn deliver_thumbnail(&self, ticket: BindingTicket, thumb: DecodedThumb) {
        let presenter = self.presenter.clone();
        let bindings = self.bindings.clone();
        self.ui.post(Box::new(move || {
            if bindings.is_current(&ticket) {
                presenter.show_thumbnail(ticket.slot(), thumb);
            }
        }));
    }

    fn deliver_placeholder(&self, ticket: BindingTicket, icon: PlaceholderIcon) {
        let presenter = self.presenter.clone();
        let bindings = self.bindings.clone();
        self.ui.post(Box::new(move || {
            if bindings.is_current(&ticket) {
                presenter.show_placeholder(ticket.slot(), icon);
            }
        }));
    }
}

/// One scheduled fetch, self-contained so it can move onto a worker.
struct FetchJob {
    item_id: String,
    key: RequestKey,
    thumb_key: ThumbKey,
    variant: ThumbnailVariant,
    ticket: BindingTicket,
    token: CancellationToken,
    handle: TaskHandle,
    icon: PlaceholderIcon,
    cache: ThumbnailDiskCache,
    transport: Arc<dyn ThumbnailTransport>,
    presenter: Arc<dyn SlotPresenter>,
    ui: Arc<dyn UiExecutor>,
    bindings: Arc<BindingTracker>,
    failed: Arc<Mutex<HashSet<RequestKey>>>,
}

impl FetchJob {
    fn run(self) {
        self.handle.set(TaskState::Running);

        if self.is_stale() {
            debug!("fetch for {} superseded before start, skipping I/O", self.item_id);
            self.handle.set(TaskState::Cancelled);
            return;
        }

        let bytes = match self.obtain_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("thumbnail fetch failed for {}: {err}", self.item_id);
                self.fail();
                return;
            }
        };

        let thumb = match decode(&bytes, self.variant) {
            Ok(thumb) => thumb,
            Err(err) => {
                warn!("thumbnail decode failed for {}: {err}", self.item_id);
                self.fail();
                return;
            }
        };

        if self.is_stale() {
            debug!("late thumbnail for {} discarded after supersession", self.item_id);
            self.handle.set(TaskState::Cancelled);
            return;
        }

        self.failed.lock().unwrap().remove(&self.key);
        self.handle.set(TaskState::Completed);

        let presenter = self.presenter;
        let bindings = self.bindings;
        let ticket = self.ticket;
        // Final binding check happens on the UI executor itself; the slot
        // may be rebound between here and the closure running.
        self.ui.post(Box::new(move || {
            if bindings.is_current(&ticket) {
                presenter.show_thumbnail(ticket.slot(), thumb);
            }
        }));
    }

    /// Cooperative staleness check: supersession cancels the token and
    /// invalidates the ticket.
    fn is_stale(&self) -> bool {
        self.token.is_cancelled() || !self.bindings.is_current(&self.ticket)
    }

    /// Get the thumbnail bytes, from cache when a concurrent task already
    /// published this item version, otherwise from the transport.
    fn obtain_bytes(&self) -> Result<Vec<u8>, FetchError> {
        if let Ok(Some(bytes)) = self.cache.read(&self.thumb_key) {
            return Ok(bytes);
        }

        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let staging = self
            .cache
            .entry_path(&self.thumb_key)
            .with_extension(format!("fetch{seq}"));

        let fetched = self.transport.fetch(&self.item_id, &staging);
        let bytes = match fetched {
            Ok(()) => fs::read(&staging).map_err(|e| FetchError::Transport(e.to_string()))?,
            Err(err) => {
                fs::remove_file(&staging).ok();
                return Err(err);
            }
        };
        fs::remove_file(&staging).ok();

        if bytes.is_empty() {
            return Err(FetchError::Transport("empty download".to_string()));
        }

        // A failed publish still leaves the in-memory bytes usable for this
        // display pass; the next visibility re-fetches and re-publishes.
        if let Err(err) = self.cache.publish(&self.thumb_key, &bytes) {
            warn!("cache write failed for {}: {err}", self.item_id);
        }

        Ok(bytes)
    }

    /// Failed terminal state: remember the key and fall back to the
    /// placeholder. Never propagates past the pool boundary.
    fn fail(self) {
        self.failed.lock().unwrap().insert(self.key);
        self.handle.set(TaskState::Failed);

        let presenter = self.presenter;
        let bindings = self.bindings;
        let ticket = self.ticket;
        let icon = self.icon;
        self.ui.post(Box::new(move || {
            if bindings.is_current(&ticket) {
                presenter.show_placeholder(ticket.slot(), icon);
            }
        }));
    }
}

/// Decode image bytes and downscale to the variant's bound.
fn decode(bytes: &[u8], variant: ThumbnailVariant) -> Result<DecodedThumb, FetchError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
    let max = variant.max_dimension();
    let rgba = decoded.to_rgba8();
    let rgba = if rgba.width() > max || rgba.height() > max {
        decoded.thumbnail(max, max).to_rgba8()
    } else {
        rgba
    };
    Ok(DecodedThumb {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}
