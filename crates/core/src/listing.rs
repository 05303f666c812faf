//! Paginated remote listing loader
//!
//! Pulls a container's contents page by page through the [`RemoteListing`]
//! collaborator and feeds each page into the command queue. A failed page
//! does not retry on its own: it arms a resume flag so the host can retry
//! once connectivity returns, and the display layer can show a retry row.

use crate::commands::CommandSender;
use crate::item::RemoteItem;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Listing collaborator failure.
#[derive(Debug, Error)]
pub enum ListingError {
    /// Transport-level failure (network, server error)
    #[error("listing transport failure: {0}")]
    Transport(String),

    /// No connectivity at all
    #[error("no connectivity")]
    Offline,
}

/// One page of a remote listing.
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Items in this page, in display order
    pub items: Vec<RemoteItem>,

    /// Total number of items in the container
    pub total: usize,
}

/// Remote listing collaborator: returns a page of a container's contents.
pub trait RemoteListing: Send + Sync {
    /// List `limit` items of `container_id` starting at `offset`.
    fn list(&self, container_id: &str, offset: usize, limit: usize) -> Result<ListingPage, ListingError>;
}

/// Incremental loader for one container's listing.
///
/// The first page replaces the displayed sequence; later pages append.
/// Progress counters are atomics so visibility callbacks on other threads
/// can ask `has_more()` without locking.
pub struct PageLoader {
    listing: Arc<dyn RemoteListing>,
    sender: CommandSender,
    container_id: String,
    page_size: usize,
    loaded: AtomicUsize,
    total: AtomicUsize,
    started: AtomicBool,
    resume_when_connected: AtomicBool,
}

impl PageLoader {
    /// Default page size for listing requests.
    pub const DEFAULT_PAGE_SIZE: usize = 100;

    /// Create a loader for one container.
    pub fn new(listing: Arc<dyn RemoteListing>, sender: CommandSender, container_id: impl Into<String>) -> Self {
        Self {
            listing,
            sender,
            container_id: container_id.into(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            loaded: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            started: AtomicBool::new(false),
            resume_when_connected: AtomicBool::new(false),
        }
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetch the next page and queue it for display.
    ///
    /// The first successful page is queued as a replace, later pages as
    /// appends. On failure the resume flag is armed and the error returned;
    /// no retry is scheduled here.
    pub fn load_next_page(&self) -> Result<(), ListingError> {
        let offset = self.loaded.load(Ordering::Acquire);
        let page = match self.listing.list(&self.container_id, offset, self.page_size) {
            Ok(page) => page,
            Err(err) => {
                warn!("page load failed at offset {offset}: {err}");
                self.resume_when_connected.store(true, Ordering::Release);
                return Err(err);
            }
        };

        self.resume_when_connected.store(false, Ordering::Release);
        self.total.store(page.total, Ordering::Release);
        self.loaded.store(offset + page.items.len(), Ordering::Release);
        debug!(
            "loaded page at offset {offset}: {} items of {}",
            page.items.len(),
            page.total
        );

        if self.started.swap(true, Ordering::AcqRel) {
            self.sender.append(page.items);
        } else {
            self.sender.replace_with(page.items);
        }
        Ok(())
    }

    /// Whether more pages remain.
    pub fn has_more(&self) -> bool {
        !self.started.load(Ordering::Acquire) || self.loaded.load(Ordering::Acquire) < self.total.load(Ordering::Acquire)
    }

    /// Items loaded so far.
    pub fn loaded(&self) -> usize {
        self.loaded.load(Ordering::Acquire)
    }

    /// Total item count reported by the last successful page.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    /// Whether a failed load is waiting for connectivity to return.
    pub fn is_awaiting_connectivity(&self) -> bool {
        self.resume_when_connected.load(Ordering::Acquire)
    }

    /// Retry the failed page after connectivity returned. No-op unless the
    /// resume flag is armed.
    pub fn resume(&self) -> Result<(), ListingError> {
        if !self.resume_when_connected.load(Ordering::Acquire) {
            return Ok(());
        }
        self.load_next_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command_queue;
    use crate::events::ChangeNotifier;
    use crate::reconciler::Reconciler;
    use std::sync::Mutex;

    struct ScriptedListing {
        pages: Mutex<Vec<Result<ListingPage, ListingError>>>,
    }

    impl ScriptedListing {
        fn new(pages: Vec<Result<ListingPage, ListingError>>) -> Self {
            Self {
                pages: Mutex::new(pages),
            }
        }
    }

    impl RemoteListing for ScriptedListing {
        fn list(&self, _container: &str, _offset: usize, _limit: usize) -> Result<ListingPage, ListingError> {
            self.pages.lock().unwrap().remove(0)
        }
    }

    fn page(ids: &[&str], total: usize) -> ListingPage {
        ListingPage {
            items: ids.iter().map(|id| RemoteItem::leaf(*id, format!("{id}.png"), 0, 1)).collect(),
            total,
        }
    }

    fn setup(pages: Vec<Result<ListingPage, ListingError>>) -> (PageLoader, Arc<Reconciler>, crate::commands::CommandPump) {
        let reconciler = Arc::new(Reconciler::new(Arc::new(ChangeNotifier::new())));
        let (sender, pump) = command_queue(reconciler.clone());
        let loader = PageLoader::new(Arc::new(ScriptedListing::new(pages)), sender, "root").with_page_size(2);
        (loader, reconciler, pump)
    }

    #[test]
    fn test_first_page_replaces_later_pages_append() {
        let (loader, reconciler, pump) = setup(vec![
            Ok(page(&["a", "b"], 3)),
            Ok(page(&["c"], 3)),
        ]);

        loader.load_next_page().unwrap();
        assert!(loader.has_more());
        loader.load_next_page().unwrap();
        assert!(!loader.has_more());

        pump.drain();
        let ids: Vec<String> = reconciler.items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(loader.loaded(), 3);
        assert_eq!(loader.total(), 3);
    }

    #[test]
    fn test_failure_arms_resume_flag() {
        let (loader, reconciler, pump) = setup(vec![
            Err(ListingError::Offline),
            Ok(page(&["a"], 1)),
        ]);

        assert!(loader.load_next_page().is_err());
        assert!(loader.is_awaiting_connectivity());
        pump.drain();
        assert!(reconciler.is_empty());

        loader.resume().unwrap();
        assert!(!loader.is_awaiting_connectivity());
        pump.drain();
        assert_eq!(reconciler.len(), 1);
    }

    #[test]
    fn test_resume_without_failure_is_noop() {
        let (loader, _, _) = setup(vec![]);
        loader.resume().unwrap();
    }
}
