//! Cloudshelf Core Library
//!
//! Item model and list reconciliation for the remote file list.
//!
//! The reconciler owns the canonical ordered item sequence and turns remote
//! listing updates into the cheapest correct plan of change events for the
//! display layer. Producers on other threads queue mutations through the
//! single-writer command queue; the paginated loader feeds listing pages
//! into that queue.

pub mod commands;
pub mod events;
pub mod index;
pub mod item;
pub mod listing;
pub mod reconciler;

pub use commands::{command_queue, CommandPump, CommandSender, ListCommand};
pub use events::{ChangeEvent, ChangeListener, ChangeNotifier, RecordingListener};
pub use index::PositionalIndex;
pub use item::{Fingerprint, ItemKind, RemoteItem, SyntheticKind};
pub use listing::{ListingError, ListingPage, PageLoader, RemoteListing};
pub use reconciler::{Reconciler, ReconcilerConfig};
