//! Cloudshelf Thumbnail Library
//!
//! Cancellable thumbnail fetch pipeline with per-slot binding tracking.
//!
//! A display slot asks for a thumbnail when it becomes visible; the
//! pipeline answers from the disk cache when it can and from the remote
//! transport when it must, always on the bounded thumbnail worker pool.
//! Slots are recycled freely by the display layer: the binding tracker
//! guarantees that a superseded fetch never writes a stale image into a
//! reused slot.

pub mod binding;
pub mod icons;
pub mod pipeline;
pub mod request;

pub use binding::{BindingTicket, BindingTracker, SlotId};
pub use icons::{DefaultIconResolver, ExtensionIconResolver, PlaceholderIcon};
pub use pipeline::{
    DecodedThumb, FetchError, InlineExecutor, SlotPresenter, TaskHandle, TaskState,
    ThumbnailPipeline, ThumbnailTransport, UiExecutor,
};
pub use request::{RequestKey, ThumbnailVariant};
