//! Item model for the remote listing
//!
//! Items are immutable value snapshots of remote entries. A changed entry is
//! represented by a *new* `RemoteItem` carrying the same id, never by mutating
//! an existing one, so value equality doubles as change detection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Synthetic row kinds shown by incrementally loading lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntheticKind {
    /// Spinner row appended while the next page is in flight.
    LoadingMore,

    /// Tap-to-retry row shown after a page fetch failed.
    Retry,
}

/// What a listed item is, with the payload each shape needs.
///
/// Call sites match exhaustively; there is no catch-all "other" shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// A folder. The collaboration flag participates in the fingerprint
    /// because a folder's icon changes when it becomes shared.
    Container {
        /// Whether the folder is shared with collaborators
        shared: bool,
    },

    /// A regular file.
    Leaf {
        /// Lowercased file extension, if the name has one
        extension: Option<String>,
    },

    /// A non-data row injected by the list itself (load-more spinner,
    /// retry affordance). Synthetic rows never get thumbnails.
    SyntheticRow(SyntheticKind),
}

impl ItemKind {
    /// Leaf kind derived from a display name's extension.
    pub fn leaf_from_name(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty());
        ItemKind::Leaf { extension }
    }

    /// Whether this kind can ever have a thumbnail.
    pub fn supports_thumbnail(&self) -> bool {
        match self {
            ItemKind::Container { .. } => false,
            ItemKind::Leaf { .. } => true,
            ItemKind::SyntheticRow(_) => false,
        }
    }
}

/// An immutable snapshot of one remote entry.
///
/// Identity is the `id` string, unique within a listing. Everything else is
/// version data: two snapshots with the same id but different fields describe
/// two versions of the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Stable remote identifier, unique within a list
    pub id: String,

    /// Display name
    pub name: String,

    /// Last modification time in epoch milliseconds
    pub modified_at: u64,

    /// Content size in bytes (zero for containers)
    pub size: u64,

    /// Item shape and shape-specific payload
    pub kind: ItemKind,
}

impl RemoteItem {
    /// Create a leaf (file) snapshot, deriving the extension from the name.
    pub fn leaf(id: impl Into<String>, name: impl Into<String>, modified_at: u64, size: u64) -> Self {
        let name = name.into();
        let kind = ItemKind::leaf_from_name(&name);
        Self {
            id: id.into(),
            name,
            modified_at,
            size,
            kind,
        }
    }

    /// Create a container (folder) snapshot.
    pub fn container(id: impl Into<String>, name: impl Into<String>, modified_at: u64, shared: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            modified_at,
            size: 0,
            kind: ItemKind::Container { shared },
        }
    }

    /// Create a synthetic row. Synthetic rows use their kind tag as id so
    /// they stay unique against remote ids.
    pub fn synthetic(kind: SyntheticKind) -> Self {
        let id = match kind {
            SyntheticKind::LoadingMore => "#loading-more",
            SyntheticKind::Retry => "#retry",
        };
        Self {
            id: id.to_string(),
            name: String::new(),
            modified_at: 0,
            size: 0,
            kind: ItemKind::SyntheticRow(kind),
        }
    }

    /// Content fingerprint of this snapshot.
    pub fn fingerprint(&self) -> Fingerprint {
        let shared = matches!(self.kind, ItemKind::Container { shared: true });
        Fingerprint {
            modified_at: self.modified_at,
            size: self.size,
            shared,
        }
    }
}

/// Cheap content-identifying value for an item version.
///
/// Two snapshots of the same entry compare equal here exactly when no
/// thumbnail-relevant content changed. The rendered form is filesystem-safe
/// and keys the on-disk thumbnail cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Modification time in epoch milliseconds
    pub modified_at: u64,

    /// Content size in bytes
    pub size: u64,

    /// Collaboration flag (containers only, always false for leaves)
    pub shared: bool,
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shared {
            write!(f, "{}-{}-s", self.modified_at, self.size)
        } else {
            write!(f, "{}-{}", self.modified_at, self.size)
        }
    }
}
