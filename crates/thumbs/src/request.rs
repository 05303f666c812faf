//! Fetch request identity
//!
//! A fetch task is identified by the item it serves and the variant the
//! display slot wants. The on-disk cache is keyed by item version only; the
//! variant exists so a slot rebound from a list row to a grid cell for the
//! same item still supersedes the old task.

use cloudshelf_core::RemoteItem;

/// Which rendition of a thumbnail a slot wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailVariant {
    /// Small square icon next to a list row
    ListIcon,

    /// Larger preview filling a grid cell
    GridCell,
}

impl ThumbnailVariant {
    /// Longest edge of the rendition, in pixels.
    pub fn max_dimension(&self) -> u32 {
        match self {
            ThumbnailVariant::ListIcon => 64,
            ThumbnailVariant::GridCell => 256,
        }
    }
}

/// Identity of one fetch request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// Stable item id
    pub item_id: String,

    /// Requested rendition
    pub variant: ThumbnailVariant,
}

impl RequestKey {
    /// Key for an item snapshot and variant.
    pub fn new(item: &RemoteItem, variant: ThumbnailVariant) -> Self {
        Self {
            item_id: item.id.clone(),
            variant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_item_different_variant_differs() {
        let item = RemoteItem::leaf("a", "a.jpg", 1, 1);
        let list = RequestKey::new(&item, ThumbnailVariant::ListIcon);
        let grid = RequestKey::new(&item, ThumbnailVariant::GridCell);
        assert_ne!(list, grid);
        assert_eq!(list.item_id, grid.item_id);
    }
}
