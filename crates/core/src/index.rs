//! Positional index over an item sequence snapshot
//!
//! Maps stable item ids to their current position. The index is always
//! derived from a sequence snapshot and never persisted; it is only valid
//! for the snapshot it was built from.

use crate::item::RemoteItem;
use std::collections::HashMap;

/// Id → position lookup for one snapshot of the ordered sequence.
#[derive(Debug, Clone, Default)]
pub struct PositionalIndex {
    positions: HashMap<String, usize>,
}

impl PositionalIndex {
    /// Build an index from a sequence snapshot.
    ///
    /// Ids are unique within a sequence (reconciler invariant), so each id
    /// maps to exactly one position.
    pub fn build(items: &[RemoteItem]) -> Self {
        let positions = items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.id.clone(), pos))
            .collect();
        Self { positions }
    }

    /// Position of an id in the snapshot, or `None` if absent.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Whether the snapshot contains the id.
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::RemoteItem;

    fn items(ids: &[&str]) -> Vec<RemoteItem> {
        ids.iter().map(|id| RemoteItem::leaf(*id, format!("{id}.txt"), 0, 1)).collect()
    }

    #[test]
    fn test_positions_match_sequence_order() {
        let index = PositionalIndex::build(&items(&["a", "b", "c"]));
        assert_eq!(index.position_of("a"), Some(0));
        assert_eq!(index.position_of("c"), Some(2));
        assert_eq!(index.position_of("z"), None);
    }

    #[test]
    fn test_empty_snapshot() {
        let index = PositionalIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.position_of("a"), None);
    }
}
