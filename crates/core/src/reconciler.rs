//! Reconciler for the canonical ordered item sequence
//!
//! Owns the displayed sequence and turns every mutation into the cheapest
//! correct plan of change events. Small deltas become fine-grained
//! insert/remove events so the display layer can animate them; anything
//! bigger falls back to a full reset. A full diff algorithm is deliberately
//! avoided in favor of these bounded heuristics.
//!
//! Concurrency: all mutation happens inside an exclusive writer section and
//! all reads inside a shared reader section. No I/O and no event emission
//! happen while a lock is held; events are collected under the write lock
//! and emitted after release.

use crate::events::{ChangeEvent, ChangeNotifier};
use crate::index::PositionalIndex;
use crate::item::RemoteItem;
use log::debug;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Delta thresholds for incremental change plans.
///
/// Fine-grained events pay off only for small deltas; past these bounds the
/// bookkeeping and animation cost exceeds a flat re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Maximum insertion count still worth per-position insert events
    pub insert_threshold: usize,

    /// Maximum removal count still worth per-index remove events
    pub remove_threshold: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            insert_threshold: 10,
            remove_threshold: 5,
        }
    }
}

impl ReconcilerConfig {
    /// Create a configuration with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the insertion threshold.
    pub fn with_insert_threshold(mut self, threshold: usize) -> Self {
        self.insert_threshold = threshold;
        self
    }

    /// Set the removal threshold.
    pub fn with_remove_threshold(mut self, threshold: usize) -> Self {
        self.remove_threshold = threshold;
        self
    }
}

/// Change plan decided by [`Reconciler::replace_with`].
#[derive(Debug, PartialEq, Eq)]
enum ReplacePlan {
    /// Same ids, same order, same values: nothing to do
    Noop,

    /// Insert-only delta within threshold; positions in the new sequence
    Insertions(Vec<usize>),

    /// Remove-only delta within threshold; indices in the old sequence
    Removals(Vec<usize>),

    /// Mixed, over-threshold, from-empty, or to-empty replace
    Reset,
}

/// Owner of the canonical ordered item sequence.
///
/// Invariant: ids are unique within the sequence. External reads always get
/// a defensive copy; the sequence itself never escapes the lock.
pub struct Reconciler {
    items: RwLock<Vec<RemoteItem>>,
    notifier: Arc<ChangeNotifier>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create an empty reconciler with default thresholds.
    pub fn new(notifier: Arc<ChangeNotifier>) -> Self {
        Self::with_config(notifier, ReconcilerConfig::default())
    }

    /// Create an empty reconciler with custom thresholds.
    pub fn with_config(notifier: Arc<ChangeNotifier>, config: ReconcilerConfig) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            notifier,
            config,
        }
    }

    /// Replace the displayed sequence with a fresh remote listing.
    ///
    /// Decides, in order of preference: adopt wholesale when currently empty
    /// (one reset, no stale state to preserve); no-op when nothing changed;
    /// per-position insert events for a small insert-only delta; per-index
    /// remove events for a small remove-only delta; otherwise one full
    /// reset. Idempotent with respect to the final displayed state.
    pub fn replace_with(&self, new_items: Vec<RemoteItem>) {
        let new_items = dedupe_by_id(new_items);
        let mut events = Vec::new();

        {
            let mut items = self.items.write().unwrap();

            if items.is_empty() {
                if new_items.is_empty() {
                    // Replacing empty with empty changes nothing; emitting a
                    // reset here would break replace_with idempotence.
                    return;
                }
                debug!("replace_with: adopting {} items into empty list", new_items.len());
                *items = new_items;
                events.push(ChangeEvent::Reset);
            } else {
                match self.plan_replace(&items, &new_items) {
                    ReplacePlan::Noop => {
                        debug!("replace_with: no change, skipping notification");
                        return;
                    }
                    ReplacePlan::Insertions(positions) => {
                        debug!("replace_with: {} insertions", positions.len());
                        *items = new_items;
                        events.extend(positions.into_iter().map(ChangeEvent::Inserted));
                        events.push(ChangeEvent::RangeChanged {
                            start: 0,
                            count: items.len(),
                        });
                    }
                    ReplacePlan::Removals(old_indices) => {
                        debug!("replace_with: {} removals", old_indices.len());
                        *items = new_items;
                        // Highest index first so earlier events do not shift
                        // the positions named by later ones.
                        events.extend(old_indices.into_iter().rev().map(ChangeEvent::Removed));
                        events.push(ChangeEvent::RangeChanged {
                            start: 0,
                            count: items.len(),
                        });
                    }
                    ReplacePlan::Reset => {
                        debug!("replace_with: full reset ({} -> {} items)", items.len(), new_items.len());
                        *items = new_items;
                        events.push(ChangeEvent::Reset);
                    }
                }
            }
        }

        self.notifier.emit_all(&events);
    }

    /// Append items to the tail of the sequence.
    ///
    /// No-op on empty input. Emits a single full reset rather than tracking
    /// incremental appends: appends come from paginated loads, where a flat
    /// re-render of a growing list is cheap next to the network round trip.
    pub fn append(&self, new_items: Vec<RemoteItem>) {
        if new_items.is_empty() {
            return;
        }

        let appended = {
            let mut items = self.items.write().unwrap();
            let existing: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
            let mut fresh: Vec<RemoteItem> = Vec::with_capacity(new_items.len());
            let mut seen: HashSet<String> = HashSet::new();
            for item in new_items {
                if existing.contains(item.id.as_str()) || !seen.insert(item.id.clone()) {
                    debug!("append: dropping duplicate id {}", item.id);
                    continue;
                }
                fresh.push(item);
            }
            if fresh.is_empty() {
                false
            } else {
                items.extend(fresh);
                true
            }
        };

        if appended {
            self.notifier.emit(ChangeEvent::Reset);
        }
    }

    /// Remove every entry whose id is in `ids`, preserving survivor order.
    ///
    /// No-op when none of the ids are present. Emits per-index remove events
    /// (highest index first) when the removed count is within the removal
    /// threshold, otherwise a single range-changed over the survivors.
    pub fn remove_by_ids(&self, ids: &HashSet<String>) {
        let mut events = Vec::new();

        {
            let mut items = self.items.write().unwrap();
            let removed_indices: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, item)| ids.contains(&item.id))
                .map(|(idx, _)| idx)
                .collect();

            if removed_indices.is_empty() {
                return;
            }

            items.retain(|item| !ids.contains(&item.id));
            debug!("remove_by_ids: removed {} entries, {} remain", removed_indices.len(), items.len());

            if removed_indices.len() <= self.config.remove_threshold {
                events.extend(removed_indices.into_iter().rev().map(ChangeEvent::Removed));
            } else {
                events.push(ChangeEvent::RangeChanged {
                    start: 0,
                    count: items.len(),
                });
            }
        }

        self.notifier.emit_all(&events);
    }

    /// Replace the entry with a matching id in place (same position).
    ///
    /// Emits a single item-changed event; no-op when the id is absent or the
    /// stored snapshot is already value-equal.
    pub fn update_one(&self, item: RemoteItem) {
        let event = {
            let mut items = self.items.write().unwrap();
            match items.iter().position(|existing| existing.id == item.id) {
                Some(pos) => {
                    if items[pos] == item {
                        return;
                    }
                    items[pos] = item;
                    ChangeEvent::ItemChanged(pos)
                }
                None => return,
            }
        };

        self.notifier.emit(event);
    }

    /// Current position of an id, built from a fresh positional index.
    ///
    /// May reflect a snapshot that a concurrent mutation is about to
    /// replace; callers must tolerate eventual consistency.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        let items = self.items.read().unwrap();
        PositionalIndex::build(&items).position_of(id)
    }

    /// Defensive copy of the current sequence.
    pub fn items(&self) -> Vec<RemoteItem> {
        self.items.read().unwrap().clone()
    }

    /// Number of displayed items.
    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    /// Decide the cheapest correct plan for a non-empty current sequence.
    fn plan_replace(&self, current: &[RemoteItem], new_items: &[RemoteItem]) -> ReplacePlan {
        if new_items.is_empty() {
            // Clearing a populated list is always a reset.
            return ReplacePlan::Reset;
        }

        let current_index = PositionalIndex::build(current);
        let new_index = PositionalIndex::build(new_items);

        let removed: Vec<usize> = current
            .iter()
            .enumerate()
            .filter(|(_, item)| !new_index.contains(&item.id))
            .map(|(idx, _)| idx)
            .collect();
        let inserted: Vec<usize> = new_items
            .iter()
            .enumerate()
            .filter(|(_, item)| !current_index.contains(&item.id))
            .map(|(pos, _)| pos)
            .collect();

        // Retained entries must keep their relative order and their values
        // for an incremental plan to be expressible as pure inserts or pure
        // removes; a moved or re-valued survivor forces a reset.
        let retained_current: Vec<&RemoteItem> = current
            .iter()
            .filter(|item| new_index.contains(&item.id))
            .collect();
        let retained_new: Vec<&RemoteItem> = new_items
            .iter()
            .filter(|item| current_index.contains(&item.id))
            .collect();
        let retained_intact = retained_current == retained_new;

        if removed.is_empty() && inserted.is_empty() && retained_intact {
            ReplacePlan::Noop
        } else if removed.is_empty()
            && retained_intact
            && !inserted.is_empty()
            && inserted.len() <= self.config.insert_threshold
        {
            ReplacePlan::Insertions(inserted)
        } else if inserted.is_empty()
            && retained_intact
            && !removed.is_empty()
            && removed.len() <= self.config.remove_threshold
        {
            ReplacePlan::Removals(removed)
        } else {
            ReplacePlan::Reset
        }
    }
}

/// Drop later duplicates of any repeated id, preserving first occurrences.
fn dedupe_by_id(items: Vec<RemoteItem>) -> Vec<RemoteItem> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.id.clone()) {
            out.push(item);
        } else {
            debug!("dropping duplicate id {} from incoming listing", item.id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingListener;

    fn leaf(id: &str) -> RemoteItem {
        RemoteItem::leaf(id, format!("{id}.jpg"), 100, 1)
    }

    fn leaves(ids: &[&str]) -> Vec<RemoteItem> {
        ids.iter().map(|id| leaf(id)).collect()
    }

    fn setup() -> (Reconciler, Arc<RecordingListener>) {
        let notifier = Arc::new(ChangeNotifier::new());
        let recorder = Arc::new(RecordingListener::new());
        notifier.register(recorder.clone());
        (Reconciler::new(notifier), recorder)
    }

    fn ids(reconciler: &Reconciler) -> Vec<String> {
        reconciler.items().into_iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_adopt_into_empty_emits_single_reset() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b", "c"]));

        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);
        assert_eq!(ids(&reconciler), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_replace_with_is_idempotent() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b"]));
        recorder.clear();

        reconciler.replace_with(leaves(&["a", "b"]));
        assert_eq!(recorder.events(), vec![]);
    }

    #[test]
    fn test_replace_empty_with_empty_is_noop() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(Vec::new());
        reconciler.replace_with(Vec::new());
        assert_eq!(recorder.events(), vec![]);
    }

    #[test]
    fn test_two_insertions_emit_inserts_then_range() {
        // [A,B,C] -> [A,B,C,D,E]
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b", "c"]));
        recorder.clear();

        reconciler.replace_with(leaves(&["a", "b", "c", "d", "e"]));
        assert_eq!(
            recorder.events(),
            vec![
                ChangeEvent::Inserted(3),
                ChangeEvent::Inserted(4),
                ChangeEvent::RangeChanged { start: 0, count: 5 },
            ]
        );
    }

    #[test]
    fn test_insertions_in_middle_emit_new_positions() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "c"]));
        recorder.clear();

        reconciler.replace_with(leaves(&["a", "b", "c"]));
        assert_eq!(
            recorder.events(),
            vec![
                ChangeEvent::Inserted(1),
                ChangeEvent::RangeChanged { start: 0, count: 3 },
            ]
        );
    }

    #[test]
    fn test_removals_emit_highest_index_first() {
        // [A,B,C,D,E,F,G] -> [A,C,E,G] removes old indices 1, 3, 5.
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b", "c", "d", "e", "f", "g"]));
        recorder.clear();

        reconciler.replace_with(leaves(&["a", "c", "e", "g"]));
        assert_eq!(
            recorder.events(),
            vec![
                ChangeEvent::Removed(5),
                ChangeEvent::Removed(3),
                ChangeEvent::Removed(1),
                ChangeEvent::RangeChanged { start: 0, count: 4 },
            ]
        );
    }

    #[test]
    fn test_mixed_delta_is_single_reset() {
        // [A,B] -> [A,C,D,E,X,Y,Z]: one removal plus five insertions.
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b"]));
        recorder.clear();

        reconciler.replace_with(leaves(&["a", "c", "d", "e", "x", "y", "z"]));
        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);
        assert_eq!(reconciler.len(), 7);
    }

    #[test]
    fn test_over_threshold_insertions_reset() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a"]));
        recorder.clear();

        let mut next = vec!["a".to_string()];
        next.extend((0..11).map(|n| format!("n{n}")));
        let next: Vec<&str> = next.iter().map(|s| s.as_str()).collect();
        reconciler.replace_with(leaves(&next));

        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);
    }

    #[test]
    fn test_over_threshold_removals_reset() {
        let all: Vec<String> = (0..10).map(|n| format!("n{n}")).collect();
        let all: Vec<&str> = all.iter().map(|s| s.as_str()).collect();

        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&all));
        recorder.clear();

        // Six removals exceeds the default threshold of five.
        reconciler.replace_with(leaves(&all[..4]));
        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);
    }

    #[test]
    fn test_reordered_survivors_force_reset() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b"]));
        recorder.clear();

        reconciler.replace_with(leaves(&["b", "a", "c"]));
        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);
    }

    #[test]
    fn test_revalued_survivor_forces_reset() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b"]));
        recorder.clear();

        // Same ids and order, but "a" carries a new modification time, and
        // "c" is inserted; not expressible as pure insertions.
        let mut next = leaves(&["a", "b", "c"]);
        next[0].modified_at = 999;
        reconciler.replace_with(next);
        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);
    }

    #[test]
    fn test_clearing_populated_list_resets() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b"]));
        recorder.clear();

        reconciler.replace_with(Vec::new());
        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);
        assert!(reconciler.is_empty());
    }

    #[test]
    fn test_append_emits_reset_and_skips_empty() {
        let (reconciler, recorder) = setup();
        reconciler.append(Vec::new());
        assert_eq!(recorder.events(), vec![]);

        reconciler.append(leaves(&["a", "b"]));
        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);

        recorder.clear();
        reconciler.append(leaves(&["b", "c"]));
        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);
        assert_eq!(ids(&reconciler), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_by_ids_small_delta() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b", "c", "d"]));
        recorder.clear();

        let ids_to_remove: HashSet<String> = ["b", "d"].iter().map(|s| s.to_string()).collect();
        reconciler.remove_by_ids(&ids_to_remove);

        assert_eq!(
            recorder.events(),
            vec![ChangeEvent::Removed(3), ChangeEvent::Removed(1)]
        );
        assert_eq!(ids(&reconciler), vec!["a", "c"]);
    }

    #[test]
    fn test_remove_by_ids_large_delta_range_changed() {
        let all: Vec<String> = (0..10).map(|n| format!("n{n}")).collect();
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&all.iter().map(|s| s.as_str()).collect::<Vec<_>>()));
        recorder.clear();

        let ids_to_remove: HashSet<String> = all[..6].iter().cloned().collect();
        reconciler.remove_by_ids(&ids_to_remove);

        assert_eq!(
            recorder.events(),
            vec![ChangeEvent::RangeChanged { start: 0, count: 4 }]
        );
    }

    #[test]
    fn test_remove_by_ids_absent_is_noop() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a"]));
        recorder.clear();

        let ids_to_remove: HashSet<String> = ["zz"].iter().map(|s| s.to_string()).collect();
        reconciler.remove_by_ids(&ids_to_remove);
        assert_eq!(recorder.events(), vec![]);
    }

    #[test]
    fn test_update_one_emits_item_changed_in_place() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a", "b", "c"]));
        recorder.clear();

        let mut updated = leaf("b");
        updated.modified_at = 999;
        reconciler.update_one(updated.clone());

        assert_eq!(recorder.events(), vec![ChangeEvent::ItemChanged(1)]);
        assert_eq!(reconciler.items()[1], updated);
    }

    #[test]
    fn test_update_one_absent_or_unchanged_is_noop() {
        let (reconciler, recorder) = setup();
        reconciler.replace_with(leaves(&["a"]));
        recorder.clear();

        reconciler.update_one(leaf("zz"));
        reconciler.update_one(leaf("a"));
        assert_eq!(recorder.events(), vec![]);
    }

    #[test]
    fn test_ids_stay_unique_after_every_operation() {
        let (reconciler, _) = setup();
        reconciler.replace_with(vec![leaf("a"), leaf("a"), leaf("b")]);
        reconciler.append(vec![leaf("b"), leaf("c"), leaf("c")]);

        let seen = ids(&reconciler);
        let unique: HashSet<&String> = seen.iter().collect();
        assert_eq!(seen.len(), unique.len());
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_index_of_reflects_current_snapshot() {
        let (reconciler, _) = setup();
        reconciler.replace_with(leaves(&["a", "b", "c"]));
        assert_eq!(reconciler.index_of("b"), Some(1));
        assert_eq!(reconciler.index_of("zz"), None);

        let ids_to_remove: HashSet<String> = ["a"].iter().map(|s| s.to_string()).collect();
        reconciler.remove_by_ids(&ids_to_remove);
        assert_eq!(reconciler.index_of("b"), Some(0));
    }

    #[test]
    fn test_items_returns_defensive_copy() {
        let (reconciler, _) = setup();
        reconciler.replace_with(leaves(&["a"]));

        let mut copy = reconciler.items();
        copy.clear();
        assert_eq!(reconciler.len(), 1);
    }

    #[test]
    fn test_custom_thresholds_respected() {
        let notifier = Arc::new(ChangeNotifier::new());
        let recorder = Arc::new(RecordingListener::new());
        notifier.register(recorder.clone());
        let config = ReconcilerConfig::new().with_insert_threshold(1);
        let reconciler = Reconciler::with_config(notifier, config);

        reconciler.replace_with(leaves(&["a"]));
        recorder.clear();

        reconciler.replace_with(leaves(&["a", "b", "c"]));
        assert_eq!(recorder.events(), vec![ChangeEvent::Reset]);
    }
}
