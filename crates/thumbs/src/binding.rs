//! Target binding tracker
//!
//! Display slots are recycled: during scrolling the same slot is rebound to
//! different logical items many times. A fetch task therefore never owns
//! its slot; it holds a ticket (slot id plus generation) and must verify
//! the ticket is still current before delivering. Rebinding a slot bumps
//! the generation and cancels the superseded task's token, so at most one
//! task is ever live per slot and a late result can cheaply detect that its
//! slot has moved on — even if the slot object now shows a different row.

use crate::request::RequestKey;
use cloudshelf_scheduler::CancellationToken;
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Identity of a reusable display slot.
pub type SlotId = usize;

/// Non-owning proof that a task was bound to a slot at some generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingTicket {
    slot: SlotId,
    generation: u64,
}

impl BindingTicket {
    /// The slot this ticket refers to.
    pub fn slot(&self) -> SlotId {
        self.slot
    }
}

struct BindingEntry {
    key: RequestKey,
    generation: u64,
    token: CancellationToken,
}

/// At-most-one live binding per display slot.
#[derive(Default)]
pub struct BindingTracker {
    entries: Mutex<HashMap<SlotId, BindingEntry>>,
    // Process-monotonic, so a stale ticket can never match a recycled slot.
    next_generation: AtomicU64,
}

impl BindingTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a slot to a new request, superseding any previous binding.
    ///
    /// The superseded task's token is cancelled; its late completion will
    /// fail ticket verification and be discarded. Returns the new ticket
    /// and the fresh task's cancellation token.
    pub fn bind(&self, slot: SlotId, key: RequestKey) -> (BindingTicket, CancellationToken) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        let entry = BindingEntry {
            key,
            generation,
            token: token.clone(),
        };

        if let Some(previous) = self.entries.lock().unwrap().insert(slot, entry) {
            debug!("slot {slot} rebound, superseding task for {:?}", previous.key.item_id);
            previous.token.cancel();
        }

        (BindingTicket { slot, generation }, token)
    }

    /// Whether a ticket still names the slot's live binding.
    pub fn is_current(&self, ticket: &BindingTicket) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(&ticket.slot)
            .map(|entry| entry.generation == ticket.generation)
            .unwrap_or(false)
    }

    /// The request key currently owned by a slot, if any.
    pub fn current_key(&self, slot: SlotId) -> Option<RequestKey> {
        self.entries.lock().unwrap().get(&slot).map(|entry| entry.key.clone())
    }

    /// Drop a slot's binding and cancel its task. Called when the display
    /// layer recycles the slot.
    pub fn release(&self, slot: SlotId) {
        if let Some(entry) = self.entries.lock().unwrap().remove(&slot) {
            debug!("slot {slot} released, cancelling task for {:?}", entry.key.item_id);
            entry.token.cancel();
        }
    }

    /// Number of live bindings.
    pub fn live_bindings(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
