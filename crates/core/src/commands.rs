//! Single-writer command queue for sequence mutations
//!
//! Producers (network callbacks, worker threads) never call the reconciler's
//! mutating operations directly; they send commands through a clonable
//! sender, and the one execution context that owns display state drains the
//! queue between layout passes. This serializes every mutation onto a single
//! logical thread of control, and concurrent replaces resolve as
//! last-submitted-wins. Commands are never dropped.

use crate::item::RemoteItem;
use crate::reconciler::Reconciler;
use log::debug;
use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One deferred mutation of the displayed sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    /// Replace the whole sequence
    ReplaceWith(Vec<RemoteItem>),

    /// Append a page of items to the tail
    Append(Vec<RemoteItem>),

    /// Remove entries by id
    RemoveByIds(HashSet<String>),

    /// Replace one entry in place
    UpdateOne(RemoteItem),
}

/// Producer half of the command queue. Cheap to clone, safe to hand to any
/// thread.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<ListCommand>,
}

impl CommandSender {
    /// Queue a full-sequence replace.
    pub fn replace_with(&self, items: Vec<RemoteItem>) {
        self.send(ListCommand::ReplaceWith(items));
    }

    /// Queue a tail append.
    pub fn append(&self, items: Vec<RemoteItem>) {
        self.send(ListCommand::Append(items));
    }

    /// Queue a removal by ids.
    pub fn remove_by_ids(&self, ids: HashSet<String>) {
        self.send(ListCommand::RemoveByIds(ids));
    }

    /// Queue an in-place single-item update.
    pub fn update_one(&self, item: RemoteItem) {
        self.send(ListCommand::UpdateOne(item));
    }

    /// Queue an arbitrary command.
    pub fn send(&self, command: ListCommand) {
        // The receiver lives as long as the pump; a send after teardown has
        // nowhere to go and is intentionally ignored.
        if self.tx.send(command).is_err() {
            debug!("command queue closed, dropping late command");
        }
    }
}

/// Consumer half of the command queue.
///
/// Owned by the single execution context that also owns display state. Not
/// clonable and not `Sync`: draining from anywhere else would reintroduce
/// the multi-writer problem the queue exists to solve.
pub struct CommandPump {
    rx: Receiver<ListCommand>,
    reconciler: Arc<Reconciler>,
}

impl CommandPump {
    /// Apply every queued command in arrival order. Returns the number of
    /// commands applied. Call once per tick, between layout passes.
    pub fn drain(&self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.rx.try_recv() {
            self.apply(command);
            applied += 1;
        }
        applied
    }

    /// Drain continuously until `deadline` elapses, sleeping `poll_interval`
    /// between empty polls. Test and headless-host support; UI hosts call
    /// [`CommandPump::drain`] from their own tick instead.
    pub fn run_for(&self, deadline: Duration, poll_interval: Duration) -> usize {
        let start = Instant::now();
        let mut applied = 0;
        while start.elapsed() < deadline {
            let n = self.drain();
            applied += n;
            if n == 0 {
                std::thread::sleep(poll_interval);
            }
        }
        applied
    }

    fn apply(&self, command: ListCommand) {
        match command {
            ListCommand::ReplaceWith(items) => self.reconciler.replace_with(items),
            ListCommand::Append(items) => self.reconciler.append(items),
            ListCommand::RemoveByIds(ids) => self.reconciler.remove_by_ids(&ids),
            ListCommand::UpdateOne(item) => self.reconciler.update_one(item),
        }
    }
}

/// Build a connected sender/pump pair around a reconciler.
pub fn command_queue(reconciler: Arc<Reconciler>) -> (CommandSender, CommandPump) {
    let (tx, rx) = channel();
    (CommandSender { tx }, CommandPump { rx, reconciler })
}
