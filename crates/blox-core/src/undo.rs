//! Per-workspace undo and redo stacks.
//!
//! Events with `record_undo` are pushed onto the undo stack as they are
//! delivered. Undoing pops the top event together with every consecutive
//! event from the same group, moves them to the redo stack, merges them in
//! replay order, and hands them back for replay.
//!
//! | Direction | Source stack | Destination | Replay |
//! |---|---|---|---|
//! | undo | undo | redo | backward, newest first |
//! | redo | redo | undo | forward, oldest first |

use crate::engine::filter;
use crate::event::Event;

#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    undo: Vec<Event>,
    redo: Vec<Event>,
    max_undo: usize,
}

impl UndoHistory {
    #[must_use]
    pub const fn new(max_undo: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_undo,
        }
    }

    /// Push a delivered event if it is undoable. Clears the redo stack.
    pub fn record(&mut self, event: &Event) {
        if !event.record_undo || self.max_undo == 0 {
            return;
        }
        self.undo.push(event.clone());
        self.redo.clear();
        if self.undo.len() > self.max_undo {
            let excess = self.undo.len() - self.max_undo;
            self.undo.drain(..excess);
        }
    }

    /// Re-merge the last contiguous group on the undo stack so a gesture
    /// recorded across several flushes undoes as one compact batch.
    pub fn squash_tail(&mut self) {
        let Some(group) = self.undo.last().map(|e| e.group.clone()) else {
            return;
        };
        if group.is_empty() {
            return;
        }
        let start = self
            .undo
            .iter()
            .rposition(|e| e.group != group)
            .map_or(0, |i| i + 1);
        if self.undo.len() - start < 2 {
            return;
        }
        let tail: Vec<Event> = self.undo.drain(start..).collect();
        self.undo.extend(filter(tail, true));
    }

    /// Pop the next batch for undo (`redo == false`) or redo, move it to the
    /// opposite stack, and return it merged and in replay order.
    pub fn take_batch(&mut self, redo: bool) -> Vec<Event> {
        let (source, target) = if redo {
            (&mut self.redo, &mut self.undo)
        } else {
            (&mut self.undo, &mut self.redo)
        };
        let Some(first) = source.pop() else {
            return Vec::new();
        };
        let group = first.group.clone();
        let mut batch = vec![first];
        while !group.is_empty() && source.last().is_some_and(|e| e.group == group) {
            if let Some(event) = source.pop() {
                batch.push(event);
            }
        }
        target.extend(batch.iter().cloned());
        filter(batch, redo)
    }

    /// Empty both stacks.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    #[must_use]
    pub fn undo_stack(&self) -> &[Event] {
        &self.undo
    }

    #[must_use]
    pub fn redo_stack(&self) -> &[Event] {
        &self.redo
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
