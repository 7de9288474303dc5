//! The event engine: fire queue, flush scheduling, groups and the
//! enable/disable counter.
//!
//! One engine is shared (`Rc<EventEngine>`) by every workspace that should
//! batch together. All methods take `&self`, so listeners and replayed events
//! can fire while a flush is delivering. Those fires land in the next queue
//! generation.
//!
//! Scheduling is cooperative: [`EventEngine::fire`] only marks a flush as
//! due. The host calls [`EventEngine::flush`] once per turn, or
//! [`EventEngine::run_until_idle`] to drain re-entrant generations.

pub mod filter;
pub mod ids;

pub use filter::filter;

use crate::config::EngineConfig;
use crate::event::{Event, EventPayload};
use crate::model::Workspaces;
use ids::IdGenerator;
use std::cell::{Cell, RefCell};
use tracing::{debug, warn};

/// Argument to [`EventEngine::set_group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupUpdate {
    /// Open a fresh group with a generated id.
    Open,
    /// Close the current group.
    Close,
    /// Join an existing group.
    Join(String),
}

impl From<bool> for GroupUpdate {
    fn from(open: bool) -> Self {
        if open { Self::Open } else { Self::Close }
    }
}

impl From<&str> for GroupUpdate {
    fn from(id: &str) -> Self {
        if id.is_empty() {
            Self::Close
        } else {
            Self::Join(id.to_string())
        }
    }
}

impl From<String> for GroupUpdate {
    fn from(id: String) -> Self {
        if id.is_empty() { Self::Close } else { Self::Join(id) }
    }
}

/// Counts from one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub generation: u64,
    pub fired: usize,
    pub delivered: usize,
}

#[derive(Debug)]
pub struct EventEngine {
    queue: RefCell<Vec<Event>>,
    generation: Cell<u64>,
    flush_scheduled: Cell<bool>,
    group: RefCell<String>,
    disabled: Cell<u32>,
    record_undo: Cell<bool>,
    ids: RefCell<IdGenerator>,
    config: EngineConfig,
}

impl Default for EventEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EventEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let ids = IdGenerator::from_entropy(config.group_id_len);
        Self::with_ids(config, ids)
    }

    /// Engine whose generated ids are reproducible.
    #[must_use]
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        let ids = IdGenerator::seeded(seed, config.group_id_len);
        Self::with_ids(config, ids)
    }

    fn with_ids(config: EngineConfig, ids: IdGenerator) -> Self {
        Self {
            queue: RefCell::new(Vec::new()),
            generation: Cell::new(0),
            flush_scheduled: Cell::new(false),
            group: RefCell::new(String::new()),
            disabled: Cell::new(0),
            record_undo: Cell::new(true),
            ids: RefCell::new(ids),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh random id.
    pub fn new_id(&self) -> String {
        self.ids.borrow_mut().next_id()
    }

    /// Stamp `payload` with the current group and undo flag.
    #[must_use]
    pub fn bind(&self, workspace_id: &str, payload: EventPayload) -> Event {
        let mut event = Event::new(workspace_id, payload);
        event.group = self.group();
        event.record_undo = event.record_undo && self.record_undo();
        event
    }

    // -----------------------------------------------------------------------
    // Queue
    // -----------------------------------------------------------------------

    /// Queue `event` for the next flush. Dropped while disabled.
    pub fn fire(&self, event: Event) {
        if !self.is_enabled() {
            return;
        }
        let mut queue = self.queue.borrow_mut();
        if queue.is_empty() {
            self.flush_scheduled.set(true);
        }
        queue.push(event);
    }

    #[must_use]
    pub fn is_flush_scheduled(&self) -> bool {
        self.flush_scheduled.get()
    }

    /// Events fired since the last flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Number of flushes that have taken a queue generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Take the current queue generation, merge it, and deliver each
    /// surviving event to its workspace's listeners.
    pub fn flush(&self, workspaces: &mut Workspaces) -> FlushStats {
        self.flush_scheduled.set(false);
        let batch = self.queue.take();
        let generation = self.generation.get();
        if batch.is_empty() {
            return FlushStats {
                generation,
                ..FlushStats::default()
            };
        }
        self.generation.set(generation + 1);

        let fired = batch.len();
        let events = filter(batch, true);
        let mut delivered = 0;
        let mut touched: Vec<String> = Vec::new();

        for event in &events {
            if event.workspace_id.is_empty() {
                continue;
            }
            let Some(ws) = workspaces.get_by_id_mut(&event.workspace_id) else {
                debug!(workspace_id = %event.workspace_id, kind = event.kind_str(), "no workspace for event");
                continue;
            };
            ws.fire_change_listener(event);
            delivered += 1;
            if !touched.contains(&event.workspace_id) {
                touched.push(event.workspace_id.clone());
            }
        }

        for id in &touched {
            if let Some(ws) = workspaces.get_by_id_mut(id) {
                ws.squash_undo_tail();
            }
        }

        debug!(generation, fired, delivered, "flushed event queue");
        FlushStats {
            generation,
            fired,
            delivered,
        }
    }

    /// Flush until no further flush is scheduled, bounded by
    /// `max_flush_rounds`. Returns the number of flushes run.
    pub fn run_until_idle(&self, workspaces: &mut Workspaces) -> usize {
        let mut rounds = 0;
        while self.flush_scheduled.get() {
            if rounds >= self.config.max_flush_rounds {
                warn!(
                    rounds,
                    pending = self.pending(),
                    "flush did not settle; listeners keep firing"
                );
                break;
            }
            self.flush(workspaces);
            rounds += 1;
        }
        rounds
    }

    /// Mark every queued event as not undoable.
    pub fn clear_pending_undo(&self) {
        for event in self.queue.borrow_mut().iter_mut() {
            event.record_undo = false;
        }
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    pub fn set_group(&self, update: impl Into<GroupUpdate>) {
        let next = match update.into() {
            GroupUpdate::Open => self.new_id(),
            GroupUpdate::Close => String::new(),
            GroupUpdate::Join(id) => id,
        };
        debug!(group = %next, "set event group");
        *self.group.borrow_mut() = next;
    }

    /// Current group id, `""` when none is open.
    #[must_use]
    pub fn group(&self) -> String {
        self.group.borrow().clone()
    }

    // -----------------------------------------------------------------------
    // Enable / disable
    // -----------------------------------------------------------------------

    pub fn disable(&self) {
        self.disabled.set(self.disabled.get() + 1);
    }

    pub fn enable(&self) {
        match self.disabled.get().checked_sub(1) {
            Some(depth) => self.disabled.set(depth),
            None => warn!("enable() called without a matching disable()"),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.disabled.get() == 0
    }

    // -----------------------------------------------------------------------
    // Undo recording
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn record_undo(&self) -> bool {
        self.record_undo.get()
    }

    pub fn set_record_undo(&self, record: bool) {
        self.record_undo.set(record);
    }

    /// Turn undo recording off until the guard drops, then restore the
    /// previous setting.
    #[must_use]
    pub fn suppress_undo(&self) -> UndoSuppressed<'_> {
        let previous = self.record_undo.replace(false);
        UndoSuppressed {
            engine: self,
            previous,
        }
    }
}

/// Guard returned by [`EventEngine::suppress_undo`].
#[derive(Debug)]
pub struct UndoSuppressed<'a> {
    engine: &'a EventEngine,
    previous: bool,
}

impl Drop for UndoSuppressed<'_> {
    fn drop(&mut self) {
        self.engine.record_undo.set(self.previous);
    }
}
