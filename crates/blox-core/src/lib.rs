//! blox-core library: events, the dispatch engine, and undo history for
//! block-based documents.
//!
//! # Conventions
//!
//! - **Errors**: event decoding and replay return [`EventError`]; listeners
//!   and config loading use `anyhow::Result`.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Ownership**: one `Rc<EventEngine>` is shared by the workspaces that
//!   batch together; workspaces live in a [`Workspaces`] registry the engine
//!   delivers through.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod model;
pub mod orphans;
pub mod undo;

pub use config::EngineConfig;
pub use engine::{EventEngine, FlushStats, GroupUpdate};
pub use error::{ErrorCode, EventError};
pub use event::{Event, EventKind, EventPayload, EventRegistry};
pub use model::{ChangeListener, ListenerId, Workspace, WorkspaceState, Workspaces};
pub use undo::UndoHistory;
