//! Filesystem change detection and dispatch.
//!
//! [`FileWatcher`] produces debounced batches of [`ChangeEvent`]s,
//! [`ChangeFilter`] decides whether a batch matters, and [`WatchDispatcher`]
//! turns qualifying batches into a live-reload publish or a restart.

mod dispatch;
mod event;
mod filter;
mod watcher;

pub use dispatch::{Outcome, Reaction, WatchDispatcher};
pub use event::{ChangeEvent, ChangeOp};
pub use filter::{ChangeFilter, Predicate};
pub use watcher::FileWatcher;
