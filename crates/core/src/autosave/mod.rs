//! Debounced, retrying persistence of editor snapshots.

pub mod config;
pub mod engine;
pub mod persist;
pub mod state;

pub use config::AutoSaveConfig;
pub use engine::AutoSave;
pub use persist::{persist_fn, Persist, PersistFn, SaveFuture};
pub use state::{AutoSaveError, AutoSaveState, SaveStatus};
