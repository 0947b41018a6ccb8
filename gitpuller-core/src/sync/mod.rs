//! Concurrent synchronization of remote branches into local clones

mod cancel;
mod gate;
mod orchestrator;

pub use cancel::CancelHandle;
pub use gate::{ConcurrencyGate, GatePermit};
pub use orchestrator::{CatalogEntry, SyncOrchestrator, SyncReport};
