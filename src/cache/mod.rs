//! Write-coalescing sync cache.
//!
//! This module provides the policy core of the engine:
//! - `FlushScheduler`: the dirty flag plus the debounce and max-delay
//!   deadlines that decide when pending mutations are pushed
//! - `SyncCache`: the per-session context owning the document, the
//!   session identity, and the scheduler, with the verify/load/flush
//!   operations and the per-collection mutators consumed by UI code

pub mod coalescer;
pub mod manager;

pub use coalescer::FlushScheduler;
pub use manager::{LifecycleEvent, SyncCache, Transport};
