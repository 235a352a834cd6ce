//! StudyDeck sync engine.
//!
//! A client-side synchronization layer that keeps an in-memory working
//! copy of a user's study data consistent with the remote store while
//! minimizing round trips: mutations are coalesced behind a debounce
//! with a max-delay ceiling, verified identities and loaded documents are
//! trusted for a TTL, and page-lifecycle signals force a fire-and-forget
//! flush so edits survive abrupt teardown.
//!
//! Typical host wiring:
//!
//! ```no_run
//! use studydeck_sync::{SyncCache, SyncConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = SyncConfig::load()?;
//! let mut cache = SyncCache::from_config(&config)?;
//! let authenticated = cache.initialize().await;
//! # let _ = authenticated;
//! // ... UI calls mutators; the event loop drives cache.poll_flush(),
//! // and lifecycle hooks call cache.handle_lifecycle(...).
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError, RemoteStore};
pub use auth::{Session, SessionIdentity};
pub use cache::{FlushScheduler, LifecycleEvent, SyncCache, Transport};
pub use config::SyncConfig;
pub use models::{Document, RecordId, UserProfile};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
