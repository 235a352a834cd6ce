//! Authentication module for session identity and verification freshness.
//!
//! This module provides:
//! - `SessionIdentity`: bearer token + user-profile snapshot, always
//!   replaced wholesale and cleared wholesale
//! - `Session`: the current identity plus the TTL window that decides
//!   whether a cached verification can be trusted
//! - `FreshnessWindow`: the reusable (timestamp, TTL) gate

pub mod session;

pub use session::{FreshnessWindow, Session, SessionIdentity};
