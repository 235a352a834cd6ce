//! REST API client module for the StudyDeck remote store.
//!
//! This module provides the `RemoteStore` trait describing the remote
//! store's endpoints (register/login/logout/verify plus whole-document
//! read/write) and `ApiClient`, the reqwest-backed implementation.
//!
//! Authenticated calls carry a bearer token; the teardown-time beacon
//! write carries the token as a query parameter instead.

pub mod client;
pub mod error;

pub use client::{ApiClient, RemoteStore};
pub use error::ApiError;
