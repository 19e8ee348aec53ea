//! SQLite backend for the hrdesk document store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every collection lives in one
//! `documents` table; filtering and ordering reuse
//! [`hrdesk_core::store::Query::apply`] so results match the in-memory store.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
