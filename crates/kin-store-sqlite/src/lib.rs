//! SQLite backend for the Kin record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. A merge runs the synchronous engine
//! from `kin-core` on that thread, inside a single SQLite transaction.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{JournalEntry, SqliteStore};
