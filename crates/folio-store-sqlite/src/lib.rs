//! SQLite backend for the folio content store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod seed;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::Migration;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
