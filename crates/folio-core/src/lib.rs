//! Core types and trait definitions for the folio content store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::ContentStore`]; the web layer depends
//! on that abstraction only.

// Native `async fn` in traits; the store trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod analytics;
pub mod category;
pub mod entry;
pub mod error;
pub mod store;

pub use error::{Error, Result};
