//! SQLite backend for the Dugout ingestion pipeline.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write path is a single
//! `IMMEDIATE` transaction; the one exception is [`SqliteStore::copy_csv`].

mod encode;
mod loader;
mod migrate;
mod refresh;
mod store;
mod win_expectancy;

pub mod error;

pub use error::{Error, Result};
pub use loader::{COPY_BATCH_ROWS, StageMerge};
pub use migrate::{DirMigrations, EmbeddedMigrations};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
