//! Core types and trait definitions for the Dugout ingestion pipeline.
//!
//! No database, archive or CSV dependencies live here. The crate declares the
//! shape of every destination table once, so that the record transformers and
//! the bulk loader agree on column names and order.

pub mod error;
pub mod game;
pub mod migration;
pub mod reference;
pub mod refresh;
pub mod schema;
pub mod win_expectancy;

pub use error::{Error, Result};
