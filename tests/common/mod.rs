//! Common test infrastructure
//!
//! End-to-end tests run both jobs against a scratch SQLite warehouse, loading
//! JSON sources written into a temporary directory. Tests should only import
//! from this module, not from internal submodules.

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{count, log_event, query_strings, song_document, TestWarehouse};
