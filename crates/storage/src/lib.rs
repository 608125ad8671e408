//! # Greenstone Storage
//!
//! Durable record of a terminal session: its scrollback, its files and the
//! interpreter state, kept as one JSON document on disk.

pub mod error;
pub mod store;

pub use error::{Result, StorageError};
pub use store::{StateStore, TerminalSaveData};
