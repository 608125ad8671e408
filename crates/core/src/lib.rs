//! Greenstone Core - Shared error type for the host crates

mod error;

pub use error::*;
