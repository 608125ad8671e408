//! # Greenstone Terminal
//!
//! A terminal session hosting one GRPL context: the scrollback it prints to,
//! the files it can read and write, and a job runner that can interrupt a
//! program that never finishes.

pub mod error;
pub mod fs;
pub mod io;
pub mod scrollback;
pub mod terminal;

pub use error::{Result, TerminalError};
pub use fs::{fs_commands, FileSystem};
pub use io::{Screen, SessionLink, TerminalEvent, TerminalIo};
pub use scrollback::Scrollback;
pub use terminal::{JobOutcome, Terminal};
