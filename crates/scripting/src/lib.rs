//! # Greenstone Scripting System
//!
//! This crate implements GRPL, the small stack-based language run by
//! Greenstone terminals.
//!
//! ## Features
//! - Hand-written lexer and recursive descent parser
//! - Tree-walking interpreter over a value stack and a flat variable table
//! - Built-in command groups (core, math, list, string, type)
//! - Host-supplied command groups, including IO through [`GrplIo`]
//! - Serializable interpreter state for persistence
//!
//! ## Example
//!
//! ```
//! use greenstone_scripting::{Context, Value};
//!
//! let mut ctx = Context::default();
//! ctx.execute("newlist 1 2 3 tolist len").unwrap();
//! assert_eq!(ctx.stack().values(), &[Value::Int(3)]);
//! ```

pub mod builtins;
pub mod context;
pub mod error;
pub mod grpl;
pub mod location;
pub mod value;

pub use builtins::io::{io_commands, BufferedIo, GrplIo};
pub use builtins::{
    build_default_registry, default_groups, BuiltinCommand, BuiltinFn, Command, CommandGroup,
    CommandRegistry,
};
pub use context::{Context, SaveData, Stack};
pub use error::{
    ExecError, ExecErrorKind, ExecResult, ParseError, RegistryError, Result, ScriptError,
    INTERRUPTED_MESSAGE,
};
pub use grpl::{parse, IfBranch, Statement};
pub use location::SourceLocation;
pub use value::{float_int_bin_op, float_int_cmp_op, Value, ValueType};
