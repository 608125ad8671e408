//! Error types for the scripting crate
//!
//! Parsing and execution fail in different ways and at different times:
//! a [`ParseError`] happens before any statement runs, while an [`ExecError`]
//! is raised by a running statement and remembers where it happened.

use crate::location::SourceLocation;
use crate::value::{Value, ValueType};
use greenstone_core::GreenstoneError;
use std::ops::RangeInclusive;

/// Message shown by hosts when a running program is cancelled.
pub const INTERRUPTED_MESSAGE: &str = "Program Interrupted";

/// Source text could not be turned into statements
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    /// Human readable description, including the line and column when known
    pub message: String,

    /// Byte offset into the source where parsing failed
    pub position: Option<usize>,
}

impl ParseError {
    /// Create a parse error at `position`, describing the location in `source`
    pub fn at(source: &str, position: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = match line_col(source, position) {
            Some((line, col)) => format!("{} at line {}, column {}", message, line, col),
            None => message,
        };
        Self {
            message,
            position: Some(position),
        }
    }

    /// Convert the failing position into a 1-based `(line, column)` pair
    pub fn line_col(&self, source: &str) -> Option<(usize, usize)> {
        self.position.and_then(|pos| line_col(source, pos))
    }

    /// Render the error the way a terminal shows it
    pub fn pretty_message(&self) -> String {
        format!("Parse Error: {}", self.message)
    }
}

fn line_col(source: &str, position: usize) -> Option<(usize, usize)> {
    if position > source.len() || !source.is_char_boundary(position) {
        return None;
    }
    let before = &source[..position];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = source[line_start..position].chars().count() + 1;
    Some((line, col))
}

/// The closed set of things that can go wrong while a program runs
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecErrorKind {
    /// Popped a value off an empty stack
    #[error("Tried to pop empty stack")]
    EmptyStack,

    /// An operand had the wrong variant
    #[error(
        "Expected type {}, but value {} had type {}.",
        expected_list(.expected),
        .value.repr(),
        .value.value_type()
    )]
    Type { value: Value, expected: Vec<ValueType> },

    /// No command with this name is registered
    #[error("There is no command called {0}.")]
    UnknownCommand(String),

    /// Loaded a variable that was never stored
    #[error("Variable name {0} is not defined.")]
    UndefinedName(String),

    /// Arithmetic that has no result, such as integer division by zero
    #[error("{0}")]
    Arithmetic(String),

    /// List or string index outside the valid range
    #[error("Index {index} is out of range {}..{}.", .valid.start(), .valid.end())]
    Index { index: i64, valid: RangeInclusive<i64> },

    /// Host filesystem failure
    #[error("{0}")]
    File(String),
}

fn expected_list(expected: &[ValueType]) -> String {
    match expected {
        [] => "nothing".to_string(),
        [one] => one.to_string(),
        many => {
            let names: Vec<&str> = many.iter().map(|t| t.name()).collect();
            format!("one of {}", names.join(", "))
        }
    }
}

/// An execution error plus the first source location it propagated through
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct ExecError {
    /// What went wrong
    pub kind: ExecErrorKind,

    /// Location of the innermost statement that failed, if it carried one
    pub trace: Option<SourceLocation>,
}

impl ExecError {
    pub fn new(kind: ExecErrorKind) -> Self {
        Self { kind, trace: None }
    }

    /// Shorthand for a type error on `value`
    pub fn type_error(value: &Value, expected: &[ValueType]) -> Self {
        ExecErrorKind::Type {
            value: value.clone(),
            expected: expected.to_vec(),
        }
        .into()
    }

    /// Shorthand for an index error against a sequence of `len` items
    pub fn index_error(index: i64, len: usize) -> Self {
        ExecErrorKind::Index {
            index,
            valid: 0..=len as i64,
        }
        .into()
    }

    pub fn kind(&self) -> &ExecErrorKind {
        &self.kind
    }

    pub fn trace(&self) -> Option<&SourceLocation> {
        self.trace.as_ref()
    }

    /// Attach `location` unless an inner statement already did
    pub(crate) fn with_trace(mut self, location: Option<&SourceLocation>) -> Self {
        if self.trace.is_none() {
            self.trace = location.cloned();
        }
        self
    }

    /// Render the error the way a terminal shows it, with a code pointer
    /// under the failing statement when one was recorded
    pub fn pretty_message(&self) -> String {
        match &self.trace {
            Some(loc) => format!("Execution error: {}\n{}", self.kind, loc.underline()),
            None => format!("Execution error: {}", self.kind),
        }
    }
}

impl From<ExecErrorKind> for ExecError {
    fn from(kind: ExecErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Command registry construction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Command group {0} is registered more than once")]
    DuplicateGroup(String),
}

/// Any failure surfaced by the scripting crate
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScriptError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ScriptError {
    /// Render the error the way a terminal shows it
    pub fn pretty_message(&self) -> String {
        match self {
            ScriptError::Parse(e) => e.pretty_message(),
            ScriptError::Exec(e) => e.pretty_message(),
            ScriptError::Registry(e) => e.to_string(),
        }
    }
}

impl From<ScriptError> for GreenstoneError {
    fn from(err: ScriptError) -> Self {
        GreenstoneError::Script(err.to_string())
    }
}

/// Result type for statement and command execution
pub type ExecResult<T> = std::result::Result<T, ExecError>;

/// Result type for scripting operations
pub type Result<T> = std::result::Result<T, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_parse_error_position() {
        let err = ParseError::at("42\n  ?", 5, "unexpected character `?`");
        assert_eq!(err.message, "unexpected character `?` at line 2, column 3");
        assert_eq!(err.line_col("42\n  ?"), Some((2, 3)));
        assert_eq!(
            err.pretty_message(),
            "Parse Error: unexpected character `?` at line 2, column 3"
        );
    }

    #[test]
    fn test_type_error_message() {
        let err = ExecError::type_error(&Value::String("x".into()), &[ValueType::Int]);
        assert_eq!(err.to_string(), "Expected type int, but value \"x\" had type string.");

        let err = ExecError::type_error(&Value::Null, &[ValueType::String, ValueType::List]);
        assert_eq!(
            err.to_string(),
            "Expected type one of string, list, but value null had type null."
        );
    }

    #[test]
    fn test_first_trace_wins() {
        let src: Arc<str> = Arc::from("1 2 foo");
        let inner = SourceLocation::new(src.clone(), 4, 7);
        let outer = SourceLocation::new(src, 0, 1);

        let err = ExecError::new(ExecErrorKind::UnknownCommand("foo".into()))
            .with_trace(Some(&inner))
            .with_trace(Some(&outer));
        assert_eq!(err.trace(), Some(&inner));
    }

    #[test]
    fn test_pretty_message_with_trace() {
        let loc = SourceLocation::new(Arc::from("1 2 foo"), 4, 7);
        let err = ExecError::new(ExecErrorKind::UnknownCommand("foo".into())).with_trace(Some(&loc));
        assert_eq!(
            err.pretty_message(),
            "Execution error: There is no command called foo.\n1 2 foo\n    ^^^"
        );
    }

    #[test]
    fn test_index_error_range() {
        let err = ExecError::index_error(5, 3);
        assert_eq!(err.to_string(), "Index 5 is out of range 0..3.");
    }
}
