//! Runtime values
//!
//! Everything a GRPL program manipulates is a [`Value`]. Values are immutable
//! once created: list commands pop a list, build a new one and push it back.

use crate::error::{ExecError, ExecResult};
use crate::grpl::Statement;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Value types
// ============================================================================

/// Names the variant of a [`Value`]; also a first-class value itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Function,
    Type,
}

impl ValueType {
    pub const ALL: [ValueType; 8] = [
        ValueType::Null,
        ValueType::Bool,
        ValueType::Int,
        ValueType::Float,
        ValueType::String,
        ValueType::List,
        ValueType::Function,
        ValueType::Type,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::List => "list",
            ValueType::Function => "function",
            ValueType::Type => "type",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Values
// ============================================================================

/// A GRPL runtime value
///
/// Serialized with an adjacent tag, e.g. `{"type":"int","value":42}`.
/// A function is written as `{"source": <lines>, "offset": n, "line_base": n,
/// "body": [...]}`, where `source` holds only the lines the body was written
/// on, starting `offset` bytes and `line_base` lines into the program. Its
/// statements then only need to carry byte ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(#[serde(with = "float_repr")] f64),
    String(String),
    List(Vec<Value>),
    Function(#[serde(with = "function_repr")] Arc<[Statement]>),
    Type(ValueType),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::List(_) => ValueType::List,
            Value::Function(_) => ValueType::Function,
            Value::Type(_) => ValueType::Type,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of a numeric value; floats truncate toward zero
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Float view of a numeric value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int_or_err(&self) -> ExecResult<i64> {
        self.as_int()
            .ok_or_else(|| ExecError::type_error(self, &[ValueType::Int]))
    }

    pub fn as_float_or_err(&self) -> ExecResult<f64> {
        self.as_float()
            .ok_or_else(|| ExecError::type_error(self, &[ValueType::Float]))
    }

    pub fn as_bool_or_err(&self) -> ExecResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(ExecError::type_error(other, &[ValueType::Bool])),
        }
    }

    pub fn as_str_or_err(&self) -> ExecResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(ExecError::type_error(other, &[ValueType::String])),
        }
    }

    pub fn as_type_or_err(&self) -> ExecResult<ValueType> {
        match self {
            Value::Type(t) => Ok(*t),
            other => Err(ExecError::type_error(other, &[ValueType::Type])),
        }
    }

    pub fn as_list_or_err(&self) -> ExecResult<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(ExecError::type_error(other, &[ValueType::List])),
        }
    }

    pub fn as_function_or_err(&self) -> ExecResult<&Arc<[Statement]>> {
        match self {
            Value::Function(body) => Ok(body),
            other => Err(ExecError::type_error(other, &[ValueType::Function])),
        }
    }

    pub fn into_string_or_err(self) -> ExecResult<String> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(ExecError::type_error(&other, &[ValueType::String])),
        }
    }

    pub fn into_list_or_err(self) -> ExecResult<Vec<Value>> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(ExecError::type_error(&other, &[ValueType::List])),
        }
    }

    pub fn into_function_or_err(self) -> ExecResult<Arc<[Statement]>> {
        match self {
            Value::Function(body) => Ok(body),
            other => Err(ExecError::type_error(&other, &[ValueType::Function])),
        }
    }

    /// Length in characters for strings, in elements for lists
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Text used by `print`: strings appear without quotes
    pub fn display_str(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.repr(),
        }
    }

    /// Text used by `trace` and inside lists: strings appear quoted
    pub fn repr(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => format!("{:?}", v),
            Value::String(s) => format!("\"{}\"", s),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Function(_) => "fun".to_string(),
            Value::Type(t) => t.name().to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_str())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

// ============================================================================
// Numeric promotion
// ============================================================================

/// Apply a binary numeric operation, promoting to float when either side is
/// a float and using `int_op` when both are ints
pub fn float_int_bin_op(
    a: &Value,
    b: &Value,
    float_op: impl Fn(f64, f64) -> f64,
    int_op: impl Fn(i64, i64) -> i64,
) -> ExecResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(*x, *y))),
        _ => {
            let x = numeric_or_err(a)?;
            let y = numeric_or_err(b)?;
            Ok(Value::Float(float_op(x, y)))
        }
    }
}

/// Numeric comparison with the same promotion rules as [`float_int_bin_op`]
pub fn float_int_cmp_op(
    a: &Value,
    b: &Value,
    float_op: impl Fn(f64, f64) -> bool,
    int_op: impl Fn(i64, i64) -> bool,
) -> ExecResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Bool(int_op(*x, *y))),
        _ => {
            let x = numeric_or_err(a)?;
            let y = numeric_or_err(b)?;
            Ok(Value::Bool(float_op(x, y)))
        }
    }
}

fn numeric_or_err(value: &Value) -> ExecResult<f64> {
    value
        .as_float()
        .ok_or_else(|| ExecError::type_error(value, &[ValueType::Int, ValueType::Float]))
}

/// Non-finite floats are stored as strings since JSON has no literal for them
mod float_repr {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(&value.to_string())
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(text) => text.parse().map_err(de::Error::custom),
        }
    }
}

mod function_repr {
    use crate::grpl::ast::{for_each_location, relocate, Statement};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::sync::Arc;

    #[derive(Serialize)]
    struct FunctionRef<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<&'a str>,
        #[serde(skip_serializing_if = "is_zero")]
        offset: usize,
        #[serde(skip_serializing_if = "is_zero")]
        line_base: usize,
        body: &'a [Statement],
    }

    #[derive(Deserialize)]
    struct FunctionRecord {
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        offset: usize,
        #[serde(default)]
        line_base: usize,
        body: Vec<Statement>,
    }

    fn is_zero(n: &usize) -> bool {
        *n == 0
    }

    /// The lines of program text the body was written on
    struct Excerpt<'a> {
        text: &'a str,
        offset: usize,
        line_base: usize,
    }

    fn excerpt(body: &[Statement]) -> Option<Excerpt<'_>> {
        let mut first = None;
        let mut span: Option<(usize, usize)> = None;
        for_each_location(body, &mut |loc| {
            let origin = *first.get_or_insert(loc);
            if !Arc::ptr_eq(origin.shared_source(), loc.shared_source()) {
                return;
            }
            let (from, to) = loc.line_range();
            span = Some(match span {
                Some((a, b)) => (a.min(from), b.max(to)),
                None => (from, to),
            });
        });
        let (loc, (from, to)) = first.zip(span)?;
        let source = loc.source();
        Some(Excerpt {
            text: &source[from..to],
            offset: from,
            line_base: loc.line_base() + source[..from].matches('\n').count(),
        })
    }

    pub fn serialize<S: Serializer>(
        body: &Arc<[Statement]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let excerpt = excerpt(body);
        FunctionRef {
            source: excerpt.as_ref().map(|e| e.text),
            offset: excerpt.as_ref().map_or(0, |e| e.offset),
            line_base: excerpt.as_ref().map_or(0, |e| e.line_base),
            body: &body[..],
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Arc<[Statement]>, D::Error> {
        let FunctionRecord {
            source,
            offset,
            line_base,
            mut body,
        } = FunctionRecord::deserialize(deserializer)?;
        if let Some(source) = source {
            let source: Arc<str> = Arc::from(source);
            relocate(&mut body, &|loc| loc.rebase(source.clone(), offset, line_base));
        }
        Ok(body.into())
    }
}
