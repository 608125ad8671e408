//! String and sequence commands
//!
//! String indices count characters, not bytes.

use super::CommandGroup;
use crate::context::Context;
use crate::error::{ExecError, ExecResult};
use crate::value::{Value, ValueType};

/// Build the `string` command group
pub fn group() -> CommandGroup {
    let mut group = CommandGroup::new("string", "Commands for manipulating strings");
    group
        .add_builtin(
            "slice",
            "Pops an end index, a start index and a string or list, and pushes the part \
             from start up to but not including end.\n\
             Example: `\"Hello\" 1 4 slice` pushes \"ell\".",
            builtin_slice,
        )
        .add_builtin(
            "find",
            "Pops a pattern and a string or list, and pushes the index of the first \
             occurrence of the pattern.\n\
             Strings are searched for a substring, lists for an equal element. Pushes -1 if \
             there is no match.\n\
             Example: `\"Hello hello\" \"ll\" find` pushes 2.",
            builtin_find,
        )
        .add_builtin(
            "rfind",
            "Pops a pattern and a string or list, and pushes the index of the last \
             occurrence of the pattern.\n\
             Pushes -1 if there is no match.\n\
             Example: `\"Hello hello\" \"ll\" rfind` pushes 8.",
            builtin_rfind,
        )
        .add_builtin(
            "concat",
            "Pops two strings or two lists and pushes them joined together.\n\
             Mixing a string with a list, or any other type, raises a type error.",
            builtin_concat,
        );
    group
}

/// Validate a `start..end` range over a sequence of `len` items
fn checked_range(start: i64, end: i64, len: usize) -> ExecResult<(usize, usize)> {
    let start_ok = usize::try_from(start).ok().filter(|&s| s <= len);
    let start = start_ok.ok_or_else(|| ExecError::index_error(start, len))?;
    let end = usize::try_from(end)
        .ok()
        .filter(|&e| e <= len && e >= start)
        .ok_or_else(|| ExecError::index_error(end, len))?;
    Ok((start, end))
}

fn builtin_slice(ctx: &mut Context) -> ExecResult<()> {
    let end = ctx.pop()?.as_int_or_err()?;
    let start = ctx.pop()?.as_int_or_err()?;
    let sliced = match ctx.pop()? {
        Value::String(s) => {
            let (start, end) = checked_range(start, end, s.chars().count())?;
            Value::String(s.chars().skip(start).take(end - start).collect())
        }
        Value::List(items) => {
            let (start, end) = checked_range(start, end, items.len())?;
            Value::List(items[start..end].to_vec())
        }
        other => {
            return Err(ExecError::type_error(
                &other,
                &[ValueType::String, ValueType::List],
            ))
        }
    };
    ctx.push(sliced);
    Ok(())
}

/// Convert a byte offset found by `str::find` into a character index
fn char_index(haystack: &str, byte_offset: usize) -> i64 {
    haystack[..byte_offset].chars().count() as i64
}

fn search(ctx: &mut Context, from_end: bool) -> ExecResult<()> {
    let needle = ctx.pop()?;
    let haystack = ctx.pop()?;
    let found = match &haystack {
        Value::String(s) => {
            let pattern = needle.as_str_or_err()?;
            let offset = if from_end { s.rfind(pattern) } else { s.find(pattern) };
            offset.map(|b| char_index(s, b))
        }
        Value::List(items) => {
            let position = if from_end {
                items.iter().rposition(|v| *v == needle)
            } else {
                items.iter().position(|v| *v == needle)
            };
            position.map(|i| i as i64)
        }
        other => {
            return Err(ExecError::type_error(
                other,
                &[ValueType::String, ValueType::List],
            ))
        }
    };
    ctx.push(found.unwrap_or(-1));
    Ok(())
}

fn builtin_find(ctx: &mut Context) -> ExecResult<()> {
    search(ctx, false)
}

fn builtin_rfind(ctx: &mut Context) -> ExecResult<()> {
    search(ctx, true)
}

fn builtin_concat(ctx: &mut Context) -> ExecResult<()> {
    let b = ctx.pop()?;
    let a = ctx.pop()?;
    let joined = match a {
        Value::String(mut s) => {
            s.push_str(b.as_str_or_err()?);
            Value::String(s)
        }
        Value::List(mut items) => {
            items.extend(b.into_list_or_err()?);
            Value::List(items)
        }
        other => {
            return Err(ExecError::type_error(
                &other,
                &[ValueType::String, ValueType::List],
            ))
        }
    };
    ctx.push(joined);
    Ok(())
}
