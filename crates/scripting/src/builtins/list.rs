//! List construction and indexing
//!
//! Lists are values, so every command here pops a list and pushes a new one.

use super::CommandGroup;
use crate::context::Context;
use crate::error::{ExecError, ExecResult};
use crate::value::{Value, ValueType};

/// Build the `list` command group
pub fn group() -> CommandGroup {
    let mut group = CommandGroup::new("list", "Commands for manipulating lists");
    group
        .add_builtin("newlist", "Pushes a new, empty list on the stack.", builtin_newlist)
        .add_builtin(
            "tolist",
            "Pops values until a list is popped, then appends the other popped values to it in \
             the order they were pushed.\n\
             Example: `newlist 1 2 3 tolist` leaves the list [1, 2, 3] on the stack.",
            builtin_tolist,
        )
        .add_builtin(
            "len",
            "Pops a string or list and pushes its length.\n\
             Strings are measured in characters. Other values raise a type error.",
            builtin_len,
        )
        .add_builtin(
            "listget",
            "Pops an index and a list, and pushes the element at that index.\n\
             Lists are 0-indexed.\n\
             Example: `newlist 1 2 3 tolist 1 listget` pushes 2.",
            builtin_listget,
        )
        .add_builtin(
            "listappend",
            "Pops a value and a list, and pushes the list with the value added to the end.\n\
             Example: `newlist 1 2 tolist 3 listappend` pushes [1, 2, 3].",
            builtin_listappend,
        )
        .add_builtin(
            "listrm",
            "Pops an index and a list, and pushes the list with the element at that index removed.\n\
             Example: `newlist 1 2 3 tolist 1 listrm` pushes [1, 3].",
            builtin_listrm,
        )
        .add_builtin(
            "listinsert",
            "Pops an index, a value and a list, and pushes the list with the value inserted \
             before the element at that index.\n\
             Example: `newlist 1 2 3 tolist 4 1 listinsert` pushes [1, 4, 2, 3].",
            builtin_listinsert,
        );
    group
}

/// Validate `index` against a list of `len` elements
fn checked_index(index: i64, len: usize) -> ExecResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| ExecError::index_error(index, len))
}

fn builtin_newlist(ctx: &mut Context) -> ExecResult<()> {
    ctx.push(Value::List(Vec::new()));
    Ok(())
}

fn builtin_tolist(ctx: &mut Context) -> ExecResult<()> {
    let mut popped = Vec::new();
    let mut list = loop {
        match ctx.pop()? {
            Value::List(items) => break items,
            other => popped.push(other),
        }
    };
    list.extend(popped.into_iter().rev());
    ctx.push(list);
    Ok(())
}

fn builtin_len(ctx: &mut Context) -> ExecResult<()> {
    let v = ctx.pop()?;
    let len = v
        .length()
        .ok_or_else(|| ExecError::type_error(&v, &[ValueType::String, ValueType::List]))?;
    ctx.push(len as i64);
    Ok(())
}

fn builtin_listget(ctx: &mut Context) -> ExecResult<()> {
    let index = ctx.pop()?.as_int_or_err()?;
    let mut list = ctx.pop()?.into_list_or_err()?;
    let i = checked_index(index, list.len())?;
    ctx.push(list.swap_remove(i));
    Ok(())
}

fn builtin_listappend(ctx: &mut Context) -> ExecResult<()> {
    let v = ctx.pop()?;
    let mut list = ctx.pop()?.into_list_or_err()?;
    list.push(v);
    ctx.push(list);
    Ok(())
}

fn builtin_listrm(ctx: &mut Context) -> ExecResult<()> {
    let index = ctx.pop()?.as_int_or_err()?;
    let mut list = ctx.pop()?.into_list_or_err()?;
    let i = checked_index(index, list.len())?;
    list.remove(i);
    ctx.push(list);
    Ok(())
}

fn builtin_listinsert(ctx: &mut Context) -> ExecResult<()> {
    let index = ctx.pop()?.as_int_or_err()?;
    let v = ctx.pop()?;
    let mut list = ctx.pop()?.into_list_or_err()?;
    let i = checked_index(index, list.len())?;
    list.insert(i, v);
    ctx.push(list);
    Ok(())
}
