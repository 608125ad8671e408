//! Stack shuffling and boolean logic

use super::CommandGroup;
use crate::context::Context;
use crate::error::ExecResult;
use crate::value::Value;

/// Build the `core` command group
pub fn group() -> CommandGroup {
    let mut group = CommandGroup::new("core", "Basic stack manipulation and logic commands");
    group
        .add_builtin("pop", "Discards the item at the top of the stack.", builtin_pop)
        .add_builtin("dup", "Duplicates the item at the top of the stack.", builtin_dup)
        .add_builtin("swap", "Swaps the two items at the top of the stack.", builtin_swap)
        .add_builtin(
            "not",
            "Pops a bool and pushes its negation.\n\
             Raises a type error if the value is not a bool.",
            builtin_not,
        )
        .add_builtin(
            "and",
            "Pops two bools and pushes true if both are true.\n\
             Raises a type error if either value is not a bool.",
            builtin_and,
        )
        .add_builtin(
            "or",
            "Pops two bools and pushes true if either is true.\n\
             Raises a type error if either value is not a bool.",
            builtin_or,
        )
        .add_builtin(
            "eq",
            "Pops two values and pushes true if they are equal.\n\
             Values of different types are never equal, so `2 2.0 eq` pushes false.",
            builtin_eq,
        );
    group
}

fn builtin_pop(ctx: &mut Context) -> ExecResult<()> {
    ctx.pop()?;
    Ok(())
}

fn builtin_dup(ctx: &mut Context) -> ExecResult<()> {
    let v = ctx.pop()?;
    ctx.push(v.clone());
    ctx.push(v);
    Ok(())
}

fn builtin_swap(ctx: &mut Context) -> ExecResult<()> {
    let a = ctx.pop()?;
    let b = ctx.pop()?;
    ctx.push(a);
    ctx.push(b);
    Ok(())
}

fn builtin_not(ctx: &mut Context) -> ExecResult<()> {
    let v = ctx.pop()?.as_bool_or_err()?;
    ctx.push(!v);
    Ok(())
}

fn builtin_and(ctx: &mut Context) -> ExecResult<()> {
    let b = ctx.pop()?.as_bool_or_err()?;
    let a = ctx.pop()?.as_bool_or_err()?;
    ctx.push(a && b);
    Ok(())
}

fn builtin_or(ctx: &mut Context) -> ExecResult<()> {
    let b = ctx.pop()?.as_bool_or_err()?;
    let a = ctx.pop()?.as_bool_or_err()?;
    ctx.push(a || b);
    Ok(())
}

fn builtin_eq(ctx: &mut Context) -> ExecResult<()> {
    let b = ctx.pop()?;
    let a = ctx.pop()?;
    ctx.push(Value::Bool(a == b));
    Ok(())
}
