//! Arithmetic and comparison
//!
//! Binary commands pop the right operand first, so `a b sub` computes `a - b`.

use super::CommandGroup;
use crate::context::Context;
use crate::error::{ExecErrorKind, ExecResult};
use crate::value::{float_int_bin_op, float_int_cmp_op, Value};

/// Build the `math` command group
pub fn group() -> CommandGroup {
    let mut group = CommandGroup::new("math", "Commands for mathematical operations");
    group
        .add_builtin(
            "gt",
            "Pops two numbers and pushes true if the bottom one is greater than the top one.\n\
             Example: `3 2 gt` leaves `true` on the stack.",
            builtin_gt,
        )
        .add_builtin(
            "lt",
            "Pops two numbers and pushes true if the bottom one is less than the top one.\n\
             Example: `2 3 lt` leaves `true` on the stack.",
            builtin_lt,
        )
        .add_builtin(
            "add",
            "Pops two numbers and pushes their sum.\n\
             Raises a type error if the values are not numbers.",
            builtin_add,
        )
        .add_builtin(
            "sub",
            "Pops two numbers and subtracts the top one from the bottom one.\n\
             Example: if the stack is `a b` (a pushed first), this pushes a - b.\n\
             Raises a type error if the values are not numbers.",
            builtin_sub,
        )
        .add_builtin(
            "mul",
            "Pops two numbers and pushes their product.\n\
             Raises a type error if the values are not numbers.",
            builtin_mul,
        )
        .add_builtin(
            "div",
            "Pops two numbers and divides the bottom one by the top one as floats.\n\
             Example: if the stack is `a b` (a pushed first), this pushes a / b.\n\
             Dividing by zero gives an infinite or NaN float rather than an error.",
            builtin_div,
        )
        .add_builtin(
            "idiv",
            "Pops two numbers and divides the bottom one by the top one using integer division.\n\
             Floats are truncated to ints before dividing, and the result is an int.\n\
             Raises an arithmetic error when dividing by zero.",
            builtin_idiv,
        );
    group
}

fn pop_pair(ctx: &mut Context) -> ExecResult<(Value, Value)> {
    let b = ctx.pop()?;
    let a = ctx.pop()?;
    Ok((a, b))
}

fn builtin_gt(ctx: &mut Context) -> ExecResult<()> {
    let (a, b) = pop_pair(ctx)?;
    ctx.push(float_int_cmp_op(&a, &b, |x, y| x > y, |x, y| x > y)?);
    Ok(())
}

fn builtin_lt(ctx: &mut Context) -> ExecResult<()> {
    let (a, b) = pop_pair(ctx)?;
    ctx.push(float_int_cmp_op(&a, &b, |x, y| x < y, |x, y| x < y)?);
    Ok(())
}

fn builtin_add(ctx: &mut Context) -> ExecResult<()> {
    let (a, b) = pop_pair(ctx)?;
    ctx.push(float_int_bin_op(&a, &b, |x, y| x + y, i64::wrapping_add)?);
    Ok(())
}

fn builtin_sub(ctx: &mut Context) -> ExecResult<()> {
    let (a, b) = pop_pair(ctx)?;
    ctx.push(float_int_bin_op(&a, &b, |x, y| x - y, i64::wrapping_sub)?);
    Ok(())
}

fn builtin_mul(ctx: &mut Context) -> ExecResult<()> {
    let (a, b) = pop_pair(ctx)?;
    ctx.push(float_int_bin_op(&a, &b, |x, y| x * y, i64::wrapping_mul)?);
    Ok(())
}

fn builtin_div(ctx: &mut Context) -> ExecResult<()> {
    let b = ctx.pop()?.as_float_or_err()?;
    let a = ctx.pop()?.as_float_or_err()?;
    ctx.push(a / b);
    Ok(())
}

fn builtin_idiv(ctx: &mut Context) -> ExecResult<()> {
    let b = ctx.pop()?.as_int_or_err()?;
    let a = ctx.pop()?.as_int_or_err()?;
    if b == 0 {
        return Err(ExecErrorKind::Arithmetic(format!("Attempted to divide {} by 0.", a)).into());
    }
    ctx.push(a.wrapping_div(b));
    Ok(())
}
