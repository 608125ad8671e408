//! Type conversion and inspection

use super::CommandGroup;
use crate::context::Context;
use crate::error::{ExecError, ExecResult};
use crate::value::{Value, ValueType};

/// Build the `type` command group
pub fn group() -> CommandGroup {
    let mut group = CommandGroup::new("type", "Commands for converting between different types");
    group
        .add_builtin(
            "int",
            "Pops a value, converts it to an int, and pushes the int.\n\
             Floats are truncated toward zero. Strings are parsed, pushing null if the string \
             is not a valid int. Other types raise a type error.",
            builtin_int,
        )
        .add_builtin(
            "float",
            "Pops a value, converts it to a float, and pushes the float.\n\
             Strings are parsed, pushing null if the string is not a valid float. Other types \
             raise a type error.",
            builtin_float,
        )
        .add_builtin(
            "str",
            "Pops a value, converts it to a string, and pushes the string.\n\
             Every type can be converted to a string.",
            builtin_str,
        )
        .add_builtin("null", "Pushes null on the stack.", builtin_null)
        .add_builtin(
            "typeof",
            "Pops a value and pushes its type.\n\
             Example: `42 typeof str` pushes \"int\".",
            builtin_typeof,
        )
        .add_builtin(
            "isa",
            "Pops a type and a value, and pushes true if the value has that type.\n\
             Example: `42 7 typeof isa` pushes true.",
            builtin_isa,
        );
    group
}

const CONVERTIBLE: [ValueType; 3] = [ValueType::Int, ValueType::Float, ValueType::String];

fn builtin_int(ctx: &mut Context) -> ExecResult<()> {
    let converted = match ctx.pop()? {
        v @ Value::Int(_) => v,
        Value::Float(f) => Value::Int(f as i64),
        Value::String(s) => s.parse::<i64>().map(Value::Int).unwrap_or(Value::Null),
        other => return Err(ExecError::type_error(&other, &CONVERTIBLE)),
    };
    ctx.push(converted);
    Ok(())
}

fn builtin_float(ctx: &mut Context) -> ExecResult<()> {
    let converted = match ctx.pop()? {
        v @ Value::Float(_) => v,
        Value::Int(i) => Value::Float(i as f64),
        Value::String(s) => s.parse::<f64>().map(Value::Float).unwrap_or(Value::Null),
        other => return Err(ExecError::type_error(&other, &CONVERTIBLE)),
    };
    ctx.push(converted);
    Ok(())
}

fn builtin_str(ctx: &mut Context) -> ExecResult<()> {
    let v = ctx.pop()?;
    ctx.push(v.display_str());
    Ok(())
}

fn builtin_null(ctx: &mut Context) -> ExecResult<()> {
    ctx.push(Value::Null);
    Ok(())
}

fn builtin_typeof(ctx: &mut Context) -> ExecResult<()> {
    let v = ctx.pop()?;
    ctx.push(Value::Type(v.value_type()));
    Ok(())
}

fn builtin_isa(ctx: &mut Context) -> ExecResult<()> {
    let expected = ctx.pop()?.as_type_or_err()?;
    let v = ctx.pop()?;
    ctx.push(v.value_type() == expected);
    Ok(())
}
