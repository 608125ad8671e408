//! GRPL Abstract Syntax Tree
//!
//! A program is a flat list of statements. Control flow nests statement
//! lists; everything else is a single stack operation.

use crate::location::SourceLocation;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One `if`/`elif` arm: the condition block runs, then a bool is popped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfBranch {
    pub cond: Vec<Statement>,
    pub body: Vec<Statement>,
}

/// GRPL statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// Push a constant
    Literal {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<SourceLocation>,
    },

    /// `<name`: push a variable's value
    LoadVar {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<SourceLocation>,
    },

    /// `>name`: pop into a variable
    StoreVar {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<SourceLocation>,
    },

    /// Run a registered command by name
    Command {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<SourceLocation>,
    },

    /// `if c then b (elif c then b)* (else b)? end`
    If {
        branches: Vec<IfBranch>,
        else_body: Option<Vec<Statement>>,
    },

    /// `while c do b end`
    While {
        cond: Vec<Statement>,
        body: Vec<Statement>,
    },

    /// `fun b end` pushes a function; `fun@name b end` stores it instead
    Function {
        name: Option<String>,
        body: Arc<[Statement]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<SourceLocation>,
    },

    /// `@` calls the function on the stack; `@name` calls a stored one
    Call {
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<SourceLocation>,
    },
}

impl Statement {
    pub fn literal(value: impl Into<Value>) -> Self {
        Statement::Literal {
            value: value.into(),
            loc: None,
        }
    }

    pub fn command(name: impl Into<String>) -> Self {
        Statement::Command {
            name: name.into(),
            loc: None,
        }
    }

    pub fn load_var(name: impl Into<String>) -> Self {
        Statement::LoadVar {
            name: name.into(),
            loc: None,
        }
    }

    pub fn store_var(name: impl Into<String>) -> Self {
        Statement::StoreVar {
            name: name.into(),
            loc: None,
        }
    }

    /// Source location of a leaf statement; control flow has none
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Statement::Literal { loc, .. }
            | Statement::LoadVar { loc, .. }
            | Statement::StoreVar { loc, .. }
            | Statement::Command { loc, .. }
            | Statement::Function { loc, .. }
            | Statement::Call { loc, .. } => loc.as_ref(),
            Statement::If { .. } | Statement::While { .. } => None,
        }
    }

    /// Copy of this statement with every location removed, recursively
    ///
    /// Function values held by literals are stripped as well.
    pub fn without_location(&self) -> Statement {
        match self {
            Statement::Literal { value, .. } => Statement::Literal {
                value: strip_value(value),
                loc: None,
            },
            Statement::LoadVar { name, .. } => Statement::load_var(name.clone()),
            Statement::StoreVar { name, .. } => Statement::store_var(name.clone()),
            Statement::Command { name, .. } => Statement::command(name.clone()),
            Statement::If {
                branches,
                else_body,
            } => Statement::If {
                branches: branches
                    .iter()
                    .map(|b| IfBranch {
                        cond: strip_all(&b.cond),
                        body: strip_all(&b.body),
                    })
                    .collect(),
                else_body: else_body.as_deref().map(strip_all),
            },
            Statement::While { cond, body } => Statement::While {
                cond: strip_all(cond),
                body: strip_all(body),
            },
            Statement::Function { name, body, .. } => Statement::Function {
                name: name.clone(),
                body: strip_all(body).into(),
                loc: None,
            },
            Statement::Call { name, .. } => Statement::Call {
                name: name.clone(),
                loc: None,
            },
        }
    }
}

/// Strip locations from a whole statement list
pub fn strip_all(statements: &[Statement]) -> Vec<Statement> {
    statements.iter().map(Statement::without_location).collect()
}

fn strip_value(value: &Value) -> Value {
    match value {
        Value::Function(body) => Value::Function(strip_all(body).into()),
        Value::List(items) => Value::List(items.iter().map(strip_value).collect()),
        other => other.clone(),
    }
}

/// Visit every location in a statement list, nested blocks included
///
/// Function values held by literals carry their own text and are skipped.
pub(crate) fn for_each_location<'a>(
    statements: &'a [Statement],
    visit: &mut impl FnMut(&'a SourceLocation),
) {
    for stmt in statements {
        match stmt {
            Statement::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    for_each_location(&branch.cond, visit);
                    for_each_location(&branch.body, visit);
                }
                if let Some(body) = else_body {
                    for_each_location(body, visit);
                }
            }
            Statement::While { cond, body } => {
                for_each_location(cond, visit);
                for_each_location(body, visit);
            }
            Statement::Function { body, loc, .. } => {
                if let Some(l) = loc {
                    visit(l);
                }
                for_each_location(body, visit);
            }
            other => {
                if let Some(l) = other.location() {
                    visit(l);
                }
            }
        }
    }
}

/// Replace every location in a statement list, nested blocks included
///
/// Function values held by literals keep their own locations.
pub(crate) fn relocate(
    statements: &mut [Statement],
    map: &impl Fn(&SourceLocation) -> SourceLocation,
) {
    for stmt in statements {
        match stmt {
            Statement::Literal { loc, .. }
            | Statement::LoadVar { loc, .. }
            | Statement::StoreVar { loc, .. }
            | Statement::Command { loc, .. }
            | Statement::Call { loc, .. } => relocate_one(loc, map),
            Statement::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    relocate(&mut branch.cond, map);
                    relocate(&mut branch.body, map);
                }
                if let Some(body) = else_body {
                    relocate(body, map);
                }
            }
            Statement::While { cond, body } => {
                relocate(cond, map);
                relocate(body, map);
            }
            Statement::Function { body, loc, .. } => {
                relocate_one(loc, map);
                match Arc::get_mut(body) {
                    Some(body) => relocate(body, map),
                    None => {
                        let mut owned = body.to_vec();
                        relocate(&mut owned, map);
                        *body = owned.into();
                    }
                }
            }
        }
    }
}

fn relocate_one(
    loc: &mut Option<SourceLocation>,
    map: &impl Fn(&SourceLocation) -> SourceLocation,
) {
    if let Some(l) = loc {
        *l = map(l);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grpl::parse;

    #[test]
    fn test_without_location_strips_function_literals() {
        let inner = parse("1 add").unwrap();
        let stmt = Statement::Literal {
            value: Value::List(vec![Value::Function(inner.into())]),
            loc: None,
        };

        let expected = Statement::literal(Value::List(vec![Value::Function(
            vec![Statement::literal(1i64), Statement::command("add")].into(),
        )]));
        assert_eq!(stmt.without_location(), expected);
    }

    #[test]
    fn test_for_each_location_looks_inside_blocks() {
        let program = parse("if true then 1 end while false do fun@f 2 end end").unwrap();
        let mut seen = Vec::new();
        for_each_location(&program, &mut |loc| seen.push(loc.text()));
        assert_eq!(seen, ["true", "1", "false", "fun@f", "2"]);

        let mut count = 0;
        for_each_location(&strip_all(&program), &mut |_| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_relocate_reaches_nested_bodies() {
        let source = "while true do fun@f 1 end end";
        let program = parse(source).unwrap();
        let detached: Vec<Statement> =
            serde_json::from_str(&serde_json::to_string(&program).unwrap()).unwrap();
        assert_ne!(detached, program);

        let source: Arc<str> = Arc::from(source);
        let mut attached = detached;
        relocate(&mut attached, &|loc| loc.attach(source.clone()));
        assert_eq!(attached, program);
    }
}
