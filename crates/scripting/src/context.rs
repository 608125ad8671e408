//! Script execution context
//!
//! A [`Context`] owns everything a running program can see: the value stack,
//! the variable table and the command registry. Nothing is shared between
//! contexts, so a host can snapshot one with [`Context::save_data`] and rebuild
//! it later with [`SaveData::restore`].

use crate::builtins::{CommandGroup, CommandRegistry};
use crate::error::{ExecError, ExecErrorKind, ExecResult, RegistryError, Result};
use crate::grpl::{self, Statement};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

// ============================================================================
// Stack
// ============================================================================

/// The value stack; the last element is the top
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Remove and return the top value
    pub fn pop(&mut self) -> ExecResult<Value> {
        self.values
            .pop()
            .ok_or_else(|| ExecError::new(ExecErrorKind::EmptyStack))
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate from bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Bottom-to-top view of the stack
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl From<Vec<Value>> for Stack {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

// ============================================================================
// Context
// ============================================================================

/// Script execution context
#[derive(Debug)]
pub struct Context {
    vars: HashMap<String, Value>,
    stack: Stack,
    commands: CommandRegistry,
}

impl Context {
    /// Create a context with the standard commands plus `extra_groups`
    pub fn new(extra_groups: Vec<CommandGroup>) -> std::result::Result<Self, RegistryError> {
        debug!("Creating context with {} extra command groups", extra_groups.len());
        Ok(Self::with_registry(CommandRegistry::with_extra(extra_groups)?))
    }

    /// Create a context around an already built registry
    pub fn with_registry(commands: CommandRegistry) -> Self {
        Self {
            vars: HashMap::new(),
            stack: Stack::new(),
            commands,
        }
    }

    /// Parse and run `source`
    pub fn execute(&mut self, source: &str) -> Result<()> {
        let program = grpl::parse(source)?;
        debug!("Executing program of {} statements", program.len());
        self.exec(&program)?;
        Ok(())
    }

    /// Run statements in order, stopping at the first error
    ///
    /// An error leaving a statement is tagged with that statement's location
    /// unless a nested statement already tagged it.
    pub fn exec(&mut self, statements: &[Statement]) -> ExecResult<()> {
        for stmt in statements {
            self.exec_statement(stmt)
                .map_err(|e| e.with_trace(stmt.location()))?;
        }
        Ok(())
    }

    fn exec_statement(&mut self, stmt: &Statement) -> ExecResult<()> {
        match stmt {
            Statement::Literal { value, .. } => {
                self.stack.push(value.clone());
            }
            Statement::LoadVar { name, .. } => {
                let value = self.get_var(name)?;
                self.stack.push(value);
            }
            Statement::StoreVar { name, .. } => {
                let value = self.stack.pop()?;
                self.vars.insert(name.clone(), value);
            }
            Statement::Command { name, .. } => {
                let command = self
                    .commands
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ExecError::new(ExecErrorKind::UnknownCommand(name.clone())))?;
                trace!("Running command {}", name);
                command.exec(self)?;
            }
            Statement::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    if self.test_condition(&branch.cond)? {
                        return self.exec(&branch.body);
                    }
                }
                if let Some(body) = else_body {
                    self.exec(body)?;
                }
            }
            Statement::While { cond, body } => {
                while self.test_condition(cond)? {
                    self.exec(body)?;
                }
            }
            Statement::Function { name, body, .. } => {
                let function = Value::Function(Arc::clone(body));
                match name {
                    Some(name) => {
                        self.vars.insert(name.clone(), function);
                    }
                    None => self.stack.push(function),
                }
            }
            Statement::Call { name, .. } => {
                let function = match name {
                    Some(name) => self.get_var(name)?,
                    None => self.stack.pop()?,
                };
                let body = function.into_function_or_err()?;
                self.exec(&body)?;
            }
        }
        Ok(())
    }

    /// Run a condition block and pop the bool it leaves behind
    fn test_condition(&mut self, cond: &[Statement]) -> ExecResult<bool> {
        self.exec(cond)?;
        self.stack
            .pop()
            .and_then(|v| v.as_bool_or_err())
            .map_err(|e| e.with_trace(cond.last().and_then(Statement::location)))
    }

    /// Pop the top of the stack
    pub fn pop(&mut self) -> ExecResult<Value> {
        self.stack.pop()
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.stack.push(value.into());
    }

    /// Look up a variable, failing if it was never stored
    pub fn get_var(&self, name: &str) -> ExecResult<Value> {
        self.vars
            .get(name)
            .cloned()
            .ok_or_else(|| ExecError::new(ExecErrorKind::UndefinedName(name.to_string())))
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn vars(&self) -> &HashMap<String, Value> {
        &self.vars
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Rebuild a context from a snapshot; see [`SaveData::restore`]
    pub fn from_save_data(
        data: SaveData,
        extra_groups: Vec<CommandGroup>,
    ) -> std::result::Result<Self, RegistryError> {
        data.restore(extra_groups)
    }

    /// Snapshot the variables and stack
    pub fn save_data(&self) -> SaveData {
        SaveData {
            vars: self.vars.clone(),
            stack: self.stack.values().to_vec(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::with_registry(CommandRegistry::standard())
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Serializable snapshot of a context's state
///
/// Commands are not saved; the host supplies its groups again on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    #[serde(default)]
    pub vars: HashMap<String, Value>,

    /// Bottom-to-top
    #[serde(default)]
    pub stack: Vec<Value>,
}

impl SaveData {
    /// Rebuild a context from this snapshot with the standard commands plus
    /// `extra_groups`
    pub fn restore(
        self,
        extra_groups: Vec<CommandGroup>,
    ) -> std::result::Result<Context, RegistryError> {
        debug!(
            "Restoring context with {} vars and {} stack values",
            self.vars.len(),
            self.stack.len()
        );
        let mut ctx = Context::new(extra_groups)?;
        ctx.vars = self.vars;
        ctx.stack = Stack::from(self.stack);
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptError;

    fn run(source: &str) -> Context {
        let mut ctx = Context::default();
        ctx.execute(source).unwrap();
        ctx
    }

    fn stack_of(source: &str) -> Vec<Value> {
        run(source).stack().values().to_vec()
    }

    fn exec_err(source: &str) -> ExecError {
        let mut ctx = Context::default();
        match ctx.execute(source) {
            Err(ScriptError::Exec(e)) => e,
            other => panic!("expected execution error, got {:?}", other),
        }
    }

    #[test]
    fn test_stack_pop_empty() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop().unwrap_err().kind, ExecErrorKind::EmptyStack);
        stack.push(Value::Int(1));
        assert_eq!(stack.peek(), Some(&Value::Int(1)));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_variables() {
        let ctx = run("5 >x <x <x");
        assert_eq!(ctx.stack().values(), &[Value::Int(5), Value::Int(5)]);
        assert_eq!(ctx.vars().get("x"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_undefined_variable() {
        let err = exec_err("<nope");
        assert_eq!(err.kind, ExecErrorKind::UndefinedName("nope".into()));
        assert_eq!(err.trace().unwrap().text(), "<nope");
    }

    #[test]
    fn test_if_chain_takes_first_true() {
        assert_eq!(
            stack_of("if false then 1 elif true then 2 elif true then 3 else 4 end"),
            vec![Value::Int(2)]
        );
        assert_eq!(stack_of("if false then 1 else 4 end"), vec![Value::Int(4)]);
        assert!(stack_of("if false then 1 end").is_empty());
    }

    #[test]
    fn test_if_condition_must_be_bool() {
        let err = exec_err("if 1 then 2 end");
        assert!(matches!(err.kind, ExecErrorKind::Type { .. }));
        assert_eq!(err.trace().unwrap().text(), "1");
    }

    #[test]
    fn test_while_counts_down() {
        let ctx = run("3 >n while <n 0 gt do <n <n 1 sub >n end");
        assert_eq!(
            ctx.stack().values(),
            &[Value::Int(3), Value::Int(2), Value::Int(1)]
        );
    }

    #[test]
    fn test_functions() {
        assert_eq!(stack_of("fun 42 end @"), vec![Value::Int(42)]);
        assert_eq!(stack_of("fun@f 1 2 add end @f @f"), vec![Value::Int(3), Value::Int(3)]);

        let ctx = run("fun@f end");
        assert!(ctx.stack().is_empty());
        assert_eq!(ctx.vars().get("f").map(Value::value_type), Some(crate::ValueType::Function));
    }

    #[test]
    fn test_call_non_function() {
        let err = exec_err("1 >f @f");
        assert!(matches!(err.kind, ExecErrorKind::Type { .. }));
        assert_eq!(err.trace().unwrap().text(), "@f");
    }

    #[test]
    fn test_innermost_location_wins() {
        let err = exec_err("fun@f\n  1 nosuch\nend\n@f");
        assert_eq!(err.kind, ExecErrorKind::UnknownCommand("nosuch".into()));
        let trace = err.trace().unwrap();
        assert_eq!(trace.text(), "nosuch");
        assert_eq!(trace.line_number(), 2);
    }

    #[test]
    fn test_failed_program_keeps_partial_state() {
        let mut ctx = Context::default();
        assert!(ctx.execute("1 2 >a nosuch 3").is_err());
        assert_eq!(ctx.stack().values(), &[Value::Int(1)]);
        assert_eq!(ctx.vars().get("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_parse_error_runs_nothing() {
        let mut ctx = Context::default();
        let err = ctx.execute("1 2 end").unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
        assert!(ctx.stack().is_empty());
    }

    #[test]
    fn test_save_and_restore() {
        let ctx = run("1 \"two\" 3.5 >x fun@f 1 end");
        let data = ctx.save_data();
        assert_eq!(data.stack, vec![Value::Int(1), Value::String("two".into())]);

        let mut restored = data.restore(Vec::new()).unwrap();
        restored.execute("<x @f").unwrap();
        assert_eq!(
            restored.stack().values(),
            &[
                Value::Int(1),
                Value::String("two".into()),
                Value::Float(3.5),
                Value::Int(1),
            ]
        );
    }
}
