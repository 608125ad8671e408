//! Built-in commands for GRPL
//!
//! Commands are grouped by purpose. A [`CommandRegistry`] flattens the groups
//! into one name lookup while keeping them around for `help`.

pub mod basic;
pub mod io;
pub mod list;
pub mod math;
pub mod string;
pub mod types;

use crate::context::Context;
use crate::error::{ExecResult, RegistryError};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A named operation on a [`Context`]
pub trait Command: Send + Sync {
    fn name(&self) -> &str;

    /// Help text; the first line is used as the summary
    fn help(&self) -> &str;

    fn exec(&self, ctx: &mut Context) -> ExecResult<()>;
}

/// Signature of a stateless built-in command
pub type BuiltinFn = fn(&mut Context) -> ExecResult<()>;

/// A command backed by a plain function
#[derive(Clone, Copy)]
pub struct BuiltinCommand {
    name: &'static str,
    help: &'static str,
    run: BuiltinFn,
}

impl BuiltinCommand {
    pub const fn new(name: &'static str, help: &'static str, run: BuiltinFn) -> Self {
        Self { name, help, run }
    }
}

impl Command for BuiltinCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn help(&self) -> &str {
        self.help
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        (self.run)(ctx)
    }
}

/// First line of a command's help text
pub fn summary(command: &dyn Command) -> &str {
    command.help().lines().next().unwrap_or("")
}

// ============================================================================
// Command groups
// ============================================================================

/// A named, described set of commands
#[derive(Clone)]
pub struct CommandGroup {
    name: String,
    description: String,
    commands: Vec<Arc<dyn Command>>,
}

impl CommandGroup {
    /// Create an empty group
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            commands: Vec::new(),
        }
    }

    /// Create a group from an existing command list
    pub fn with_commands(
        name: impl Into<String>,
        description: impl Into<String>,
        commands: Vec<Arc<dyn Command>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            commands,
        }
    }

    /// Add a command to the group
    pub fn add(&mut self, command: Arc<dyn Command>) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Add a function-backed command to the group
    pub fn add_builtin(&mut self, name: &'static str, help: &'static str, run: BuiltinFn) -> &mut Self {
        self.add(Arc::new(BuiltinCommand::new(name, help, run)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn commands(&self) -> &[Arc<dyn Command>] {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.iter().find(|c| c.name() == name)
    }
}

impl fmt::Debug for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.commands.iter().map(|c| c.name()).collect();
        f.debug_struct("CommandGroup")
            .field("name", &self.name)
            .field("commands", &names)
            .finish()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// All command groups of a context plus a flat name index
#[derive(Clone)]
pub struct CommandRegistry {
    groups: Vec<CommandGroup>,
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Build a registry from `groups`
    ///
    /// Group names must be unique. When two groups define the same command
    /// name, the group listed later wins.
    pub fn new(groups: Vec<CommandGroup>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for group in &groups {
            if !seen.insert(group.name()) {
                return Err(RegistryError::DuplicateGroup(group.name().to_string()));
            }
        }
        Ok(Self::from_unique_groups(groups))
    }

    /// Registry with only the standard groups
    pub fn standard() -> Self {
        Self::from_unique_groups(default_groups())
    }

    /// Registry with the standard groups followed by `extra`
    pub fn with_extra(extra: Vec<CommandGroup>) -> Result<Self, RegistryError> {
        let mut groups = default_groups();
        groups.extend(extra);
        Self::new(groups)
    }

    fn from_unique_groups(groups: Vec<CommandGroup>) -> Self {
        let mut commands: HashMap<String, Arc<dyn Command>> = HashMap::new();
        for group in &groups {
            for command in group.commands() {
                if commands
                    .insert(command.name().to_string(), Arc::clone(command))
                    .is_some()
                {
                    debug!(
                        "Command {} redefined by group {}",
                        command.name(),
                        group.name()
                    );
                }
            }
        }
        Self { groups, commands }
    }

    /// Look up a command by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&CommandGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    /// Number of distinct command names
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("groups", &self.groups)
            .finish()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// The standard command groups every context gets
pub fn default_groups() -> Vec<CommandGroup> {
    vec![
        basic::group(),
        math::group(),
        list::group(),
        string::group(),
        types::group(),
    ]
}

/// Registry holding only the standard command groups
pub fn build_default_registry() -> CommandRegistry {
    CommandRegistry::standard()
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::context::Context;
    use crate::error::{ExecErrorKind, ScriptError};
    use crate::value::Value;

    /// Run `source` on a fresh context and return the final stack
    pub fn stack_after(source: &str) -> Vec<Value> {
        let mut ctx = Context::default();
        if let Err(e) = ctx.execute(source) {
            panic!("{} failed: {}", source, e);
        }
        ctx.stack().values().to_vec()
    }

    /// Run `source` and return the kind of the execution error it raises
    pub fn error_after(source: &str) -> ExecErrorKind {
        let mut ctx = Context::default();
        match ctx.execute(source) {
            Err(ScriptError::Exec(e)) => e.kind,
            other => panic!("{} should fail to execute, got {:?}", source, other),
        }
    }
}
