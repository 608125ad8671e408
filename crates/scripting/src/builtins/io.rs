//! Host IO commands
//!
//! The core has no terminal of its own. A host implements [`GrplIo`] and
//! registers the group returned by [`io_commands`] when building a context.

use super::{summary, Command, CommandGroup, CommandRegistry};
use crate::context::Context;
use crate::error::ExecResult;
use crate::value::Value;
use parking_lot::Mutex;
use std::sync::Arc;

/// Output sink for the `io` command group
pub trait GrplIo: Send + Sync {
    /// Write text to the terminal as-is
    fn print(&self, text: &str);

    /// Erase everything printed so far
    fn clear(&self);

    /// Write text followed by a newline
    fn println(&self, text: &str) {
        self.print(&format!("{}\n", text));
    }
}

/// Build the `io` command group around a host sink
pub fn io_commands(io: Arc<dyn GrplIo>) -> CommandGroup {
    let commands: Vec<Arc<dyn Command>> = vec![
        Arc::new(PrintCommand { io: io.clone() }),
        Arc::new(ClearCommand { io: io.clone() }),
        Arc::new(TraceCommand { io: io.clone() }),
        Arc::new(HelpCommand { io }),
    ];
    CommandGroup::with_commands(
        "io",
        "Commands for printing to the terminal and getting help",
        commands,
    )
}

struct PrintCommand {
    io: Arc<dyn GrplIo>,
}

impl Command for PrintCommand {
    fn name(&self) -> &str {
        "print"
    }

    fn help(&self) -> &str {
        "Pops a value off the top of the stack and prints it to the terminal."
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        let v = ctx.pop()?;
        self.io.println(&v.display_str());
        Ok(())
    }
}

struct ClearCommand {
    io: Arc<dyn GrplIo>,
}

impl Command for ClearCommand {
    fn name(&self) -> &str {
        "clear"
    }

    fn help(&self) -> &str {
        "Clears the terminal screen. The stack is left untouched."
    }

    fn exec(&self, _ctx: &mut Context) -> ExecResult<()> {
        self.io.clear();
        Ok(())
    }
}

struct TraceCommand {
    io: Arc<dyn GrplIo>,
}

impl Command for TraceCommand {
    fn name(&self) -> &str {
        "trace"
    }

    fn help(&self) -> &str {
        "Prints every value on the stack, bottom first, without removing any of them.\n\
         Strings are shown in quotes so they can be told apart from other values."
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        let line = if ctx.stack().is_empty() {
            "<empty stack>".to_string()
        } else {
            let items: Vec<String> = ctx.stack().iter().map(Value::repr).collect();
            items.join(" ")
        };
        self.io.println(&line);
        Ok(())
    }
}

struct HelpCommand {
    io: Arc<dyn GrplIo>,
}

impl HelpCommand {
    fn overview(registry: &CommandRegistry) -> String {
        let mut out = String::from("Command groups:");
        for group in registry.groups() {
            out.push_str(&format!("\n  {} - {}", group.name(), group.description()));
        }
        out.push_str(
            "\nUse `\"@group\" help` to list the commands in a group, \
             or `\"name\" help` to learn about one command.",
        );
        out
    }

    fn group_help(registry: &CommandRegistry, name: &str) -> String {
        let Some(group) = registry.group(name) else {
            return format!("There is no command group called {}.", name);
        };
        let mut out = format!("{} - {}", group.name(), group.description());
        for command in group.commands() {
            out.push_str(&format!("\n  {} - {}", command.name(), summary(command.as_ref())));
        }
        out
    }

    fn command_help(registry: &CommandRegistry, name: &str) -> String {
        match registry.get(name) {
            Some(command) => command.help().to_string(),
            None => format!("There is no command called {}.", name),
        }
    }
}

impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn help(&self) -> &str {
        "Prints help about commands.\n\
         With a string on top of the stack, pops it and prints the help for the command with \
         that name, or lists a group's commands if the string starts with @, as in \
         `\"@math\" help`.\n\
         Otherwise lists every command group."
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        let has_topic = matches!(ctx.stack().peek(), Some(Value::String(_)));
        let topic = if has_topic {
            Some(ctx.pop()?.into_string_or_err()?)
        } else {
            None
        };
        let registry = ctx.commands();
        let text = match topic.as_deref() {
            None => Self::overview(registry),
            Some(topic) => match topic.strip_prefix('@') {
                Some(group) => Self::group_help(registry, group),
                None => Self::command_help(registry, topic),
            },
        };
        self.io.println(&text);
        Ok(())
    }
}

/// In-memory [`GrplIo`] that collects everything printed
#[derive(Debug, Default)]
pub struct BufferedIo {
    buffer: Mutex<String>,
}

impl BufferedIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything printed since the last clear or take
    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }

    /// Return everything printed so far and empty the buffer
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.lock())
    }
}

impl GrplIo for BufferedIo {
    fn print(&self, text: &str) {
        self.buffer.lock().push_str(text);
    }

    fn clear(&self) {
        self.buffer.lock().clear();
    }
}
