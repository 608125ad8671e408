//! Terminal filesystem
//!
//! A flat store of named text files with no directories, plus the `fs`
//! command group that exposes it to programs.

use crate::io::SessionLink;
use greenstone_scripting::{
    parse, Command, CommandGroup, Context, ExecError, ExecErrorKind, ExecResult, Value,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

fn not_found(name: &str) -> ExecError {
    ExecError::new(ExecErrorKind::File(format!("File {} not found", name)))
}

/// Named text files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSystem {
    files: BTreeMap<String, String>,
}

impl FileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files(files: BTreeMap<String, String>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// File names in sorted order
    pub fn list(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// Read a whole file
    pub fn read(&self, name: &str) -> ExecResult<String> {
        self.files.get(name).cloned().ok_or_else(|| not_found(name))
    }

    /// Create or overwrite a file
    pub fn write(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(name.into(), content.into());
    }

    /// Delete a file. Deleting a missing file does nothing.
    pub fn remove(&mut self, name: &str) {
        self.files.remove(name);
    }

    /// Rename a file, replacing anything already called `new`
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> ExecResult<()> {
        let content = self.files.remove(old).ok_or_else(|| not_found(old))?;
        self.files.insert(new.into(), content);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Build the `fs` command group over a shared filesystem
///
/// Commands stop changing files once `link` is severed; reads keep working.
pub fn fs_commands(fs: Arc<Mutex<FileSystem>>, link: SessionLink) -> CommandGroup {
    let shared = FsShared { fs, link };
    let commands: Vec<Arc<dyn Command>> = vec![
        Arc::new(ListCommand(shared.clone())),
        Arc::new(RemoveCommand(shared.clone())),
        Arc::new(MoveCommand(shared.clone())),
        Arc::new(WriteCommand(shared.clone())),
        Arc::new(ReadCommand(shared.clone())),
        Arc::new(RunCommand(shared)),
    ];
    CommandGroup::with_commands("fs", "Commands for accessing the filesystem.", commands)
}

#[derive(Clone)]
struct FsShared {
    fs: Arc<Mutex<FileSystem>>,
    link: SessionLink,
}

impl FsShared {
    /// Apply a change unless the owning job was cut off
    fn modify<T>(&self, change: impl FnOnce(&mut FileSystem) -> ExecResult<T>) -> ExecResult<Option<T>> {
        let mut fs = self.fs.lock();
        if !self.link.is_live() {
            trace!("Ignoring filesystem change from a detached job");
            return Ok(None);
        }
        change(&mut fs).map(Some)
    }
}

fn pop_string(ctx: &mut Context) -> ExecResult<String> {
    ctx.pop()?.into_string_or_err()
}

struct ListCommand(FsShared);

impl Command for ListCommand {
    fn name(&self) -> &str {
        "ls"
    }

    fn help(&self) -> &str {
        "Pushes a list of all files on the computer."
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        let names = self.0.fs.lock().list();
        ctx.push(names.into_iter().map(Value::String).collect::<Vec<_>>());
        Ok(())
    }
}

struct RemoveCommand(FsShared);

impl Command for RemoveCommand {
    fn name(&self) -> &str {
        "rm"
    }

    fn help(&self) -> &str {
        "Pops a string off the stack and deletes the file with that name.\n\
         If the file does not exist, does nothing."
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        let name = pop_string(ctx)?;
        self.0.modify(|fs| {
            fs.remove(&name);
            Ok(())
        })?;
        Ok(())
    }
}

struct MoveCommand(FsShared);

impl Command for MoveCommand {
    fn name(&self) -> &str {
        "mv"
    }

    fn help(&self) -> &str {
        "Pops two strings and renames the file named by the lower one to the upper one.\n\
         Example: `\"foo\" \"bar\" mv` renames the file \"foo\" to \"bar\"."
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        let new = pop_string(ctx)?;
        let old = pop_string(ctx)?;
        self.0.modify(|fs| fs.rename(&old, new))?;
        Ok(())
    }
}

struct WriteCommand(FsShared);

impl Command for WriteCommand {
    fn name(&self) -> &str {
        "fwriteall"
    }

    fn help(&self) -> &str {
        "Pops a filename and a string, and writes the string to the file with that name.\n\
         An existing file is overwritten. A missing file is created.\n\
         Example: `\"hello\" \"\\\"hi\\\" print\" fwriteall`"
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        let content = pop_string(ctx)?;
        let name = pop_string(ctx)?;
        self.0.modify(|fs| {
            fs.write(name, content);
            Ok(())
        })?;
        Ok(())
    }
}

struct ReadCommand(FsShared);

impl Command for ReadCommand {
    fn name(&self) -> &str {
        "freadall"
    }

    fn help(&self) -> &str {
        "Pops a filename, reads that file and pushes its contents as a string."
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        let name = pop_string(ctx)?;
        let content = self.0.fs.lock().read(&name)?;
        ctx.push(content);
        Ok(())
    }
}

struct RunCommand(FsShared);

impl Command for RunCommand {
    fn name(&self) -> &str {
        "run"
    }

    fn help(&self) -> &str {
        "Pops a filename and runs the GRPL program stored in that file.\n\
         The program shares the stack and variables of the caller."
    }

    fn exec(&self, ctx: &mut Context) -> ExecResult<()> {
        let name = pop_string(ctx)?;
        // The lock is released before the program runs so it can use `fs` itself
        let source = self.0.fs.lock().read(&name)?;
        let program = parse(&source).map_err(|e| {
            ExecError::new(ExecErrorKind::File(format!(
                "File {} could not be parsed: {}",
                name, e.message
            )))
        })?;
        debug!("Running file {} ({} statements)", name, program.len());
        ctx.exec(&program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenstone_scripting::ScriptError;

    fn setup() -> (Arc<Mutex<FileSystem>>, SessionLink, Context) {
        let fs = Arc::new(Mutex::new(FileSystem::new()));
        let link = SessionLink::new();
        let ctx = Context::new(vec![fs_commands(fs.clone(), link.clone())]).unwrap();
        (fs, link, ctx)
    }

    fn file_error(err: &ExecError) -> &str {
        match err.kind() {
            ExecErrorKind::File(message) => message,
            other => panic!("expected a file error, got {:?}", other),
        }
    }

    #[test]
    fn test_filesystem_basics() {
        let mut fs = FileSystem::new();
        fs.write("b", "2");
        fs.write("a", "1");
        fs.write("b", "two");
        assert_eq!(fs.list(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(fs.read("b").unwrap(), "two");

        fs.rename("a", "b").unwrap();
        assert_eq!(fs.list(), vec!["b".to_string()]);
        assert_eq!(fs.read("b").unwrap(), "1");

        fs.remove("b");
        fs.remove("b");
        assert!(fs.is_empty());
    }

    #[test]
    fn test_missing_file_errors() {
        let mut fs = FileSystem::new();
        assert_eq!(file_error(&fs.read("nope").unwrap_err()), "File nope not found");
        assert_eq!(file_error(&fs.rename("nope", "x").unwrap_err()), "File nope not found");
    }

    #[test]
    fn test_write_read_and_list() {
        let (fs, _link, mut ctx) = setup();
        ctx.execute("\"b\" \"second\" fwriteall \"a\" \"first\" fwriteall ls \"a\" freadall")
            .unwrap();
        assert_eq!(
            ctx.stack().values(),
            &[
                Value::List(vec![Value::from("a"), Value::from("b")]),
                Value::from("first"),
            ]
        );
        assert_eq!(fs.lock().len(), 2);
    }

    #[test]
    fn test_mv_and_rm() {
        let (fs, _link, mut ctx) = setup();
        ctx.execute("\"foo\" \"x\" fwriteall \"foo\" \"bar\" mv").unwrap();
        assert_eq!(fs.lock().list(), vec!["bar".to_string()]);

        ctx.execute("\"bar\" rm \"missing\" rm").unwrap();
        assert!(fs.lock().is_empty());

        let err = ctx.execute("\"ghost\" \"x\" mv").unwrap_err();
        assert_eq!(
            err.pretty_message(),
            "Execution error: File ghost not found\n\"ghost\" \"x\" mv\n            ^^"
        );
    }

    #[test]
    fn test_freadall_missing() {
        let (_fs, _link, mut ctx) = setup();
        let err = ctx.execute("\"nope\" freadall").unwrap_err();
        assert!(err.pretty_message().starts_with("Execution error: File nope not found"));
    }

    #[test]
    fn test_run_shares_context() {
        let (fs, _link, mut ctx) = setup();
        fs.lock().write("double", "<n 2 mul >n");
        ctx.execute("21 >n \"double\" run <n").unwrap();
        assert_eq!(ctx.stack().values(), &[Value::Int(42)]);
    }

    #[test]
    fn test_run_nested_fs_access() {
        let (fs, _link, mut ctx) = setup();
        fs.lock().write("inner", "\"out\" \"done\" fwriteall");
        fs.lock().write("outer", "\"inner\" run \"out\" freadall");
        ctx.execute("\"outer\" run").unwrap();
        assert_eq!(ctx.stack().values(), &[Value::from("done")]);
    }

    #[test]
    fn test_run_parse_failure_is_file_error() {
        let (fs, _link, mut ctx) = setup();
        fs.lock().write("broken", "if true then");
        let err = match ctx.execute("\"broken\" run").unwrap_err() {
            ScriptError::Exec(e) => e,
            other => panic!("expected an execution error, got {:?}", other),
        };
        assert!(file_error(&err).starts_with("File broken could not be parsed: "));
    }

    #[test]
    fn test_detached_commands_leave_files_alone() {
        let (fs, link, mut ctx) = setup();
        fs.lock().write("keep", "1");
        link.sever();

        ctx.execute("\"keep\" rm \"new\" \"x\" fwriteall \"keep\" freadall").unwrap();
        assert_eq!(fs.lock().list(), vec!["keep".to_string()]);
        assert_eq!(ctx.stack().values(), &[Value::from("1")]);
    }
}
