//! Terminal session
//!
//! A [`Terminal`] owns one context and runs input lines against it as jobs.
//! Only one job runs at a time; [`Terminal::run_job`] moves the context onto a
//! blocking worker so the job can be interrupted.

use crate::error::Result;
use crate::fs::{fs_commands, FileSystem};
use crate::io::{Screen, SessionLink, TerminalEvent, TerminalIo};
use crate::scrollback::Scrollback;
use greenstone_config::TerminalConfig;
use greenstone_scripting::{
    io_commands, parse, CommandGroup, Context, ExecError, ParseError, SaveData,
    INTERRUPTED_MESSAGE,
};
use greenstone_storage::TerminalSaveData;
use parking_lot::{Mutex, MutexGuard};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};

/// How a job ended
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed,
    ExecFailed(ExecError),
    ParseFailed(ParseError),
    Interrupted,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed)
    }

    /// Text the terminal prints for this outcome, if any
    pub fn message(&self) -> Option<String> {
        match self {
            JobOutcome::Completed => None,
            JobOutcome::ExecFailed(e) => Some(e.pretty_message()),
            JobOutcome::ParseFailed(e) => Some(e.pretty_message()),
            JobOutcome::Interrupted => Some(INTERRUPTED_MESSAGE.to_string()),
        }
    }
}

/// Parse and run one input line
fn execute_input(ctx: &mut Context, input: &str) -> JobOutcome {
    let program = match parse(input) {
        Ok(program) => program,
        Err(e) => return JobOutcome::ParseFailed(e),
    };
    match ctx.exec(&program) {
        Ok(()) => JobOutcome::Completed,
        Err(e) => JobOutcome::ExecFailed(e),
    }
}

/// A computer terminal running GRPL
///
/// # Purpose
/// Ties a context to the screen and filesystem its `io` and `fs` commands
/// use, and renders job results the way the terminal shows them.
///
/// # Interruption
/// An interrupted job is abandoned, not stopped: its worker keeps running
/// until the program ends on its own. The terminal severs the job's
/// [`SessionLink`] so it can no longer print or change files, and carries on
/// with the state it had before the job started.
pub struct Terminal {
    config: TerminalConfig,
    screen: Arc<Screen>,
    files: Arc<Mutex<FileSystem>>,
    link: SessionLink,
    context: Context,
}

impl Terminal {
    /// Create a blank terminal
    pub fn new(config: TerminalConfig) -> Result<Self> {
        Self::from_save_data(config, TerminalSaveData::default())
    }

    /// Restore a terminal from its saved record
    ///
    /// # Arguments
    /// * `config` - Terminal settings; the scrollback limit applies to the restored logs
    /// * `data` - Saved logs, files and interpreter state
    pub fn from_save_data(config: TerminalConfig, data: TerminalSaveData) -> Result<Self> {
        let screen = Arc::new(Screen::new(Scrollback::with_text(
            data.logs,
            config.scrollback_limit,
        )));
        let files = Arc::new(Mutex::new(FileSystem::from_files(data.files)));
        let link = SessionLink::new();
        let context = data
            .context
            .restore(host_groups(&screen, &files, &link))?;

        info!(
            "Terminal ready ({} files, {} vars, {} stack values)",
            files.lock().len(),
            context.vars().len(),
            context.stack().len()
        );

        Ok(Self {
            config,
            screen,
            files,
            link,
            context,
        })
    }

    /// Snapshot everything needed to restore this terminal
    pub fn save_data(&self) -> TerminalSaveData {
        TerminalSaveData {
            logs: self.screen.contents(),
            files: self.files.lock().files().clone(),
            context: self.context.save_data(),
        }
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn filesystem(&self) -> MutexGuard<'_, FileSystem> {
        self.files.lock()
    }

    /// Current scrollback text
    pub fn logs(&self) -> String {
        self.screen.contents()
    }

    /// Receive every change to the screen from now on
    pub fn subscribe(&self) -> UnboundedReceiver<TerminalEvent> {
        self.screen.subscribe()
    }

    /// Run one input line on the calling thread
    pub fn run(&mut self, input: &str) -> JobOutcome {
        self.begin(input);
        let outcome = execute_input(&mut self.context, input);
        self.finish(&outcome);
        outcome
    }

    /// Run one input line on a blocking worker, racing it against `interrupt`
    ///
    /// # Behavior
    /// 1. Echoes the input and snapshots the context
    /// 2. Moves the context onto a `spawn_blocking` worker
    /// 3. If the worker finishes first, takes the context back
    /// 4. If `interrupt` resolves first, severs the worker from the session
    ///    and continues from the snapshot
    ///
    /// # Errors
    /// Fails only if the snapshot cannot be turned back into a context.
    pub async fn run_job<F>(&mut self, input: &str, interrupt: F) -> Result<JobOutcome>
    where
        F: Future,
    {
        self.begin(input);

        // Stands in while the worker owns the real context and becomes the
        // session context if the job is interrupted
        let standby_link = SessionLink::new();
        let standby = self
            .context
            .save_data()
            .restore(host_groups(&self.screen, &self.files, &standby_link))?;
        let mut ctx = std::mem::replace(&mut self.context, standby);

        let source = input.to_string();
        let worker = tokio::task::spawn_blocking(move || {
            let outcome = execute_input(&mut ctx, &source);
            (ctx, outcome)
        });

        let outcome = tokio::select! {
            joined = worker => match joined {
                Ok((ctx, outcome)) => {
                    self.context = ctx;
                    outcome
                }
                Err(e) => {
                    error!("Job worker failed: {}", e);
                    self.abandon(standby_link);
                    JobOutcome::Interrupted
                }
            },
            _ = interrupt => {
                info!("Interrupting job");
                self.abandon(standby_link);
                JobOutcome::Interrupted
            }
        };

        self.finish(&outcome);
        Ok(outcome)
    }

    /// Restore a saved context in place of the current one
    pub fn restore_context(&mut self, data: SaveData) -> Result<()> {
        let link = SessionLink::new();
        let context = data.restore(host_groups(&self.screen, &self.files, &link))?;
        self.screen.detach(&self.link);
        self.link = link;
        self.context = context;
        Ok(())
    }

    fn begin(&self, input: &str) {
        debug!("Running job: {}", input);
        if self.config.echo_input {
            self.screen.echo(input);
        }
    }

    /// Cut the running job off and switch to the standby context's link
    fn abandon(&mut self, standby_link: SessionLink) {
        self.screen.detach(&self.link);
        self.link = standby_link;
    }

    fn finish(&self, outcome: &JobOutcome) {
        match outcome.message() {
            Some(message) => {
                debug!("Job ended: {}", message);
                self.screen.print(&format!("{}\n", message));
            }
            None => debug!("Job completed"),
        }
    }
}

/// Command groups the terminal adds to every context it builds
fn host_groups(
    screen: &Arc<Screen>,
    files: &Arc<Mutex<FileSystem>>,
    link: &SessionLink,
) -> Vec<CommandGroup> {
    vec![
        io_commands(Arc::new(TerminalIo::new(screen.clone(), link.clone()))),
        fs_commands(files.clone(), link.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenstone_scripting::{ExecErrorKind, Value};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn terminal() -> Terminal {
        Terminal::new(TerminalConfig::default()).unwrap()
    }

    /// Run a future on a runtime that does not wait for abandoned workers
    fn block_on<F: Future>(future: F) -> F::Output {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let output = runtime.block_on(future);
        runtime.shutdown_background();
        output
    }

    #[test]
    fn test_run_prints_output() {
        let mut term = terminal();
        let outcome = term.run("\"hello\" print 1 2 add");
        assert!(outcome.is_completed());
        assert_eq!(term.logs(), ">\"hello\" print 1 2 add\nhello\n");
        assert_eq!(term.context().stack().values(), &[Value::Int(3)]);
    }

    #[test]
    fn test_run_reports_errors() {
        let mut term = terminal();

        let outcome = term.run("1 nosuch");
        assert!(matches!(
            &outcome,
            JobOutcome::ExecFailed(e) if matches!(e.kind(), ExecErrorKind::UnknownCommand(_))
        ));

        let outcome = term.run("if true");
        assert!(matches!(outcome, JobOutcome::ParseFailed(_)));

        let logs = term.logs();
        assert!(logs.contains(
            ">1 nosuch\nExecution error: There is no command called nosuch.\n1 nosuch\n  ^^^^^^\n"
        ));
        assert!(logs.contains(">if true\nParse Error: "));
    }

    #[test]
    fn test_echo_can_be_disabled() {
        let config = TerminalConfig {
            echo_input: false,
            ..TerminalConfig::default()
        };
        let mut term = Terminal::new(config).unwrap();
        term.run("42 print");
        assert_eq!(term.logs(), "42\n");
    }

    #[test]
    fn test_clear_wipes_scrollback() {
        let mut term = terminal();
        term.run("1 print");
        term.run("clear 2 print");
        assert_eq!(term.logs(), "2\n");
    }

    #[test]
    fn test_scrollback_limit_applies() {
        let config = TerminalConfig {
            scrollback_limit: 8,
            echo_input: false,
            ..TerminalConfig::default()
        };
        let mut term = Terminal::new(config).unwrap();
        term.run("\"abcdef\" print \"ghij\" print");
        assert_eq!(term.logs(), "ef\nghij\n");
    }

    #[test]
    fn test_save_and_restore() {
        let mut term = terminal();
        term.run("\"notes\" \"1 2 add\" fwriteall 5 >x fun@inc 1 add end 7");

        let data = term.save_data();
        assert_eq!(data.files.get("notes").map(String::as_str), Some("1 2 add"));

        let mut restored = Terminal::from_save_data(TerminalConfig::default(), data).unwrap();
        assert_eq!(restored.logs(), term.logs());

        restored.run("@inc \"notes\" run <x");
        assert_eq!(
            restored.context().stack().values(),
            &[Value::Int(8), Value::Int(3), Value::Int(5)]
        );
    }

    #[test]
    fn test_restore_context() {
        let mut term = terminal();
        term.run("1 2 3");
        term.restore_context(SaveData {
            vars: Default::default(),
            stack: vec![Value::from("fresh")],
        })
        .unwrap();
        term.run("print");
        assert!(term.logs().ends_with(">print\nfresh\n"));
        assert!(term.context().stack().is_empty());
    }

    #[test]
    fn test_subscribe_sees_output() {
        let mut term = terminal();
        let mut events = term.subscribe();
        term.run("\"x\" print");

        assert_eq!(events.try_recv().unwrap(), TerminalEvent::Echo("\"x\" print".to_string()));
        assert_eq!(events.try_recv().unwrap(), TerminalEvent::Output("x\n".to_string()));
    }

    #[test]
    fn test_job_completes() {
        let mut term = terminal();
        let outcome = block_on(async {
            term.run_job("3 >n fun@sq <n <n mul end @sq", std::future::pending::<()>())
                .await
                .unwrap()
        });
        assert!(outcome.is_completed());
        assert_eq!(term.context().stack().values(), &[Value::Int(9)]);

        // Commands still reach the session after the job
        term.run("\"after\" print");
        assert!(term.logs().ends_with("after\n"));
    }

    #[test]
    fn test_job_error_keeps_partial_state() {
        let mut term = terminal();
        let outcome = block_on(async {
            term.run_job("1 2 pop pop pop", std::future::pending::<()>())
                .await
                .unwrap()
        });
        assert!(matches!(outcome, JobOutcome::ExecFailed(_)));
        assert!(term.context().stack().is_empty());
        assert!(term.logs().contains("Execution error: Tried to pop empty stack"));
    }

    #[test]
    fn test_interrupt_restores_snapshot() {
        let mut term = terminal();
        term.run("1 >x 10");

        let outcome = block_on(async {
            let outcome = term
                .run_job(
                    "2 >x pop while true do \"spam\" print end",
                    tokio::time::sleep(Duration::from_millis(50)),
                )
                .await
                .unwrap();
            // Give the abandoned worker time to print if it still could
            tokio::time::sleep(Duration::from_millis(50)).await;
            outcome
        });

        assert!(matches!(outcome, JobOutcome::Interrupted));
        assert!(term.logs().ends_with("Program Interrupted\n"));
        assert_eq!(term.context().vars().get("x"), Some(&Value::Int(1)));
        assert_eq!(term.context().stack().values(), &[Value::Int(10)]);

        term.run("<x print");
        assert!(term.logs().ends_with("><x print\n1\n"));
    }

    #[test]
    fn test_interrupted_job_cannot_write_files() {
        let mut term = terminal();
        term.filesystem().write("keep", "yes");

        block_on(async {
            term.run_job(
                "while true do \"keep\" rm \"junk\" \"x\" fwriteall end",
                tokio::time::sleep(Duration::from_millis(20)),
            )
            .await
            .unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        });

        // Writes made before the interrupt stay; nothing lands afterwards
        term.filesystem().write("keep", "yes");
        term.filesystem().remove("junk");
        std::thread::sleep(Duration::from_millis(20));

        let mut expected = BTreeMap::new();
        expected.insert("keep".to_string(), "yes".to_string());
        assert_eq!(term.filesystem().files(), &expected);
    }
}
