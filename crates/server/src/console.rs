//! Console driver
//!
//! Screen events are written to stdout while a job runs. Ctrl-C interrupts
//! the running job, or leaves the console when no job is running.

use greenstone_storage::StateStore;
use greenstone_terminal::{JobOutcome, Terminal, TerminalEvent};
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};

/// Run one program and exit
pub async fn eval(mut terminal: Terminal, store: &StateStore, source: &str) -> anyhow::Result<ExitCode> {
    let mut events = terminal.subscribe();
    let outcome = run_line(&mut terminal, &mut events, source).await?;

    if terminal.config().autosave {
        save(&terminal, store);
    }

    Ok(if outcome.is_completed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Interactive loop over stdin
///
/// # Commands
/// - `:quit` leaves the console (as does end of input)
/// - `:save` writes the terminal state right away
///
/// Every other line runs as a GRPL program.
pub async fn repl(mut terminal: Terminal, store: &StateStore) -> anyhow::Result<ExitCode> {
    let mut events = terminal.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let logs = terminal.logs();
    if !logs.is_empty() {
        write_out(&logs);
    }

    loop {
        write_out(&terminal.config().prompt);

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                write_out("\n");
                None
            }
        };
        let Some(line) = line else {
            debug!("End of input");
            break;
        };

        match line.trim() {
            "" => continue,
            ":quit" => break,
            ":save" => {
                save(&terminal, store);
                continue;
            }
            _ => {}
        }

        run_line(&mut terminal, &mut events, &line).await?;
        if terminal.config().autosave {
            save(&terminal, store);
        }
    }

    save(&terminal, store);
    Ok(ExitCode::SUCCESS)
}

/// Run a line as a job, streaming output until it ends
async fn run_line(
    terminal: &mut Terminal,
    events: &mut UnboundedReceiver<TerminalEvent>,
    line: &str,
) -> anyhow::Result<JobOutcome> {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let job = terminal.run_job(line, interrupt);
    tokio::pin!(job);

    let outcome = loop {
        tokio::select! {
            outcome = &mut job => break outcome?,
            Some(event) = events.recv() => render(event),
        }
    };

    // Output queued right before the job ended
    while let Ok(event) = events.try_recv() {
        render(event);
    }

    Ok(outcome)
}

fn render(event: TerminalEvent) {
    match event {
        // The user already sees what they typed
        TerminalEvent::Echo(_) => {}
        TerminalEvent::Output(text) => write_out(&text),
        TerminalEvent::Cleared => write_out("\x1B[2J\x1B[H"),
    }
}

fn write_out(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

fn save(terminal: &Terminal, store: &StateStore) {
    match store.save(&terminal.save_data()) {
        Ok(()) => info!("Saved terminal state to {}", store.path().display()),
        Err(e) => error!("Failed to save terminal state: {}", e),
    }
}
