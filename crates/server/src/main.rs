//! Greenstone - GRPL computer terminal
//!
//! Console front end for a terminal session. Reads GRPL from stdin one line
//! at a time, or runs a single program given with `--eval`.

mod console;

use clap::Parser;
use greenstone_config::{TerminalConfig, DEFAULT_CONFIG_FILE};
use greenstone_storage::StateStore;
use greenstone_terminal::Terminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "greenstone")]
#[command(about = "Greenstone - a terminal that runs GRPL programs", long_about = None)]
struct Cli {
    /// Path to the options file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Path to the saved terminal state (overrides the options file)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Run this program once and exit instead of starting a console
    #[arg(long)]
    eval: Option<String>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let loaded = TerminalConfig::load_from_file(&cli.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => TerminalConfig::default(),
    };
    if let Some(state) = cli.state {
        config.state_file = state;
    }

    // Logs go to stderr so program output on stdout stays clean
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = loaded {
        warn!("{}; using default settings", e);
    }
    config.display();

    let store = StateStore::new(&config.state_file);
    let terminal = open_terminal(config, &store)?;

    // Interrupted jobs leave workers behind, so the runtime must not wait for
    // blocking tasks on the way out
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async {
        match cli.eval {
            Some(source) => console::eval(terminal, &store, &source).await,
            None => console::repl(terminal, &store).await,
        }
    });
    runtime.shutdown_background();

    info!("Goodbye");
    result
}

/// Load the saved terminal, or start a blank one
fn open_terminal(config: TerminalConfig, store: &StateStore) -> greenstone_core::Result<Terminal> {
    let terminal = match store.load()? {
        Some(data) => Terminal::from_save_data(config, data)?,
        None => {
            info!("Starting a fresh terminal");
            Terminal::new(config)?
        }
    };
    Ok(terminal)
}
