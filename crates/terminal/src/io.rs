//! Terminal output
//!
//! Everything a terminal shows goes through its [`Screen`]: program output
//! from the `io` commands, echoed input and rendered errors. The screen keeps
//! the scrollback and forwards each change to an optional listener.

use crate::scrollback::Scrollback;
use greenstone_scripting::GrplIo;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// A change to the terminal screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Input line echoed before it runs, without the leading `>`
    Echo(String),
    /// Text printed by a program or by the terminal itself
    Output(String),
    /// The screen was wiped
    Cleared,
}

/// Connects one context's commands to the session
///
/// A job that was interrupted keeps running on its worker thread until it
/// finishes on its own. Severing its link stops it from touching the screen
/// or the filesystem in the meantime.
#[derive(Debug, Clone)]
pub struct SessionLink(Arc<AtomicBool>);

impl SessionLink {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn sever(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for SessionLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Scrollback plus listener of a terminal session
#[derive(Debug)]
pub struct Screen {
    scrollback: Mutex<Scrollback>,
    listener: Mutex<Option<UnboundedSender<TerminalEvent>>>,
}

impl Screen {
    pub fn new(scrollback: Scrollback) -> Self {
        Self {
            scrollback: Mutex::new(scrollback),
            listener: Mutex::new(None),
        }
    }

    /// Start forwarding screen events, replacing any previous listener
    pub fn subscribe(&self) -> UnboundedReceiver<TerminalEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.listener.lock() = Some(tx);
        rx
    }

    /// Append text to the scrollback
    pub fn print(&self, text: &str) {
        self.scrollback.lock().push(text);
        self.notify(TerminalEvent::Output(text.to_string()));
    }

    /// Append `>input` to the scrollback
    pub fn echo(&self, input: &str) {
        self.scrollback.lock().push(&format!(">{}\n", input));
        self.notify(TerminalEvent::Echo(input.to_string()));
    }

    pub fn clear(&self) {
        self.scrollback.lock().clear();
        self.notify(TerminalEvent::Cleared);
    }

    /// Copy of the scrollback text
    pub fn contents(&self) -> String {
        self.scrollback.lock().as_str().to_string()
    }

    /// Print on behalf of a job, dropping the text if the job was cut off
    fn print_linked(&self, link: &SessionLink, text: &str) {
        let mut scrollback = self.scrollback.lock();
        if !link.is_live() {
            return;
        }
        scrollback.push(text);
        drop(scrollback);
        self.notify(TerminalEvent::Output(text.to_string()));
    }

    fn clear_linked(&self, link: &SessionLink) {
        let mut scrollback = self.scrollback.lock();
        if !link.is_live() {
            return;
        }
        scrollback.clear();
        drop(scrollback);
        self.notify(TerminalEvent::Cleared);
    }

    /// Cut a job off from the screen
    ///
    /// Holds the scrollback lock so no output from the job can land after
    /// this returns.
    pub fn detach(&self, link: &SessionLink) {
        let _scrollback = self.scrollback.lock();
        link.sever();
    }

    fn notify(&self, event: TerminalEvent) {
        let mut listener = self.listener.lock();
        if let Some(tx) = listener.as_ref() {
            if tx.send(event).is_err() {
                debug!("Terminal listener went away");
                *listener = None;
            }
        }
    }
}

/// [`GrplIo`] implementation that writes to a terminal screen
pub struct TerminalIo {
    screen: Arc<Screen>,
    link: SessionLink,
}

impl TerminalIo {
    pub fn new(screen: Arc<Screen>, link: SessionLink) -> Self {
        Self { screen, link }
    }
}

impl GrplIo for TerminalIo {
    fn print(&self, text: &str) {
        self.screen.print_linked(&self.link, text);
    }

    fn clear(&self) {
        self.screen.clear_linked(&self.link);
    }
}
