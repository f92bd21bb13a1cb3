use std::cell::RefCell;
use std::io::{self, IsTerminal, Stdout, Write};

use tracing::warn;

/// Fire-and-forget user notification sink.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, title: &str, message: &str) {
        (**self).notify(title, message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Prints `title: message` on stdout, or on any writer via `with_writer`.
///
/// Write failures are logged and dropped; a notification never aborts the
/// action that raised it.
#[derive(Debug)]
pub struct ConsoleNotifier<W = Stdout> {
    color: bool,
    out: RefCell<W>,
}

impl ConsoleNotifier {
    pub fn new(color: bool) -> Self {
        Self::with_writer(color && io::stdout().is_terminal(), io::stdout())
    }
}

impl<W: Write> ConsoleNotifier<W> {
    pub fn with_writer(color: bool, out: W) -> Self {
        Self {
            color,
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> Notifier for ConsoleNotifier<W> {
    fn notify(&self, title: &str, message: &str) {
        let mut out = self.out.borrow_mut();
        let written = if self.color {
            writeln!(out, "\x1b[1m{title}\x1b[0m: {message}")
        } else {
            writeln!(out, "{title}: {message}")
        };

        if let Err(err) = written.and_then(|()| out.flush()) {
            warn!(error = %err, title, "failed to print notification");
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _title: &str, _message: &str) {}
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.sent.borrow_mut().push(Notification {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}
