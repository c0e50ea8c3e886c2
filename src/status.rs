//! Progress reporting.
//!
//! The pipeline emits plain text lines while it works. Reporters only
//! observe them: nothing a reporter does changes the outcome of a run.

use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// A single status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Warning(String),
}

impl Status {
    pub fn message(&self) -> &str {
        match self {
            Self::Info(m) | Self::Warning(m) => m,
        }
    }
}

pub trait StatusReporter: Send + Sync {
    fn report(&self, line: &str);

    /// Something went wrong but the run goes on.
    fn warn(&self, line: &str) {
        self.report(line);
    }
}

/// Forwards every line to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, line: &str) {
        log::info!("{}", line);
    }

    fn warn(&self, line: &str) {
        log::warn!("{}", line);
    }
}

/// Sends every line over a channel, to be displayed by another thread.
///
/// Lines sent after the receiver is gone are dropped.
#[derive(Debug)]
pub struct ChannelReporter {
    tx: Mutex<Sender<Status>>,
}

impl ChannelReporter {
    pub fn new(tx: Sender<Status>) -> Self {
        Self { tx: Mutex::new(tx) }
    }

    fn send(&self, status: Status) {
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(status);
        }
    }
}

impl StatusReporter for ChannelReporter {
    fn report(&self, line: &str) {
        self.send(Status::Info(line.to_string()));
    }

    fn warn(&self, line: &str) {
        self.send(Status::Warning(line.to_string()));
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<Status>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<Status> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|s| match s {
                Status::Warning(m) => Some(m),
                Status::Info(_) => None,
            })
            .collect()
    }

    fn push(&self, status: Status) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(status);
        }
    }
}

impl StatusReporter for MemoryReporter {
    fn report(&self, line: &str) {
        self.push(Status::Info(line.to_string()));
    }

    fn warn(&self, line: &str) {
        self.push(Status::Warning(line.to_string()));
    }
}
