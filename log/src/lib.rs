use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;

mod progress;

pub use progress::ProgressBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Notify,
    Warning,
    Error,
    Trace,
}

impl Level {
    fn color(self) -> &'static str {
        match self {
            Level::Notify => "\x1b[32m",
            Level::Warning => "\x1b[33m",
            Level::Error => "\x1b[31m",
            Level::Trace => "\x1b[90m",
        }
    }
}

#[macro_export]
macro_rules! notify {
    () => {};

    ($($arg:tt)*) => {{
        $crate::append(format!($($arg)*), $crate::Level::Notify);
    }};
}

#[macro_export]
macro_rules! warning {
    () => {};

    ($($arg:tt)*) => {{
        $crate::append(format!($($arg)*), $crate::Level::Warning);
    }};
}

/// Logs the error along with recent trace history and exits the process.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        $crate::append(format!($($arg)*), $crate::Level::Error);
        $crate::dump_history();
        std::process::exit(1)
    }};
}

#[macro_export]
macro_rules! trace {
    () => {};

    ($($arg:tt)*) => {{
        $crate::append(format!($($arg)*), $crate::Level::Trace);
    }};
}

pub static LOGGER: Lazy<Mutex<Logger<300>>> = Lazy::new(|| Mutex::new(Logger::new()));

pub static PROGRESS: ProgressBar = ProgressBar::new();

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Echo trace lines as they're logged instead of only keeping them in the history.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Record a line and print it to stderr unless it's a trace and we aren't verbose.
pub fn append(line: String, level: Level) {
    if level != Level::Trace || is_verbose() {
        eprintln!("{}{line}\x1b[0m", level.color());
    }

    LOGGER.lock().unwrap_or_else(PoisonError::into_inner).append(line, level);
}

/// Print trace lines that weren't echoed when they were logged.
pub fn dump_history() {
    if is_verbose() {
        return;
    }

    let logger = LOGGER.lock().unwrap_or_else(PoisonError::into_inner);
    let traces: Vec<&str> = logger
        .lines()
        .filter(|(_, level)| *level == Level::Trace)
        .map(|(line, _)| line.as_str())
        .collect();

    if traces.is_empty() {
        return;
    }

    eprintln!("{}recent history:", Level::Trace.color());
    for line in traces {
        eprintln!("  {line}");
    }
    eprint!("\x1b[0m");
}

pub struct Logger<const N: usize> {
    lines: [(String, Level); N],
    head: usize,
    len: usize,
}

impl<const N: usize> Logger<N> {
    pub fn new() -> Self {
        Self {
            lines: std::array::from_fn(|_| (String::new(), Level::Trace)),
            head: 0,
            len: 0,
        }
    }

    pub fn append(&mut self, line: String, level: Level) {
        self.lines[self.head] = (line, level);
        self.head = (self.head + 1) % N;
        self.len += 1;
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Lines in the order they were appended, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &(String, Level)> {
        let (a, b) = if self.len < N {
            (&self.lines[0..self.len], &[][..])
        } else {
            // wrapped around, so we need to return two slices
            let (a, b) = self.lines.split_at(self.head);
            (b, a)
        };

        a.iter().chain(b)
    }
}

impl<const N: usize> Default for Logger<N> {
    fn default() -> Self {
        Self::new()
    }
}
