//! Minimal structured logging for the daily-loop core.
//!
//! Provides the [`dlog!`] macro producing lines in the format:
//!
//! ```text
//! 20260826T08:00:12.000 - src/notify.rs:91 - reminder fired for 2026-08-26
//! ```
//!
//! Output goes to stderr by default. [`set_writer`] redirects it (tests
//! capture log output through an in-memory buffer); installing a writer also
//! disables ANSI colour, which is otherwise enabled when stderr is a
//! terminal.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};

use chrono::Local;

static COLOUR_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_WRITER: LazyLock<Mutex<Box<dyn Write + Send>>> =
    LazyLock::new(|| Mutex::new(Box::new(io::stderr())));

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

/// Initialize logging. Call once at startup; detects terminal colour support.
pub fn init() {
    COLOUR_ENABLED.store(io::stderr().is_terminal(), Ordering::Relaxed);
}

/// Replace the log writer. All subsequent [`dlog!`] output goes to `w`.
pub fn set_writer(w: Box<dyn Write + Send>) {
    COLOUR_ENABLED.store(false, Ordering::Relaxed);
    *LOG_WRITER.lock().unwrap() = w;
}

/// Write a single log line. Called by [`dlog!`]; not intended for direct use.
pub fn emit(file: &str, line: u32, msg: &str) {
    let ts = Local::now().format("%Y%m%dT%H:%M:%S%.3f");
    let formatted = if COLOUR_ENABLED.load(Ordering::Relaxed) {
        format!("{DIM}{ts}{RESET} {DIM}{file}:{line}{RESET} {msg}")
    } else {
        format!("{ts} - {file}:{line} - {msg}")
    };
    let mut writer = LOG_WRITER.lock().unwrap();
    let _ = writeln!(*writer, "{formatted}");
}

/// Emit a log line with timestamp and source location.
///
/// ```ignore
/// dlog!("initialized {} log(s) for {}", created, day);
/// ```
#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {{
        $crate::logging::emit(file!(), line!(), &format!($($arg)*));
    }};
}
