//! Structured logging with box-drawing output.
//!
//! The clock logs in blocks: a block opens with `log_block_start!`, continues
//! with `log_decorated!` and `log_indented!`, and the process ends with
//! `log_end!`. Semantic macros (`log_info!`, `log_warning!`, `log_error!`,
//! `log_debug!`, `log_critical!`) carry a colored `[LEVEL]` tag.
//!
//! ```text
//! ┏ shabbat-clock v0.3.0 ━━╸
//! ┃
//! ┣ Loading configuration
//! ┃   Location: 43.8563°, -79.5085° (America/Toronto)
//! ┃
//! ┣ Shabbat Shalom
//! ┃   Shabbat Ends: 9:10 PM
//! ┣[WARNING] Calendar feed unavailable, using sunset times
//! ╹
//! ```
//!
//! Output goes to stdout, or to a file when `start_file_logging` is active
//! (ANSI colors are stripped there). `log_debug!` prints only after
//! `Log::set_debug(true)`.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Timezone of the clock, used for the timestamp prefix once set
static CLOCK_TIMEZONE: OnceLock<chrono_tz::Tz> = OnceLock::new();

// Channel for routing output to file when --log is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Global switches and helpers behind the logging macros.
pub struct Log;

impl Log {
    /// Enable or disable `log_debug!` output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with the wall time in the clock's timezone.
    ///
    /// Can only be set once per process.
    pub fn set_clock_timezone(tz: chrono_tz::Tz) {
        let _ = CLOCK_TIMEZONE.set(tz);
    }

    /// Start file logging to the specified path.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// `[HH:MM:SS] ` in the clock timezone, or an empty string when unset.
    pub fn get_timestamp_prefix() -> String {
        match CLOCK_TIMEZONE.get() {
            Some(tz) => {
                let now = chrono::Utc::now().with_timezone(tz);
                format!("[{}] ", now.format("%H:%M:%S"))
            }
            None => String::new(),
        }
    }
}

/// Guard for file logging that flushes and joins the writer thread on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Remove `ESC [ ... m` color sequences.
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Route formatted output to the log file or stdout (needed by the macros).
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Prefix each line of a pre-built body with the timestamp and emit it.
pub fn emit(lines: &[String]) {
    let prefix = Log::get_timestamp_prefix();
    let mut out = String::new();
    for line in lines {
        out.push_str(&prefix);
        out.push_str(line);
        out.push('\n');
    }
    write_output(&out);
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with {
    ($head:expr; $($arg:tt)+) => {{
        let message = format!($($arg)+);
        $crate::common::logger::emit(&[format!("{}{message}", $head)]);
    }};
}

/// Continue the current block with `┣ message`.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_with!("┣ "; $($arg)+) };
}

/// Nested detail line `┃   message`.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_with!("┃   "; $($arg)+) };
}

/// Empty `┃` spacer line.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::common::logger::emit(&["┃".to_string()])
    };
}

/// Open a new block: spacer line followed by `┣ message`.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => {{
        let message = format!($($arg)+);
        $crate::common::logger::emit(&["┃".to_string(), format!("┣ {message}")]);
    }};
}

/// Startup header `┏ shabbat-clock vX.Y.Z ━━╸`.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::common::logger::emit(&[format!(
            "┏ {} v{} ━━╸",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )])
    };
}

/// Final termination marker `╹`.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::common::logger::emit(&["╹".to_string()])
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_with!("┣[\x1b[32mINFO\x1b[0m] "; $($arg)+) };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_with!("┣[\x1b[33mWARNING\x1b[0m] "; $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_with!("┣[\x1b[31mERROR\x1b[0m] "; $($arg)+) };
}

/// Error that ends the process: spacer and a closing corner.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => {{
        let message = format!($($arg)+);
        $crate::common::logger::emit(&[
            "┃".to_string(),
            format!("┗[\x1b[31mERROR\x1b[0m] {message}"),
        ]);
    }};
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => { $crate::__log_with!("┣[\x1b[31mCRITICAL\x1b[0m] "; $($arg)+) };
}

/// Debug line, printed only when debug logging is on.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {{
        if $crate::common::logger::Log::is_debug() {
            $crate::__log_with!("┣[\x1b[32mDEBUG\x1b[0m] "; $($arg)+)
        }
    }};
}
