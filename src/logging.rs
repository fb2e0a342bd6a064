//! Structured JSONL logging plus human-readable stderr output.
//!
//! - **JSONL to file** (`~/.kiwa/logs/kiwa.jsonl`) - structured, one object per line
//! - **Compact to stderr** - for developers running from a terminal
//!
//! # Usage
//!
//! ```rust,ignore
//! use kiwa::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init();
//!
//! tracing::info!(event_type = "app_lifecycle", "Application started");
//! logging::log("HOTKEY", "Registered ⌥ ⇧ D");
//! ```

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "kiwa.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
/// If the log file cannot be opened only the stderr layer is installed.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_path();
    eprintln!("[KIWA] JSONL log: {}", log_path.display());

    // Environment filter - default to info, allow override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (json_writer, file_guard) = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            // Non-blocking writer keeps file I/O off the UI thread
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            (None, None)
        }
    };

    build_subscriber(env_filter, json_writer).init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Application logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Registry with the optional JSONL file layer and the compact stderr layer.
fn build_subscriber(
    env_filter: EnvFilter,
    json_writer: Option<NonBlocking>,
) -> impl Subscriber + Send + Sync + 'static {
    let json_layer = json_writer.map(|writer| {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .with_span_events(FmtSpan::NONE)
    });

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
}

/// Get the log directory path (~/.kiwa/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".kiwa").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("kiwa-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

/// Category-tagged info log.
///
/// Prefer tracing macros directly when there are structured fields to attach.
pub fn log(category: &str, message: &str) {
    tracing::info!(category = category, "{}", message);
}

/// Log a routed keyboard event with structured fields
pub fn log_key_event(key_code: u16, modifiers: &str, action: &str) {
    tracing::debug!(
        event_type = "key_event",
        key_code = key_code,
        modifiers = modifiers,
        action = action,
        "Key 0x{:02X} -> {}",
        key_code,
        action
    );
}

/// Log an error with structured fields and context
pub fn log_error(category: &str, error: &str, context: Option<&str>) {
    let msg = match context {
        Some(ctx) => format!("{}: {} (context: {})", category, error, ctx),
        None => format!("{}: {}", category, error),
    };

    tracing::error!(
        event_type = "error",
        category = category,
        error_message = error,
        context = context,
        "{}",
        msg
    );
}
