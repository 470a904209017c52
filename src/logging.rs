//! Structured JSONL logging plus human-readable stderr output.
//!
//! Dual-output logging:
//! - **JSONL to file** (~/.phrasekit/logs/phrasekit-config.jsonl) - structured,
//!   machine-parseable
//! - **Pretty to stderr** - human-readable for developers
//!
//! A third layer, `LogViewLayer`, mirrors info-and-above events into a small
//! in-memory ring buffer behind the window's log view (the "Show log" toggle
//! in the settings menu). Anything logged through the usual `tracing` macros
//! shows up there; there is no separate logging call to remember.
//!
//! # Usage
//!
//! ```rust,ignore
//! let _guard = phrasekit::logging::init();
//! tracing::info!(event_type = "window_open", "Configuration window opened");
//! ```

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static LOG_BUFFER: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();
const MAX_LOG_LINES: usize = 200;

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
/// Dropping the guard flushes remaining logs and closes the file.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join("phrasekit-config.jsonl");

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .unwrap_or_else(|e| {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            OpenOptions::new()
                .write(true)
                .open("/dev/null")
                .expect("Failed to open /dev/null")
        });

    // Non-blocking writer keeps slow disks off the event thread.
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

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
        .with(LogViewLayer)
        .init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Get the log directory path (~/.phrasekit/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".phrasekit").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("phrasekit-logs"))
}

/// Path to the JSONL log file.
pub fn log_path() -> PathBuf {
    get_log_dir().join("phrasekit-config.jsonl")
}

/// Tracing layer feeding the in-memory buffer behind the window's log view.
/// Keeps info, warn, and error events; debug/trace chatter stays out of the
/// UI.
pub struct LogViewLayer;

impl<S: Subscriber> Layer<S> for LogViewLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let level = *event.metadata().level();
        if level > Level::INFO {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        add_to_buffer(&level.to_string(), &visitor.line());
    }
}

/// Collects the `message` field plus any structured fields into one line.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn line(&self) -> String {
        if self.fields.is_empty() {
            self.message.clone()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

fn add_to_buffer(category: &str, message: &str) {
    let buffer = LOG_BUFFER.get_or_init(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));
    let mut buf = buffer.lock();
    if buf.len() >= MAX_LOG_LINES {
        buf.pop_front();
    }
    buf.push_back(format!("[{}] {}", category, message));
}

/// Recent log lines for the window's log view, oldest first.
pub fn recent_logs() -> Vec<String> {
    LOG_BUFFER
        .get()
        .map(|buffer| buffer.lock().iter().cloned().collect())
        .unwrap_or_default()
}
