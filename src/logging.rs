//! Tracing configuration and log routing.
//!
//! Console output goes to stdout for the HTTP server and to stderr for the one-shot
//! `process-event` binary, whose stdout carries the JSON result. Logs are also appended to
//! `RUSTY_DOC_LOG_FILE` when set, or to a daily file under `logs/` otherwise. The file writer is
//! non‑blocking so slow disks stay off the pipeline path.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "rusty-doc.log";

/// Stream receiving the human-readable console layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    /// Long-running server processes.
    Stdout,
    /// One-shot invocations that reserve stdout for their result.
    Stderr,
}

/// Configure tracing with a stdout console layer; see [`init_tracing_to`].
pub fn init_tracing() {
    init_tracing_to(ConsoleTarget::Stdout);
}

/// Configure tracing subscribers for the console and file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Installs a compact console layer and, when available, a file layer with targets.
/// - Uses a global guard to keep the non‑blocking writer alive for the process lifetime.
pub fn init_tracing_to(target: ConsoleTarget) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = match target {
        ConsoleTarget::Stdout => fmt::layer().with_target(false).compact().boxed(),
        ConsoleTarget::Stderr => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .boxed(),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(writer) = configure_file_writer() {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

/// Build a non‑blocking writer for file logging.
///
/// Returns `None` when the logs directory cannot be created or the target file cannot be opened.
fn configure_file_writer() -> Option<NonBlocking> {
    let writer = match std::env::var("RUSTY_DOC_LOG_FILE") {
        Ok(path) => match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            Ok(file) => tracing_appender::non_blocking(file),
            Err(err) => {
                eprintln!("Failed to open log file {path}: {err}");
                return None;
            }
        },
        Err(_) => {
            if let Err(err) = std::fs::create_dir_all(DEFAULT_LOG_DIR) {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            tracing_appender::non_blocking(tracing_appender::rolling::daily(
                DEFAULT_LOG_DIR,
                DEFAULT_LOG_FILE,
            ))
        }
    };

    let (non_blocking, guard) = writer;
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
