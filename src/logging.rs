//! Tracing setup. The terminal belongs to the UI, so logs only go to a file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "MNEMO_LOG";
const DEFAULT_FILTER: &str = "info";

/// Keeps the background log writer alive; drop it last.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs a daily-rolling file subscriber under `log_dir`. Without a
/// usable directory, tracing stays uninstalled and events are discarded.
pub fn init_tracing(log_dir: Option<&Path>) -> Option<FileLogGuard> {
    let log_dir = log_dir?;
    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {}: {err}", log_dir.display());
        return None;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "mnemo.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    let installed = tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .try_init();
    if installed.is_err() {
        return None;
    }

    Some(FileLogGuard { _guard: guard })
}
