use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE: &str = "sprouts.log";

/// Keeps the background log writer alive; flushes on drop.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// `RUST_LOG` wins over the configured level.
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to a daily file under `log_dir`. The terminal belongs to the quiz
/// screen, so nothing is written to stdout or stderr. If the directory cannot
/// be created, logging stays off for the run.
pub fn init_tracing(log_level: &str, log_dir: &Path) -> Option<FileLogGuard> {
    let filter = env_filter(log_level);

    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!(
            "logging disabled: cannot create {}: {err}",
            log_dir.display()
        );
        return None;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    Some(FileLogGuard { _guard: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_log_dir_disables_logging() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        assert!(init_tracing("info", &blocker.join("logs")).is_none());
    }
}
