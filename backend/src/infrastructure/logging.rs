use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::any::Any;
use std::backtrace::Backtrace;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::infrastructure::config::AppConfig;

pub struct LoggingRuntime {
    _guard: WorkerGuard,
    pub log_file: PathBuf,
}

pub fn init_logging(config: &AppConfig) -> Result<LoggingRuntime> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log dir: {}", config.log_dir.display()))?;
    let log_file = config.log_file();
    if rotate_stale_log(&log_file, config.log_retention_days)? {
        eprintln!("removed stale log file {}", log_file.display());
    }

    let (file_writer, guard) = create_non_blocking_writer(&config.log_dir, &config.log_file_name);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    install_panic_hook();

    Ok(LoggingRuntime {
        _guard: guard,
        log_file,
    })
}

/// Deletes the log file when it was last written more than `retention_days` ago.
pub fn rotate_stale_log(log_file: &Path, retention_days: u16) -> Result<bool> {
    rotate_stale_log_at(log_file, retention_days, Utc::now())
}

pub fn rotate_stale_log_at(log_file: &Path, retention_days: u16, now: DateTime<Utc>) -> Result<bool> {
    let metadata = match std::fs::metadata(log_file) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(false),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to stat log file: {}", log_file.display()))
        }
    };
    let modified: DateTime<Utc> = metadata
        .modified()
        .with_context(|| format!("failed to read mtime: {}", log_file.display()))?
        .into();

    if now - modified <= ChronoDuration::days(retention_days.max(1) as i64) {
        return Ok(false);
    }
    std::fs::remove_file(log_file)
        .with_context(|| format!("failed to remove stale log file: {}", log_file.display()))?;
    Ok(true)
}

/// Routes panics into the log sink with their location and a backtrace.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = panic_message(info.payload());
        let backtrace = Backtrace::force_capture();
        tracing::error!(
            location = %location,
            panic = %message,
            backtrace = %backtrace,
            "panic captured"
        );
    }));
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn create_non_blocking_writer(log_dir: &Path, file_name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::never(log_dir, file_name);
    tracing_appender::non_blocking(appender)
}
