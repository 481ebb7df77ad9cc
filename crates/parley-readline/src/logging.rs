//! Tracing setup for the REPL.
//!
//! Everything at the configured level goes to a daily-rolling file under the
//! logs directory. Only warnings and errors reach stderr so the conversation
//! stays readable.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "parley.log";

/// HTTP internals that are noisy at debug level.
const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls", "rustyline"];

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = String::from(log_level);
        for module in NOISY_MODULES {
            directives.push_str(&format!(",{module}=warn"));
        }
        EnvFilter::new(directives)
    })
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`. The returned guard flushes
/// the file writer on drop and must be held until exit.
pub fn init(log_level: &str, logs_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;
    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(build_filter(log_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    tracing::info!(log_level = %log_level, logs_dir = %logs_dir.display(), "Logging initialized");
    Ok(guard)
}
