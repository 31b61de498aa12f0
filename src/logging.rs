//! File logging for interactive sessions
//!
//! The chat prompt shares the terminal with the user, so its logs go to a
//! file under `.threadvault/` instead of stderr.

use std::env;
use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directory, relative to the working directory, that holds log files
pub const LOG_DIR: &str = ".threadvault";

/// Send logs to `.threadvault/<file_name>` instead of the terminal, for
/// interactive sessions where log lines would interleave with the prompt.
pub fn setup_file_logging(file_name: &str) -> anyhow::Result<PathBuf> {
    let log_dir = env::current_dir()?.join(LOG_DIR);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, file_name);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(file_layer)
        .init();

    Ok(log_dir.join(file_name))
}
