//! Logging and tracing initialization.
//!
//! Diagnostics never go to stdout: stdout is reserved for frame record
//! lines so it can be redirected straight into a log file.

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
pub fn init_logging(config: &LoggingConfig) {
    tracing::subscriber::set_global_default(build_subscriber(config)).ok();
}

/// Subscriber for `config`, writing to its file (appended) or to stderr.
pub fn build_subscriber(config: &LoggingConfig) -> Box<dyn Subscriber + Send + Sync> {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (writer, ansi) = match &config.file {
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => (BoxMakeWriter::new(Arc::new(file)), false),
            Err(e) => {
                eprintln!(
                    "Failed to open log file {}: {e}; logging to stderr",
                    path.display()
                );
                (BoxMakeWriter::new(std::io::stderr), true)
            }
        },
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    if config.json {
        Box::new(
            fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .json()
                .finish(),
        )
    } else {
        Box::new(
            fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    }
}
