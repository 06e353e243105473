//! Logging initialization

use anyhow::{Context, Result};
use lockdown_core::config::LoggingConfig;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::{Args, LogFormat};

/// Initialize logging from CLI arguments, falling back to the config file
///
/// The returned guard flushes the log file on drop and must be held until
/// exit.
pub fn init(args: &Args, config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => config.level.parse().unwrap_or(Level::INFO),
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let format = match args.log_format {
        LogFormat::Text if config.json_format => LogFormat::Json,
        other => other,
    };

    let (file_writer, guard) = match args.log_file.as_deref().or(config.file.as_deref()) {
        Some(path) => {
            let (writer, guard) = open_log_file(Path::new(path))?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // Console output goes to stderr so command output stays pipeable
    match format {
        LogFormat::Text => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(args.verbose >= 2)
                    .with_thread_ids(args.verbose >= 3)
                    .with_file(args.verbose >= 3)
                    .with_line_number(args.verbose >= 3),
            );

            if let Some(writer) = file_writer {
                subscriber
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .init();
            } else {
                subscriber.init();
            }
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr));

            if let Some(writer) = file_writer {
                subscriber
                    .with(fmt::layer().json().with_writer(writer))
                    .init();
            } else {
                subscriber.init();
            }
        }
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr));

            if let Some(writer) = file_writer {
                subscriber
                    .with(fmt::layer().compact().with_ansi(false).with_writer(writer))
                    .init();
            } else {
                subscriber.init();
            }
        }
    }

    Ok(guard)
}

fn open_log_file(path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    Ok(tracing_appender::non_blocking(file))
}
