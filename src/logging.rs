// src/logging.rs

//! Log sink setup.
//!
//! Two sinks share one formatter (`2024-01-05 09:30:00,123 - INFO - message`):
//! the console at the configured level, and an append-mode file that always
//! records debug output. The subscriber is installed as the default for the
//! current thread only and is removed when the returned guard drops.

use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;

use chrono::Local;
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::error::{AppError, Result};
use crate::models::LoggingConfig;

/// Keeps the log subscriber installed while alive.
pub struct LogGuard {
    _default: tracing::dispatcher::DefaultGuard,
}

/// `timestamp - LEVEL - message` lines.
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Console level from config, raised to debug by `--verbose`.
fn console_level(config: &LoggingConfig, verbose: bool) -> LevelFilter {
    if verbose {
        return LevelFilter::DEBUG;
    }
    config.level.parse().unwrap_or(LevelFilter::INFO)
}

/// Build both sinks and install them for the current thread.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<LogGuard> {
    let console = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(std::io::stdout)
        .with_filter(console_level(config, verbose));

    let file = if config.file.trim().is_empty() {
        None
    } else {
        let path = config.file.trim();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| AppError::LogSink {
                path: path.to_string(),
                source,
            })?;
        Some(
            tracing_subscriber::fmt::layer()
                .event_format(LineFormat)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::DEBUG),
        )
    };

    let subscriber = tracing_subscriber::registry().with(console).with(file);
    let dispatch = Dispatch::new(subscriber);

    Ok(LogGuard {
        _default: tracing::dispatcher::set_default(&dispatch),
    })
}
