//! Append-only event log shared by every component that writes to it.
//!
//! Lines have the shape `<timestamp> <LEVEL> <message>`. Each line is handed to the
//! background writer in a single write, so concurrent callers never interleave bytes.

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

/// ISO 8601 timestamp with a numeric UTC offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Cloneable handle to the log file.
///
/// The [`WorkerGuard`] returned alongside the sink owns the background writer;
/// dropping it flushes everything written so far.
#[derive(Clone)]
pub struct LogSink {
    writer: NonBlocking,
}

impl LogSink {
    /// Open (or create) the log file at `path` in append mode.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<(Self, WorkerGuard)> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file))
    }

    /// Wrap an arbitrary writer. Lines are never dropped, writers block instead.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> (Self, WorkerGuard) {
        let (writer, guard) = NonBlockingBuilder::default().lossy(false).finish(writer);
        (Self { writer }, guard)
    }

    /// Append one event and mirror it to the diagnostic subscriber.
    pub fn write(&self, level: Level, message: &str) -> io::Result<()> {
        match level {
            Level::ERROR => tracing::error!("{}", message),
            Level::WARN => tracing::warn!("{}", message),
            Level::INFO => tracing::info!("{}", message),
            Level::DEBUG => tracing::debug!("{}", message),
            _ => tracing::trace!("{}", message),
        }

        let line = format_line(&Local::now(), level, message);
        let mut writer = self.writer.clone();
        writer.write_all(line.as_bytes())
    }

    pub fn info(&self, message: &str) -> io::Result<()> {
        self.write(Level::INFO, message)
    }

    pub fn warn(&self, message: &str) -> io::Result<()> {
        self.write(Level::WARN, message)
    }

    pub fn error(&self, message: &str) -> io::Result<()> {
        self.write(Level::ERROR, message)
    }
}

fn format_line<Tz>(time: &DateTime<Tz>, level: Level, message: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{} {} {}\n", time.format(TIMESTAMP_FORMAT), level, message)
}
