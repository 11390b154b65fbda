//! Recording of probe outcomes into the shared log.

mod sink;

pub use sink::*;

use crate::probe::ProbeResult;
use std::io;

/// Writes one log line per probe result.
#[derive(Clone)]
pub struct Recorder {
    sink: LogSink,
}

impl Recorder {
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Append the result at INFO level. Write failures are returned, not retried.
    pub fn record(&self, result: &ProbeResult) -> io::Result<()> {
        self.sink.info(&format_record(result))
    }
}

/// Render a result as `[<url>] <MARKER> <status|-> <ms>ms|-[ [<error>]]`.
pub fn format_record(result: &ProbeResult) -> String {
    let status = result
        .status_code
        .map_or_else(|| "-".to_string(), |code| code.to_string());
    let response_time = result
        .response_time_ms
        .map_or_else(|| "-".to_string(), |ms| format!("{}ms", ms));

    let mut line = format!("[{}] {} {} {}", result.url, result.outcome, status, response_time);
    if let Some(error) = &result.error_message {
        line.push_str(&format!(" [{}]", error));
    }
    line
}
