//! Summary report computed by rescanning the event log.
//!
//! Probe lines are recognised by plain substring matching: a line counts when it
//! carries the `INFO` level and a `SUCCESS` or `FAILED` marker. Response times are
//! every `<digits>ms` token on those lines.

use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

use crate::probe::Outcome;

/// Report error types.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read log {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

/// Aggregate statistics over every probe line in the log.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub period: NaiveDate,
    pub total_pings: usize,
    pub successes: usize,
    pub failures: usize,
    /// Mean response time rounded to two decimals, `None` when no times were logged.
    pub average_response_time_ms: Option<f64>,
}

fn response_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)ms").unwrap())
}

impl Report {
    /// Scan full log contents and summarize them under `period`.
    pub fn from_log(contents: &str, period: NaiveDate) -> Self {
        let success = Outcome::Success.marker();
        let failure = Outcome::Failure.marker();

        let lines: Vec<&str> = contents
            .lines()
            .filter(|line| line.contains("INFO") && (line.contains(success) || line.contains(failure)))
            .collect();

        let successes = lines.iter().filter(|l| l.contains(success)).count();
        let failures = lines.iter().filter(|l| l.contains(failure)).count();

        let re = response_time_regex();
        let times: Vec<u64> = lines
            .iter()
            .flat_map(|line| re.captures_iter(*line))
            .filter_map(|caps| caps[1].parse().ok())
            .collect();

        let average_response_time_ms = if times.is_empty() {
            None
        } else {
            let mean = times.iter().map(|&t| t as f64).sum::<f64>() / times.len() as f64;
            Some((mean * 100.0).round() / 100.0)
        };

        Self {
            period,
            total_pings: lines.len(),
            successes,
            failures,
            average_response_time_ms,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Choque Report ({}) ---", self.period.format("%Y-%m-%d"))?;
        writeln!(f, "Total Pings: {}", self.total_pings)?;
        writeln!(f, "Successes: {}", self.successes)?;
        writeln!(f, "Failures: {}", self.failures)?;
        match self.average_response_time_ms {
            Some(avg) => write!(f, "Average Response Time: {:.2}ms", avg),
            None => write!(f, "Average Response Time: N/A"),
        }
    }
}

/// Read the log at `path` and summarize it under today's UTC date.
pub async fn generate_report<P: AsRef<Path>>(path: P) -> Result<Report, ReportError> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Report::from_log(&contents, Utc::now().date_naive()))
}
