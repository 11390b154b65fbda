//! Command implementations behind the CLI.

use std::path::Path;
use std::time::Duration;

use crate::config::{Config, Target};
use crate::error::{Error, Result};
use crate::probe::{HttpProber, PROBE_TIMEOUT};
use crate::record::{LogSink, Recorder};
use crate::report::{generate_report, Report};
use crate::scheduler::Scheduler;

/// Load the config and probe every target until the process is stopped.
pub async fn start<P: AsRef<Path>>(config_path: P, sink: &LogSink) -> Result<()> {
    let config = Config::load(config_path).await?;
    let prober = HttpProber::new(PROBE_TIMEOUT)?;

    let scheduler = Scheduler::new(prober, Recorder::new(sink.clone()));
    scheduler.run(config.targets()).await?;

    Ok(())
}

/// Whole seconds from `--interval`. Non-numeric input and zero count as absent.
fn parse_interval_secs(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|&secs| secs != 0)
}

/// Append a target to the config. Both arguments are required; nothing is
/// written when either is missing.
pub async fn add<P: AsRef<Path>>(
    config_path: P,
    url: Option<&str>,
    interval: Option<&str>,
    sink: &LogSink,
) -> Result<Target> {
    let (Some(url), Some(secs)) = (url, interval.and_then(parse_interval_secs)) else {
        return Err(Error::MissingArgument);
    };

    // Negative intervals clamp to the minimum like any other short one.
    let requested = Duration::from_secs(secs.max(0) as u64);

    let path = config_path.as_ref();
    let mut config = Config::load(path).await?;
    let target = config.add_target(url, requested);
    config.save(path).await?;

    sink.info(&format!(
        "Added {} with interval {}s",
        target.url,
        target.interval.as_secs_f64()
    ))?;

    Ok(target)
}

/// Print a summary of the log and append it to the same log.
///
/// A log that cannot be read is reported as an error line, not a failure.
pub async fn report<P: AsRef<Path>>(log_path: P, sink: &LogSink) -> Result<Option<Report>> {
    match generate_report(log_path).await {
        Ok(report) => {
            let text = report.to_string();
            println!("{}", text);
            sink.info(&text)?;
            Ok(Some(report))
        }
        Err(e) => {
            sink.error(&format!("Failed to generate report: {}", e))?;
            Ok(None)
        }
    }
}
