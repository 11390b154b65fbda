//! Scheduler module for running probes on a fixed interval per target.

mod interval;

pub use interval::*;

use crate::config::Target;
use crate::probe::Probe;
use crate::record::Recorder;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Scheduler error types.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("No URLs configured. Add URLs using \"choque add --url <url> --interval <seconds>\".")]
    NoTargets,
}

/// Runs one independent probe loop per target.
pub struct Scheduler<P> {
    prober: Arc<P>,
    recorder: Recorder,
}

impl<P: Probe + 'static> Scheduler<P> {
    pub fn new(prober: P, recorder: Recorder) -> Self {
        Self {
            prober: Arc::new(prober),
            recorder,
        }
    }

    /// Arm a probe loop for every target and return their handles.
    ///
    /// Nothing is armed when `targets` is empty.
    pub fn start(&self, targets: Vec<Target>) -> Result<Vec<JoinHandle<()>>, ScheduleError> {
        if targets.is_empty() {
            return Err(ScheduleError::NoTargets);
        }

        tracing::info!("Starting scheduler with {} targets", targets.len());

        Ok(targets.into_iter().map(|t| self.add_target(t)).collect())
    }

    /// Start monitoring a single target.
    pub fn add_target(&self, target: Target) -> JoinHandle<()> {
        let interval = validate_interval(target.interval);

        let message = format!(
            "Starting pings for {} every {}s",
            target.url,
            interval.as_secs_f64()
        );
        if let Err(e) = self.recorder.sink().info(&message) {
            tracing::error!("Failed to log start of {}: {}", target.url, e);
        }

        tokio::spawn(run_probe_loop(
            target.url,
            interval,
            self.prober.clone(),
            self.recorder.clone(),
        ))
    }

    /// Start every target and wait on the loops, which only end if a task panics.
    pub async fn run(&self, targets: Vec<Target>) -> Result<(), ScheduleError> {
        let handles = self.start(targets)?;

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Probe loop terminated: {}", e);
            }
        }

        Ok(())
    }
}

/// Run the probe loop for a single target.
///
/// Every tick spawns its own probe task, so a slow probe never delays the next
/// tick. Overlapping probes for the same URL are allowed and reported.
async fn run_probe_loop<P: Probe + 'static>(
    url: String,
    period: Duration,
    prober: Arc<P>,
    recorder: Recorder,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let in_flight = Arc::new(AtomicUsize::new(0));

    loop {
        interval.tick().await;

        let running = in_flight.fetch_add(1, Ordering::SeqCst);
        if running > 0 {
            let message = format!(
                "Previous probe for {} still running ({} in flight), probing again",
                url, running
            );
            if let Err(e) = recorder.sink().warn(&message) {
                tracing::error!("Failed to log overlap for {}: {}", url, e);
            }
        }

        let url = url.clone();
        let prober = prober.clone();
        let recorder = recorder.clone();
        let in_flight = in_flight.clone();

        tokio::spawn(async move {
            let result = prober.probe(&url).await;

            if let Err(e) = recorder.record(&result) {
                tracing::error!("Failed to record result for {}: {}", url, e);
            }

            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ProbeError, ProbeResult};
    use crate::record::LogSink;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    /// Probe whose behavior depends on the host: `down` fails, `hang` never returns.
    #[derive(Default)]
    struct FakeProbe {
        calls: Arc<Mutex<HashMap<String, usize>>>,
    }

    #[async_trait]
    impl Probe for FakeProbe {
        async fn probe(&self, url: &str) -> ProbeResult {
            {
                let mut calls = self.calls.lock().unwrap();
                *calls.entry(url.to_string()).or_default() += 1;
            }

            if url.contains("hang") {
                std::future::pending::<()>().await;
            }
            if url.contains("down") {
                let err = ProbeError::Network("connection refused".to_string());
                return ProbeResult::failure(url, &err, Utc::now());
            }
            ProbeResult::success(url, 200, Duration::from_millis(42), Utc::now())
        }
    }

    fn target(url: &str, secs: u64) -> Target {
        Target {
            url: url.to_string(),
            interval: Duration::from_secs(secs),
        }
    }

    fn count(calls: &Arc<Mutex<HashMap<String, usize>>>, url: &str) -> usize {
        calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn lines_containing(path: &Path, needle: &str) -> usize {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|l| l.contains(needle))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_targets_arm_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("choque.log");
        let (sink, guard) = LogSink::open(&path).unwrap();
        let probe = FakeProbe::default();
        let calls = probe.calls.clone();
        let scheduler = Scheduler::new(probe, Recorder::new(sink));

        let result = scheduler.start(Vec::new());
        assert!(matches!(result, Err(ScheduleError::NoTargets)));

        time::sleep(Duration::from_secs(3600)).await;
        assert!(calls.lock().unwrap().is_empty());

        drop(scheduler);
        drop(guard);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_probe_after_one_interval() {
        let dir = tempfile::tempdir().unwrap();
        let (sink, _guard) = LogSink::open(dir.path().join("choque.log")).unwrap();
        let probe = FakeProbe::default();
        let calls = probe.calls.clone();
        let scheduler = Scheduler::new(probe, Recorder::new(sink));

        let handles = scheduler.start(vec![target("http://up.example", 60)]).unwrap();

        time::sleep(Duration::from_secs(59)).await;
        assert_eq!(count(&calls, "http://up.example"), 0);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count(&calls, "http://up.example"), 1);

        for h in handles {
            h.abort();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("choque.log");
        let (sink, guard) = LogSink::open(&path).unwrap();
        let probe = FakeProbe::default();
        let calls = probe.calls.clone();
        let scheduler = Scheduler::new(probe, Recorder::new(sink));

        let handles = scheduler.start(vec![target("http://up.example", 1)]).unwrap();

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count(&calls, "http://up.example"), 0);

        for h in handles {
            h.abort();
        }
        drop(scheduler);
        drop(guard);
        assert_eq!(lines_containing(&path, "Starting pings for http://up.example every 60s"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_targets_fire_independently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("choque.log");
        let (sink, guard) = LogSink::open(&path).unwrap();
        let probe = FakeProbe::default();
        let calls = probe.calls.clone();
        let scheduler = Scheduler::new(probe, Recorder::new(sink));

        let handles = scheduler
            .start(vec![
                target("http://down.example", 60),
                target("http://up.example", 90),
            ])
            .unwrap();

        time::sleep(Duration::from_secs(185)).await;
        for h in handles {
            h.abort();
        }

        // down fires at 60/120/180, up at 90/180
        assert_eq!(count(&calls, "http://down.example"), 3);
        assert_eq!(count(&calls, "http://up.example"), 2);

        drop(scheduler);
        drop(guard);
        assert_eq!(lines_containing(&path, "INFO [http://down.example] FAILED - -"), 3);
        assert_eq!(lines_containing(&path, "INFO [http://up.example] SUCCESS 200 42ms"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_probe_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("choque.log");
        let (sink, guard) = LogSink::open(&path).unwrap();
        let probe = FakeProbe::default();
        let calls = probe.calls.clone();
        let scheduler = Scheduler::new(probe, Recorder::new(sink));

        let handles = scheduler
            .start(vec![
                target("http://hang.example", 60),
                target("http://up.example", 60),
            ])
            .unwrap();

        time::sleep(Duration::from_secs(185)).await;
        for h in handles {
            h.abort();
        }

        // Overlapping firings for the hung target still happen.
        assert_eq!(count(&calls, "http://hang.example"), 3);
        assert_eq!(count(&calls, "http://up.example"), 3);

        drop(scheduler);
        drop(guard);
        assert_eq!(lines_containing(&path, "[http://up.example] SUCCESS"), 3);
        assert_eq!(lines_containing(&path, "[http://hang.example]"), 0);
        assert_eq!(
            lines_containing(&path, "WARN Previous probe for http://hang.example still running"),
            2
        );
        assert_eq!(lines_containing(&path, "Previous probe for http://up.example"), 0);
    }
}
