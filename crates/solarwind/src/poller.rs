use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info, warn};

use crate::cell::ControlCell;
use crate::error::PollError;
use crate::sample::{latest_sample, SpeedRange, WindSample};
use crate::source::SampleSource;

/// Fixed delay between fetch cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Receives the outcome of every fetch cycle.
pub trait PollObserver: Send {
    fn on_update(&self, sample: &WindSample, value: f32);
    fn on_failure(&self, error: &PollError);
}

/// Observer that reports cycles through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PollObserver for TracingObserver {
    fn on_update(&self, sample: &WindSample, value: f32) {
        match sample.observed_at {
            Some(observed_at) => info!(
                speed = sample.speed,
                %observed_at,
                control = value,
                "solar wind sample applied"
            ),
            None => info!(speed = sample.speed, control = value, "solar wind sample applied"),
        }
    }

    fn on_failure(&self, error: &PollError) {
        warn!(%error, "solar wind fetch failed; keeping previous control value");
    }
}

/// Result of a successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub sample: WindSample,
    pub value: f32,
}

/// Runs one fetch-and-normalize cycle.
///
/// On success the normalized value is written into `cell`. On failure the cell
/// is left untouched; either way the observer hears about it before this
/// returns.
pub fn poll_once(
    source: &dyn SampleSource,
    range: &SpeedRange,
    cell: &ControlCell,
    observer: &dyn PollObserver,
) -> Result<Reading, PollError> {
    let outcome = source.fetch().and_then(|body| latest_sample(&body));
    match outcome {
        Ok(sample) => {
            let value = range.normalize(sample.speed);
            cell.set(value);
            observer.on_update(&sample, value);
            Ok(Reading { sample, value })
        }
        Err(err) => {
            observer.on_failure(&err);
            Err(err)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub range: SpeedRange,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            range: SpeedRange::default(),
        }
    }
}

/// Cancellable handle for the background polling task.
///
/// Dropping the handle cancels the task as well.
pub struct PollerHandle {
    shutdown: Option<Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true)
    }

    /// Stops the task at its next wait and joins the worker thread.
    ///
    /// A request already in flight is allowed to complete first.
    pub fn cancel(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Disconnecting the channel wakes the worker out of `recv_deadline`.
        self.shutdown.take();
        if let Some(handle) = self.join_handle.take() {
            if handle.join().is_err() {
                error!("solar wind poller thread panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Starts polling on a background thread: one cycle immediately, then one
/// every `config.interval` until the returned handle is cancelled.
pub fn spawn_poller<S, O>(
    source: S,
    observer: O,
    cell: ControlCell,
    config: PollerConfig,
) -> std::io::Result<PollerHandle>
where
    S: SampleSource + 'static,
    O: PollObserver + 'static,
{
    let (shutdown_tx, shutdown_rx) = bounded(0);
    let join_handle = thread::Builder::new()
        .name("solarwind-poller".into())
        .spawn(move || run_poller(&source, &observer, &cell, config, shutdown_rx))?;

    Ok(PollerHandle {
        shutdown: Some(shutdown_tx),
        join_handle: Some(join_handle),
    })
}

fn run_poller(
    source: &dyn SampleSource,
    observer: &dyn PollObserver,
    cell: &ControlCell,
    config: PollerConfig,
    shutdown: Receiver<()>,
) {
    debug!(interval_s = config.interval.as_secs_f64(), "solar wind poller started");
    let mut next_cycle = Instant::now();
    loop {
        // Failures were already reported to the observer.
        let _ = poll_once(source, &config.range, cell, observer);

        let Some(deadline) = next_deadline(next_cycle, Instant::now(), config.interval) else {
            warn!(
                interval_s = config.interval.as_secs_f64(),
                "poll interval is beyond the clock's range; no further cycles"
            );
            // Blocks until the handle disconnects the channel.
            let _ = shutdown.recv();
            break;
        };
        next_cycle = deadline;

        match shutdown.recv_deadline(next_cycle) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("solar wind poller stopped");
}

/// Next cycle start, one interval after the previous one. A cycle that overran
/// is rescheduled from `now`. Returns `None` when the clock cannot represent it.
fn next_deadline(previous: Instant, now: Instant, interval: Duration) -> Option<Instant> {
    match previous.checked_add(interval) {
        Some(deadline) if deadline > now => Some(deadline),
        _ => now.checked_add(interval),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    struct StaticSource(Result<&'static str, ()>);

    impl SampleSource for StaticSource {
        fn fetch(&self) -> Result<String, PollError> {
            match self.0 {
                Ok(body) => Ok(body.to_string()),
                Err(()) => Err(PollError::EmptySeries),
            }
        }
    }

    #[derive(Clone, Default)]
    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl SampleSource for CountingSource {
        fn fetch(&self) -> Result<String, PollError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(r#"[["2024-05-01 12:00:00.000","1.0","525"]]"#.to_string())
        }
    }

    /// Fails on the first call, then serves a fixed payload.
    #[derive(Clone, Default)]
    struct FlakySource {
        calls: Arc<AtomicUsize>,
    }

    impl SampleSource for FlakySource {
        fn fetch(&self) -> Result<String, PollError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(PollError::EmptySeries)
            } else {
                Ok(r#"[["2024-05-01 12:00:00.000","1.0","800"]]"#.to_string())
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingObserver {
        updates: Arc<Mutex<Vec<f32>>>,
        failures: Arc<Mutex<Vec<String>>>,
    }

    impl PollObserver for RecordingObserver {
        fn on_update(&self, _sample: &WindSample, value: f32) {
            self.updates.lock().unwrap().push(value);
        }

        fn on_failure(&self, error: &PollError) {
            self.failures.lock().unwrap().push(error.to_string());
        }
    }

    #[test]
    fn successful_cycle_overwrites_cell() {
        let cell = ControlCell::default();
        let observer = RecordingObserver::default();
        let source = StaticSource(Ok(r#"[["t1","1","300"],["t2","1","500"]]"#));

        let reading =
            poll_once(&source, &SpeedRange::default(), &cell, &observer).expect("reading");

        assert!((reading.value - 0.4545).abs() < 1e-3);
        assert_eq!(cell.get(), reading.value);
        assert_eq!(observer.updates.lock().unwrap().as_slice(), &[reading.value]);
    }

    #[test]
    fn failed_cycles_leave_cell_untouched() {
        let cell = ControlCell::new(0.8);
        let observer = RecordingObserver::default();

        for source in [
            StaticSource(Err(())),
            StaticSource(Ok("{ definitely not json")),
            StaticSource(Ok(r#"[["t","1","fast"]]"#)),
        ] {
            let before = cell.get();
            assert!(poll_once(&source, &SpeedRange::default(), &cell, &observer).is_err());
            assert_eq!(cell.get(), before);
        }

        assert_eq!(observer.failures.lock().unwrap().len(), 3);
        assert!(observer.updates.lock().unwrap().is_empty());
    }

    #[test]
    fn default_value_holds_until_first_success() {
        let cell = ControlCell::default();
        let _ = poll_once(
            &StaticSource(Err(())),
            &SpeedRange::default(),
            &cell,
            &TracingObserver,
        );
        assert_eq!(cell.get(), 0.5);
    }

    #[test]
    fn first_cycle_runs_immediately_and_cancel_is_prompt() {
        let source = CountingSource::default();
        let calls = source.calls.clone();
        let cell = ControlCell::default();
        let config = PollerConfig {
            interval: Duration::from_secs(3600),
            ..PollerConfig::default()
        };

        let handle =
            spawn_poller(source, TracingObserver, cell.clone(), config).expect("spawn poller");
        let started = Instant::now();
        handle.cancel();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!((cell.get() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn repeats_on_the_configured_interval() {
        let source = CountingSource::default();
        let calls = source.calls.clone();
        let config = PollerConfig {
            interval: Duration::from_millis(10),
            ..PollerConfig::default()
        };

        let handle = spawn_poller(source, RecordingObserver::default(), ControlCell::default(), config)
            .expect("spawn poller");
        thread::sleep(Duration::from_millis(200));
        assert!(!handle.is_finished());
        drop(handle);

        let after_stop = calls.load(Ordering::SeqCst);
        assert!(after_stop >= 3, "expected several cycles, saw {after_stop}");
        thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn keeps_polling_after_a_failed_cycle() {
        let source = FlakySource::default();
        let calls = source.calls.clone();
        let observer = RecordingObserver::default();
        let cell = ControlCell::new(0.3);
        let config = PollerConfig {
            interval: Duration::from_millis(10),
            ..PollerConfig::default()
        };

        let handle =
            spawn_poller(source, observer.clone(), cell.clone(), config).expect("spawn poller");
        let started = Instant::now();
        while observer.updates.lock().unwrap().is_empty()
            && started.elapsed() < Duration::from_secs(5)
        {
            thread::sleep(Duration::from_millis(5));
        }
        handle.cancel();

        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(observer.failures.lock().unwrap().len(), 1);
        let updates = observer.updates.lock().unwrap();
        assert!(!updates.is_empty());
        assert!(updates.iter().all(|value| *value == 1.0));
        assert_eq!(cell.get(), 1.0);
    }

    #[test]
    fn unrepresentable_interval_stops_scheduling_without_panicking() {
        let source = CountingSource::default();
        let calls = source.calls.clone();
        let config = PollerConfig {
            interval: Duration::MAX,
            ..PollerConfig::default()
        };

        let handle = spawn_poller(source, TracingObserver, ControlCell::default(), config)
            .expect("spawn poller");
        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());
        handle.cancel();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn next_deadline_tracks_previous_cycle() {
        let start = Instant::now();
        let interval = Duration::from_secs(300);

        assert_eq!(next_deadline(start, start, interval), Some(start + interval));
        let late = start + Duration::from_secs(400);
        assert_eq!(next_deadline(start, late, interval), Some(late + interval));
        assert_eq!(next_deadline(start, start, Duration::MAX), None);
    }
}
