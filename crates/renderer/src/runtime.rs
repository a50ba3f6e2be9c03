use std::time::{Duration, Instant};

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed seconds since the loop started.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Decides when the next redraw should be requested.
///
/// Without a cap every display refresh renders a frame; with a cap the loop
/// sleeps until `last_render + 1/fps`. Caps whose period does not fit in a
/// `Duration` are treated as uncapped.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    frame_interval: Option<Duration>,
    last_render: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(target_fps: Option<f32>) -> Self {
        let frame_interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .and_then(|fps| Duration::try_from_secs_f32(1.0 / fps).ok());
        Self {
            frame_interval,
            last_render: None,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (self.frame_interval, self.last_render) {
            (Some(interval), Some(last)) => last
                .checked_add(interval)
                .is_some_and(|deadline| now >= deadline),
            _ => true,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.frame_interval, self.last_render) {
            (Some(interval), Some(last)) => last.checked_add(interval),
            _ => None,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_render = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_time_source_is_non_decreasing() {
        let mut source = SystemTimeSource::new();
        let mut last = source.sample();
        for _ in 0..100 {
            let next = source.sample();
            assert!(next.seconds >= last.seconds);
            assert_eq!(next.frame_index, last.frame_index + 1);
            last = next;
        }
    }

    #[test]
    fn uncapped_scheduler_is_always_ready() {
        let mut scheduler = FrameScheduler::new(None);
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert!(scheduler.next_deadline().is_none());
    }

    #[test]
    fn capped_scheduler_waits_for_frame_interval() {
        let mut scheduler = FrameScheduler::new(Some(4.0));
        let start = Instant::now();
        assert!(scheduler.ready_for_frame(start));
        scheduler.mark_rendered(start);
        assert!(!scheduler.ready_for_frame(start + Duration::from_millis(100)));
        assert!(scheduler.ready_for_frame(start + Duration::from_millis(250)));
        assert_eq!(
            scheduler.next_deadline(),
            Some(start + Duration::from_millis(250))
        );
    }

    #[test]
    fn unusable_caps_mean_uncapped() {
        let now = Instant::now();
        for fps in [0.0, -5.0, f32::NAN, f32::INFINITY, 1e-30] {
            let mut scheduler = FrameScheduler::new(Some(fps));
            scheduler.mark_rendered(now);
            assert!(scheduler.ready_for_frame(now), "fps {fps}");
            assert!(scheduler.next_deadline().is_none(), "fps {fps}");
        }
    }
}
