//! High-resolution interval timing on a monotonic clock.

use quanta::Clock;
use std::time::Duration;

use crate::error::{TimingError, TimingResult};

/// Render a duration as seconds with nine fractional digits.
pub fn format_seconds(elapsed: Duration) -> String {
    format!("{}.{:09}", elapsed.as_secs(), elapsed.subsec_nanos())
}

/// A re-arming monotonic timer.
///
/// Marks are raw ticks from a [`quanta::Clock`], so wall-clock adjustments
/// never affect a reading. Every `end()` re-arms the timer at the end mark,
/// which makes consecutive calls measure back-to-back intervals.
///
/// # Example
///
/// ```rust
/// use timing::HighResolutionTimer;
///
/// let mut timer = HighResolutionTimer::new();
/// timer.start();
/// // ... work ...
/// let first = timer.end(true).unwrap();
/// // ... more work, measured from the previous end ...
/// let second = timer.bench().unwrap();
/// assert!(first.is_some());
/// assert!(second.contains('.'));
/// ```
#[derive(Debug, Clone)]
pub struct HighResolutionTimer {
    clock: Clock,
    start: Option<u64>,
    last: Option<Duration>,
}

impl HighResolutionTimer {
    /// Create an unarmed timer on the calibrated system clock.
    pub fn new() -> Self {
        Self::with_clock(Clock::new())
    }

    /// Create an unarmed timer on a specific clock (e.g. `Clock::mock()`).
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            start: None,
            last: None,
        }
    }

    /// Whether a start mark is set.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.start.is_some()
    }

    /// Arm the timer, discarding any unfinished mark.
    #[inline]
    pub fn start(&mut self) {
        self.start = Some(self.clock.raw());
    }

    /// Take the end mark and re-arm.
    ///
    /// Returns the rendered interval when `return_result` is set.
    pub fn end(&mut self, return_result: bool) -> TimingResult<Option<String>> {
        let start = self.start.ok_or(TimingError::MissingStart)?;
        let ended = self.clock.raw();
        let elapsed = Duration::from_nanos(self.clock.delta_as_nanos(start, ended));

        self.last = Some(elapsed);
        self.start = Some(ended);

        tracing::trace!(
            target: "timing::timer",
            elapsed = ?elapsed,
            "high resolution mark"
        );

        Ok(return_result.then(|| format_seconds(elapsed)))
    }

    /// The most recently completed interval, rendered.
    pub fn last_elapsed(&self) -> TimingResult<String> {
        self.last_duration()
            .map(format_seconds)
            .ok_or(TimingError::MissingEnd)
    }

    /// The most recently completed interval.
    #[inline]
    pub fn last_duration(&self) -> Option<Duration> {
        self.last
    }

    /// Arm if needed, then read the interval since the previous mark.
    pub fn bench(&mut self) -> TimingResult<String> {
        if !self.is_armed() {
            self.start();
        }
        self.end(true)?.ok_or(TimingError::MissingEnd)
    }
}

impl Default for HighResolutionTimer {
    fn default() -> Self {
        Self::new()
    }
}
