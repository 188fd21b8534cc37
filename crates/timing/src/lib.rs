//! Wall-clock diffing and high-resolution timing
//!
//! This crate provides the two measurement engines used by bench sessions:
//! - A format registry with persistent defaults and per-call overrides
//! - A wall-clock engine converting between the serialized form
//!   (`1662625532.744800`) and rendered dates, and diffing rendered dates
//! - A re-arming high-resolution timer on a monotonic clock
//!
//! Wall-clock instants and monotonic ticks never mix: the wall clock is only
//! used for reporting, the monotonic clock only for intervals.
//!
//! # Example
//!
//! ```rust
//! use timing::{FormatOverrides, ManualWallClock, WallClockDiffEngine};
//! use chrono::{DateTime, TimeDelta};
//!
//! let start = DateTime::from_timestamp(1_662_625_532, 744_800_000).unwrap();
//! let clock = ManualWallClock::new(start + TimeDelta::seconds(1));
//! let engine = WallClockDiffEngine::new("1662625532.744800").with_clock(clock);
//!
//! let result = engine.diff_to_now(None, &FormatOverrides::none()).unwrap();
//! assert_eq!(result.took, "1.000000");
//! ```

mod clock;
mod error;
mod format;
mod interval;
mod timer;
mod wall_clock;

pub use clock::{ManualWallClock, SystemWallClock, WallClock};
pub use error::{ErrorKind, TimingError, TimingResult};
pub use format::{
    FormatOverrides, FormatRegistry, FormatSpec, ResolvedFormats, DATE_FORMAT, DIFF_FORMAT,
    EPOCH_FORMAT, MICROTIME_FORMAT,
};
pub use interval::Interval;
pub use timer::{format_seconds, HighResolutionTimer};
pub use wall_clock::{
    parse_instant, parse_zone, render_instant, DiffResult, Measurement,
    WallClockDiffEngine,
};

/// Re-export so callers can name zones and clocks without extra dependencies
pub use chrono_tz::Tz;
pub use quanta::{Clock as MonotonicClock, Mock as MonotonicMock};
