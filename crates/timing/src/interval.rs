//! Rendering of elapsed intervals between two wall-clock instants.
//!
//! Directives:
//!
//! | directive | meaning                                   |
//! |-----------|-------------------------------------------|
//! | `%T`      | total whole seconds                       |
//! | `%S`/`%s` | seconds component (0-59), padded/unpadded |
//! | `%I`/`%i` | minutes component, padded/unpadded        |
//! | `%H`/`%h` | hours component, padded/unpadded          |
//! | `%a`      | total whole days                          |
//! | `%F`/`%f` | microseconds, six digits/unpadded         |
//! | `%R`      | `+` or `-` for the direction              |
//! | `%r`      | `-` when reversed, empty otherwise        |
//! | `%%`      | literal `%`                               |

use chrono::TimeDelta;
use std::fmt::Write;

use crate::error::{TimingError, TimingResult};

/// Non-negative magnitude of an interval plus the direction it was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    seconds: u64,
    micros: u32,
    negative: bool,
}

impl Interval {
    /// Build an interval from a signed delta.
    pub fn from_delta(delta: TimeDelta) -> Self {
        let negative = delta < TimeDelta::zero();
        let magnitude = delta.abs();
        Self {
            seconds: magnitude.num_seconds().unsigned_abs(),
            micros: magnitude.subsec_nanos().unsigned_abs() / 1_000,
            negative,
        }
    }

    /// Total whole seconds.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Microsecond remainder.
    pub fn micros(&self) -> u32 {
        self.micros
    }

    /// Whether the end came before the start.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Render using the directive table in the module docs.
    pub fn format(&self, pattern: &str) -> TimingResult<String> {
        let mut out = String::with_capacity(pattern.len() + 8);
        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }

            let Some(directive) = chars.next() else {
                return Err(TimingError::pattern(pattern, "trailing '%'"));
            };

            let written = match directive {
                'T' => write!(out, "{}", self.seconds),
                'S' => write!(out, "{:02}", self.seconds % 60),
                's' => write!(out, "{}", self.seconds % 60),
                'I' => write!(out, "{:02}", (self.seconds / 60) % 60),
                'i' => write!(out, "{}", (self.seconds / 60) % 60),
                'H' => write!(out, "{:02}", (self.seconds / 3_600) % 24),
                'h' => write!(out, "{}", (self.seconds / 3_600) % 24),
                'a' => write!(out, "{}", self.seconds / 86_400),
                'F' => write!(out, "{:06}", self.micros),
                'f' => write!(out, "{}", self.micros),
                'R' => write!(out, "{}", if self.negative { '-' } else { '+' }),
                'r' => {
                    if self.negative {
                        out.push('-');
                    }
                    Ok(())
                }
                '%' => {
                    out.push('%');
                    Ok(())
                }
                other => {
                    return Err(TimingError::pattern(
                        pattern,
                        format!("unknown interval directive '%{other}'"),
                    ))
                }
            };
            written.map_err(|_| TimingError::pattern(pattern, "cannot render this interval"))?;
        }

        Ok(out)
    }
}
