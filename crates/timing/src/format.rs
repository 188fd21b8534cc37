//! Format registry for serializing, rendering and diffing instants.

use serde::{Deserialize, Serialize};

/// Default serialized wall-clock form (`1662625532.744800`).
pub const MICROTIME_FORMAT: &str = "%s.%6f";

/// Epoch seconds with any number of fraction digits, or none (`1662625532.7448`).
pub const EPOCH_FORMAT: &str = "%s%.f";

/// Default human-readable form (`2022-09-08 08:25:32.744800`).
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Default interval form (`1.000000`).
pub const DIFF_FORMAT: &str = "%T.%F";

/// The three format strings used by the wall-clock engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatSpec {
    /// How a serialized instant is parsed
    pub from: String,
    /// How an instant is rendered
    pub to: String,
    /// How an interval is rendered
    pub diff: String,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            from: MICROTIME_FORMAT.to_string(),
            to: DATE_FORMAT.to_string(),
            diff: DIFF_FORMAT.to_string(),
        }
    }
}

/// Per-call format overrides. Fields left as `None` use the registry default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOverrides {
    pub from: Option<String>,
    pub to: Option<String>,
    pub diff: Option<String>,
}

impl FormatOverrides {
    /// Create overrides that change nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Override the parse format.
    pub fn with_from(mut self, format: impl Into<String>) -> Self {
        self.from = Some(format.into());
        self
    }

    /// Override the render format.
    pub fn with_to(mut self, format: impl Into<String>) -> Self {
        self.to = Some(format.into());
        self
    }

    /// Override the interval format.
    pub fn with_diff(mut self, format: impl Into<String>) -> Self {
        self.diff = Some(format.into());
        self
    }
}

/// Effective formats for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFormats<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub diff: &'a str,
}

/// Holds the active default formats.
///
/// Setters replace the default for every later call on the same instance.
/// Format strings are not validated here; a malformed one is reported by the
/// engine when it is first used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatRegistry {
    active: FormatSpec,
}

impl FormatRegistry {
    /// Create a registry with the built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from an explicit spec.
    pub fn with_spec(spec: FormatSpec) -> Self {
        Self { active: spec }
    }

    /// Get the active spec.
    pub fn spec(&self) -> &FormatSpec {
        &self.active
    }

    pub fn from_format(&self) -> &str {
        &self.active.from
    }

    pub fn to_format(&self) -> &str {
        &self.active.to
    }

    pub fn diff_format(&self) -> &str {
        &self.active.diff
    }

    /// Replace the default parse format.
    pub fn set_from(&mut self, format: impl Into<String>) {
        self.active.from = format.into();
    }

    /// Replace the default render format.
    pub fn set_to(&mut self, format: impl Into<String>) {
        self.active.to = format.into();
    }

    /// Replace the default interval format.
    pub fn set_diff(&mut self, format: impl Into<String>) {
        self.active.diff = format.into();
    }

    /// Restore the built-in defaults.
    pub fn reset(&mut self) {
        self.active = FormatSpec::default();
    }

    /// Resolve the formats for one call without touching the defaults.
    pub fn resolve<'a>(&'a self, overrides: &'a FormatOverrides) -> ResolvedFormats<'a> {
        ResolvedFormats {
            from: overrides.from.as_deref().unwrap_or(&self.active.from),
            to: overrides.to.as_deref().unwrap_or(&self.active.to),
            diff: overrides.diff.as_deref().unwrap_or(&self.active.diff),
        }
    }
}
