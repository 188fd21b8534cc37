//! Bench session configuration.

use serde::{Deserialize, Serialize};
use timing::{parse_zone, FormatSpec, Tz};

use crate::bytes::{ByteFormat, DEFAULT_PRECISION, DEFAULT_UNITS};
use crate::error::ProbeResult;

/// Configuration for a [`BenchSession`](crate::BenchSession).
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use probe::BenchConfig;
///
/// let config = BenchConfig::from_json(r#"{"time_zone": "Europe/Berlin"}"#).unwrap();
/// assert_eq!(config.byte_precision, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Serialize, render and interval formats
    pub formats: FormatSpec,
    /// IANA name of the display time zone
    pub time_zone: String,
    /// Decimals used for readable byte sizes
    pub byte_precision: u32,
    /// Unit names for readable byte sizes, 1024 apart
    pub byte_units: Vec<String>,
    /// Whether snapshots render memory figures as readable sizes
    pub readable_memory: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            formats: FormatSpec::default(),
            time_zone: "UTC".to_string(),
            byte_precision: DEFAULT_PRECISION,
            byte_units: DEFAULT_UNITS.iter().map(|u| u.to_string()).collect(),
            readable_memory: true,
        }
    }
}

impl BenchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON document.
    pub fn from_json(json: &str) -> ProbeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write as pretty JSON.
    pub fn to_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_formats(mut self, formats: FormatSpec) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_time_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = zone.into();
        self
    }

    pub fn with_byte_precision(mut self, precision: u32) -> Self {
        self.byte_precision = precision;
        self
    }

    pub fn with_byte_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.byte_units = units.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_readable_memory(mut self, readable: bool) -> Self {
        self.readable_memory = readable;
        self
    }

    /// Resolve the display time zone.
    pub fn zone(&self) -> ProbeResult<Tz> {
        Ok(parse_zone(&self.time_zone)?)
    }

    pub fn byte_format(&self) -> ByteFormat {
        ByteFormat {
            precision: self.byte_precision,
            units: self.byte_units.clone(),
        }
    }
}
