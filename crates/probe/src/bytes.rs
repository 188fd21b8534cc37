//! Readable byte sizes.

/// Binary unit names, 1024 apart.
pub const DEFAULT_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Default number of decimals.
pub const DEFAULT_PRECISION: u32 = 2;

/// Render `bytes` in the largest unit that keeps the value at or above one.
///
/// The unit index is clamped to the last entry of `units`. Zero and negative
/// inputs render as a bare `"0"`.
pub fn readable_bytes<S: AsRef<str>>(bytes: i64, precision: u32, units: &[S]) -> String {
    if bytes <= 0 {
        return "0".to_string();
    }

    let bytes = bytes as u128;
    let last = units.len().saturating_sub(1);
    let mut index = 0;
    let mut scale: u128 = 1;
    while index < last && bytes >= scale * 1024 {
        scale *= 1024;
        index += 1;
    }

    let factor = 10f64.powi(precision as i32);
    let value = ((bytes as f64 / scale as f64) * factor).round() / factor;

    match units.get(index) {
        Some(unit) => format!("{} {}", value, unit.as_ref()),
        None => value.to_string(),
    }
}

/// Precision and unit names for rendering memory figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteFormat {
    pub precision: u32,
    pub units: Vec<String>,
}

impl Default for ByteFormat {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            units: DEFAULT_UNITS.iter().map(|u| u.to_string()).collect(),
        }
    }
}

impl ByteFormat {
    /// Render with this format.
    pub fn render(&self, bytes: i64) -> String {
        readable_bytes(bytes, self.precision, &self.units)
    }
}
