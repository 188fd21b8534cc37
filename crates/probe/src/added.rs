//! Named probes reported under the snapshot's `added` key.

use serde_json::Value;
use std::fmt;

/// A named, zero-argument value producer.
pub trait Probe: fmt::Debug + Send {
    /// Key the value is reported under.
    fn name(&self) -> &str;

    /// Produce the current value.
    fn produce(&self) -> Value;
}

/// A probe backed by a closure.
pub struct FnProbe<F> {
    name: String,
    produce: F,
}

impl<F> FnProbe<F>
where
    F: Fn() -> Value + Send,
{
    pub fn new(name: impl Into<String>, produce: F) -> Self {
        Self {
            name: name.into(),
            produce,
        }
    }
}

impl<F> fmt::Debug for FnProbe<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProbe").field("name", &self.name).finish()
    }
}

impl<F> Probe for FnProbe<F>
where
    F: Fn() -> Value + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn produce(&self) -> Value {
        (self.produce)()
    }
}
