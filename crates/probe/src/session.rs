//! Chained bench sessions.
//!
//! A [`BenchSession`] belongs to exactly one execution (a request, a job, a
//! process run). It owns the chain state, so each [`BenchSession::bench_diff`]
//! measures from the end of the previous one. Hosts that serve many
//! executions create one session per execution; sessions are `Send` but are
//! never shared.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use timing::{
    DiffResult, FormatOverrides, FormatRegistry, HighResolutionTimer, MonotonicClock, WallClock,
    WallClockDiffEngine,
};

use crate::added::Probe;
use crate::bytes::ByteFormat;
use crate::config::BenchConfig;
use crate::error::ProbeResult;
use crate::memory::{MemoryProbe, ProcessMemoryProbe};
use crate::modules::{prepare_module_list, MappedModules, ModuleSource};
use crate::snapshot::{self, Snapshot, SnapshotOptions};

/// The serialized end instant of the last completed measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainState {
    last: Option<String>,
}

impl ChainState {
    /// The implicit start of the next measurement, if any.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.last.is_some()
    }

    fn set(&mut self, serialized: String) {
        self.last = Some(serialized);
    }

    fn clear(&mut self) {
        self.last = None;
    }
}

/// One chained reading: the wall-clock diff plus an optional
/// high-resolution interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchReading {
    #[serde(flatten)]
    pub diff: DiffResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_res: Option<String>,
}

/// Wall-clock and high-resolution measurements for one execution.
///
/// # Example
///
/// ```rust
/// use probe::{BenchConfig, BenchSession};
///
/// let mut session = BenchSession::new(BenchConfig::default(), "1662625532.744800").unwrap();
/// session.init_bench().unwrap();
///
/// for _ in 0..3 {
///     // ... one iteration of work ...
///     let reading = session.bench_diff(true).unwrap();
///     assert!(reading.h_res.is_some());
/// }
/// ```
#[derive(Debug)]
pub struct BenchSession {
    engine: WallClockDiffEngine,
    timer: HighResolutionTimer,
    chain: ChainState,
    bytes: ByteFormat,
    readable_memory: bool,
    memory: Box<dyn MemoryProbe>,
    modules: Box<dyn ModuleSource>,
    probes: Vec<Box<dyn Probe>>,
}

impl BenchSession {
    /// Create a session for an execution that began at `request_start`.
    ///
    /// `request_start` is in the configured serialized form
    /// (`seconds.microseconds` by default) or bare epoch seconds with any
    /// number of fraction digits. It is normalized here, so a malformed start
    /// fails now rather than at the first measurement.
    pub fn new(config: BenchConfig, request_start: impl Into<String>) -> ProbeResult<Self> {
        let zone = config.zone()?;
        let mut engine = WallClockDiffEngine::new(request_start)
            .with_zone(zone)
            .with_formats(FormatRegistry::with_spec(config.formats.clone()));
        engine.normalize_request_start()?;

        Ok(Self {
            engine,
            timer: HighResolutionTimer::new(),
            chain: ChainState::default(),
            bytes: config.byte_format(),
            readable_memory: config.readable_memory,
            memory: Box::new(ProcessMemoryProbe),
            modules: Box::new(MappedModules),
            probes: Vec::new(),
        })
    }

    /// Replace the wall-clock source.
    pub fn with_wall_clock(mut self, clock: impl WallClock + 'static) -> Self {
        self.engine = self.engine.with_clock(clock);
        self
    }

    /// Replace the monotonic clock. Any armed mark is dropped.
    pub fn with_monotonic_clock(mut self, clock: MonotonicClock) -> Self {
        self.timer = HighResolutionTimer::with_clock(clock);
        self
    }

    pub fn with_memory_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.memory = Box::new(probe);
        self
    }

    pub fn with_module_source(mut self, source: impl ModuleSource + 'static) -> Self {
        self.modules = Box::new(source);
        self
    }

    pub fn with_probe(mut self, probe: impl Probe + 'static) -> Self {
        self.register_probe(probe);
        self
    }

    /// Register a named probe reported under `added` in snapshots.
    pub fn register_probe(&mut self, probe: impl Probe + 'static) {
        tracing::debug!(target: "probe::session", probe = probe.name(), "probe registered");
        self.probes.push(Box::new(probe));
    }

    pub fn engine(&self) -> &WallClockDiffEngine {
        &self.engine
    }

    /// Mutable engine access, e.g. to change default formats.
    pub fn engine_mut(&mut self) -> &mut WallClockDiffEngine {
        &mut self.engine
    }

    pub fn timer(&self) -> &HighResolutionTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut HighResolutionTimer {
        &mut self.timer
    }

    pub fn chain(&self) -> &ChainState {
        &self.chain
    }

    /// Seed the chain with "now" and arm the high-resolution timer.
    ///
    /// Optional. Without it the first wall-clock reading is measured from the
    /// request start, and the first high-resolution reading from the moment
    /// [`bench_diff`](Self::bench_diff) first arms the timer, which makes that
    /// first reading close to zero and not meaningful.
    pub fn init_bench(&mut self) -> ProbeResult<()> {
        let now = self.engine.serialize_now()?;
        tracing::debug!(target: "probe::session", start = %now, "bench initialised");
        self.chain.set(now);
        self.timer.start();
        Ok(())
    }

    /// Forget the chain; the next reading starts from the request start again.
    pub fn reset_chain(&mut self) {
        self.chain.clear();
    }

    /// Measure from the end of the previous reading to now.
    ///
    /// The chain only advances, and the high-resolution timer only re-arms,
    /// when the wall-clock reading succeeds.
    pub fn bench_diff(&mut self, include_high_res: bool) -> ProbeResult<BenchReading> {
        let measured = self
            .engine
            .measure_to_now(self.chain.last(), &FormatOverrides::none())?;
        let next = self.engine.serialize(measured.ended_at)?;
        let diff = measured.diff;

        let h_res = if include_high_res {
            Some(self.timer.bench()?)
        } else {
            None
        };

        tracing::trace!(
            target: "probe::session",
            took = %diff.took,
            h_res = h_res.as_deref().unwrap_or(""),
            next_start = %next,
            "bench reading"
        );
        self.chain.set(next);

        Ok(BenchReading { diff, h_res })
    }

    /// Time since the request start, memory usage, loaded modules and any
    /// registered probes. Empty entries are omitted.
    pub fn snapshot(&self, options: &SnapshotOptions) -> ProbeResult<Snapshot> {
        let diff = self.engine.diff_to_now(None, &FormatOverrides::none())?;

        let mut out = Snapshot::new();
        out.insert(snapshot::START, diff.start);
        out.insert(snapshot::ENDED, diff.ended);
        out.insert(snapshot::TOOK, diff.took);

        let readable = options.readable_memory.unwrap_or(self.readable_memory);
        let (usage, peak) = self.memory_usage(readable);
        out.insert(snapshot::MEM_USAGE, usage);
        out.insert(snapshot::MEM_PEAK, peak);

        let modules = self.modules.loaded_modules();
        out.insert(snapshot::MODULES_TOTAL, modules.len());
        if options.include_module_list {
            let list = prepare_module_list(modules, options.strip_prefix.as_deref());
            out.insert(snapshot::MODULES_LIST, list);
        }

        let added: Map<String, Value> = self
            .probes
            .iter()
            .map(|probe| (probe.name().to_string(), probe.produce()))
            .collect();
        out.insert(snapshot::ADDED, added);

        tracing::debug!(target: "probe::session", entries = out.len(), "snapshot taken");
        Ok(out)
    }

    /// Current and peak memory, either raw byte counts or readable sizes.
    pub fn memory_usage(&self, readable: bool) -> (Value, Value) {
        let usage = self.memory.current_usage_bytes();
        let peak = self.memory.peak_usage_bytes();

        if readable {
            let render = |bytes: u64| {
                Value::String(self.bytes.render(i64::try_from(bytes).unwrap_or(i64::MAX)))
            };
            (render(usage), render(peak))
        } else {
            (Value::from(usage), Value::from(peak))
        }
    }
}
