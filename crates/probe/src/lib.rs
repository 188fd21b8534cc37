//! Chained Bench Sessions
//!
//! This crate combines the engines from `timing` into a per-execution bench
//! session:
//!
//! - Chained readings, where each reading starts where the previous one ended
//! - Optional high-resolution intervals alongside the wall-clock diff
//! - Sparse snapshots with memory usage, loaded modules and named probes
//! - Readable byte sizes
//!
//! # Example
//!
//! ```rust
//! use probe::{BenchConfig, BenchSession, FixedMemoryProbe, SnapshotOptions, StaticModules};
//!
//! let config = BenchConfig::new().with_time_zone("Europe/Berlin");
//! let mut session = BenchSession::new(config, "1662625532.744800")
//!     .unwrap()
//!     .with_memory_probe(FixedMemoryProbe::new(1536, 4096))
//!     .with_module_source(StaticModules::new(["/srv/app/main.rs"]));
//!
//! session.init_bench().unwrap();
//! let reading = session.bench_diff(true).unwrap();
//! println!("took {} (h_res {:?})", reading.diff.took, reading.h_res);
//!
//! let snapshot = session
//!     .snapshot(&SnapshotOptions::new().with_module_list(true).with_strip_prefix("/srv/app"))
//!     .unwrap();
//! assert_eq!(snapshot.get_str("mem_usage"), Some("1.5 KB"));
//! ```
//!
//! # Modules
//!
//! - [`session`] - Bench sessions and chain state
//! - [`snapshot`] - Sparse output
//! - [`memory`] - Memory probes and the counting allocator
//! - [`modules`] - Loaded module enumeration and natural ordering
//! - [`bytes`] - Readable byte sizes

mod added;
pub mod bytes;
mod config;
mod error;
pub mod memory;
pub mod modules;
pub mod session;
pub mod snapshot;

pub use added::{FnProbe, Probe};
pub use bytes::{readable_bytes, ByteFormat};
pub use config::BenchConfig;
pub use error::{ProbeError, ProbeResult};
pub use memory::{AllocatorProbe, CountingAllocator, FixedMemoryProbe, MemoryProbe, ProcessMemoryProbe};
pub use modules::{natural_cmp, prepare_module_list, MappedModules, ModuleSource, StaticModules};
pub use session::{BenchReading, BenchSession, ChainState};
pub use snapshot::{Snapshot, SnapshotOptions};

/// Re-export for convenience
pub use timing::{
    DiffResult, FormatOverrides, FormatSpec, ManualWallClock, MonotonicClock, MonotonicMock,
    TimingError,
};
