//! Memory usage probes.
//!
//! Two sources are available:
//!
//! - [`AllocatorProbe`] reads the counters kept by [`CountingAllocator`]. The
//!   host has to install the allocator for the figures to be meaningful:
//!
//!   ```rust,ignore
//!   #[global_allocator]
//!   static ALLOC: probe::CountingAllocator = probe::CountingAllocator;
//!   ```
//!
//! - [`ProcessMemoryProbe`] asks the OS for the resident set size and its
//!   high-water mark. Linux only; other platforms report zero.

use std::alloc::{GlobalAlloc, Layout, System};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Read-only view of current and peak memory usage.
pub trait MemoryProbe: fmt::Debug + Send {
    /// Bytes currently in use.
    fn current_usage_bytes(&self) -> u64;

    /// Highest number of bytes in use so far.
    fn peak_usage_bytes(&self) -> u64;
}

static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

/// System allocator wrapper that counts live and peak heap bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountingAllocator;

impl CountingAllocator {
    /// Live heap bytes.
    pub fn current() -> usize {
        CURRENT.load(Ordering::Relaxed)
    }

    /// Peak live heap bytes.
    pub fn peak() -> usize {
        PEAK.load(Ordering::Relaxed)
    }

    /// Restart peak tracking from the current usage.
    pub fn reset_peak() {
        PEAK.store(CURRENT.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    #[inline]
    fn grow(size: usize) {
        let now = CURRENT.fetch_add(size, Ordering::Relaxed) + size;
        PEAK.fetch_max(now, Ordering::Relaxed);
    }

    #[inline]
    fn shrink(size: usize) {
        CURRENT.fetch_sub(size, Ordering::Relaxed);
    }
}

// No logging in here: tracing may allocate.
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            Self::grow(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            Self::grow(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        Self::shrink(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            let old_size = layout.size();
            if new_size > old_size {
                Self::grow(new_size - old_size);
            } else {
                Self::shrink(old_size - new_size);
            }
        }
        new_ptr
    }
}

/// Reads the [`CountingAllocator`] counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocatorProbe;

impl MemoryProbe for AllocatorProbe {
    fn current_usage_bytes(&self) -> u64 {
        CountingAllocator::current() as u64
    }

    fn peak_usage_bytes(&self) -> u64 {
        CountingAllocator::peak() as u64
    }
}

/// Resident set size of the process, from `/proc/self/status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMemoryProbe;

impl ProcessMemoryProbe {
    #[cfg(target_os = "linux")]
    fn read_field(field: &str) -> u64 {
        match std::fs::read_to_string("/proc/self/status") {
            Ok(status) => status_field_bytes(&status, field).unwrap_or(0),
            Err(err) => {
                tracing::warn!(target: "probe::memory", error = %err, "cannot read /proc/self/status");
                0
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn read_field(_field: &str) -> u64 {
        0
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn current_usage_bytes(&self) -> u64 {
        Self::read_field("VmRSS")
    }

    fn peak_usage_bytes(&self) -> u64 {
        Self::read_field("VmHWM")
    }
}

/// Extract a `kB` figure such as `VmRSS:     1234 kB` and convert it to bytes.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn status_field_bytes(status: &str, field: &str) -> Option<u64> {
    status.lines().find_map(|line| {
        let rest = line.strip_prefix(field)?.strip_prefix(':')?;
        let kb = rest.split_whitespace().next()?.parse::<u64>().ok()?;
        Some(kb * 1024)
    })
}

/// A probe reporting fixed figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedMemoryProbe {
    pub current: u64,
    pub peak: u64,
}

impl FixedMemoryProbe {
    pub fn new(current: u64, peak: u64) -> Self {
        Self { current, peak }
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn current_usage_bytes(&self) -> u64 {
        self.current
    }

    fn peak_usage_bytes(&self) -> u64 {
        self.peak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\tlapwatch\nVmPeak:\t  20000 kB\nVmHWM:\t    4096 kB\nVmRSS:\t    2048 kB\n";

    #[test]
    fn test_status_field_bytes() {
        assert_eq!(status_field_bytes(STATUS, "VmRSS"), Some(2048 * 1024));
        assert_eq!(status_field_bytes(STATUS, "VmHWM"), Some(4096 * 1024));
        assert_eq!(status_field_bytes(STATUS, "VmSwap"), None);
    }

    #[test]
    fn test_status_field_requires_exact_name() {
        // "VmPeak" must not match a lookup for "VmPea"
        assert_eq!(status_field_bytes(STATUS, "VmPea"), None);
    }

    #[test]
    fn test_fixed_probe() {
        let probe = FixedMemoryProbe::new(10, 20);
        assert_eq!(probe.current_usage_bytes(), 10);
        assert_eq!(probe.peak_usage_bytes(), 20);
    }

    #[test]
    fn test_counting_allocator_tracks_direct_calls() {
        let alloc = CountingAllocator;
        let layout = Layout::from_size_align(4096, 8).unwrap();

        let before = CountingAllocator::current();
        unsafe {
            let ptr = alloc.alloc(layout);
            assert!(!ptr.is_null());
            assert!(CountingAllocator::peak() >= before + 4096);

            let ptr = alloc.realloc(ptr, layout, 8192);
            assert!(!ptr.is_null());
            assert!(CountingAllocator::peak() >= before + 8192);

            alloc.dealloc(ptr, Layout::from_size_align(8192, 8).unwrap());
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_probe_reports_something() {
        let probe = ProcessMemoryProbe;
        assert!(probe.current_usage_bytes() > 0);
        assert!(probe.peak_usage_bytes() > 0);
    }
}
