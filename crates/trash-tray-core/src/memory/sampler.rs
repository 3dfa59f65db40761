use std::sync::{Mutex, PoisonError};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::{debug, trace};

/// Reports this process's resident memory.
pub trait MemorySampler: Send + Sync {
    /// Resident set size in bytes, or `None` when it cannot be read.
    fn resident_bytes(&self) -> Option<u64>;

    /// Drop any buffers kept between samples. Called before an aggressive
    /// trim so the freed memory can be returned too.
    fn release_buffers(&self) {}
}

/// Heap slack a standard trim leaves at the top of the heap.
const STANDARD_TRIM_PAD: usize = 1024 * 1024;

/// How hard a trim pass should work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimLevel {
    /// Return free allocator pages to the OS, keeping some slack.
    Standard,
    /// Used above the critical threshold: also drops sampling buffers and
    /// keeps no slack.
    Aggressive,
}

impl TrimLevel {
    /// Bytes of free heap the allocator may keep after the trim.
    pub fn trim_pad(self) -> usize {
        match self {
            TrimLevel::Standard => STANDARD_TRIM_PAD,
            TrimLevel::Aggressive => 0,
        }
    }
}

/// Gives memory back to the operating system.
pub trait MemoryTrimmer: Send + Sync {
    /// Run one trim pass. Must not fail.
    fn trim(&self, level: TrimLevel);
}

/// Samples resident memory through `sysinfo`.
pub struct ProcessMemorySampler {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl ProcessMemorySampler {
    /// Sampler for the current process.
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| debug!(error = e, "Current pid unavailable, memory sampling disabled"))
            .ok();
        Self {
            pid,
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler for ProcessMemorySampler {
    fn resident_bytes(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            ProcessRefreshKind::new().with_memory(),
        );
        let rss = system.process(pid).map(|process| process.memory());
        trace!(?rss, "Resident memory sampled");
        rss
    }

    fn release_buffers(&self) {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        *system = System::new();
        debug!("Sampling buffers released");
    }
}

/// Trims the global allocator where the platform allows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrimmer;

impl MemoryTrimmer for SystemTrimmer {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    fn trim(&self, level: TrimLevel) {
        // SAFETY: malloc_trim only releases free heap pages; it has no
        // preconditions and is safe to call from any thread.
        let pad = level.trim_pad();
        let released = unsafe { libc::malloc_trim(pad) };
        debug!(?level, pad, released = released != 0, "malloc_trim completed");
    }

    #[cfg(not(all(target_os = "linux", target_env = "gnu")))]
    fn trim(&self, level: TrimLevel) {
        debug!(?level, "Allocator trim not available on this platform");
    }
}
