//! Memory-pressure admission gate.
//!
//! Every encrypt and decrypt call asks a [`MemoryMonitor`] whether the host
//! is low on memory before doing any allocation-heavy work, and refuses
//! with `ResourceExhausted` if so.

use std::sync::Mutex;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

use crate::kdf::KdfParams;

/// Default floor of available memory below which the host counts as low.
pub const DEFAULT_MIN_AVAILABLE_BYTES: u64 = 64 * 1024 * 1024;

/// Reports whether the host is short on memory.
pub trait MemoryMonitor: Send + Sync {
    /// True when new allocation-heavy work should be refused.
    fn is_low_on_memory(&self) -> bool;
}

impl<F> MemoryMonitor for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_low_on_memory(&self) -> bool {
        self()
    }
}

/// A monitor that never reports memory pressure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

impl MemoryMonitor for AlwaysAvailable {
    fn is_low_on_memory(&self) -> bool {
        false
    }
}

/// Queries the operating system for available memory.
pub struct SystemMemoryMonitor {
    system: Mutex<System>,
    min_available_bytes: u64,
}

impl SystemMemoryMonitor {
    /// Create a monitor with an explicit floor.
    pub fn new(min_available_bytes: u64) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new().with_memory(MemoryRefreshKind::new().with_ram()),
        );
        Self {
            system: Mutex::new(system),
            min_available_bytes,
        }
    }

    /// Create a monitor whose floor leaves room for `concurrent` derivations.
    ///
    /// The floor never drops below [`DEFAULT_MIN_AVAILABLE_BYTES`].
    pub fn for_kdf(params: &KdfParams, concurrent: u64) -> Self {
        let needed = params
            .working_set_bytes()
            .saturating_mul(2)
            .saturating_mul(concurrent.max(1));
        Self::new(needed.max(DEFAULT_MIN_AVAILABLE_BYTES))
    }

    /// The configured floor in bytes.
    pub fn min_available_bytes(&self) -> u64 {
        self.min_available_bytes
    }

    /// Current available memory in bytes.
    pub fn available_bytes(&self) -> u64 {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_memory();
        system.available_memory()
    }
}

impl Default for SystemMemoryMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_AVAILABLE_BYTES)
    }
}

impl MemoryMonitor for SystemMemoryMonitor {
    fn is_low_on_memory(&self) -> bool {
        let available = self.available_bytes();
        let low = available < self.min_available_bytes;
        if low {
            debug!(
                available,
                floor = self.min_available_bytes,
                "Host reports low memory"
            );
        }
        low
    }
}

impl std::fmt::Debug for SystemMemoryMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemMemoryMonitor")
            .field("min_available_bytes", &self.min_available_bytes)
            .finish()
    }
}
