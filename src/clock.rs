// Goalfinder - Monotonic Time Source

use std::sync::atomic::{AtomicU32, Ordering};

// ---------------------------------------------------------------------------
// Utility: milliseconds since boot (wraps at ~49 days - fine for timeouts)
// ---------------------------------------------------------------------------
#[cfg(target_os = "espidf")]
pub fn now_ms() -> u32 {
    unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
}

#[cfg(not(target_os = "espidf"))]
pub fn now_ms() -> u32 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static BOOT: OnceLock<Instant> = OnceLock::new();
    BOOT.get_or_init(Instant::now).elapsed().as_millis() as u32
}

/// Time source for the state machines. All arithmetic on the returned
/// values must use `wrapping_sub`.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u32;
}

/// Milliseconds since boot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        now_ms()
    }
}

/// Hand-driven clock for tests and the host simulation.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self { now: AtomicU32::new(start_ms) }
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}
