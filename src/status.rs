// Goalfinder - Shared Device Status
//
// Cross-task state that is not behind the audio lock. Every field has a
// single writer; readers on other tasks go through atomics.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug)]
pub struct DeviceStatus {
    detected_hits: AtomicU32,
    detected_misses: AtomicU32,
    sound_enabled: AtomicBool,
    shot_pending: AtomicBool,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            detected_hits: AtomicU32::new(0),
            detected_misses: AtomicU32::new(0),
            sound_enabled: AtomicBool::new(true),
            shot_pending: AtomicBool::new(false),
        }
    }
}

impl DeviceStatus {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- counters (written by the detection task) ----

    pub(crate) fn record_hit(&self) -> u32 {
        self.detected_hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_miss(&self) -> u32 {
        self.detected_misses.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Hits since the last reset. The reporting side pairs each read with
    /// [`reset_detected_hits`](Self::reset_detected_hits).
    pub fn detected_hits(&self) -> u32 {
        self.detected_hits.load(Ordering::Relaxed)
    }

    pub fn detected_misses(&self) -> u32 {
        self.detected_misses.load(Ordering::Relaxed)
    }

    pub fn reset_detected_hits(&self) {
        self.detected_hits.store(0, Ordering::Relaxed);
    }

    pub fn reset_detected_misses(&self) {
        self.detected_misses.store(0, Ordering::Relaxed);
    }

    // ---- sound toggle (written by the reporting/HTTP side) ----

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    // ---- shot window (written by the detection task, read by the metronome) ----

    pub(crate) fn set_shot_pending(&self, pending: bool) {
        self.shot_pending.store(pending, Ordering::Relaxed);
    }

    pub fn is_shot_pending(&self) -> bool {
        self.shot_pending.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_does_not_clear_counters() {
        let status = DeviceStatus::new();
        status.record_hit();
        status.record_hit();
        status.record_miss();

        assert_eq!(status.detected_hits(), 2);
        assert_eq!(status.detected_hits(), 2);
        status.reset_detected_hits();
        assert_eq!(status.detected_hits(), 0);
        assert_eq!(status.detected_misses(), 1);
    }

    #[test]
    fn sound_is_enabled_at_boot() {
        assert!(DeviceStatus::new().is_sound_enabled());
    }
}
