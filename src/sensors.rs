// Goalfinder - Sensor Adapters
//
// Polling wrappers over the ToF distance sensor and the vibration sensor.
// Read failures are never errors: they surface as `Distance::Invalid` or a
// zero pulse width and mean "nothing happened this sample".

use crate::config::MIN_HIT_DISTANCE_MM;

// ---------------------------------------------------------------------------
// Distance reading
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    Millimeters(u16),
    /// Out of range or ranging error.
    Invalid,
}

impl Distance {
    /// `true` if the reading is strictly between the noise floor and
    /// `max_mm`, i.e. a ball sits in front of the sensor.
    pub fn is_hit(&self, max_mm: i32) -> bool {
        match *self {
            Self::Millimeters(mm) => {
                let mm = i32::from(mm);
                mm > MIN_HIT_DISTANCE_MM && mm < max_mm
            }
            Self::Invalid => false,
        }
    }
}

pub trait DistanceSensor: Send {
    /// Single-shot ranging, no retries.
    fn read_distance_mm(&mut self) -> Distance;
}

pub trait VibrationSensor: Send {
    /// Width in microseconds of the next HIGH pulse, or 0 if none completes
    /// within `timeout_us`. Blocks the caller for at most the timeout.
    fn measure_pulse_us(&mut self, timeout_us: u32) -> u32;
}

/// Stand-in for a sensor that failed to boot. Keeps the detection task
/// running in a degraded state.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

impl DistanceSensor for Unavailable {
    fn read_distance_mm(&mut self) -> Distance {
        Distance::Invalid
    }
}

impl VibrationSensor for Unavailable {
    fn measure_pulse_us(&mut self, _timeout_us: u32) -> u32 {
        0
    }
}

// ---------------------------------------------------------------------------
// Pulse-width measurement
// ---------------------------------------------------------------------------

/// Measure a HIGH pulse on a digital input by polling.
///
/// A pulse already in progress when the call starts is skipped, so only a
/// complete rising-to-falling edge pair is measured. Returns 0 when the
/// timeout (counted from the call) elapses first.
pub fn measure_pulse<P, T>(mut is_high: P, mut micros: T, timeout_us: u32) -> u32
where
    P: FnMut() -> bool,
    T: FnMut() -> u64,
{
    let start = micros();
    let expired = |now: u64| now.wrapping_sub(start) > u64::from(timeout_us);

    while is_high() {
        if expired(micros()) {
            return 0;
        }
    }
    while !is_high() {
        if expired(micros()) {
            return 0;
        }
    }

    let rise = micros();
    while is_high() {
        if expired(micros()) {
            return 0;
        }
    }
    micros().wrapping_sub(rise) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn hit_window_is_exclusive_on_both_ends() {
        assert!(!Distance::Millimeters(20).is_hit(180));
        assert!(Distance::Millimeters(21).is_hit(180));
        assert!(Distance::Millimeters(179).is_hit(180));
        assert!(!Distance::Millimeters(180).is_hit(180));
        assert!(!Distance::Invalid.is_hit(180));
    }

    #[test]
    fn measures_complete_pulse() {
        let t = Cell::new(0u64);
        let is_high = || (100..2600).contains(&t.get());
        let micros = || {
            t.set(t.get() + 10);
            t.get()
        };

        let width = measure_pulse(is_high, micros, 10_000);
        assert!((2480..=2520).contains(&width), "width = {width}");
    }

    #[test]
    fn skips_pulse_in_progress() {
        let t = Cell::new(0u64);
        // Already HIGH at start, then a 500 us pulse later on.
        let is_high = || t.get() < 300 || (1000..1500).contains(&t.get());
        let micros = || {
            t.set(t.get() + 10);
            t.get()
        };

        let width = measure_pulse(is_high, micros, 10_000);
        assert!((480..=520).contains(&width), "width = {width}");
    }

    #[test]
    fn returns_zero_without_pulse() {
        let t = Cell::new(0u64);
        let micros = || {
            t.set(t.get() + 10);
            t.get()
        };
        assert_eq!(measure_pulse(|| false, micros, 10_000), 0);
    }

    #[test]
    fn returns_zero_when_pulse_outlasts_timeout() {
        let t = Cell::new(0u64);
        let is_high = || t.get() >= 100;
        let micros = || {
            t.set(t.get() + 10);
            t.get()
        };
        assert_eq!(measure_pulse(is_high, micros, 1000), 0);
    }
}
