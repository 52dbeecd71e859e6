// Goalfinder - Host Simulation Hardware
//
// Stand-ins for the device peripherals so the full task graph can run on a
// development machine: a court that produces a shot every period and a ball
// arrival on every other one, a sink that swallows audio, and an LED that
// only logs.

use std::sync::Arc;

use crate::audio::AudioSink;
use crate::clips::MemoryClips;
use crate::clock::Clock;
use crate::config::*;
use crate::led::LedOutput;
use crate::sensors::{Distance, DistanceSensor, VibrationSensor};

const SHOT_PULSE_US: u32 = 2500;
const SHOT_WINDOW_MS: u32 = 50;
const BALL_ARRIVAL_MS: std::ops::Range<u32> = 800..900;
const BALL_DISTANCE_MM: u16 = 120;

/// Deterministic shooting drill driven by a clock.
#[derive(Clone)]
pub struct SimulatedCourt {
    clock: Arc<dyn Clock>,
    period_ms: u32,
}

impl SimulatedCourt {
    pub fn new(clock: Arc<dyn Clock>, period_ms: u32) -> Self {
        Self { clock, period_ms }
    }

    fn position(&self) -> (u32, u32) {
        let now = self.clock.now_ms();
        (now / self.period_ms, now % self.period_ms)
    }
}

impl VibrationSensor for SimulatedCourt {
    fn measure_pulse_us(&mut self, _timeout_us: u32) -> u32 {
        let (_, offset) = self.position();
        if offset < SHOT_WINDOW_MS { SHOT_PULSE_US } else { 0 }
    }
}

impl DistanceSensor for SimulatedCourt {
    fn read_distance_mm(&mut self) -> Distance {
        let (period, offset) = self.position();
        if period % 2 == 0 && BALL_ARRIVAL_MS.contains(&offset) {
            Distance::Millimeters(BALL_DISTANCE_MM)
        } else {
            Distance::Invalid
        }
    }
}

/// Accepts and discards all audio.
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn write(&mut self, pcm: &[u8]) -> anyhow::Result<usize> {
        Ok(pcm.len())
    }

    fn set_gain(&mut self, _gain: f32) {}
}

#[derive(Debug, Default)]
pub struct LoggingLed;

impl LedOutput for LoggingLed {
    fn set_duty(&mut self, duty: u8) {
        log::trace!("LED duty {}", duty);
    }
}

/// Every clip the firmware can play, as `duration_ms` of silence.
pub fn silent_clips(duration_ms: u32) -> MemoryClips {
    let bytes = (AUDIO_SAMPLE_RATE_HZ as usize * 2) * duration_ms as usize / 1000;
    TICK_CLIPS
        .iter()
        .chain(HIT_CLIPS)
        .chain(MISS_CLIPS)
        .chain(std::iter::once(&WAITING_CLIP))
        .fold(MemoryClips::new(), |clips, name| clips.with_clip(name, vec![0; bytes]))
}
