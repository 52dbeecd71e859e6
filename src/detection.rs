// Goalfinder - Shot / Hit Detection Engine
//
// Correlates vibration pulses (shot) with ToF distance readings (ball
// arrival) into Shot, Hit and Miss events. The engine is owned by the
// detection task and only ever mutated from there; counters and the
// shot-pending flag are published through `DeviceStatus` atomics.
//
// Phases are derived from the two timestamps on every cycle:
//
//   Idle ──vibration > threshold──▶ ShotWindowOpen
//   ShotWindowOpen ──distance in window──▶ Hit  ──▶ PostHitCooldown
//   ShotWindowOpen ──window elapsed─────▶ Miss ──▶ PostHitCooldown
//   PostHitCooldown ──after-hit timeout──▶ Idle

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::*;
use crate::events::Announcement;
use crate::sensors::{DistanceSensor, VibrationSensor};
use crate::status::DeviceStatus;

// ---------------------------------------------------------------------------
// Runtime parameters (fed by the settings mirror)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionParams {
    /// Upper bound (exclusive) of the hit window in mm.
    pub ball_hit_distance_mm: i32,
    /// Skip vibration entirely; any ball in range is a hit.
    pub distance_only: bool,
    pub after_hit_timeout_ms: u32,
    /// Stored for the settings UI; the shot threshold does not use it yet.
    pub vibration_sensitivity: u8,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            ball_hit_distance_mm: 180,
            distance_only: false,
            after_hit_timeout_ms: 5000,
            vibration_sensitivity: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ShotWindowOpen,
    PostHitCooldown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionState {
    /// Set only while a shot window is open.
    pub last_shock_ms: Option<u32>,
    /// Time of the last Hit or Miss resolution.
    pub last_hit_ms: Option<u32>,
    /// At most one outstanding event; a newer one overwrites it.
    pub pending: Announcement,
}

pub struct DetectionEngine {
    state: DetectionState,
    params: DetectionParams,
    announcing: bool,
    status: Arc<DeviceStatus>,
    clock: Arc<dyn Clock>,
}

impl DetectionEngine {
    pub fn new(status: Arc<DeviceStatus>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: DetectionState::default(),
            params: DetectionParams::default(),
            announcing: false,
            status,
            clock,
        }
    }

    pub fn apply_params(&mut self, params: DetectionParams) {
        if params != self.params {
            log::info!(
                "Detection params: hit distance {} mm, distance-only {}, after-hit timeout {} ms",
                params.ball_hit_distance_mm,
                params.distance_only,
                params.after_hit_timeout_ms
            );
        }
        self.params = params;
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        let now = self.clock.now_ms();
        if self.state.last_shock_ms.is_some() {
            Phase::ShotWindowOpen
        } else if self.in_cooldown(now) {
            Phase::PostHitCooldown
        } else {
            Phase::Idle
        }
    }

    /// Hand the pending announcement to the dispatcher and reset it.
    pub fn take_announcement(&mut self) -> Announcement {
        std::mem::take(&mut self.state.pending)
    }

    /// A Hit/Miss sound has been started for the last announcement.
    pub fn mark_announcing(&mut self) {
        self.announcing = true;
    }

    /// Run one detection cycle.
    ///
    /// `is_playing` queries the audio player; it is only consulted while an
    /// announcement is outstanding, so the audio lock is not taken on every
    /// cycle.
    pub fn detect<D, V, F>(&mut self, distance: &mut D, vibration: &mut V, mut is_playing: F)
    where
        D: DistanceSensor + ?Sized,
        V: VibrationSensor + ?Sized,
        F: FnMut() -> bool,
    {
        let now = self.clock.now_ms();
        if self.in_cooldown(now) {
            return;
        }

        if self.params.distance_only {
            // A window opened before the switch can never resolve here.
            if self.state.last_shock_ms.take().is_some() {
                if self.state.pending == Announcement::Shot {
                    self.state.pending = Announcement::None;
                }
                self.status.set_shot_pending(false);
                log::info!("{:.3}: open shot window dropped (distance-only mode)", secs(now));
            }
            if !self.is_voicing(&mut is_playing)
                && distance.read_distance_mm().is_hit(self.params.ball_hit_distance_mm)
            {
                self.resolve_hit(now);
            }
            return;
        }

        // ---- Idle → ShotWindowOpen ----
        if self.state.last_shock_ms.is_none() && !self.is_voicing(&mut is_playing) {
            let pulse = vibration.measure_pulse_us(VIBRATION_MEASURE_TIMEOUT_US);
            if pulse > SHOT_VIBRATION_THRESHOLD {
                // The pulse read may have blocked; stamp after it.
                let at = self.clock.now_ms();
                self.state.last_shock_ms = Some(at);
                self.state.pending = Announcement::Shot;
                self.status.set_shot_pending(true);
                log::info!("{:.3}: shot detected (pulse {} us)", secs(at), pulse);
            }
        }

        // ---- ShotWindowOpen → Hit | Miss ----
        // Distance is checked first so a late hit never turns into a miss.
        if let Some(shock) = self.state.last_shock_ms {
            let now = self.clock.now_ms();
            if distance.read_distance_mm().is_hit(self.params.ball_hit_distance_mm) {
                self.resolve_hit(now);
            } else if now.wrapping_sub(shock) > MAX_SHOT_DURATION_MS {
                self.resolve_miss(now);
            }
        }
    }

    fn in_cooldown(&self, now: u32) -> bool {
        self.state
            .last_hit_ms
            .is_some_and(|t| now.wrapping_sub(t) < self.params.after_hit_timeout_ms)
    }

    /// Soft de-bounce: an announcement sound is still audible. Clears the
    /// flag once playback has ended.
    fn is_voicing<F: FnMut() -> bool>(&mut self, is_playing: &mut F) -> bool {
        if self.announcing && is_playing() {
            return true;
        }
        self.announcing = false;
        false
    }

    fn resolve_hit(&mut self, now: u32) {
        self.close_window(now);
        self.state.pending = Announcement::Hit;
        let total = self.status.record_hit();
        log::info!("{:.3}: Hit detected! Total hits: {}", secs(now), total);
    }

    fn resolve_miss(&mut self, now: u32) {
        self.close_window(now);
        self.state.pending = Announcement::Miss;
        let total = self.status.record_miss();
        log::info!("{:.3}: Miss detected! Total misses: {}", secs(now), total);
    }

    fn close_window(&mut self, now: u32) {
        self.state.last_shock_ms = None;
        self.state.last_hit_ms = Some(now);
        self.status.set_shot_pending(false);
    }
}

fn secs(ms: u32) -> f32 {
    ms as f32 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sensors::Distance;

    struct Scripted {
        pulse: u32,
        distance: Distance,
        pulse_reads: usize,
        distance_reads: usize,
    }

    impl Scripted {
        fn quiet() -> Self {
            Self { pulse: 0, distance: Distance::Invalid, pulse_reads: 0, distance_reads: 0 }
        }
    }

    impl DistanceSensor for Scripted {
        fn read_distance_mm(&mut self) -> Distance {
            self.distance_reads += 1;
            self.distance
        }
    }

    impl VibrationSensor for Scripted {
        fn measure_pulse_us(&mut self, _timeout_us: u32) -> u32 {
            self.pulse_reads += 1;
            self.pulse
        }
    }

    fn engine() -> (DetectionEngine, Arc<ManualClock>, Arc<DeviceStatus>) {
        let clock = Arc::new(ManualClock::new(1000));
        let status = Arc::new(DeviceStatus::new());
        let engine = DetectionEngine::new(status.clone(), clock.clone());
        (engine, clock, status)
    }

    /// Run one cycle with the same scripted rig acting as both sensors.
    fn cycle(engine: &mut DetectionEngine, sensors: &mut Scripted) {
        let mut vibration = Scripted { pulse_reads: 0, ..*sensors };
        engine.detect(sensors, &mut vibration, || false);
        sensors.pulse_reads += vibration.pulse_reads;
    }

    #[test]
    fn pulse_at_threshold_does_not_open_window() {
        let (mut engine, _, _) = engine();
        let mut s = Scripted { pulse: SHOT_VIBRATION_THRESHOLD, ..Scripted::quiet() };
        cycle(&mut engine, &mut s);
        assert_eq!(engine.phase(), Phase::Idle);

        s.pulse = SHOT_VIBRATION_THRESHOLD + 1;
        cycle(&mut engine, &mut s);
        assert_eq!(engine.phase(), Phase::ShotWindowOpen);
        assert_eq!(engine.take_announcement(), Announcement::Shot);
    }

    #[test]
    fn open_window_stops_vibration_sampling() {
        let (mut engine, clock, _) = engine();
        let mut s = Scripted { pulse: 2500, ..Scripted::quiet() };
        cycle(&mut engine, &mut s);
        let reads = s.pulse_reads;

        clock.advance(100);
        cycle(&mut engine, &mut s);
        assert_eq!(s.pulse_reads, reads);
        assert_eq!(engine.state().last_shock_ms, Some(1000));
    }

    #[test]
    fn distance_outside_window_keeps_shot_open() {
        let (mut engine, clock, status) = engine();
        let mut s = Scripted { pulse: 2500, ..Scripted::quiet() };
        cycle(&mut engine, &mut s);

        for mm in [0, 20, 180, 500] {
            s.distance = Distance::Millimeters(mm);
            clock.advance(10);
            cycle(&mut engine, &mut s);
            assert_eq!(engine.phase(), Phase::ShotWindowOpen, "mm = {mm}");
        }
        assert_eq!(status.detected_hits(), 0);
        assert!(status.is_shot_pending());
    }

    #[test]
    fn hit_closes_window_and_starts_cooldown() {
        let (mut engine, clock, status) = engine();
        let mut s = Scripted { pulse: 2500, ..Scripted::quiet() };
        cycle(&mut engine, &mut s);

        clock.advance(300);
        s.distance = Distance::Millimeters(150);
        cycle(&mut engine, &mut s);

        assert_eq!(engine.take_announcement(), Announcement::Hit);
        assert_eq!(engine.state().last_shock_ms, None);
        assert_eq!(engine.state().last_hit_ms, Some(1300));
        assert_eq!(engine.phase(), Phase::PostHitCooldown);
        assert_eq!(status.detected_hits(), 1);
        assert!(!status.is_shot_pending());
    }

    #[test]
    fn window_expiry_is_a_single_miss() {
        let (mut engine, clock, status) = engine();
        let mut s = Scripted { pulse: 2500, ..Scripted::quiet() };
        cycle(&mut engine, &mut s);
        s.pulse = 0;

        clock.advance(MAX_SHOT_DURATION_MS);
        cycle(&mut engine, &mut s);
        assert_eq!(engine.phase(), Phase::ShotWindowOpen);

        clock.advance(1);
        cycle(&mut engine, &mut s);
        assert_eq!(engine.take_announcement(), Announcement::Miss);
        assert_eq!(status.detected_misses(), 1);

        clock.advance(1);
        cycle(&mut engine, &mut s);
        assert_eq!(status.detected_misses(), 1);
        assert_eq!(engine.take_announcement(), Announcement::None);
    }

    #[test]
    fn late_hit_wins_over_timeout() {
        let (mut engine, clock, status) = engine();
        let mut s = Scripted { pulse: 2500, ..Scripted::quiet() };
        cycle(&mut engine, &mut s);

        clock.advance(MAX_SHOT_DURATION_MS + 50);
        s.distance = Distance::Millimeters(100);
        cycle(&mut engine, &mut s);

        assert_eq!(engine.take_announcement(), Announcement::Hit);
        assert_eq!(status.detected_hits(), 1);
        assert_eq!(status.detected_misses(), 0);
    }

    #[test]
    fn cooldown_blocks_new_shots() {
        let (mut engine, clock, _) = engine();
        let mut s = Scripted { pulse: 2500, distance: Distance::Millimeters(100), ..Scripted::quiet() };
        cycle(&mut engine, &mut s);
        engine.take_announcement();
        let reads = s.pulse_reads;

        clock.advance(4999);
        cycle(&mut engine, &mut s);
        assert_eq!(s.pulse_reads, reads);
        assert_eq!(engine.take_announcement(), Announcement::None);

        clock.advance(1);
        s.distance = Distance::Invalid;
        cycle(&mut engine, &mut s);
        assert_eq!(engine.phase(), Phase::ShotWindowOpen);
    }

    #[test]
    fn zero_timeout_disables_cooldown() {
        let (mut engine, _, status) = engine();
        engine.apply_params(DetectionParams { after_hit_timeout_ms: 0, ..DetectionParams::default() });
        let mut s = Scripted { pulse: 2500, distance: Distance::Millimeters(100), ..Scripted::quiet() };

        cycle(&mut engine, &mut s);
        cycle(&mut engine, &mut s);
        assert_eq!(status.detected_hits(), 2);
    }

    #[test]
    fn announcing_gates_vibration_until_playback_ends() {
        let (mut engine, clock, _) = engine();
        engine.apply_params(DetectionParams { after_hit_timeout_ms: 0, ..DetectionParams::default() });
        engine.mark_announcing();
        let mut sensors = Scripted { pulse: 2500, ..Scripted::quiet() };
        let mut vibration = Scripted { pulse: 2500, ..Scripted::quiet() };

        engine.detect(&mut sensors, &mut vibration, || true);
        assert_eq!(vibration.pulse_reads, 0);
        assert_eq!(engine.phase(), Phase::Idle);

        clock.advance(10);
        engine.detect(&mut sensors, &mut vibration, || false);
        assert_eq!(vibration.pulse_reads, 1);
        assert_eq!(engine.phase(), Phase::ShotWindowOpen);
    }

    #[test]
    fn distance_only_mode_never_samples_vibration() {
        let (mut engine, _, status) = engine();
        engine.apply_params(DetectionParams { distance_only: true, ..DetectionParams::default() });
        let mut s = Scripted { pulse: 9999, distance: Distance::Millimeters(100), ..Scripted::quiet() };

        cycle(&mut engine, &mut s);
        assert_eq!(s.pulse_reads, 0);
        assert_eq!(engine.take_announcement(), Announcement::Hit);
        assert_eq!(status.detected_hits(), 1);
    }

    #[test]
    fn distance_only_mode_has_no_miss() {
        let (mut engine, clock, status) = engine();
        engine.apply_params(DetectionParams { distance_only: true, ..DetectionParams::default() });
        let mut s = Scripted::quiet();

        for _ in 0..10 {
            clock.advance(MAX_SHOT_DURATION_MS);
            cycle(&mut engine, &mut s);
        }
        assert_eq!(status.detected_misses(), 0);
        assert_eq!(engine.take_announcement(), Announcement::None);
    }

    #[test]
    fn switching_to_distance_only_drops_an_open_window() {
        let (mut engine, clock, status) = engine();
        let mut s = Scripted { pulse: 2500, ..Scripted::quiet() };
        cycle(&mut engine, &mut s);
        assert_eq!(engine.phase(), Phase::ShotWindowOpen);
        assert!(status.is_shot_pending());

        engine.apply_params(DetectionParams { distance_only: true, ..DetectionParams::default() });
        clock.advance(60_000);
        cycle(&mut engine, &mut s);
        assert_eq!(engine.phase(), Phase::Idle);
        assert!(!status.is_shot_pending());
        assert_eq!(engine.take_announcement(), Announcement::None);

        // Back in vibration mode the stale window must not surface as a miss.
        engine.apply_params(DetectionParams::default());
        s.pulse = 0;
        clock.advance(1);
        cycle(&mut engine, &mut s);
        assert_eq!(status.detected_misses(), 0);
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn distance_only_mode_waits_for_voicing_to_end() {
        let (mut engine, _, status) = engine();
        engine.apply_params(DetectionParams {
            distance_only: true,
            after_hit_timeout_ms: 0,
            ..DetectionParams::default()
        });
        engine.mark_announcing();
        let mut s = Scripted { distance: Distance::Millimeters(100), ..Scripted::quiet() };
        let mut v = Scripted::quiet();

        engine.detect(&mut s, &mut v, || true);
        assert_eq!(status.detected_hits(), 0);
        engine.detect(&mut s, &mut v, || false);
        assert_eq!(status.detected_hits(), 1);
    }

    #[test]
    fn newer_event_overwrites_pending_one() {
        let (mut engine, clock, _) = engine();
        let mut s = Scripted { pulse: 2500, ..Scripted::quiet() };
        cycle(&mut engine, &mut s);
        assert_eq!(engine.state().pending, Announcement::Shot);

        clock.advance(100);
        s.distance = Distance::Millimeters(100);
        cycle(&mut engine, &mut s);
        assert_eq!(engine.take_announcement(), Announcement::Hit);
    }
}
