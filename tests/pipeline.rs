// End-to-end detection pipeline: settings -> detection -> dispatch -> audio,
// plus the LED and metronome tasks, all driven by a manual clock on the test
// thread.

use std::sync::{Arc, Mutex};

use goalfinder::app::{App, Hardware};
use goalfinder::clips::{ClipError, ClipSource, ClipStream, MemoryClips};
use goalfinder::clock::ManualClock;
use goalfinder::detection::Phase;
use goalfinder::led::LedOutput;
use goalfinder::sensors::{Distance, DistanceSensor, VibrationSensor};
use goalfinder::settings::{MemoryStore, Settings};
use goalfinder::sim::{silent_clips, NullSink};

const BOOT_MS: u32 = 10_000;

struct CourtState {
    pulse_us: u32,
    distance: Distance,
    pulse_reads: usize,
}

#[derive(Clone)]
struct Court(Arc<Mutex<CourtState>>);

impl Court {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(CourtState { pulse_us: 0, distance: Distance::Invalid, pulse_reads: 0 })))
    }

    fn shock(&self, pulse_us: u32) {
        self.0.lock().unwrap().pulse_us = pulse_us;
    }

    fn ball_at(&self, distance: Distance) {
        self.0.lock().unwrap().distance = distance;
    }

    fn pulse_reads(&self) -> usize {
        self.0.lock().unwrap().pulse_reads
    }
}

impl VibrationSensor for Court {
    fn measure_pulse_us(&mut self, _timeout_us: u32) -> u32 {
        let mut state = self.0.lock().unwrap();
        state.pulse_reads += 1;
        state.pulse_us
    }
}

impl DistanceSensor for Court {
    fn read_distance_mm(&mut self) -> Distance {
        self.0.lock().unwrap().distance
    }
}

struct RecordingClips {
    inner: MemoryClips,
    opened: Arc<Mutex<Vec<String>>>,
}

impl ClipSource for RecordingClips {
    fn open(&mut self, clip: &str) -> Result<Box<dyn ClipStream>, ClipError> {
        self.opened.lock().unwrap().push(clip.to_owned());
        self.inner.open(clip)
    }
}

struct RecordingLed(Arc<Mutex<Vec<u8>>>);

impl LedOutput for RecordingLed {
    fn set_duty(&mut self, duty: u8) {
        self.0.lock().unwrap().push(duty);
    }
}

struct Rig {
    app: App,
    clock: Arc<ManualClock>,
    court: Court,
    opened: Arc<Mutex<Vec<String>>>,
    duties: Arc<Mutex<Vec<u8>>>,
}

impl Rig {
    fn new(configure: impl FnOnce(&Settings)) -> Self {
        let settings = Arc::new(Settings::new(Box::new(MemoryStore::new())));
        configure(&settings);

        let clock = Arc::new(ManualClock::new(BOOT_MS));
        let court = Court::new();
        let opened = Arc::new(Mutex::new(Vec::new()));
        let duties = Arc::new(Mutex::new(Vec::new()));
        let hardware = Hardware {
            distance: Box::new(court.clone()),
            vibration: Box::new(court.clone()),
            clips: Box::new(RecordingClips { inner: silent_clips(100), opened: opened.clone() }),
            audio_out: Box::new(NullSink::default()),
            led: Box::new(RecordingLed(duties.clone())),
        };
        let app = App::new(hardware, settings, clock.clone());
        Self { app, clock, court, opened, duties }
    }

    /// Advance the clock by `ms`, then run every task once.
    fn tick_after(&mut self, ms: u32) {
        self.clock.advance(ms);
        self.app.tick();
    }

    fn run_for(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick_after(1);
        }
    }

    fn opened_matching(&self, prefix: &str) -> usize {
        self.opened.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn hits(&self) -> u32 {
        self.app.status().detected_hits()
    }

    fn misses(&self) -> u32 {
        self.app.status().detected_misses()
    }

    fn phase(&self) -> Phase {
        self.app.detection().engine.phase()
    }
}

#[test]
fn shot_then_ball_in_range_is_one_hit() {
    let mut rig = Rig::new(|_| {});

    rig.court.shock(2500);
    rig.tick_after(0);
    assert_eq!(rig.phase(), Phase::ShotWindowOpen);
    assert!(rig.app.status().is_shot_pending());

    rig.court.shock(0);
    rig.court.ball_at(Distance::Millimeters(150));
    rig.tick_after(100);

    assert_eq!(rig.hits(), 1);
    assert_eq!(rig.misses(), 0);
    assert_eq!(rig.phase(), Phase::PostHitCooldown);
    assert!(!rig.app.status().is_shot_pending());
    assert_eq!(rig.app.audio().current_clip().as_deref(), Some("hit-1.mp3"));

    // The announcement was consumed: no second hit sound.
    rig.run_for(50);
    assert_eq!(rig.hits(), 1);
    assert_eq!(rig.opened_matching("hit-"), 1);
}

#[test]
fn shot_without_ball_times_out_into_one_miss() {
    let mut rig = Rig::new(|_| {});

    rig.court.shock(2500);
    rig.tick_after(0);
    rig.court.shock(0);

    rig.tick_after(5000);
    assert_eq!(rig.misses(), 0);
    assert_eq!(rig.phase(), Phase::ShotWindowOpen);

    rig.tick_after(1);
    assert_eq!(rig.misses(), 1);
    assert_eq!(rig.hits(), 0);
    assert_eq!(rig.opened_matching("miss-1.mp3"), 1);

    rig.run_for(50);
    assert_eq!(rig.misses(), 1);
    assert_eq!(rig.opened_matching("miss-"), 1);
}

#[test]
fn distance_only_mode_needs_no_shock() {
    let mut rig = Rig::new(|s| s.set_distance_only_hit_detection(true).unwrap());

    rig.court.ball_at(Distance::Millimeters(100));
    rig.tick_after(0);

    assert_eq!(rig.hits(), 1);
    assert_eq!(rig.court.pulse_reads(), 0);
}

#[test]
fn cooldown_blocks_new_shots() {
    let mut rig = Rig::new(|_| {});
    rig.app.status().set_sound_enabled(false);

    rig.court.shock(2500);
    rig.court.ball_at(Distance::Millimeters(150));
    rig.tick_after(0);
    assert_eq!(rig.hits(), 1);

    let reads = rig.court.pulse_reads();
    rig.tick_after(4999);
    assert_eq!(rig.hits(), 1);
    assert_eq!(rig.court.pulse_reads(), reads);

    rig.tick_after(1);
    assert_eq!(rig.hits(), 2);
}

#[test]
fn muting_during_a_clip_keeps_detection_running() {
    let mut rig = Rig::new(|_| {});

    rig.court.shock(2500);
    rig.court.ball_at(Distance::Millimeters(150));
    rig.tick_after(0);
    assert_eq!(rig.hits(), 1);
    assert!(rig.app.audio().is_playing());

    rig.app.status().set_sound_enabled(false);
    rig.tick_after(1);
    assert!(!rig.app.audio().is_playing());

    rig.tick_after(5000);
    assert_eq!(rig.hits(), 2);
    assert!(!rig.app.audio().is_playing());
}

#[test]
fn runtime_setting_changes_reach_the_engine() {
    let mut rig = Rig::new(|_| {});
    rig.app.status().set_sound_enabled(false);
    rig.app.settings().set_ball_hit_distance_mm(120).unwrap();

    rig.court.shock(2500);
    rig.court.ball_at(Distance::Millimeters(150));
    rig.tick_after(0);
    assert_eq!(rig.hits(), 0);
    assert_eq!(rig.phase(), Phase::ShotWindowOpen);

    rig.court.ball_at(Distance::Millimeters(110));
    rig.tick_after(10);
    assert_eq!(rig.hits(), 1);
}

#[test]
fn metronome_follows_the_configured_tick() {
    let mut rig = Rig::new(|s| s.set_metronome_sound(1).unwrap());

    rig.tick_after(0);
    assert_eq!(rig.app.audio().current_clip().as_deref(), Some("tick-2.mp3"));
}

#[test]
fn flash_at_half_brightness() {
    let mut rig = Rig::new(|s| s.set_led_brightness(50).unwrap());

    rig.tick_after(0);
    rig.tick_after(99);
    assert_eq!(*rig.duties.lock().unwrap(), vec![127]);

    rig.tick_after(1);
    rig.tick_after(499);
    assert_eq!(*rig.duties.lock().unwrap(), vec![127, 0]);

    rig.tick_after(1);
    assert_eq!(*rig.duties.lock().unwrap(), vec![127, 0, 127]);
}
