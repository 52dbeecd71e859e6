// Goalfinder - Application Wiring
//
// Builds every component once, hands each task the handles it needs, and
// spawns the task threads. Nothing here is global: the main entry point
// owns the `App` until `spawn`, after which the returned handle exposes the
// state shared with reporting code (status counters, settings, audio).

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::announce::AnnouncementDispatcher;
use crate::audio::{AudioHandle, AudioPlayer, AudioSink};
use crate::clips::ClipSource;
use crate::clock::Clock;
use crate::detection::DetectionEngine;
use crate::events::LedMode;
use crate::led::{LedOutput, LedRenderer};
use crate::logger::LogDrain;
use crate::metronome::Metronome;
use crate::sensors::{DistanceSensor, VibrationSensor};
use crate::settings::{Settings, SettingsMirror};
use crate::status::DeviceStatus;
use crate::tasks::audio::AudioTask;
use crate::tasks::detection::DetectionTask;
use crate::tasks::led::LedTask;
use crate::tasks::{self, AUDIO_TASK, DETECTION_TASK, LED_TASK, LOGGER_TASK};

/// Peripherals the application runs on.
pub struct Hardware {
    pub distance: Box<dyn DistanceSensor>,
    pub vibration: Box<dyn VibrationSensor>,
    pub clips: Box<dyn ClipSource>,
    pub audio_out: Box<dyn AudioSink>,
    pub led: Box<dyn LedOutput>,
}

pub struct App {
    status: Arc<DeviceStatus>,
    settings: Arc<Settings>,
    audio: AudioHandle,
    detection: DetectionTask,
    audio_task: AudioTask,
    led_task: LedTask,
}

/// What remains reachable once the tasks run.
pub struct AppHandle {
    pub status: Arc<DeviceStatus>,
    pub settings: Arc<Settings>,
    pub audio: AudioHandle,
    threads: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(hw: Hardware, settings: Arc<Settings>, clock: Arc<dyn Clock>) -> Self {
        let status = Arc::new(DeviceStatus::new());
        let audio = AudioHandle::new(AudioPlayer::new(hw.clips, hw.audio_out));

        let (led_tx, led_rx) = mpsc::channel();
        let (metronome_tx, metronome_rx) = mpsc::channel();

        let mut renderer = LedRenderer::new(hw.led);
        renderer.set_mode(LedMode::Flash);

        let mut detection = DetectionTask::new(
            DetectionEngine::new(status.clone(), clock.clone()),
            AnnouncementDispatcher::new(status.clone()),
            SettingsMirror::new(settings.clone(), led_tx, metronome_tx),
            hw.distance,
            hw.vibration,
            audio.clone(),
        );
        detection.apply_settings();

        let audio_task = AudioTask::new(audio.clone(), Metronome::default(), metronome_rx, status.clone(), clock.clone());
        let led_task = LedTask::new(renderer, led_rx, clock);

        Self { status, settings, audio, detection, audio_task, led_task }
    }

    pub fn status(&self) -> &Arc<DeviceStatus> {
        &self.status
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn audio(&self) -> &AudioHandle {
        &self.audio
    }

    pub fn detection(&self) -> &DetectionTask {
        &self.detection
    }

    /// Run one iteration of every task on the calling thread, in the order
    /// detection, audio, LED.
    pub fn tick(&mut self) {
        let _ = self.detection.run_once();
        let _ = self.audio_task.run_once();
        let _ = self.led_task.run_once();
    }

    /// Start the task threads. The logger task only runs when a drain is
    /// given.
    pub fn spawn(self, log_drain: Option<LogDrain>) -> anyhow::Result<AppHandle> {
        let Self { status, settings, audio, mut detection, mut audio_task, mut led_task } = self;
        let mut threads = Vec::with_capacity(4);

        if let Some(drain) = log_drain {
            threads.push(tasks::spawn(LOGGER_TASK, move || tasks::logger::run_once(&drain))?);
        }
        threads.push(tasks::spawn(DETECTION_TASK, move || detection.run_once())?);
        threads.push(tasks::spawn(AUDIO_TASK, move || audio_task.run_once())?);
        threads.push(tasks::spawn(LED_TASK, move || led_task.run_once())?);

        log::info!("{} tasks running", threads.len());
        Ok(AppHandle { status, settings, audio, threads })
    }
}

impl AppHandle {
    /// Block until every task has exited. Tasks only exit on fatal errors,
    /// so on the device this never returns.
    pub fn join(self) {
        for thread in self.threads {
            if thread.join().is_err() {
                log::error!("A task panicked");
            }
        }
    }
}
