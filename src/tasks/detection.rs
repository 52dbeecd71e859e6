// Goalfinder - Detection Task
//
// One cycle per tick: pick up settings changes, sense and evaluate, then
// dispatch whatever the engine announced. The steps never overlap.

use std::ops::ControlFlow;

use crate::announce::AnnouncementDispatcher;
use crate::audio::AudioHandle;
use crate::detection::DetectionEngine;
use crate::sensors::{DistanceSensor, VibrationSensor};
use crate::settings::SettingsMirror;

pub struct DetectionTask {
    pub engine: DetectionEngine,
    pub dispatcher: AnnouncementDispatcher,
    pub mirror: SettingsMirror,
    distance: Box<dyn DistanceSensor>,
    vibration: Box<dyn VibrationSensor>,
    audio: AudioHandle,
}

impl DetectionTask {
    pub fn new(
        engine: DetectionEngine,
        dispatcher: AnnouncementDispatcher,
        mirror: SettingsMirror,
        distance: Box<dyn DistanceSensor>,
        vibration: Box<dyn VibrationSensor>,
        audio: AudioHandle,
    ) -> Self {
        Self { engine, dispatcher, mirror, distance, vibration, audio }
    }

    /// Apply the stored settings unconditionally (boot).
    pub fn apply_settings(&mut self) {
        self.mirror.refresh(true, &mut self.engine, &mut self.dispatcher, &self.audio);
    }

    pub fn run_once(&mut self) -> ControlFlow<()> {
        self.mirror.refresh(false, &mut self.engine, &mut self.dispatcher, &self.audio);

        let audio = &self.audio;
        self.engine.detect(&mut *self.distance, &mut *self.vibration, || audio.is_playing());

        let announcement = self.engine.take_announcement();
        if self.dispatcher.dispatch(announcement, &self.audio) {
            self.engine.mark_announcing();
        }
        ControlFlow::Continue(())
    }
}
