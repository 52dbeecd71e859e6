// Goalfinder - Audio Task
//
// Advances the player by one chunk per tick and, while nothing is playing,
// lets the metronome start its next tick or waiting clip. Nothing is stepped
// while sound is disabled.

use std::ops::ControlFlow;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::audio::AudioHandle;
use crate::clock::Clock;
use crate::events::MetronomeCommand;
use crate::metronome::Metronome;
use crate::status::DeviceStatus;

pub struct AudioTask {
    audio: AudioHandle,
    metronome: Metronome,
    commands: Receiver<MetronomeCommand>,
    status: Arc<DeviceStatus>,
    clock: Arc<dyn Clock>,
}

impl AudioTask {
    pub fn new(
        audio: AudioHandle,
        metronome: Metronome,
        commands: Receiver<MetronomeCommand>,
        status: Arc<DeviceStatus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { audio, metronome, commands, status, clock }
    }

    pub fn run_once(&mut self) -> ControlFlow<()> {
        for command in self.commands.try_iter() {
            self.metronome.apply(command);
        }

        if !self.status.is_sound_enabled() {
            // A clip left running would hold the detection gate shut.
            if self.audio.is_playing() {
                log::info!("Sound disabled, stopping playback");
                self.audio.stop();
            }
        } else if !self.audio.step() {
            let now = self.clock.now_ms();
            self.metronome.tick(now, self.status.is_shot_pending(), &self.audio);
        }
        ControlFlow::Continue(())
    }
}
