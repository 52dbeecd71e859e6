// Goalfinder - Settings Mirror
//
// Runs once per detection cycle on the detection task. Whenever the store
// reports a change (or on boot), the current settings are read once and
// pushed into the running components: directly into the detection engine
// and dispatcher (same task), through the audio handle for the volume, and
// over command channels to the LED and audio tasks.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::announce::AnnouncementDispatcher;
use crate::audio::AudioHandle;
use crate::detection::{DetectionEngine, DetectionParams};
use crate::events::{LedCommand, LedMode, MetronomeCommand};

use super::Settings;

/// Everything the running components consume from the settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub volume: u8,
    pub metronome_sound: usize,
    pub hit_sound: usize,
    pub miss_sound: usize,
    pub vibration_sensitivity: u8,
    pub ball_hit_distance_mm: i32,
    pub distance_only: bool,
    pub led_mode: LedMode,
    pub led_brightness: u8,
    pub after_hit_timeout_s: u32,
}

impl ConfigSnapshot {
    pub fn detection_params(&self) -> DetectionParams {
        DetectionParams {
            ball_hit_distance_mm: self.ball_hit_distance_mm,
            distance_only: self.distance_only,
            after_hit_timeout_ms: self.after_hit_timeout_s.saturating_mul(1000),
            vibration_sensitivity: self.vibration_sensitivity,
        }
    }
}

pub struct SettingsMirror {
    settings: Arc<Settings>,
    led_tx: Sender<LedCommand>,
    metronome_tx: Sender<MetronomeCommand>,
    current: Option<ConfigSnapshot>,
}

impl SettingsMirror {
    pub fn new(
        settings: Arc<Settings>,
        led_tx: Sender<LedCommand>,
        metronome_tx: Sender<MetronomeCommand>,
    ) -> Self {
        Self { settings, led_tx, metronome_tx, current: None }
    }

    pub fn current(&self) -> Option<&ConfigSnapshot> {
        self.current.as_ref()
    }

    /// Apply the stored settings if they changed (or unconditionally when
    /// `force` is set). Returns the snapshot that was applied.
    pub fn refresh(
        &mut self,
        force: bool,
        engine: &mut DetectionEngine,
        dispatcher: &mut AnnouncementDispatcher,
        audio: &AudioHandle,
    ) -> Option<ConfigSnapshot> {
        if !force && !self.settings.is_modified() {
            return None;
        }
        // Clear first: a write racing with the snapshot flags it again.
        self.settings.clear_modified();
        let snapshot = self.settings.snapshot();
        log::debug!("Applying settings: {:?}", snapshot);

        engine.apply_params(snapshot.detection_params());
        dispatcher.set_clips(snapshot.hit_sound, snapshot.miss_sound);
        audio.set_volume(snapshot.volume);

        let led = [LedCommand::SetMode(snapshot.led_mode), LedCommand::SetBrightness(snapshot.led_brightness)];
        for command in led {
            if self.led_tx.send(command).is_err() {
                log::warn!("LED task gone, dropping {:?}", command);
            }
        }
        if self.metronome_tx.send(MetronomeCommand::SetClip(snapshot.metronome_sound)).is_err() {
            log::warn!("Audio task gone, metronome clip not updated");
        }

        self.current = Some(snapshot);
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioPlayer;
    use crate::clips::MemoryClips;
    use crate::clock::ManualClock;
    use crate::settings::MemoryStore;
    use crate::sim::NullSink;
    use crate::status::DeviceStatus;
    use std::sync::mpsc;

    #[test]
    fn applies_only_when_forced_or_modified() {
        let settings = Arc::new(Settings::new(Box::new(MemoryStore::new())));
        let status = Arc::new(DeviceStatus::new());
        let mut engine = DetectionEngine::new(status.clone(), Arc::new(ManualClock::new(0)));
        let mut dispatcher = AnnouncementDispatcher::new(status);
        let audio = AudioHandle::new(AudioPlayer::new(Box::new(MemoryClips::new()), Box::new(NullSink::default())));
        let (led_tx, led_rx) = mpsc::channel();
        let (metronome_tx, metronome_rx) = mpsc::channel();
        let mut mirror = SettingsMirror::new(settings.clone(), led_tx, metronome_tx);

        assert!(mirror.refresh(false, &mut engine, &mut dispatcher, &audio).is_none());

        let boot = mirror.refresh(true, &mut engine, &mut dispatcher, &audio).unwrap();
        assert_eq!(boot.led_mode, LedMode::Flash);
        assert_eq!(led_rx.try_recv(), Ok(LedCommand::SetMode(LedMode::Flash)));
        assert_eq!(led_rx.try_recv(), Ok(LedCommand::SetBrightness(100)));
        assert_eq!(metronome_rx.try_recv(), Ok(MetronomeCommand::SetClip(0)));

        settings.set_ball_hit_distance_mm(120).unwrap();
        settings.set_after_hit_timeout_s(2).unwrap();
        settings.set_volume(70).unwrap();
        mirror.refresh(false, &mut engine, &mut dispatcher, &audio).unwrap();

        assert_eq!(engine.params().ball_hit_distance_mm, 120);
        assert_eq!(engine.params().after_hit_timeout_ms, 2000);
        assert!(!settings.is_modified());
        assert!(mirror.refresh(false, &mut engine, &mut dispatcher, &audio).is_none());
    }
}
