// Goalfinder - Metronome
//
// Cosmetic feedback while the audio player is idle: a tick clip on a fixed
// cadence, or the "waiting" clip while a shot window is open.

use crate::audio::AudioHandle;
use crate::clips::{select_clip, ClipKind};
use crate::config::{METRONOME_INTERVAL_MS, WAITING_CLIP};
use crate::events::MetronomeCommand;

pub struct Metronome {
    interval_ms: u32,
    last_tick_ms: u32,
    clip_index: usize,
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new(METRONOME_INTERVAL_MS)
    }
}

impl Metronome {
    pub fn new(interval_ms: u32) -> Self {
        Self { interval_ms, last_tick_ms: 0, clip_index: 0 }
    }

    pub fn apply(&mut self, command: MetronomeCommand) {
        match command {
            MetronomeCommand::SetClip(index) => self.clip_index = index,
        }
    }

    /// Clip due at `now`, if the interval has elapsed. Advances the cadence.
    pub fn due_clip(&mut self, now: u32, shot_pending: bool) -> Option<&'static str> {
        if now.wrapping_sub(self.last_tick_ms) <= self.interval_ms {
            return None;
        }
        self.last_tick_ms = now;
        Some(if shot_pending {
            WAITING_CLIP
        } else {
            select_clip(ClipKind::Tick, self.clip_index)
        })
    }

    /// Call only while the player is idle.
    pub fn tick(&mut self, now: u32, shot_pending: bool, audio: &AudioHandle) {
        if let Some(clip) = self.due_clip(now, shot_pending) {
            audio.play(clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_once_per_interval() {
        let mut metronome = Metronome::new(2000);
        assert_eq!(metronome.due_clip(2000, false), None);
        assert_eq!(metronome.due_clip(2001, false), Some("tick-1.mp3"));
        assert_eq!(metronome.due_clip(3000, false), None);
        assert_eq!(metronome.due_clip(4001, false), None);
        assert_eq!(metronome.due_clip(4002, false), Some("tick-1.mp3"));
    }

    #[test]
    fn pending_shot_swaps_in_waiting_clip() {
        let mut metronome = Metronome::new(2000);
        metronome.apply(MetronomeCommand::SetClip(1));
        assert_eq!(metronome.due_clip(2001, true), Some(WAITING_CLIP));
        assert_eq!(metronome.due_clip(4002, false), Some("tick-2.mp3"));
    }
}
