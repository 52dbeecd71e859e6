// Goalfinder - Announcement Dispatcher
//
// Turns the engine's pending announcement into its side effect: a trace line
// for a shot, the configured clip for a hit or miss. The caller takes the
// announcement out of the engine first, so every event is dispatched at
// most once.

use std::sync::Arc;

use crate::audio::AudioHandle;
use crate::clips::{select_clip, ClipKind};
use crate::events::Announcement;
use crate::status::DeviceStatus;

pub struct AnnouncementDispatcher {
    hit_clip: usize,
    miss_clip: usize,
    status: Arc<DeviceStatus>,
}

impl AnnouncementDispatcher {
    pub fn new(status: Arc<DeviceStatus>) -> Self {
        Self { hit_clip: 0, miss_clip: 0, status }
    }

    pub fn set_clips(&mut self, hit_clip: usize, miss_clip: usize) {
        self.hit_clip = hit_clip;
        self.miss_clip = miss_clip;
    }

    /// Clip voiced for `announcement`, if any.
    pub fn clip_for(&self, announcement: Announcement) -> Option<&'static str> {
        match announcement {
            Announcement::Hit => Some(select_clip(ClipKind::Hit, self.hit_clip)),
            Announcement::Miss => Some(select_clip(ClipKind::Miss, self.miss_clip)),
            Announcement::Shot | Announcement::None => None,
        }
    }

    /// Returns `true` if a sound was started. Nothing is played while sound
    /// is disabled, since the audio task would never advance it.
    pub fn dispatch(&self, announcement: Announcement, audio: &AudioHandle) -> bool {
        if announcement == Announcement::None {
            return false;
        }
        log::info!(
            "{:.3}: announcing event '{}'",
            crate::now_ms() as f32 / 1000.0,
            announcement.trace_label()
        );

        match self.clip_for(announcement) {
            Some(clip) if self.status.is_sound_enabled() => audio.play(clip),
            _ => false,
        }
    }
}
