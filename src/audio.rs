// Goalfinder - Audio Player
//
// Streams PCM clips from a clip source into an audio sink. `step()` moves at
// most one chunk per call and never blocks, so it can be driven from the
// audio task every tick. The player is shared between the audio task
// (stepping, metronome) and the detection task (announcements) through
// `AudioHandle`, which takes the lock for exactly one operation at a time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::clips::{ClipError, ClipSource, ClipStream};
use crate::config::{AUDIO_CHUNK_BYTES, AUDIO_DEFAULT_VOLUME};

/// Output side of the player (I2S on the device).
pub trait AudioSink: Send {
    /// Queue PCM bytes without blocking; returns how many were accepted.
    fn write(&mut self, pcm: &[u8]) -> anyhow::Result<usize>;

    /// Output gain, 0.0 (silent) up to just below 4.0.
    fn set_gain(&mut self, gain: f32);
}

/// Map a volume percentage onto the output gain curve.
pub fn volume_to_gain(percent: u8) -> f32 {
    const BASE: f32 = 25.0;
    const EPSILON: f32 = 0.01; // a gain of exactly 4.0 mutes the output stage
    f32::from(percent.min(100)) / BASE - EPSILON
}

pub struct AudioPlayer {
    source: Box<dyn ClipSource>,
    sink: Box<dyn AudioSink>,
    stream: Option<Box<dyn ClipStream>>,
    current_clip: Option<String>,
    buffer: Vec<u8>,
    buffered: usize,
    written: usize,
    volume_pct: Option<u8>,
}

impl AudioPlayer {
    pub fn new(source: Box<dyn ClipSource>, sink: Box<dyn AudioSink>) -> Self {
        let mut player = Self {
            source,
            sink,
            stream: None,
            current_clip: None,
            buffer: vec![0; AUDIO_CHUNK_BYTES],
            buffered: 0,
            written: 0,
            volume_pct: None,
        };
        player.set_volume(AUDIO_DEFAULT_VOLUME);
        player
    }

    /// Abandon the current clip (if any) and start `clip`.
    pub fn play(&mut self, clip: &str) -> Result<(), ClipError> {
        self.stop();
        let stream = self.source.open(clip)?;
        self.stream = Some(stream);
        self.current_clip = Some(clip.to_owned());
        Ok(())
    }

    /// Advance playback by at most one chunk. Stops automatically at the end
    /// of the clip or on a read/write error.
    pub fn step(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        if self.written == self.buffered {
            match stream.read(&mut self.buffer) {
                Ok(0) => {
                    self.stop();
                    return;
                }
                Ok(n) => {
                    self.buffered = n;
                    self.written = 0;
                }
                Err(e) => {
                    log::error!("Clip read failed: {}", e);
                    self.stop();
                    return;
                }
            }
        }

        match self.sink.write(&self.buffer[self.written..self.buffered]) {
            Ok(n) => self.written += n,
            Err(e) => {
                log::error!("Audio output failed: {}", e);
                self.stop();
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(clip) = self.current_clip.take() {
            log::debug!("Playback of '{}' stopped", clip);
        }
        self.stream = None;
        self.buffered = 0;
        self.written = 0;
    }

    pub fn is_playing(&self) -> bool {
        self.stream.is_some()
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.current_clip.as_deref()
    }

    /// Set the volume in percent (clipped to 100). Repeating the current
    /// value does not touch the output.
    pub fn set_volume(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.volume_pct == Some(percent) {
            return;
        }
        self.volume_pct = Some(percent);
        let gain = volume_to_gain(percent);
        log::info!("Setting audio gain to {:.3} ({}%)", gain, percent);
        self.sink.set_gain(gain);
    }

    pub fn volume(&self) -> Option<u8> {
        self.volume_pct
    }
}

// ---------------------------------------------------------------------------
// Shared handle
// ---------------------------------------------------------------------------

/// Thread-safe handle to the single audio player. Each method holds the lock
/// for that one operation only.
#[derive(Clone)]
pub struct AudioHandle {
    player: Arc<Mutex<AudioPlayer>>,
}

impl AudioHandle {
    pub fn new(player: AudioPlayer) -> Self {
        Self { player: Arc::new(Mutex::new(player)) }
    }

    fn lock(&self) -> MutexGuard<'_, AudioPlayer> {
        // Every operation leaves the player consistent, so poisoning is ignored.
        self.player.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a clip, logging (not propagating) failures.
    pub fn play(&self, clip: &str) -> bool {
        log::info!("{:.3}: starting playback of '{}'", crate::now_ms() as f32 / 1000.0, clip);
        match self.lock().play(clip) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Cannot play '{}': {}", clip, e);
                false
            }
        }
    }

    /// Advance playback; returns whether a clip is still playing afterwards.
    pub fn step(&self) -> bool {
        let mut player = self.lock();
        player.step();
        player.is_playing()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().is_playing()
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    pub fn set_volume(&self, percent: u8) {
        self.lock().set_volume(percent);
    }

    pub fn current_clip(&self) -> Option<String> {
        self.lock().current_clip().map(str::to_owned)
    }
}
