// Goalfinder - Sound Clips & Asset Store
//
// Clips live on the asset filesystem as MP3, with uncompressed 16-bit mono
// WAV accepted in their place. The audio player only sees raw PCM: each
// format module hands out a stream of mono samples.

mod mp3;
mod wav;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::*;

#[derive(Debug, Error)]
pub enum ClipError {
    #[error("clip not found: {0}")]
    NotFound(String),

    #[error("invalid WAV file {clip}: {reason}")]
    InvalidHeader { clip: String, reason: &'static str },

    #[error("unsupported WAV format in {clip}: {channels} channel(s), {bits} bit")]
    Unsupported { clip: String, channels: u16, bits: u16 },

    #[error("cannot decode {clip}: {message}")]
    Decode { clip: String, message: String },

    #[error("clip I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait ClipStream: Send {
    /// Fill `buf` with PCM bytes; `Ok(0)` marks the end of the clip.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClipError>;
}

pub trait ClipSource: Send {
    fn open(&mut self, clip: &str) -> Result<Box<dyn ClipStream>, ClipError>;
}

// ---------------------------------------------------------------------------
// Clip tables
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipKind {
    Tick,
    Hit,
    Miss,
}

impl ClipKind {
    fn table(self) -> &'static [&'static str] {
        match self {
            Self::Tick => TICK_CLIPS,
            Self::Hit  => HIT_CLIPS,
            Self::Miss => MISS_CLIPS,
        }
    }
}

/// Resolve a configured clip index. Out-of-range indices are clamped to the
/// last entry of the table.
pub fn select_clip(kind: ClipKind, index: usize) -> &'static str {
    let table = kind.table();
    let last = table.len() - 1;
    if index > last {
        log::warn!("{:?} clip index {} out of range, using {}", kind, index, last);
    }
    table[index.min(last)]
}

// ---------------------------------------------------------------------------
// Clip files on the asset filesystem
// ---------------------------------------------------------------------------

const MP3_EXTENSION: &str = "mp3";
const WAV_EXTENSION: &str = "wav";

pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

/// Opens clips by name under an asset root. A clip that is missing in the
/// requested format is looked up again as `.mp3`, then as `.wav`.
#[derive(Debug, Clone)]
pub struct FileClipSource {
    root: PathBuf,
}

impl FileClipSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, clip: &str) -> PathBuf {
        self.root.join(clip.trim_start_matches('/'))
    }

    fn resolve(&self, clip: &str) -> Option<PathBuf> {
        let path = self.path_of(clip);
        if file_exists(&path) {
            return Some(path);
        }
        [MP3_EXTENSION, WAV_EXTENSION]
            .iter()
            .map(|ext| path.with_extension(ext))
            .find(|candidate| file_exists(candidate))
    }
}

impl ClipSource for FileClipSource {
    fn open(&mut self, clip: &str) -> Result<Box<dyn ClipStream>, ClipError> {
        let path = self
            .resolve(clip)
            .ok_or_else(|| ClipError::NotFound(self.path_of(clip).display().to_string()))?;

        let is_mp3 = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MP3_EXTENSION));
        if is_mp3 {
            Ok(Box::new(mp3::Mp3Stream::open(&path, clip)?))
        } else {
            Ok(Box::new(wav::WavStream::open(&path, clip)?))
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory clips (host simulation, tests)
// ---------------------------------------------------------------------------

/// Raw PCM clips held in memory, keyed by clip name.
#[derive(Debug, Clone, Default)]
pub struct MemoryClips {
    clips: HashMap<String, Arc<[u8]>>,
}

impl MemoryClips {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(mut self, name: &str, pcm: Vec<u8>) -> Self {
        self.clips.insert(name.to_owned(), pcm.into());
        self
    }
}

impl ClipSource for MemoryClips {
    fn open(&mut self, clip: &str) -> Result<Box<dyn ClipStream>, ClipError> {
        let pcm = self
            .clips
            .get(clip)
            .cloned()
            .ok_or_else(|| ClipError::NotFound(clip.to_owned()))?;
        Ok(Box::new(MemoryStream { pcm, pos: 0 }))
    }
}

struct MemoryStream {
    pcm: Arc<[u8]>,
    pos: usize,
}

impl ClipStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClipError> {
        let n = buf.len().min(self.pcm.len() - self.pos);
        buf[..n].copy_from_slice(&self.pcm[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
