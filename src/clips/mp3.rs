// Goalfinder - MP3 Clip Decoding
//
// Frames are decoded on demand, one packet at a time, so a clip never sits
// in RAM as a whole. Output is 16-bit mono PCM; stereo input is down-mixed.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as DecodeError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{ClipError, ClipStream};
use crate::config::AUDIO_SAMPLE_RATE_HZ;

pub(super) struct Mp3Stream {
    clip: String,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    pcm: Vec<u8>,
    pos: usize,
    finished: bool,
}

fn decode_error(clip: &str, e: DecodeError) -> ClipError {
    ClipError::Decode { clip: clip.to_owned(), message: e.to_string() }
}

impl Mp3Stream {
    pub(super) fn open(path: &Path, clip: &str) -> Result<Self, ClipError> {
        let file = File::open(path)?;
        let source = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        hint.with_extension("mp3");

        let probed = symphonia::default::get_probe()
            .format(&hint, source, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| decode_error(clip, e))?;
        let format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| ClipError::Decode { clip: clip.to_owned(), message: "no audio track".to_owned() })?;
        let track_id = track.id;
        if let Some(rate) = track.codec_params.sample_rate {
            if rate != AUDIO_SAMPLE_RATE_HZ {
                log::warn!("{} is {} Hz, output runs at {} Hz", clip, rate, AUDIO_SAMPLE_RATE_HZ);
            }
        }
        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| decode_error(clip, e))?;

        Ok(Self {
            clip: clip.to_owned(),
            format,
            decoder,
            track_id,
            pcm: Vec::new(),
            pos: 0,
            finished: false,
        })
    }

    /// Decode the next packet into `pcm`. `false` at the end of the clip.
    fn decode_next(&mut self) -> Result<bool, ClipError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(DecodeError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => return Ok(false),
                Err(e) => return Err(decode_error(&self.clip, e)),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(DecodeError::DecodeError(reason)) => {
                    log::debug!("{}: skipping corrupt frame ({})", self.clip, reason);
                    continue;
                }
                Err(e) => return Err(decode_error(&self.clip, e)),
            };

            let signal = *decoded.spec();
            let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, signal);
            samples.copy_interleaved_ref(decoded);
            downmix(samples.samples(), signal.channels.count(), &mut self.pcm);
            self.pos = 0;
            return Ok(true);
        }
    }
}

impl ClipStream for Mp3Stream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClipError> {
        while self.pos == self.pcm.len() {
            if self.finished || !self.decode_next()? {
                self.finished = true;
                return Ok(0);
            }
        }
        let n = buf.len().min(self.pcm.len() - self.pos);
        buf[..n].copy_from_slice(&self.pcm[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Average interleaved frames into little-endian mono samples.
fn downmix(interleaved: &[i16], channels: usize, out: &mut Vec<u8>) {
    out.clear();
    for frame in interleaved.chunks_exact(channels.max(1)) {
        let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
        let mono = (sum / frame.len() as i32) as i16;
        out.extend_from_slice(&mono.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_frames_are_averaged() {
        let mut out = vec![0xAA; 3];
        downmix(&[100, 300, -200, -400, i16::MAX, i16::MAX], 2, &mut out);
        let mono: Vec<i16> = out.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])).collect();
        assert_eq!(mono, vec![200, -300, i16::MAX]);
    }

    #[test]
    fn mono_passes_through() {
        let mut out = Vec::new();
        downmix(&[1, -2], 1, &mut out);
        assert_eq!(out, vec![1, 0, 0xFE, 0xFF]);
    }
}
