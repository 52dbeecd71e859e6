// Goalfinder - WAV Clip Streaming
//
// Uncompressed 16-bit mono PCM. The RIFF header is validated once on open;
// reads then come straight out of the `data` chunk.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::{ClipError, ClipStream};
use crate::config::AUDIO_SAMPLE_RATE_HZ;

pub(super) struct WavStream {
    reader: BufReader<File>,
    remaining: u32,
}

impl WavStream {
    pub(super) fn open(path: &Path, clip: &str) -> Result<Self, ClipError> {
        let mut reader = BufReader::new(File::open(path)?);
        let remaining = seek_to_pcm(&mut reader, clip)?;
        Ok(Self { reader, remaining })
    }
}

impl ClipStream for WavStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClipError> {
        let want = buf.len().min(self.remaining as usize);
        if want == 0 {
            return Ok(0);
        }
        let n = self.reader.read(&mut buf[..want])?;
        self.remaining -= n as u32;
        Ok(n)
    }
}

/// Walk the RIFF chunks up to `data`, checking the `fmt ` chunk on the way.
/// Returns the PCM payload length.
fn seek_to_pcm<R: Read + Seek>(reader: &mut R, clip: &str) -> Result<u32, ClipError> {
    let invalid = |reason| ClipError::InvalidHeader { clip: clip.to_owned(), reason };

    let mut riff = [0u8; 12];
    reader.read_exact(&mut riff).map_err(|_| invalid("truncated RIFF header"))?;
    if &riff[0..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
        return Err(invalid("not a RIFF/WAVE file"));
    }

    let mut fmt_seen = false;
    loop {
        let mut header = [0u8; 8];
        reader.read_exact(&mut header).map_err(|_| invalid("missing data chunk"))?;
        let id = &header[0..4];
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        match id {
            b"fmt " => {
                if size < 16 {
                    return Err(invalid("short fmt chunk"));
                }
                let mut fmt = [0u8; 16];
                reader.read_exact(&mut fmt)?;
                let format = u16::from_le_bytes([fmt[0], fmt[1]]);
                let channels = u16::from_le_bytes([fmt[2], fmt[3]]);
                let rate = u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]);
                let bits = u16::from_le_bytes([fmt[14], fmt[15]]);

                if format != 1 {
                    return Err(invalid("not PCM"));
                }
                if channels != 1 || bits != 16 {
                    return Err(ClipError::Unsupported { clip: clip.to_owned(), channels, bits });
                }
                if rate != AUDIO_SAMPLE_RATE_HZ {
                    log::warn!("{} is {} Hz, output runs at {} Hz", clip, rate, AUDIO_SAMPLE_RATE_HZ);
                }
                skip(reader, padded(size) - 16)?;
                fmt_seen = true;
            }
            b"data" => {
                if !fmt_seen {
                    return Err(invalid("data chunk before fmt chunk"));
                }
                return Ok(size);
            }
            _ => skip(reader, padded(size))?,
        }
    }
}

fn padded(size: u32) -> u32 {
    size + (size & 1)
}

fn skip<R: Seek>(reader: &mut R, bytes: u32) -> Result<(), ClipError> {
    if bytes > 0 {
        reader.seek(SeekFrom::Current(i64::from(bytes)))?;
    }
    Ok(())
}
