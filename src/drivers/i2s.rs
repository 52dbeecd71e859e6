// Goalfinder - I2S Audio Output
//
// Standard (Philips) I2S transmitter, 16-bit mono. Gain is applied in
// software on the way to the DMA buffers; writes never wait for room.

use esp_idf_hal::gpio::{AnyIOPin, InputPin, OutputPin};
use esp_idf_hal::i2s::config::{Config, DataBitWidth, SlotMode, StdClkConfig, StdConfig, StdGpioConfig, StdSlotConfig};
use esp_idf_hal::i2s::{I2sDriver, I2sTx, I2S0};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_sys::ESP_ERR_TIMEOUT;

use crate::audio::AudioSink;
use crate::config::{AUDIO_CHUNK_BYTES, AUDIO_SAMPLE_RATE_HZ};

pub struct I2sSpeaker {
    driver: I2sDriver<'static, I2sTx>,
    gain: f32,
    scratch: Vec<u8>,
}

impl I2sSpeaker {
    pub fn new(
        i2s: impl Peripheral<P = I2S0> + 'static,
        bclk: impl Peripheral<P = impl InputPin + OutputPin> + 'static,
        dout: impl Peripheral<P = impl OutputPin> + 'static,
        ws: impl Peripheral<P = impl InputPin + OutputPin> + 'static,
    ) -> anyhow::Result<Self> {
        let config = StdConfig::new(
            Config::default(),
            StdClkConfig::from_sample_rate_hz(AUDIO_SAMPLE_RATE_HZ),
            StdSlotConfig::philips_slot_default(DataBitWidth::Bits16, SlotMode::Mono),
            StdGpioConfig::default(),
        );
        let mut driver = I2sDriver::new_std_tx(i2s, &config, bclk, dout, None::<AnyIOPin>, ws)?;
        driver.tx_enable()?;
        log::info!("I2S output ready ({} Hz, 16-bit mono)", AUDIO_SAMPLE_RATE_HZ);
        Ok(Self { driver, gain: 1.0, scratch: Vec::with_capacity(AUDIO_CHUNK_BYTES) })
    }
}

/// Scale little-endian 16-bit samples, saturating at full scale.
fn apply_gain(pcm: &[u8], gain: f32, out: &mut Vec<u8>) {
    out.clear();
    for sample in pcm.chunks_exact(2) {
        let scaled = f32::from(i16::from_le_bytes([sample[0], sample[1]])) * gain;
        let clamped = scaled.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
        out.extend_from_slice(&clamped.to_le_bytes());
    }
}

impl AudioSink for I2sSpeaker {
    fn write(&mut self, pcm: &[u8]) -> anyhow::Result<usize> {
        apply_gain(pcm, self.gain, &mut self.scratch);
        match self.driver.write(&self.scratch, 0) {
            Ok(n) => Ok(n),
            // DMA buffers full
            Err(e) if e.code() == ESP_ERR_TIMEOUT as i32 => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }
}
