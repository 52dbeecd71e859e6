// Goalfinder - LED Strip PWM Driver
//
// The strip hangs off a MOSFET gate driven by one LEDC channel.

use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcChannel, LedcDriver, LedcTimer, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

use crate::config::LED_PWM_FREQUENCY_HZ;
use crate::led::LedOutput;

pub struct PwmLed {
    channel: LedcDriver<'static>,
}

impl PwmLed {
    pub fn new<C, T>(
        timer: impl Peripheral<P = T> + 'static,
        channel: impl Peripheral<P = C> + 'static,
        pin: impl Peripheral<P = impl OutputPin> + 'static,
    ) -> anyhow::Result<Self>
    where
        C: LedcChannel<SpeedMode = <T as LedcTimer>::SpeedMode>,
        T: LedcTimer + 'static,
    {
        let timer = LedcTimerDriver::new(
            timer,
            &TimerConfig::new().frequency(LED_PWM_FREQUENCY_HZ.Hz()).resolution(Resolution::Bits8),
        )?;
        // Like the peripherals themselves, the timer is never released.
        let timer: &'static LedcTimerDriver<'static, T> = Box::leak(Box::new(timer));
        let mut channel = LedcDriver::new(channel, timer, pin)?;
        channel.set_duty(0)?;
        log::info!("LED PWM ready ({} Hz, 8-bit)", LED_PWM_FREQUENCY_HZ);
        Ok(Self { channel })
    }
}

impl LedOutput for PwmLed {
    fn set_duty(&mut self, duty: u8) {
        if let Err(e) = self.channel.set_duty(u32::from(duty)) {
            log::warn!("LED duty update failed: {}", e);
        }
    }
}
