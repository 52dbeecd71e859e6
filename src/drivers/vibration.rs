// Goalfinder - Vibration Sensor Driver
//
// SW-420 style module: digital output goes HIGH while the spring switch
// rattles. The shot strength is the width of that pulse.

use esp_idf_hal::gpio::{AnyInputPin, Input, PinDriver};

use crate::sensors::{measure_pulse, VibrationSensor};

pub struct VibrationInput {
    pin: PinDriver<'static, AnyInputPin, Input>,
}

impl VibrationInput {
    pub fn new(pin: PinDriver<'static, AnyInputPin, Input>) -> Self {
        Self { pin }
    }
}

impl VibrationSensor for VibrationInput {
    fn measure_pulse_us(&mut self, timeout_us: u32) -> u32 {
        let pin = &self.pin;
        measure_pulse(
            || pin.is_high(),
            || unsafe { esp_idf_sys::esp_timer_get_time() as u64 },
            timeout_us,
        )
    }
}
