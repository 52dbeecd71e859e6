// Goalfinder - ESP32 Peripheral Drivers
//
// Each driver implements one of the library's hardware seams:
//   - tof:       VL53L0X distance sensor  -> sensors::DistanceSensor
//   - vibration: vibration switch input   -> sensors::VibrationSensor
//   - i2s:       speaker amplifier        -> audio::AudioSink
//   - ledc:      LED strip PWM            -> led::LedOutput
//   - nvs:       settings persistence     -> settings::SettingsStore

pub mod i2s;
pub mod ledc;
pub mod nvs;
pub mod tof;
pub mod vibration;
