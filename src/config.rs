// Goalfinder - Hardware & System Configuration
// Target: ESP32 (Xtensa, dual core)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_TOF_SDA: i32 = 22;      // VL53L0X I2C data line
pub const PIN_TOF_SCL: i32 = 21;      // VL53L0X I2C clock line
pub const PIN_I2S_BCLK: i32 = 23;     // I2S bit clock
pub const PIN_I2S_WCLK: i32 = 5;      // I2S word select
pub const PIN_I2S_DOUT: i32 = 19;     // I2S data out
pub const PIN_LED_PWM: i32 = 17;      // LED strip MOSFET gate (LEDC)
pub const PIN_VIBRATION: i32 = 13;    // SW-420 vibration sensor (digital out)

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_VL53L0X: u8 = 0x29;
pub const I2C_BAUDRATE_KHZ: u32 = 400;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Audio (I2S, 16-bit mono PCM clips)
// ---------------------------------------------------------------------------
pub const AUDIO_SAMPLE_RATE_HZ: u32 = 22_050;
pub const AUDIO_CHUNK_BYTES: usize = 512;
pub const AUDIO_DEFAULT_VOLUME: u8 = 50;
pub const ASSET_ROOT: &str = "/spiffs";

// ---------------------------------------------------------------------------
// LED (LEDC PWM)
// ---------------------------------------------------------------------------
pub const LED_PWM_FREQUENCY_HZ: u32 = 5000;
pub const LED_PWM_RESOLUTION_BITS: u32 = 8;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes), priorities and cores
// ---------------------------------------------------------------------------
pub const STACK_AUDIO: usize = 8192;
pub const STACK_DETECTION: usize = 8192;
pub const STACK_LED: usize = 4096;
pub const STACK_LOGGER: usize = 4096;

pub const PRIORITY_AUDIO: u8 = 1;
pub const PRIORITY_DETECTION: u8 = 2;
pub const PRIORITY_LED: u8 = 1;
pub const PRIORITY_LOGGER: u8 = 1;

pub const CORE_AUDIO: usize = 1;
pub const CORE_DETECTION: usize = 0;
pub const CORE_LED: usize = 0;
pub const CORE_LOGGER: usize = 0;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const AUDIO_TASK_INTERVAL_MS: u64 = 1;
pub const DETECTION_TASK_INTERVAL_MS: u64 = 1;
pub const LED_TASK_INTERVAL_MS: u64 = 1;
pub const LOGGER_TASK_INTERVAL_MS: u64 = 1;
pub const METRONOME_INTERVAL_MS: u32 = 2000;

// ---------------------------------------------------------------------------
// Shot / Hit Detection
// ---------------------------------------------------------------------------
pub const SHOT_VIBRATION_THRESHOLD: u32 = 2000;   // pulse width (us) that opens a shot
pub const MAX_SHOT_DURATION_MS: u32 = 5000;       // shot window before a miss
pub const VIBRATION_MEASURE_TIMEOUT_US: u32 = 10_000;
pub const MIN_HIT_DISTANCE_MM: i32 = 20;          // closer readings are sensor noise

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------
pub const LOG_QUEUE_CAPACITY: usize = 50;
pub const LOG_MAX_LEVEL: log::LevelFilter = log::LevelFilter::Debug;

// ---------------------------------------------------------------------------
// Sound Clips (relative to ASSET_ROOT)
// ---------------------------------------------------------------------------
pub const TICK_CLIPS: &[&str] = &["tick-1.mp3", "tick-2.mp3", "tick-3.mp3"];
pub const HIT_CLIPS: &[&str] = &["hit-1.mp3", "hit-2.mp3", "hit-3.mp3"];
pub const MISS_CLIPS: &[&str] = &["miss-1.mp3", "miss-2.mp3", "miss-3.mp3"];
pub const WAITING_CLIP: &str = "waiting.mp3";
