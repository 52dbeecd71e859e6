// Goalfinder - Firmware Entry Point
//
// Boot sequence (device):
//   1. Link runtime patches, install the queued logger.
//   2. Take peripherals, mount the clip filesystem, open the settings store.
//   3. Bring up the sensors. A sensor that fails to boot is logged and
//      replaced by a stand-in that never reports anything.
//   4. Bring up audio output and the LED PWM.
//   5. Build the application (LED starts flashing, settings applied once)
//      and spawn the audio, detection, LED and logger tasks.
//
// On a development host the same task graph runs against simulated
// hardware for a fixed time (first argument, seconds).

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use goalfinder::app::{App, Hardware};
use goalfinder::clock::{Clock, SystemClock};
use goalfinder::logger;
use goalfinder::settings::Settings;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_hal::gpio::{InputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    use goalfinder::config::*;
    use goalfinder::drivers::i2s::I2sSpeaker;
    use goalfinder::drivers::ledc::PwmLed;
    use goalfinder::drivers::nvs::NvsStore;
    use goalfinder::drivers::tof::Vl53l0x;
    use goalfinder::drivers::vibration::VibrationInput;
    use goalfinder::clips::FileClipSource;
    use goalfinder::sensors::{DistanceSensor, Unavailable, VibrationSensor};

    esp_idf_svc::sys::link_patches();
    let log_drain = logger::init()?;
    log::info!("Goalfinder firmware starting");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    mount_assets()?;
    let settings = Arc::new(Settings::new(Box::new(NvsStore::new(EspDefaultNvsPartition::take()?)?)));
    if settings.is_first_run() {
        log::info!("First run, using default settings");
        if let Err(e) = settings.set_first_run(false) {
            log::warn!("Cannot persist first-run flag: {}", e);
        }
    }

    // ---- Sensors (degraded on failure) ------------------------------------
    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let distance: Box<dyn DistanceSensor> = match I2cDriver::new(peripherals.i2c0, pins.gpio22, pins.gpio21, &i2c_config)
        .map_err(anyhow::Error::from)
        .and_then(Vl53l0x::new)
    {
        Ok(sensor) => Box::new(sensor),
        Err(e) => {
            log::error!("Failed to boot VL53L0X: {}", e);
            Box::new(Unavailable)
        }
    };

    let vibration: Box<dyn VibrationSensor> = match PinDriver::input(pins.gpio13.downgrade_input()) {
        Ok(pin) => Box::new(VibrationInput::new(pin)),
        Err(e) => {
            log::error!("Failed to set up vibration input: {}", e);
            Box::new(Unavailable)
        }
    };

    // ---- Outputs ----------------------------------------------------------
    let speaker = I2sSpeaker::new(peripherals.i2s0, pins.gpio23, pins.gpio19, pins.gpio5)?;
    let led = PwmLed::new(peripherals.ledc.timer0, peripherals.ledc.channel0, pins.gpio17)?;

    let hardware = Hardware {
        distance,
        vibration,
        clips: Box::new(FileClipSource::new(ASSET_ROOT)),
        audio_out: Box::new(speaker),
        led: Box::new(led),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let _app = App::new(hardware, settings, clock).spawn(Some(log_drain))?;
    log::info!("Boot complete");

    // Main thread has nothing left to do; all work happens in the tasks.
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

/// Register the SPIFFS partition holding the clips under `ASSET_ROOT`.
#[cfg(target_os = "espidf")]
fn mount_assets() -> anyhow::Result<()> {
    let conf = esp_idf_sys::esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: std::ptr::null(),
        max_files: 4,
        format_if_mount_failed: false,
    };
    esp_idf_sys::esp!(unsafe { esp_idf_sys::esp_vfs_spiffs_register(&conf) })?;
    log::info!("Clip filesystem mounted at {}", goalfinder::config::ASSET_ROOT);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use goalfinder::settings::MemoryStore;
    use goalfinder::sim::{silent_clips, LoggingLed, NullSink, SimulatedCourt};

    const SHOT_PERIOD_MS: u32 = 12_000;
    const CLIP_LENGTH_MS: u32 = 300;
    const DEFAULT_RUN_SECS: u64 = 30;

    let log_drain = logger::init()?;
    let run_secs = match std::env::args().nth(1) {
        Some(arg) => arg.parse().map_err(|e| anyhow::anyhow!("invalid run time '{}': {}", arg, e))?,
        None => DEFAULT_RUN_SECS,
    };
    log::info!("Goalfinder host simulation starting ({} s)", run_secs);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let court = SimulatedCourt::new(clock.clone(), SHOT_PERIOD_MS);
    let hardware = Hardware {
        distance: Box::new(court.clone()),
        vibration: Box::new(court),
        clips: Box::new(silent_clips(CLIP_LENGTH_MS)),
        audio_out: Box::new(NullSink::default()),
        led: Box::new(LoggingLed),
    };
    let settings = Arc::new(Settings::new(Box::new(MemoryStore::new())));

    let app = App::new(hardware, settings, clock).spawn(Some(log_drain))?;
    thread::sleep(Duration::from_secs(run_secs));

    log::info!(
        "Simulation finished: {} hits, {} misses",
        app.status.detected_hits(),
        app.status.detected_misses()
    );
    // Let the logger task print the backlog.
    thread::sleep(Duration::from_millis(100));
    Ok(())
}
