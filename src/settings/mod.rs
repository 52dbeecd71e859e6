// Goalfinder - Persisted Settings
//
// Typed view over the key/value store. Setters clamp to the valid range,
// persist, and raise a sticky `modified` flag that the settings mirror
// clears after picking the change up. Getters never fail: a missing key or
// a store error yields the typed default.

mod mirror;
mod store;

pub use mirror::{ConfigSnapshot, SettingsMirror};
pub use store::{MemoryStore, SettingsError, SettingsStore};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::events::LedMode;

const KEY_VOLUME: &str = "volume";
const KEY_METRONOME_SOUND: &str = "metronomeSound";
const KEY_HIT_SOUND: &str = "hitSound";
const KEY_MISS_SOUND: &str = "missSound";
const KEY_DEVICE_NAME: &str = "deviceName";
const KEY_DEVICE_PASSWORD: &str = "devicePassword";
const KEY_WIFI_PASSWORD: &str = "wifiPassword";
const KEY_VIBRATION_SENSITIVITY: &str = "shotSensitivity";
const KEY_BALL_HIT_DISTANCE: &str = "ballHitDetDist";
const KEY_DISTANCE_ONLY: &str = "distOnlyHitDet";
const KEY_LED_BRIGHTNESS: &str = "ledBrightness";
const KEY_LED_MODE: &str = "ledMode";
const KEY_FIRST_RUN: &str = "firstRun";
const KEY_AFTER_HIT_TIMEOUT: &str = "afterHitTimeout";
const KEY_UPDATE_SUCCESS: &str = "updateSuccess";

const ALL_KEYS: &[&str] = &[
    KEY_VOLUME,
    KEY_METRONOME_SOUND,
    KEY_HIT_SOUND,
    KEY_MISS_SOUND,
    KEY_DEVICE_NAME,
    KEY_DEVICE_PASSWORD,
    KEY_WIFI_PASSWORD,
    KEY_VIBRATION_SENSITIVITY,
    KEY_BALL_HIT_DISTANCE,
    KEY_DISTANCE_ONLY,
    KEY_LED_BRIGHTNESS,
    KEY_LED_MODE,
    KEY_FIRST_RUN,
    KEY_AFTER_HIT_TIMEOUT,
    KEY_UPDATE_SUCCESS,
];

pub const DEFAULT_VOLUME: i32 = 25;
pub const DEFAULT_SOUND_INDEX: i32 = 0;
pub const DEFAULT_DEVICE_NAME: &str = "GoalFinder 01";
pub const DEFAULT_VIBRATION_SENSITIVITY: i32 = 100;
pub const DEFAULT_BALL_HIT_DISTANCE_MM: i32 = 180;
pub const DEFAULT_LED_BRIGHTNESS: i32 = 100;
pub const DEFAULT_AFTER_HIT_TIMEOUT_S: i32 = 5;

const MAX_SOUND_INDEX: i32 = 2;
const MAX_BALL_HIT_DISTANCE_MM: i32 = 200;
const MAX_AFTER_HIT_TIMEOUT_S: i32 = 60;
const WIFI_PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=63;

pub struct Settings {
    store: Mutex<Box<dyn SettingsStore>>,
    modified: AtomicBool,
}

impl Settings {
    pub fn new(store: Box<dyn SettingsStore>) -> Self {
        Self { store: Mutex::new(store), modified: AtomicBool::new(false) }
    }

    fn store(&self) -> MutexGuard<'_, Box<dyn SettingsStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- dirty flag ----

    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::SeqCst)
    }

    pub fn clear_modified(&self) {
        self.modified.store(false, Ordering::SeqCst);
    }

    fn set_modified(&self) {
        self.modified.store(true, Ordering::SeqCst);
    }

    // ---- typed access helpers ----

    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.store().get_i32(key) {
            Ok(value) => value.unwrap_or(default),
            Err(e) => {
                log::warn!("Reading '{}' failed, using default {}: {}", key, default, e);
                default
            }
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_int(key, i32::from(default)) != 0
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.store().get_string(key) {
            Ok(value) => value.unwrap_or_else(|| default.to_owned()),
            Err(e) => {
                log::warn!("Reading '{}' failed, using default: {}", key, e);
                default.to_owned()
            }
        }
    }

    fn put_int(&self, key: &str, value: i32) -> Result<(), SettingsError> {
        self.store().set_i32(key, value)?;
        self.set_modified();
        Ok(())
    }

    fn put_clamped(&self, key: &str, value: i32, max: i32) -> Result<(), SettingsError> {
        self.put_int(key, value.clamp(0, max))
    }

    // ---- audio ----

    /// Volume in percent (0-100).
    pub fn volume(&self) -> u8 {
        self.get_int(KEY_VOLUME, DEFAULT_VOLUME).clamp(0, 100) as u8
    }

    pub fn set_volume(&self, volume: i32) -> Result<(), SettingsError> {
        self.put_clamped(KEY_VOLUME, volume, 100)
    }

    pub fn metronome_sound(&self) -> usize {
        self.get_int(KEY_METRONOME_SOUND, DEFAULT_SOUND_INDEX).max(0) as usize
    }

    pub fn set_metronome_sound(&self, index: i32) -> Result<(), SettingsError> {
        self.put_clamped(KEY_METRONOME_SOUND, index, MAX_SOUND_INDEX)
    }

    pub fn hit_sound(&self) -> usize {
        self.get_int(KEY_HIT_SOUND, DEFAULT_SOUND_INDEX).max(0) as usize
    }

    pub fn set_hit_sound(&self, index: i32) -> Result<(), SettingsError> {
        self.put_clamped(KEY_HIT_SOUND, index, MAX_SOUND_INDEX)
    }

    pub fn miss_sound(&self) -> usize {
        self.get_int(KEY_MISS_SOUND, DEFAULT_SOUND_INDEX).max(0) as usize
    }

    pub fn set_miss_sound(&self, index: i32) -> Result<(), SettingsError> {
        self.put_clamped(KEY_MISS_SOUND, index, MAX_SOUND_INDEX)
    }

    // ---- detection ----

    pub fn vibration_sensitivity(&self) -> u8 {
        self.get_int(KEY_VIBRATION_SENSITIVITY, DEFAULT_VIBRATION_SENSITIVITY).clamp(0, 100) as u8
    }

    pub fn set_vibration_sensitivity(&self, sensitivity: i32) -> Result<(), SettingsError> {
        self.put_clamped(KEY_VIBRATION_SENSITIVITY, sensitivity, 100)
    }

    pub fn ball_hit_distance_mm(&self) -> i32 {
        self.get_int(KEY_BALL_HIT_DISTANCE, DEFAULT_BALL_HIT_DISTANCE_MM)
    }

    pub fn set_ball_hit_distance_mm(&self, distance: i32) -> Result<(), SettingsError> {
        self.put_clamped(KEY_BALL_HIT_DISTANCE, distance, MAX_BALL_HIT_DISTANCE_MM)
    }

    pub fn distance_only_hit_detection(&self) -> bool {
        self.get_bool(KEY_DISTANCE_ONLY, false)
    }

    pub fn set_distance_only_hit_detection(&self, enabled: bool) -> Result<(), SettingsError> {
        self.put_int(KEY_DISTANCE_ONLY, i32::from(enabled))
    }

    /// Post-hit cooldown in seconds.
    pub fn after_hit_timeout_s(&self) -> u32 {
        self.get_int(KEY_AFTER_HIT_TIMEOUT, DEFAULT_AFTER_HIT_TIMEOUT_S).max(0) as u32
    }

    pub fn set_after_hit_timeout_s(&self, timeout: i32) -> Result<(), SettingsError> {
        self.put_clamped(KEY_AFTER_HIT_TIMEOUT, timeout, MAX_AFTER_HIT_TIMEOUT_S)
    }

    // ---- LED ----

    pub fn led_mode(&self) -> LedMode {
        LedMode::from_raw(self.get_int(KEY_LED_MODE, LedMode::default().to_raw()))
    }

    pub fn set_led_mode(&self, mode: LedMode) -> Result<(), SettingsError> {
        self.put_int(KEY_LED_MODE, mode.to_raw())
    }

    pub fn led_brightness(&self) -> u8 {
        self.get_int(KEY_LED_BRIGHTNESS, DEFAULT_LED_BRIGHTNESS).clamp(0, 100) as u8
    }

    pub fn set_led_brightness(&self, brightness: i32) -> Result<(), SettingsError> {
        self.put_clamped(KEY_LED_BRIGHTNESS, brightness, 100)
    }

    // ---- device / network ----

    pub fn device_name(&self) -> String {
        self.get_string(KEY_DEVICE_NAME, DEFAULT_DEVICE_NAME)
    }

    /// An empty name restores the default.
    pub fn set_device_name(&self, name: &str) -> Result<(), SettingsError> {
        let name = if name.is_empty() { DEFAULT_DEVICE_NAME } else { name };
        self.store().set_string(KEY_DEVICE_NAME, name)?;
        self.set_modified();
        Ok(())
    }

    pub fn device_password(&self) -> String {
        self.get_string(KEY_DEVICE_PASSWORD, "")
    }

    /// An empty password removes it (open access point).
    pub fn set_device_password(&self, password: &str) -> Result<(), SettingsError> {
        if password.is_empty() {
            self.store().remove(KEY_DEVICE_PASSWORD)?;
        } else {
            self.store().set_string(KEY_DEVICE_PASSWORD, password)?;
        }
        self.set_modified();
        Ok(())
    }

    pub fn wifi_password(&self) -> String {
        self.get_string(KEY_WIFI_PASSWORD, "")
    }

    /// Trimmed; empty removes it, otherwise it must be 8-63 characters.
    pub fn set_wifi_password(&self, password: &str) -> Result<(), SettingsError> {
        let password = password.trim();
        if password.is_empty() {
            self.store().remove(KEY_WIFI_PASSWORD)?;
        } else {
            if !WIFI_PASSWORD_LEN.contains(&password.chars().count()) {
                log::warn!("Ignoring Wi-Fi password with invalid length, expected 8-63 characters");
                return Err(SettingsError::Invalid {
                    key: KEY_WIFI_PASSWORD,
                    reason: "length must be 8-63 characters",
                });
            }
            self.store().set_string(KEY_WIFI_PASSWORD, password)?;
        }
        self.set_modified();
        Ok(())
    }

    // ---- lifecycle ----

    pub fn is_first_run(&self) -> bool {
        self.get_bool(KEY_FIRST_RUN, true)
    }

    pub fn set_first_run(&self, first_run: bool) -> Result<(), SettingsError> {
        self.put_int(KEY_FIRST_RUN, i32::from(first_run))
    }

    pub fn update_success(&self) -> bool {
        self.get_bool(KEY_UPDATE_SUCCESS, false)
    }

    /// Bookkeeping for the updater; does not mark settings as modified.
    pub fn set_update_success(&self, success: bool) -> Result<(), SettingsError> {
        self.store().set_i32(KEY_UPDATE_SUCCESS, i32::from(success))
    }

    /// Remove every stored key. Restarting the device is up to the caller.
    pub fn reset_to_defaults(&self) -> Result<(), SettingsError> {
        let mut store = self.store();
        for key in ALL_KEYS {
            store.remove(key)?;
        }
        drop(store);
        log::warn!("Settings reset to factory defaults");
        self.set_modified();
        Ok(())
    }

    /// Read every field the running components consume.
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            volume: self.volume(),
            metronome_sound: self.metronome_sound(),
            hit_sound: self.hit_sound(),
            miss_sound: self.miss_sound(),
            vibration_sensitivity: self.vibration_sensitivity(),
            ball_hit_distance_mm: self.ball_hit_distance_mm(),
            distance_only: self.distance_only_hit_detection(),
            led_mode: self.led_mode(),
            led_brightness: self.led_brightness(),
            after_hit_timeout_s: self.after_hit_timeout_s(),
        }
    }
}
