// Goalfinder - NVS Settings Store

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_sys::EspError;

use crate::settings::{SettingsError, SettingsStore};

pub const NAMESPACE: &str = "app_prefs";
const MAX_STRING_LEN: usize = 96;

pub struct NvsStore {
    nvs: EspNvs<NvsDefault>,
}

impl NvsStore {
    pub fn new(partition: EspDefaultNvsPartition) -> anyhow::Result<Self> {
        let nvs = EspNvs::new(partition, NAMESPACE, true)?;
        log::info!("Settings store opened (namespace '{}')", NAMESPACE);
        Ok(Self { nvs })
    }
}

fn store_error(key: &str, e: EspError) -> SettingsError {
    SettingsError::Store { key: key.to_owned(), message: e.to_string() }
}

impl SettingsStore for NvsStore {
    fn get_i32(&self, key: &str) -> Result<Option<i32>, SettingsError> {
        self.nvs.get_i32(key).map_err(|e| store_error(key, e))
    }

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), SettingsError> {
        self.nvs.set_i32(key, value).map_err(|e| store_error(key, e))
    }

    fn get_string(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let mut buf = [0u8; MAX_STRING_LEN];
        let value = self.nvs.get_str(key, &mut buf).map_err(|e| store_error(key, e))?;
        Ok(value.map(str::to_owned))
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.nvs.set_str(key, value).map_err(|e| store_error(key, e))
    }

    fn remove(&mut self, key: &str) -> Result<bool, SettingsError> {
        self.nvs.remove(key).map_err(|e| store_error(key, e))
    }
}
