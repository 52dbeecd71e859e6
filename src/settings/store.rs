// Goalfinder - Key/Value Settings Store
//
// Persistence seam for `Settings`. The device implementation sits on NVS
// (`drivers::nvs`); the in-memory one backs the host simulation and tests.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings store failure on '{key}': {message}")]
    Store { key: String, message: String },

    #[error("invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: &'static str },
}

pub trait SettingsStore: Send {
    fn get_i32(&self, key: &str) -> Result<Option<i32>, SettingsError>;
    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), SettingsError>;
    fn get_string(&self, key: &str) -> Result<Option<String>, SettingsError>;
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
    /// Returns whether the key existed.
    fn remove(&mut self, key: &str) -> Result<bool, SettingsError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Int(i32),
    Str(String),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get_i32(&self, key: &str) -> Result<Option<i32>, SettingsError> {
        match self.entries.get(key) {
            Some(Value::Int(v)) => Ok(Some(*v)),
            Some(Value::Str(_)) => Err(SettingsError::Store {
                key: key.to_owned(),
                message: "stored as string".into(),
            }),
            None => Ok(None),
        }
    }

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), SettingsError> {
        self.entries.insert(key.to_owned(), Value::Int(value));
        Ok(())
    }

    fn get_string(&self, key: &str) -> Result<Option<String>, SettingsError> {
        match self.entries.get(key) {
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(Value::Int(_)) => Err(SettingsError::Store {
                key: key.to_owned(),
                message: "stored as integer".into(),
            }),
            None => Ok(None),
        }
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries.insert(key.to_owned(), Value::Str(value.to_owned()));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, SettingsError> {
        Ok(self.entries.remove(key).is_some())
    }
}
