//! In-memory setting provider. Values live for the lifetime of the process.

use super::{Scope, SettingProvider};
use crate::error::SettingsError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct MemorySettingProvider {
    settings: DashMap<Scope, HashMap<String, Value>>,
    destroyed: AtomicBool,
}

impl MemorySettingProvider {
    pub fn new() -> Self {
        Self {
            settings: DashMap::new(),
            destroyed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), SettingsError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(SettingsError::Provider("setting provider has been destroyed".to_string()));
        }
        Ok(())
    }
}

impl Default for MemorySettingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingProvider for MemorySettingProvider {
    async fn init(&self) -> Result<(), SettingsError> {
        self.destroyed.store(false, Ordering::SeqCst);
        log::info!("[SETTINGS] In-memory setting provider ready");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), SettingsError> {
        self.destroyed.store(true, Ordering::SeqCst);
        let scopes = self.settings.len();
        self.settings.clear();
        log::info!("[SETTINGS] In-memory setting provider released {} scopes", scopes);
        Ok(())
    }

    fn get(&self, scope: &Scope, key: &str) -> Option<Value> {
        self.settings
            .get(scope)
            .and_then(|entries| entries.get(key).cloned())
    }

    async fn set(&self, scope: &Scope, key: &str, value: Value) -> Result<Value, SettingsError> {
        self.ensure_open()?;
        self.settings
            .entry(scope.clone())
            .or_default()
            .insert(key.to_string(), value.clone());
        Ok(value)
    }

    async fn remove(&self, scope: &Scope, key: &str) -> Result<Option<Value>, SettingsError> {
        self.ensure_open()?;
        Ok(self
            .settings
            .get_mut(scope)
            .and_then(|mut entries| entries.remove(key)))
    }
}
