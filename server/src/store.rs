use std::sync::{ Mutex, PoisonError };

use log::info;
use thiserror::Error;

use common::prayer::{ PrayerConfig, PrayerConfigUpdate };

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("update carries no fields")]
    EmptyUpdate,
}

/// Holder of the single prayer configuration.
pub trait ConfigStore: Send + Sync {
    fn get(&self) -> PrayerConfig;

    /// Applies `update` and returns the resulting config.
    fn update(&self, update: &PrayerConfigUpdate) -> Result<PrayerConfig, StoreError>;
}

/// Lives as long as the process.
#[derive(Debug, Default)]
pub struct MemStore {
    config: Mutex<PrayerConfig>,
}

impl MemStore {
    pub fn new(config: PrayerConfig) -> Self {
        MemStore { config: Mutex::new(config) }
    }
}

impl ConfigStore for MemStore {
    fn get(&self) -> PrayerConfig {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, update: &PrayerConfigUpdate) -> Result<PrayerConfig, StoreError> {
        if update.is_empty() {
            return Err(StoreError::EmptyUpdate);
        }
        let mut config = self.config.lock().unwrap_or_else(PoisonError::into_inner);
        let updated = update.apply(&config);
        if updated != *config {
            info!("config changed from {old} to {updated}", old = *config);
        }
        *config = updated;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use common::prayer::{ AsrJuristic, TimeFormat };

    use super::*;

    #[test]
    fn updates_only_given_fields() {
        let store = MemStore::default();
        assert_eq!(store.get(), PrayerConfig::default());

        let update = PrayerConfigUpdate { asr_juristic: Some(AsrJuristic::Hanafi), ..PrayerConfigUpdate::default() };
        let updated = store.update(&update).unwrap();

        assert_eq!(updated, PrayerConfig { asr_juristic: AsrJuristic::Hanafi, ..PrayerConfig::default() });
        assert_eq!(store.get(), updated);

        let update = PrayerConfigUpdate { time_format: Some(TimeFormat::H12), ..PrayerConfigUpdate::default() };
        assert_eq!(store.update(&update).unwrap().asr_juristic, AsrJuristic::Hanafi);
    }

    #[test]
    fn rejects_empty_updates() {
        let store = MemStore::default();
        assert_eq!(store.update(&PrayerConfigUpdate::default()), Err(StoreError::EmptyUpdate));
        assert_eq!(store.get(), PrayerConfig::default());
    }
}
