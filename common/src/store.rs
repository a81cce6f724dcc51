use thiserror::Error;

use crate::config::PersistedSettings;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings storage unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings record is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

pub trait SettingsStore {
    fn load(&self) -> Result<Option<PersistedSettings>, StoreError>;

    fn save(&mut self, settings: &PersistedSettings) -> Result<(), StoreError>;
}
