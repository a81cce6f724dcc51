use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::info;

use ledclock_common::{PersistedSettings, RuntimeConfig, SettingsStore, StoreError};

const DEFAULT_DATA_DIR: &str = "./.ledclock";

#[derive(Debug, Clone)]
pub struct AppStore {
    runtime_path: PathBuf,
    settings_path: PathBuf,
}

impl AppStore {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("LEDCLOCK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        Self::new(&data_dir)
    }

    pub fn new(data_dir: &Path) -> Self {
        Self {
            runtime_path: data_dir.join("runtime.json"),
            settings_path: data_dir.join("settings.json"),
        }
    }

    pub async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        match tokio::fs::read(&self.runtime_path).await {
            Ok(raw) => serde_json::from_slice::<RuntimeConfig>(&raw)
                .with_context(|| format!("invalid {}", self.runtime_path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.runtime_path.display(), "no runtime config, using defaults");
                Ok(RuntimeConfig::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn settings_store(&self) -> JsonFileStore {
        JsonFileStore::new(self.settings_path.clone())
    }
}

pub fn apply_env_overrides(
    runtime: &mut RuntimeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> u16 {
    let network = &mut runtime.network;
    if let Some(host) = lookup("MQTT_HOST") {
        network.mqtt_host = host;
    }
    if let Some(port) = lookup("MQTT_PORT").and_then(|value| value.parse::<u16>().ok()) {
        network.mqtt_port = port;
    }
    if let Some(user) = lookup("MQTT_USER") {
        network.mqtt_user = user;
    }
    if let Some(pass) = lookup("MQTT_PASS") {
        network.mqtt_pass = pass;
    }
    lookup("LEDCLOCK_HTTP_PORT")
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080)
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedSettings>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Written beside the target and renamed over it, so readers never see
    /// a partial record.
    fn save(&mut self, settings: &PersistedSettings) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, serde_json::to_vec_pretty(settings)?)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}
