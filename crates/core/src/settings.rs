use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{PrecisError, Result};

pub const DATA_FILE: &str = "data.json";

pub fn get_root_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("precis")
}

/// Default location of the persisted settings
pub fn get_data_path() -> PathBuf {
    get_root_config_dir().join(DATA_FILE)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "openAIApiKey")]
    pub openai_api_key: String,
}

impl Settings {
    pub fn has_api_key(&self) -> bool {
        !self.openai_api_key.trim().is_empty()
    }
}

/// Persists [`Settings`] as one flat JSON object.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(get_data_path())
    }
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl ToString) -> PrecisError {
        PrecisError::Settings {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Defaults overridden by whatever is persisted; no file means defaults.
    pub async fn load(&self) -> Result<Settings> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(self.error(e)),
        };

        let persisted: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| self.error(e))?;
        if persisted.is_null() {
            return Ok(Settings::default());
        }

        serde_json::from_value(persisted).map_err(|e| self.error(e))
    }

    /// Write the full settings object.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.error(e))?;
        }
        let pretty_json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, pretty_json)
            .await
            .map_err(|e| self.error(e))?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

/// A text input in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingField {
    pub name: &'static str,
    pub description: &'static str,
    pub placeholder: &'static str,
}

pub const API_KEY_FIELD: SettingField = SettingField {
    name: "Open AI API Key",
    description: "For the magic",
    placeholder: "sk-1234",
};

/// The settings UI: every edit is persisted immediately.
pub struct SettingsPanel<'a> {
    settings: &'a mut Settings,
    store: &'a SettingsStore,
}

impl<'a> SettingsPanel<'a> {
    pub fn new(settings: &'a mut Settings, store: &'a SettingsStore) -> Self {
        Self { settings, store }
    }

    pub fn fields(&self) -> &'static [SettingField] {
        &[API_KEY_FIELD]
    }

    /// Current value of the API key field.
    pub fn value(&self) -> &str {
        &self.settings.openai_api_key
    }

    pub async fn on_change(&mut self, value: &str) -> Result<()> {
        self.settings.openai_api_key = value.to_string();
        self.store.save(&*self.settings).await
    }
}
