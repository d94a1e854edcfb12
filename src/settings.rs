use anyhow::{Context, Result};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::proctor::ProctorConfig;

/// JSON-file-backed store for operator-tuned detection thresholds. Missing
/// or unreadable files fall back to the built-in defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ProctorConfig>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            ProctorConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn config(&self) -> ProctorConfig {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, config: ProctorConfig) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            *guard = config;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &ProctorConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join("invigil-tests")
            .join(format!("settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let store = SettingsStore::new(temp_path()).unwrap();
        let config = store.config();
        assert_eq!(config.no_face_sustain_secs, 10);
        assert_eq!(config.alert_cooldown_secs, 5);
    }

    #[test]
    fn updates_persist_across_reopen() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        let mut config = store.config();
        config.alert_cooldown_secs = 9;
        config.unauthorized_objects = vec!["cell phone".to_string()];
        store.update(config).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        let config = reopened.config();
        assert_eq!(config.alert_cooldown_secs, 9);
        assert_eq!(config.unauthorized_objects, vec!["cell phone".to_string()]);
        // Untouched fields keep their defaults.
        assert_eq!(config.no_face_sustain_secs, 10);
    }

    #[test]
    fn partial_settings_files_fill_in_defaults() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "alert_cooldown_secs": 7 }"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        let config = store.config();
        assert_eq!(config.alert_cooldown_secs, 7);
        assert_eq!(config.gaze_ratio_min, 0.30);
    }
}
