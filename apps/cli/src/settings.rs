use std::cell::RefCell;
use std::path::{Path, PathBuf};

use cue_caption_sync::{Error, Result, SettingsStore, TranslationConfig};

/// Settings kept in a JSON file, in the same camelCase shape the extension
/// storage uses. A missing file reads as the defaults.
pub struct JsonFileStore {
    path: PathBuf,
    current: RefCell<Option<TranslationConfig>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RefCell::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, error: std::io::Error) -> Error {
        Error::Settings(format!("{}: {error}", self.path.display()))
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<TranslationConfig> {
        if let Some(config) = self.current.borrow().as_ref() {
            return Ok(config.clone());
        }

        let config = match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "settings_file_missing");
                TranslationConfig::default()
            }
            Err(error) => return Err(self.io_error(error)),
        };
        *self.current.borrow_mut() = Some(config.clone());
        Ok(config)
    }

    fn save(&self, config: &TranslationConfig) -> Result<()> {
        let raw = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, raw).map_err(|e| self.io_error(e))?;
        *self.current.borrow_mut() = Some(config.clone());
        tracing::debug!(path = %self.path.display(), "settings_saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cue_caption_sync::OriginalPosition;

    #[test]
    fn test_missing_file_reads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load().unwrap(), TranslationConfig::default());
    }

    #[test]
    fn test_save_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let config = TranslationConfig {
            enabled: true,
            original_position: OriginalPosition::Above,
            ..Default::default()
        };
        JsonFileStore::new(&path).save(&config).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"originalPosition\": \"above\""));
        assert_eq!(JsonFileStore::new(&path).load().unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonFileStore::new(&path).load(), Err(Error::Json(_))));
    }
}
