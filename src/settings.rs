use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RenameError;

/// Tunables read from an optional JSON file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Media extensions to pick up, without the dot. Matched case-insensitively.
    pub extensions: Vec<String>,
    /// Name of the run log written inside the target folder.
    pub log_file_name: String,
    /// Season offered when no file carries one.
    pub default_season: String,
    /// Width of the divider lines in the run log.
    pub divider_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: vec!["mkv".to_string(), "mp4".to_string(), "avi".to_string()],
            log_file_name: "rename-log.txt".to_string(),
            default_season: "1".to_string(),
            divider_width: 50,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, RenameError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, RenameError> {
        let mut settings: Settings =
            serde_json::from_str(json).map_err(|e| RenameError::Settings(e.to_string()))?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    fn normalize(&mut self) {
        self.extensions = self
            .extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self.default_season = self.default_season.trim().to_string();
    }

    fn validate(&self) -> Result<(), RenameError> {
        if self.extensions.is_empty() {
            return Err(RenameError::Settings("at least one extension is required".into()));
        }
        if self.log_file_name.is_empty()
            || self.log_file_name.contains(['/', '\\'])
        {
            return Err(RenameError::Settings(format!(
                "log_file_name must be a plain file name, got '{}'",
                self.log_file_name
            )));
        }
        if self.default_season.is_empty()
            || !self.default_season.chars().all(|c| c.is_ascii_digit())
        {
            return Err(RenameError::Settings(format!(
                "default_season must be a number, got '{}'",
                self.default_season
            )));
        }
        if self.divider_width == 0 {
            return Err(RenameError::Settings("divider_width must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.log_file_name, "rename-log.txt");
        assert_eq!(settings.extensions, vec!["mkv", "mp4", "avi"]);
        assert_eq!(settings.default_season, "1");
        assert_eq!(settings.divider_width, 50);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "extensions": [".M4V", "mkv"] }"#).unwrap();
        assert_eq!(settings.extensions, vec!["m4v", "mkv"]);
        assert_eq!(settings.divider_width, 50);
        assert_eq!(settings.log_file_name, "rename-log.txt");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Settings::from_json(r#"{ "extensions": [] }"#).is_err());
        assert!(Settings::from_json(r#"{ "log_file_name": "../log.txt" }"#).is_err());
        assert!(Settings::from_json(r#"{ "default_season": "one" }"#).is_err());
        assert!(Settings::from_json(r#"{ "divider_width": 0 }"#).is_err());
        assert!(Settings::from_json(r#"{ "unknown": true }"#).is_err());
    }
}
