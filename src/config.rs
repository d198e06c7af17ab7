// Configuration
// Grid dimensions, classifier defaults and the frame file type table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::clustering::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::io::FrameFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings shared by the loaders, the classifier and the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detector width in pixels
    pub grid_width: u32,

    /// Detector height in pixels
    pub grid_height: u32,

    /// Neighbours consulted by the KNN classifier when none is given
    pub default_k: usize,

    /// File extension (without dot, lower case) -> frame format
    pub file_types: BTreeMap<String, FrameFormat>,
}

impl Default for Config {
    fn default() -> Self {
        let file_types = [
            ("lsc", FrameFormat::Lsc),
            ("ascii", FrameFormat::AsciiMatrix),
            ("txt", FrameFormat::AsciiMatrix),
        ]
        .into_iter()
        .map(|(ext, format)| (ext.to_string(), format))
        .collect();

        Config {
            grid_width: DEFAULT_WIDTH,
            grid_height: DEFAULT_HEIGHT,
            default_k: 5,
            file_types,
        }
    }
}

impl Config {
    /// Load a JSON config file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_json_bytes(&fs::read(path)?)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json_bytes(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if self.grid_width > i32::MAX as u32 || self.grid_height > i32::MAX as u32 {
            return Err(ConfigError::Invalid("grid dimensions overflow i32".to_string()));
        }
        if self.default_k == 0 {
            return Err(ConfigError::Invalid("default_k must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Frame format for a path, looked up by its extension
    pub fn format_for_path(&self, path: &Path) -> Option<FrameFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.file_types.get(&ext).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.grid_width, 256);
        assert_eq!(config.grid_height, 256);
        assert_eq!(config.default_k, 5);
        assert_eq!(config.file_types.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_format_lookup() {
        let config = Config::default();
        assert_eq!(
            config.format_for_path(Path::new("run/frame_001.lsc")),
            Some(FrameFormat::Lsc)
        );
        assert_eq!(
            config.format_for_path(Path::new("FRAME.TXT")),
            Some(FrameFormat::AsciiMatrix)
        );
        assert_eq!(config.format_for_path(Path::new("notes.md")), None);
        assert_eq!(config.format_for_path(Path::new("README")), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json_bytes(br#"{"default_k": 3}"#).unwrap();
        assert_eq!(config.default_k, 3);
        assert_eq!(config.grid_width, 256);
        assert_eq!(config.format_for_path(Path::new("a.ascii")), Some(FrameFormat::AsciiMatrix));
    }

    #[test]
    fn test_custom_file_types() {
        let json = br#"{"file_types": {"dat": "lsc"}}"#;
        let config = Config::from_json_bytes(json).unwrap();
        assert_eq!(config.format_for_path(Path::new("x.dat")), Some(FrameFormat::Lsc));
        assert_eq!(config.format_for_path(Path::new("x.lsc")), None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            Config::from_json_bytes(br#"{"default_k": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json_bytes(br#"{"grid_width": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json_bytes(br#"{"file_types": {"x": "fits"}}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config::default();
        let bytes = config.to_json_bytes().unwrap();
        assert_eq!(Config::from_json_bytes(&bytes).unwrap(), config);
    }
}
