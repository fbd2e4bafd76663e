//! Configuration loading
//!
//! Config types are plain serde structs; this trait gives them TOML and
//! RON file round-trips keyed on the file extension.

pub use serde::{Deserialize, Serialize};

/// File-backed configuration
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the extension is unrecognized, the
    /// file cannot be read, or it fails to parse. The extension is checked
    /// before touching the filesystem.
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        if !path.ends_with(".toml") && !path.ends_with(".ron") {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when serialization or the write fails, or
    /// the extension is unrecognized.
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::SpatialSystemConfig;

    #[test]
    fn test_toml_round_trip() {
        let path = std::env::temp_dir().join("spatial_index_config_test.toml");
        let path = path.to_string_lossy().into_owned();

        let mut config = SpatialSystemConfig::default();
        config.subdivision_threshold = 12;
        config.save_to_file(&path).unwrap();

        let loaded = SpatialSystemConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.subdivision_threshold, 12);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        // Rejected before any filesystem access, whether or not the file
        // exists.
        assert!(matches!(
            SpatialSystemConfig::load_from_file("config.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let path = std::env::temp_dir().join("spatial_index_config_test.yaml");
        std::fs::write(&path, "subdivision_threshold: 8").unwrap();
        let path = path.to_string_lossy().into_owned();
        assert!(matches!(
            SpatialSystemConfig::load_from_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SpatialSystemConfig::default().save_to_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            SpatialSystemConfig::load_from_file("does_not_exist.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
