//! Application Configuration
//!
//! Service endpoints and pipeline preferences stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::capture::PipelineConfig;
use crate::location::Coordinates;
use crate::text::RomanizeOptions;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Text recognition service
    pub recognition: RecognitionConfig,
    /// Reverse geocoding service
    pub geocoding: GeocodingConfig,
    /// Translation service
    pub translation: TranslationConfig,
    /// Location settings
    pub location: LocationSettings,
    /// Pinyin output
    pub romanization: RomanizeOptions,
    /// Snap database
    pub storage: StorageSettings,
}

impl AppConfig {
    /// Settings the capture pipeline itself needs
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            romanization: self.romanization,
            live_location_fallback: self.location.live_fallback,
        }
    }
}

/// Text recognition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// PaddleOCR serving endpoint
    pub endpoint: String,
    /// Recognition language passed to the service
    pub language: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8866/predict/ocr_system".to_string(),
            language: "ch".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Reverse geocoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Nominatim base URL
    pub endpoint: String,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("place-snap/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 15,
        }
    }
}

/// Translation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// LibreTranslate-compatible base URL; unset means glossary-only translation
    pub endpoint: Option<String>,
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
    /// API key, if the server requires one
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            source_lang: "zh".to_string(),
            target_lang: "en".to_string(),
            api_key: None,
            timeout_secs: 15,
        }
    }
}

/// Location settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    /// Use the device position when the image has no EXIF location
    pub live_fallback: bool,
    /// Device position reported when the live fallback is enabled
    pub fallback_latitude: Option<f64>,
    pub fallback_longitude: Option<f64>,
}

impl LocationSettings {
    /// Configured device position, if both halves are present and valid
    pub fn fallback_coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.fallback_latitude?, self.fallback_longitude?)
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Database file; defaults to `snaps.db` in the data directory
    pub database_path: Option<PathBuf>,
}

impl StorageSettings {
    /// Effective database path
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(crate::storage::get_data_dir()?.join("snaps.db")),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        // Check recognition defaults
        assert_eq!(config.recognition.language, "ch");
        assert_eq!(config.recognition.timeout_secs, 60);

        // Check geocoding defaults
        assert_eq!(config.geocoding.endpoint, "https://nominatim.openstreetmap.org");
        assert!(config.geocoding.user_agent.starts_with("place-snap/"));

        // Check translation defaults
        assert!(config.translation.endpoint.is_none());
        assert_eq!(config.translation.source_lang, "zh");
        assert_eq!(config.translation.target_lang, "en");

        // Live location is opt-in
        assert!(!config.location.live_fallback);
        assert!(config.location.fallback_coordinates().is_none());

        assert!(config.romanization.tone_marks);
        assert!(config.storage.database_path.is_none());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.translation.endpoint = Some("https://translate.example.org".to_string());
        config.location.live_fallback = true;
        config.location.fallback_latitude = Some(31.23);
        config.location.fallback_longitude = Some(121.47);

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.translation.endpoint, config.translation.endpoint);
        assert!(parsed.location.live_fallback);
        assert_eq!(
            parsed.location.fallback_coordinates(),
            Coordinates::new(31.23, 121.47)
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [translation]
            endpoint = "http://localhost:5000"

            [romanization]
            tone_marks = false
            "#,
        )
        .unwrap();

        assert_eq!(parsed.translation.endpoint.as_deref(), Some("http://localhost:5000"));
        assert_eq!(parsed.translation.target_lang, "en");
        assert!(!parsed.romanization.tone_marks);
        assert_eq!(parsed.recognition.timeout_secs, 60);
    }

    #[test]
    fn test_pipeline_config() {
        let mut config = AppConfig::default();
        config.location.live_fallback = true;
        config.romanization.tone_marks = false;

        let pipeline = config.pipeline_config();
        assert!(pipeline.live_location_fallback);
        assert!(!pipeline.romanization.tone_marks);
    }

    #[test]
    fn test_fallback_coordinates_need_both_halves() {
        let settings = LocationSettings {
            live_fallback: true,
            fallback_latitude: Some(31.0),
            fallback_longitude: None,
        };
        assert!(settings.fallback_coordinates().is_none());
    }

    #[test]
    fn test_explicit_database_path() {
        let settings = StorageSettings {
            database_path: Some(PathBuf::from("/tmp/snaps-test.db")),
        };
        assert_eq!(
            settings.resolve_database_path().unwrap(),
            PathBuf::from("/tmp/snaps-test.db")
        );
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config.recognition.endpoint, loaded.recognition.endpoint);
        assert_eq!(config.geocoding.timeout_secs, loaded.geocoding.timeout_secs);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
