//! Client configuration.
//!
//! Loaded from `~/.config/sightline/config.toml`. Every section is optional;
//! missing values fall back to the defaults below. A few values can be
//! overridden from the environment:
//!
//! - `SIGHTLINE_BACKEND_URL` overrides `backend.base_url`
//! - `SIGHTLINE_DIALOGUE_ENDPOINT` overrides `dialogue.endpoint`

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::camera::VideoConstraints;
use crate::capture::DEFAULT_JPEG_QUALITY;
use crate::dialogue::BotConfig;
use crate::error::{Result, SightlineError};

const APP_DIR: &str = "sightline";
const CONFIG_FILE: &str = "config.toml";

/// Root configuration structure for config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    /// Absent when no dialogue runtime has been set up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<DialogueConfig>,
}

/// Vision backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub chat_path: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            chat_path: "/chat".to_string(),
            timeout_secs: 90,
        }
    }
}

impl BackendConfig {
    /// Full URL of the chat endpoint.
    pub fn chat_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.chat_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Camera device settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub recovery_delay_ms: u64,
    pub jpeg_quality: u8,
    /// Image file used as the video source by the file-backed device.
    pub frame_path: PathBuf,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ideal_width: 640,
            ideal_height: 480,
            recovery_delay_ms: 1000,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            frame_path: PathBuf::from("frame.jpg"),
        }
    }
}

impl CameraConfig {
    pub fn constraints(&self) -> VideoConstraints {
        VideoConstraints {
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
            audio: false,
        }
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }
}

/// Dialogue runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueConfig {
    pub endpoint: String,
    pub bot_id: String,
    pub bot_alias_id: String,
    #[serde(default = "default_locale")]
    pub locale_id: String,
    #[serde(default = "default_dialogue_timeout")]
    pub timeout_secs: u64,
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_dialogue_timeout() -> u64 {
    30
}

impl DialogueConfig {
    pub fn bot(&self) -> BotConfig {
        BotConfig {
            bot_id: self.bot_id.clone(),
            bot_alias_id: self.bot_alias_id.clone(),
            locale_id: self.locale_id.clone(),
        }
    }
}

impl ClientConfig {
    /// Returns the path to the configuration file: ~/.config/sightline/config.toml
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SightlineError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads the default configuration file, then applies environment
    /// overrides. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SightlineError::config(format!(
                "Failed to read configuration file at {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            SightlineError::config(format!(
                "Failed to parse configuration file at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("SIGHTLINE_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let (Ok(endpoint), Some(dialogue)) =
            (env::var("SIGHTLINE_DIALOGUE_ENDPOINT"), self.dialogue.as_mut())
        {
            dialogue.endpoint = endpoint;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ClientConfig::load_from(&temp_dir.path().join("config.toml")).unwrap();

        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.backend.chat_url(), "http://localhost:5000/chat");
        assert_eq!(config.backend.timeout(), Duration::from_secs(90));
        assert_eq!(config.camera.recovery_delay(), Duration::from_secs(1));
        assert_eq!(config.camera.jpeg_quality, 80);
        assert!(config.dialogue.is_none());
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[backend]
base_url = "http://vlm.local:8080/"

[dialogue]
endpoint = "http://runtime.local/recognize"
bot_id = "BOT"
bot_alias_id = "ALIAS"
"#,
        )
        .unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.backend.chat_url(), "http://vlm.local:8080/chat");
        assert_eq!(config.backend.timeout_secs, 90);
        assert_eq!(config.camera.constraints(), VideoConstraints::default());

        let dialogue = config.dialogue.expect("dialogue section");
        assert_eq!(dialogue.locale_id, "en_US");
        assert_eq!(dialogue.bot().bot_alias_id, "ALIAS");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[backend\nbase_url = ").unwrap();

        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, SightlineError::Config(_)));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = ClientConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: ClientConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
