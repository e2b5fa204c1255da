use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::system::StandardFileSystem;

use super::loader::ConfigLoader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub volume: VolumeConfig,

    #[serde(default)]
    pub fade: FadeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
    pub log_to_file: bool,
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Requested levels below this mute the device instead
    pub mute_threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    pub default_seconds: f32,
    pub max_seconds: f32,
    pub tick_ms: u64,
    pub step_uses_clamped_duration: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
            json_logs: false,
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            mute_threshold: 0.05,
        }
    }
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            default_seconds: 3.0,
            max_seconds: 10.0,
            tick_ms: 500,
            step_uses_clamped_duration: false,
        }
    }
}

/// Upper bound accepted for `fade.max_seconds`
pub const MAX_FADE_SECONDS: f32 = 3600.0;

impl Config {
    /// Load from `config_path`, or from the default location when `None`
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = match config_path {
            Some(path) => PathBuf::from(path),
            None => ConfigLoader::<StandardFileSystem>::default_config_path()?,
        };

        let config = ConfigLoader::new_production(path).load_config()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.volume.mute_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            bail!("volume.mute_threshold must be within [0, 1], got {}", threshold);
        }
        if !(self.fade.max_seconds > 0.0 && self.fade.max_seconds <= MAX_FADE_SECONDS) {
            bail!(
                "fade.max_seconds must be within (0, {}], got {}",
                MAX_FADE_SECONDS,
                self.fade.max_seconds
            );
        }
        if !self.fade.default_seconds.is_finite() {
            bail!("fade.default_seconds must be finite, got {}", self.fade.default_seconds);
        }
        if self.fade.tick_ms == 0 {
            bail!("fade.tick_ms must be at least 1");
        }
        self.general
            .log_level
            .parse::<tracing::Level>()
            .with_context(|| format!("Invalid general.log_level '{}'", self.general.log_level))?;
        Ok(())
    }
}
