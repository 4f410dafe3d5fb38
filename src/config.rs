//! Settings file: every parameter group, loaded from TOML.
//!
//! Missing sections and fields fall back to their defaults, so a file only
//! needs the values it changes:
//!
//! ```toml
//! [music]
//! mode = "dorian"
//! bpm = 96
//!
//! [effects.delay]
//! enabled = true
//! time_ms = 500
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::audio::EffectRack;
use crate::error::{Error, Result};
use crate::params::{FFTConfig, InputConfig, MicConfig, MusicSettings, RenderConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub audio: FFTConfig,
    pub mic: MicConfig,
    pub render: RenderConfig,
    pub music: MusicSettings,
    pub input: InputConfig,
    pub effects: EffectRack,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut settings: Settings = toml::from_str(text)?;
        settings.effects.sanitize();
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&text)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.audio
            .validate()
            .and_then(|_| self.mic.validate(self.audio.sample_rate_hz))
            .and_then(|_| self.music.validate())
            .and_then(|_| self.input.validate())
            .map_err(Error::InvalidParameter)?;
        if self.render.window_width == 0 || self.render.window_height == 0 {
            return Err(Error::InvalidParameter(
                "Window size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
