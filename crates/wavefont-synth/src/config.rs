//! Engine configuration.
//!
//! [`EngineConfig`] collects the output and voice settings an [`Engine`] is
//! created with. Every field has a default, so a TOML file only needs the
//! settings it changes:
//!
//! ```toml
//! output_mode = "mono"
//! sample_rate = 48000
//! gain_db = -6.0
//! max_voices = 64
//! interpolation = "cubic"
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wavefont_core::Interpolation;

use crate::catalog::Catalog;
use crate::engine::{DEFAULT_PERCUSSION_CHANNEL, DEFAULT_SAMPLE_RATE, Engine, OutputMode};
use crate::error::ConfigError;
use crate::pool::DEFAULT_MAX_VOICES;

/// Output and voice settings for an [`Engine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output channel layout.
    pub output_mode: OutputMode,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Global gain in dB.
    pub gain_db: f32,
    /// Global linear volume.
    pub volume: f32,
    /// Maximum simultaneous voices.
    pub max_voices: usize,
    /// Resampling kernel.
    pub interpolation: Interpolation,
    /// Channel that plays drum kits.
    pub percussion_channel: usize,
    /// Whether `percussion_channel` gets drum-kit handling at all.
    pub percussion_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            gain_db: 0.0,
            volume: 1.0,
            max_voices: DEFAULT_MAX_VOICES,
            interpolation: Interpolation::default(),
            percussion_channel: DEFAULT_PERCUSSION_CHANNEL,
            percussion_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Set the output layout and sample rate.
    pub fn with_output(mut self, mode: OutputMode, sample_rate: u32) -> Self {
        self.output_mode = mode;
        self.sample_rate = sample_rate;
        self
    }

    /// Set the global gain in dB.
    pub fn with_gain_db(mut self, gain_db: f32) -> Self {
        self.gain_db = gain_db;
        self
    }

    /// Set the voice limit.
    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    /// Set the resampling kernel.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set or disable the percussion channel.
    pub fn with_percussion(mut self, channel: Option<usize>) -> Self {
        match channel {
            Some(channel) => {
                self.percussion_channel = channel;
                self.percussion_enabled = true;
            }
            None => self.percussion_enabled = false,
        }
        self
    }

    /// The percussion channel, if enabled.
    pub fn percussion(&self) -> Option<usize> {
        self.percussion_enabled.then_some(self.percussion_channel)
    }

    /// Check every setting is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid("sample_rate", "must be positive"));
        }
        if !self.gain_db.is_finite() {
            return Err(ConfigError::invalid("gain_db", "must be finite"));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(ConfigError::invalid(
                "volume",
                format!("must be finite and non-negative, got {}", self.volume),
            ));
        }
        Ok(())
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Save to a TOML file, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }
}

impl Engine {
    /// Create an engine over `catalog` with `config` applied.
    pub fn with_config(catalog: Arc<Catalog>, config: &EngineConfig) -> Self {
        let mut engine = Self::new(catalog);
        engine.apply_config(config);
        engine
    }

    /// Apply output, voice and percussion settings.
    ///
    /// Out-of-range values are clamped as by the individual setters. The
    /// percussion channel is only rebuilt when it changes, since doing so
    /// drops channel state.
    pub fn apply_config(&mut self, config: &EngineConfig) {
        self.set_output(config.output_mode, config.sample_rate, config.gain_db);
        self.set_volume(config.volume);
        self.set_max_voices(config.max_voices);
        self.set_interpolation(config.interpolation);
        if self.percussion_channel() != config.percussion() {
            self.set_percussion_channel(config.percussion());
        }
    }

    /// Current settings as a configuration.
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            output_mode: self.output_mode(),
            sample_rate: self.sample_rate(),
            gain_db: self.gain_db(),
            volume: self.volume(),
            max_voices: self.max_voices(),
            interpolation: self.interpolation(),
            ..EngineConfig::default()
        }
        .with_percussion(self.percussion_channel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.output_mode, OutputMode::StereoInterleaved);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.max_voices, 256);
        assert_eq!(config.interpolation, Interpolation::Linear);
        assert_eq!(config.percussion(), Some(9));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            output_mode = "mono"
            sample_rate = 48000
            interpolation = "cubic"
            "#,
        )
        .unwrap();
        assert_eq!(config.output_mode, OutputMode::Mono);
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.interpolation, Interpolation::Cubic);
        assert_eq!(config.max_voices, 256);
        assert_eq!(config.volume, 1.0);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::default()
            .with_output(OutputMode::StereoUnweaved, 22050)
            .with_gain_db(-3.0)
            .with_max_voices(32)
            .with_percussion(None);
        let text = config.to_toml().unwrap();
        assert!(text.contains("stereo_unweaved"), "got: {text}");
        assert_eq!(EngineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_zero_sample_rate() {
        let err = EngineConfig::from_toml("sample_rate = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "sample_rate", .. }));
    }

    #[test]
    fn test_rejects_negative_volume() {
        let err = EngineConfig::from_toml("volume = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "volume", .. }));
    }

    #[test]
    fn test_rejects_unknown_output_mode() {
        let err = EngineConfig::from_toml(r#"output_mode = "surround""#).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_engine_config_roundtrip() {
        let config = EngineConfig::default()
            .with_output(OutputMode::Mono, 32000)
            .with_max_voices(12)
            .with_interpolation(Interpolation::None)
            .with_percussion(Some(3));
        let engine = Engine::with_config(Arc::new(Catalog::invalid()), &config);
        assert_eq!(engine.config(), config);
    }
}
