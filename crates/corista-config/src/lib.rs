//! Session configuration for corista.
//!
//! A [`SessionConfig`] captures everything the `corista play` command needs
//! to set a stage: device selection, audio rates, the lyric file, transport
//! defaults, and the starting [`EffectToggles`](corista_core::EffectToggles)
//! snapshot. Configurations load from and save to TOML:
//!
//! ```toml
//! lyrics = "sets/friday-night.lrc"
//! instrumental = "sets/friday-night.wav"
//!
//! [audio]
//! sample-rate = 48000
//! buffer-size = 256
//!
//! [transport]
//! volume = 0.9
//! rate = 1.0
//!
//! [effects]
//! echo = true
//! reverb = true
//! distortion = false
//! ```
//!
//! Every section is optional; missing fields take the defaults above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use corista_core::EffectToggles;

/// Errors that can occur while loading or saving a session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML.
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A configured value is outside its usable range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Why the value is unusable.
        reason: String,
    },
}

/// Audio device and rate selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AudioSection {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Processing block size in frames.
    pub buffer_size: u32,
    /// Capture device name (system default if absent).
    pub input_device: Option<String>,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            input_device: None,
        }
    }
}

/// Instrumental transport defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransportSection {
    /// Playback volume, 0.0 to 1.0.
    pub volume: f32,
    /// Playback rate multiplier.
    pub rate: f32,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            volume: 0.9,
            rate: 1.0,
        }
    }
}

/// A complete session configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    /// Lyric file to parse (LRC-style timestamped text).
    pub lyrics: Option<PathBuf>,
    /// Instrumental WAV to play.
    pub instrumental: Option<PathBuf>,
    /// Audio device and rate selection.
    pub audio: AudioSection,
    /// Transport defaults.
    pub transport: TransportSection,
    /// Starting effect snapshot.
    pub effects: EffectToggles,
}

impl SessionConfig {
    /// Loads a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks value ranges that TOML cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.sample_rate == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audio.sample-rate",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.audio.buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audio.buffer-size",
                reason: "must be non-zero".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.transport.volume) {
            return Err(ConfigError::InvalidValue {
                field: "transport.volume",
                reason: format!("{} is outside 0.0..=1.0", self.transport.volume),
            });
        }
        if !(0.25..=4.0).contains(&self.transport.rate) {
            return Err(ConfigError::InvalidValue {
                field: "transport.rate",
                reason: format!("{} is outside 0.25..=4.0", self.transport.rate),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = SessionConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.audio.sample_rate, 48000);
        assert!(config.effects.echo && config.effects.reverb);
        assert!(!config.effects.distortion);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: SessionConfig = toml::from_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: SessionConfig = toml::from_str(
            "lyrics = \"a.lrc\"\n[effects]\ndistortion = true\n",
        )
        .unwrap();
        assert_eq!(config.lyrics.as_deref(), Some(Path::new("a.lrc")));
        assert!(config.effects.distortion);
        // Untouched sections keep defaults.
        assert_eq!(config.audio, AudioSection::default());
        assert!(config.effects.echo, "serde(default) fills toggle defaults");
    }

    #[test]
    fn out_of_range_volume_is_rejected() {
        let mut config = SessionConfig::default();
        config.transport.volume = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("transport.volume"));
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        let mut config = SessionConfig::default();
        config.audio.buffer_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "audio.buffer-size",
                ..
            })
        ));
    }
}
