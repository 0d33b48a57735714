use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    media::OutputProfile,
};

/// Main configuration for Reelstitch
///
/// One `Config` is scoped to a single assembly request; components receive it
/// explicitly rather than reading global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output encode settings
    pub output: OutputConfig,

    /// Fallback clip settings
    pub fallback: FallbackConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string(),
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.fallback.validate()?;
        Ok(())
    }
}

/// Output encode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Fixed encode profile (resolution, frame rate, codecs)
    pub profile: OutputProfile,

    /// Minimum byte size a written output file must exceed to be considered
    /// valid; smaller files are removed and the request fails
    pub min_output_bytes: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            profile: OutputProfile::default(),
            min_output_bytes: 10_000,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.profile.fps <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "output.profile.fps".to_string(),
                value: self.profile.fps.to_string(),
            }
            .into());
        }

        if self.profile.width() == 0 || self.profile.height() == 0 {
            return Err(ConfigError::InvalidValue {
                key: "output.profile.resolution".to_string(),
                value: format!("{}x{}", self.profile.width(), self.profile.height()),
            }
            .into());
        }

        if self.profile.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "output.profile.quality".to_string(),
                value: self.profile.quality.to_string(),
            }
            .into());
        }

        if self.min_output_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "output.min_output_bytes".to_string(),
                value: self.min_output_bytes.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Fallback clip configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Background color (RGB) for the whole-pipeline fallback clip
    pub background: [u8; 3],

    /// Caption rendered on the whole-pipeline fallback clip
    pub caption: String,

    /// Color palette cycled across per-keyword placeholder clips
    pub keyword_palette: Vec<[u8; 3]>,

    /// Duration of each per-keyword placeholder clip in seconds
    pub keyword_clip_secs: f64,

    /// Maximum number of per-keyword placeholder clips to generate
    pub max_keyword_clips: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            // Dodger blue
            background: [30, 144, 255],
            caption: "AI Generated Video".to_string(),
            keyword_palette: vec![[0, 0, 255], [0, 128, 0], [128, 0, 128]],
            keyword_clip_secs: 5.0,
            max_keyword_clips: 3,
        }
    }
}

impl FallbackConfig {
    fn validate(&self) -> Result<()> {
        if self.caption.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "fallback.caption".to_string(),
                value: self.caption.clone(),
            }
            .into());
        }

        if self.keyword_clip_secs <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "fallback.keyword_clip_secs".to_string(),
                value: self.keyword_clip_secs.to_string(),
            }
            .into());
        }

        if self.keyword_palette.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "fallback.keyword_palette".to_string(),
                value: "[]".to_string(),
            }
            .into());
        }

        if self.max_keyword_clips == 0 {
            return Err(ConfigError::InvalidValue {
                key: "fallback.max_keyword_clips".to_string(),
                value: self.max_keyword_clips.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
