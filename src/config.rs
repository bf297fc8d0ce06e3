//! Ingest configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file overrides only the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnail]
//! max_width = 480           # Bounding box width (contain-fit)
//! max_height = 854          # Bounding box height
//!
//! [encoding]
//! avif_quality = 60         # AVIF quality (1-100)
//! avif_speed = 6            # rav1e speed preset (1 = slowest, 10 = fastest)
//! jpeg_quality = 90         # JPEG quality for `convert --to jpeg` (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [thumbnail]
//! max_width = 320
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, EncodeSettings, Quality, Speed, ThumbnailBounds,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Thumbnail bounding box.
    pub thumbnail: ThumbnailConfig,
    /// Encoder settings.
    pub encoding: EncodingConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl IngestConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnail.max_width == 0 || self.thumbnail.max_height == 0 {
            return Err(ConfigError::Validation(
                "thumbnail.max_width and thumbnail.max_height must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.encoding.avif_quality) {
            return Err(ConfigError::Validation(
                "encoding.avif_quality must be 1-100".into(),
            ));
        }
        if !(1..=10).contains(&self.encoding.avif_speed) {
            return Err(ConfigError::Validation(
                "encoding.avif_speed must be 1-10".into(),
            ));
        }
        if !(1..=100).contains(&self.encoding.jpeg_quality) {
            return Err(ConfigError::Validation(
                "encoding.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn bounds(&self) -> ThumbnailBounds {
        ThumbnailBounds::new(self.thumbnail.max_width, self.thumbnail.max_height)
    }

    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            avif_quality: Quality::new(self.encoding.avif_quality),
            avif_speed: Speed::new(self.encoding.avif_speed),
            jpeg_quality: Quality::new(self.encoding.jpeg_quality),
        }
    }
}

/// Thumbnail bounding box settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub avif_quality: u32,
    pub avif_speed: u8,
    pub jpeg_quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        let settings = EncodeSettings::default();
        Self {
            avif_quality: settings.avif_quality.value(),
            avif_speed: settings.avif_speed.value(),
            jpeg_quality: settings.jpeg_quality.value(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel ingest workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(IngestConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<IngestConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: IngestConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file yields the stock defaults; an unreadable or invalid file is
/// an error.
pub fn load_config(path: &Path) -> Result<IngestConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-ingest configuration
# ==========================
#
# Every key is optional. Omitted keys keep the defaults shown here.

[thumbnail]
# Thumbnails are scaled to fit entirely inside this box, keeping the
# source aspect ratio. The default is a portrait phone screen.
max_width = 480
max_height = 854

[encoding]
# AVIF quality for thumbnails (1 = smallest, 100 = best).
avif_quality = 60
# rav1e speed preset (1 = slowest/smallest, 10 = fastest).
avif_speed = 6
# JPEG quality used when converting to JPEG (1-100).
jpeg_quality = 90

[processing]
# Maximum parallel workers for `ingest`. Omit to use every CPU core.
# max_processes = 4
"##
}
