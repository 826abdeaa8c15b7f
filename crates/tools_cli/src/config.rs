//! Configuration for the `isomesh` tool
//!
//! Loads settings from `config/isomesh.json` (or `--config`) or creates the
//! default file if missing. Command-line flags override file values.

use anyhow::{ensure, Context, Result};
use glam::Vec3;
use iso_engine::{ColorMode, ExtractConfig, GridTransform};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Logging verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// Errors only
    Silent,
    /// Warnings plus one summary line per extraction (default)
    Summary,
    /// Summary + import/export and preprocessing events
    Normal,
    /// Per-phase timings and counts
    Verbose,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Summary
    }
}

impl LogLevel {
    /// `tracing` filter directive for this level
    pub fn filter(self) -> &'static str {
        match self {
            Self::Silent => "error",
            Self::Summary => "warn,iso_engine::marching_cubes=info",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    pub extraction: ExtractionConfig,
    pub preprocess: PreprocessConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Surface threshold, field values are normalized to [0, 1]
    pub isovalue: f32,

    /// Vertex coloring
    #[serde(default)]
    pub color: ColorMode,

    /// Use the rayon-parallel extraction path
    pub parallel: bool,

    /// Distance between grid vertices along x, y, z
    pub spacing: [f32; 3],

    /// World position of grid vertex (0, 0, 0)
    pub origin: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Number of halvings applied before extraction
    pub subsample_passes: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            isovalue: 0.2,
            color: ColorMode::default(),
            parallel: false,
            spacing: [1.0; 3],
            origin: [0.0; 3],
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            subsample_passes: 1,
        }
    }
}

impl ExtractionConfig {
    /// Library configuration. Fails on non-positive or non-finite spacing.
    pub fn extract_config(&self) -> Result<ExtractConfig> {
        let spacing = Vec3::from_array(self.spacing);
        ensure!(
            GridTransform::valid_spacing(spacing),
            "extraction.spacing {:?} must be positive and finite",
            self.spacing
        );
        Ok(ExtractConfig {
            color: self.color,
            transform: GridTransform::new(Vec3::from_array(self.origin), spacing),
            parallel: self.parallel,
        })
    }
}

impl ToolConfig {
    /// Default location, relative to the working directory
    pub fn default_path() -> PathBuf {
        Path::new("config").join("isomesh.json")
    }

    /// Load configuration from `path`, or write and return the default if missing
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}
