//! Startup configuration, read from RON.
//!
//! A default configuration is compiled in. A user file replaces it wholesale
//! when present; missing fields fall back to their defaults.

use std::path::{Path, PathBuf};

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::hair::{HairParameters, HairStyle, StrandLayout, DEFAULT_SAMPLING_SEED};
use crate::ui::controls::DebugToggles;

use super::collider::ColliderDesc;
use super::method::MethodKind;

const EMBEDDED_DEFAULT: &str = include_str!("../../default_hair_settings.ron");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HairConfig {
    pub num_strands: u32,
    pub strand_length: u32,
    pub hair_length: f32,
    pub style: HairStyle,
}

impl Default for HairConfig {
    fn default() -> Self {
        Self {
            num_strands: 5120,
            strand_length: 20,
            hair_length: 2.0,
            style: HairStyle::Straight,
        }
    }
}

impl HairConfig {
    pub fn layout(&self) -> StrandLayout {
        StrandLayout::new(self.num_strands, self.strand_length, self.hair_length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub position: Vec3,
    pub dimensions: Vec3,
    pub resolution: UVec3,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 0.0),
            dimensions: Vec3::splat(8.0),
            resolution: UVec3::splat(50),
        }
    }
}

/// Optional asset files. Missing entries are generated procedurally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub head_mesh: Option<PathBuf>,
    pub scalp_mesh: Option<PathBuf>,
    pub head_texture: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub hair: HairConfig,
    pub parameters: HairParameters,
    pub grid: GridConfig,
    pub colliders: Vec<ColliderDesc>,
    pub assets: AssetConfig,
    pub method: MethodKind,
    pub sampling_seed: u64,
    pub constraint_pass: bool,
    pub toggles: DebugToggles,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            hair: HairConfig::default(),
            parameters: HairParameters::default(),
            grid: GridConfig::default(),
            colliders: ColliderDesc::demo_set(),
            assets: AssetConfig::default(),
            method: MethodKind::Strand,
            sampling_seed: DEFAULT_SAMPLING_SEED,
            constraint_pass: true,
            toggles: DebugToggles::default(),
        }
    }
}

impl SimulationConfig {
    /// Read a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Read `path` if it exists, otherwise use the embedded default.
    ///
    /// A file that exists but does not parse is an error, not a fallback.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let config = Self::load(path)?;
            log::info!("Loaded hair settings from {:?}", path);
            Ok(config)
        } else {
            log::info!("No settings at {:?}, using embedded default", path);
            Ok(Self::embedded_default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = ron::from_str(contents)?;
        config.parameters = config.parameters.clamped();
        Ok(config)
    }

    fn embedded_default() -> Self {
        match Self::parse(EMBEDDED_DEFAULT) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to parse embedded hair settings: {}. Using hardcoded default.", e);
                Self::default()
            }
        }
    }
}
