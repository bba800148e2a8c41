//! Configuration system

pub use serde::{Serialize, Deserialize};

use crate::spatial::{AxisAlignedBounds, PartitionKind, TreeError};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values parsed but rejected
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] TreeError),
}

/// Tuning of one partition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Entities a node may hold before it splits
    pub splitting_threshold: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Cut point heuristic
    pub partition: PartitionKind,

    /// Destroy nodes left without entities or children after removals
    pub prune_empty_nodes: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            splitting_threshold: 8,
            max_depth: 16,
            partition: PartitionKind::Median,
            prune_empty_nodes: true,
        }
    }
}

impl TreeConfig {
    /// Default configuration with a custom splitting threshold
    pub fn with_threshold(splitting_threshold: usize) -> Self {
        Self {
            splitting_threshold,
            ..Default::default()
        }
    }

    /// Reject values the tree cannot work with
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.splitting_threshold == 0 {
            return Err(TreeError::InvalidConfig(
                "splitting_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config for TreeConfig {}

/// Corners of the default place extent
const DEFAULT_UNIVERSE: ([f64; 3], [f64; 3]) = ([0.0, 0.0, 0.0], [1000.0, 1000.0, 100.0]);

/// Indexing setup of one simulation place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceConfig {
    /// Extent of the place
    pub universe: AxisAlignedBounds,

    /// Tree holding static obstacles
    pub obstacles: TreeConfig,

    /// Tree holding mobile agents
    pub agents: TreeConfig,
}

impl Default for PlaceConfig {
    fn default() -> Self {
        let (lower, upper) = DEFAULT_UNIVERSE;
        Self {
            universe: AxisAlignedBounds::spanning(lower, upper),
            obstacles: TreeConfig {
                partition: PartitionKind::Median,
                ..Default::default()
            },
            agents: TreeConfig {
                partition: PartitionKind::Midpoint,
                ..Default::default()
            },
        }
    }
}

impl PlaceConfig {
    /// Validate both tree configurations
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.obstacles.validate()?;
        self.agents.validate()?;
        Ok(())
    }
}

impl Config for PlaceConfig {}
