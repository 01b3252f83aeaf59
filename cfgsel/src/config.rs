//! cfgsel.toml configuration parsing and validation.
//!
//! The configuration describes the compilation target and tunes the pass.
//! Every key is optional.
//!
//! # Example Configuration
//!
//! ```toml
//! [target]
//! pointer_size = 8
//!
//! [selection]
//! validate = true
//! global_init_name = "global-init"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("unsupported pointer size: {size} (expected 4 or 8)")]
    InvalidPointerSize { size: u32 },

    #[error("global initializer name must not be empty")]
    EmptyGlobalInitName,
}

/// Target machine properties the selector depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Width of a pointer in bytes.
    #[serde(default = "default_pointer_size")]
    pub pointer_size: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            pointer_size: default_pointer_size(),
        }
    }
}

fn default_pointer_size() -> u32 {
    8
}

/// Pass options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Run the CFG validator after selection.
    #[serde(default = "default_validate")]
    pub validate: bool,

    /// Name of the function holding global field initializers.
    #[serde(default = "default_global_init_name")]
    pub global_init_name: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            validate: default_validate(),
            global_init_name: default_global_init_name(),
        }
    }
}

fn default_validate() -> bool {
    true
}

fn default_global_init_name() -> String {
    "global-init".to_string()
}

/// The full selector configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub selection: SelectionConfig,
}

impl SelectorConfig {
    /// Parse a configuration from TOML text.
    #[allow(clippy::should_implement_trait)] // Uses ConfigError, not compatible with FromStr
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SelectorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a file path.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Pointer width in bytes.
    pub fn pointer_size(&self) -> u32 {
        self.target.pointer_size
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.target.pointer_size, 4 | 8) {
            return Err(ConfigError::InvalidPointerSize {
                size: self.target.pointer_size,
            });
        }
        if self.selection.global_init_name.is_empty() {
            return Err(ConfigError::EmptyGlobalInitName);
        }
        Ok(())
    }
}
