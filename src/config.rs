//! Configuration management for the storage engine
//!
//! The storage root and transfer settings are loaded once and injected into
//! the engine at construction; nothing re-reads configuration per call.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// Directory under the storage root that holds one sub-directory per principal
pub const FILES_DIR: &str = "files";

const DEFAULT_UPLOAD_PATH: &str = "uploads";
const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB copy buffer

/// Storage engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Storage root; principal sandboxes live at `<root>/files/<principal>`
    /// Environment: DRIVE_STORAGE_ROOT
    pub root: PathBuf,

    /// Principal-relative directory that receives uploads
    /// Environment: DRIVE_STORAGE_UPLOAD_PATH
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Chunk size used when streaming into a file
    /// Environment: DRIVE_STORAGE_BUFFER_SIZE
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_upload_path() -> String {
    DEFAULT_UPLOAD_PATH.to_string()
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

impl StorageConfig {
    /// Build a configuration for `root` with default transfer settings
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            upload_path: default_upload_path(),
            buffer_size: default_buffer_size(),
        }
    }

    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the named file (extension optional) with environment overrides.
    /// A missing file is not an error as long as the environment supplies `root`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("DRIVE_STORAGE"))
            .build()?;

        let config: StorageConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(config::ConfigError::Message("root cannot be empty".into()));
        }

        if self.upload_path.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "upload_path cannot be empty".into(),
            ));
        }

        let escapes = Path::new(&self.upload_path)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(config::ConfigError::Message(format!(
                "upload_path must be a relative path without '..': {}",
                self.upload_path
            )));
        }

        if self.buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Directory holding every principal root
    pub fn files_root(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }
}
