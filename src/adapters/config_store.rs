//! Configuration store adapters.
//!
//! Both implement [`ConfigPort`]:
//!
//! - [`JsonConfigFile`]: a human-edited JSON file on the host.
//! - [`MemoryConfigStore`]: a postcard blob held in memory, the stand-in
//!   for a flash key-value partition.
//!
//! Both validate before persisting and treat a missing entry as defaults.

use std::cell::RefCell;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::LinkConfig;

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV_VAR: &str = "GATTLINK_CONFIG";

// ───────────────────────────────────────────────────────────────
// JSON file
// ───────────────────────────────────────────────────────────────

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path from [`CONFIG_ENV_VAR`], if set.
    pub fn from_env() -> Option<Self> {
        std::env::var_os(CONFIG_ENV_VAR).map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<LinkConfig, ConfigError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{}: not found, using defaults", self.path.display());
                return Ok(LinkConfig::default());
            }
            Err(e) => {
                warn!("{}: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };
        let cfg = LinkConfig::from_json(&text).map_err(|e| {
            warn!("{}: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        cfg.validate()?;
        info!("Loaded config from {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &LinkConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config).map_err(|_| ConfigError::IoError)?;
        std::fs::write(&self.path, text).map_err(|_| ConfigError::IoError)?;
        info!("Saved config to {}", self.path.display());
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// In-memory blob
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored bytes, for inspection.
    pub fn blob(&self) -> Option<Vec<u8>> {
        self.blob.borrow().clone()
    }

    /// Overwrite the stored bytes without validation.
    pub fn set_blob(&self, bytes: Vec<u8>) {
        *self.blob.borrow_mut() = Some(bytes);
    }
}

impl ConfigPort for MemoryConfigStore {
    fn load(&self) -> Result<LinkConfig, ConfigError> {
        match self.blob.borrow().as_deref() {
            Some(bytes) => postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted),
            None => Ok(LinkConfig::default()),
        }
    }

    fn save(&self, config: &LinkConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        *self.blob.borrow_mut() = Some(bytes);
        Ok(())
    }
}
