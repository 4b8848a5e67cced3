//! Service configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! (or absent) file yields a working server on `0.0.0.0:8000`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StowageResult;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_LOG_FILTER: &str = "stowage=info,stowage_gateway=info,tower_http=info";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StowageConfig {
    pub bind_addr: String,
    pub log_filter: String,
    /// Upper bound on request bodies, CSV uploads included.
    pub max_upload_bytes: usize,
}

impl Default for StowageConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl StowageConfig {
    pub fn from_toml_str(raw: &str) -> StowageResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> StowageResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
