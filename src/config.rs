//! Configuration for diskfs
//!
//! Settings are loaded from environment variables with sensible defaults.
//!
//! # Environment Variables
//!
//! - `DISKFS_MMAP`: Serve `open` reads from a memory mapping (true|false) - default: "false"
//!
//! # Example
//!
//! ```no_run
//! use diskfs::{FsConfig, RealFileSystem};
//!
//! let config = FsConfig::from_env().expect("invalid DISKFS_MMAP");
//! let fs = RealFileSystem::from_config(&config);
//! ```

use std::env;
use std::fmt;
use thiserror::Error;

const MMAP_ENV: &str = "DISKFS_MMAP";
const DEFAULT_USE_MMAP: bool = false;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsConfig {
    pub use_mmap: bool,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            use_mmap: DEFAULT_USE_MMAP,
        }
    }
}

impl FsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let use_mmap = match env::var(MMAP_ENV) {
            Ok(value) => parse_flag(MMAP_ENV, &value)?,
            Err(_) => DEFAULT_USE_MMAP,
        };

        Ok(Self { use_mmap })
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            field: field.to_string(),
            error: format!("expected a boolean, got '{}'", other),
        }),
    }
}

impl fmt::Display for FsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diskfs Configuration:")?;
        writeln!(f, "  Memory-mapped reads: {}", self.use_mmap)?;
        Ok(())
    }
}
