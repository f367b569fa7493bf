// rust/timeline-core/src/config.rs

//! Configuration management for the timeline reader.
//!
//! This module provides configuration parsing from TOML files, environment
//! variable overrides, and validation of configuration values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, ReaderError};

// Top-level reader configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub materialize: MaterializeConfig,
    pub cleaner: CleanerConfig,
    pub window: WindowConfig,
}

/// Materialization options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializeConfig {
    /// Whether sequences of a batch are materialized on worker threads.
    pub multithreaded: bool,
    /// Number of worker threads used when `multithreaded` is set.
    pub threads: usize,
}

// Cleaning of invalid sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    // Number of invalid sequences tolerated before a batch request fails.
    pub max_invalid_sequences: u64,
}

// Window refill options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    // Number of chunks loaded into the window per refill.
    pub chunks_per_refill: usize,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            multithreaded: false,
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            max_invalid_sequences: 0,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            chunks_per_refill: 1,
        }
    }
}

impl FromStr for ReaderConfig {
    type Err = ReaderError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| ReaderError::config_with_source("failed to parse TOML config", e))
    }
}

impl ReaderConfig {
    // Load configuration from a TOML file.
    //
    // # Errors
    //
    // Returns an error if the file cannot be read, parsed, or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReaderError::config_with_source(
                format!("failed to read config file '{}'", path.display()),
                e,
            )
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // Environment variables are prefixed with `TLR_` and use underscores
    // to separate nested fields, e.g. `TLR_MATERIALIZE_THREADS` overrides
    // `materialize.threads`. Values that fail to parse are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("TLR_MATERIALIZE_MULTITHREADED") {
            if let Ok(v) = val.parse() {
                self.materialize.multithreaded = v;
            }
        }
        if let Ok(val) = std::env::var("TLR_MATERIALIZE_THREADS") {
            if let Ok(v) = val.parse() {
                self.materialize.threads = v;
            }
        }
        if let Ok(val) = std::env::var("TLR_CLEANER_MAX_INVALID_SEQUENCES") {
            if let Ok(v) = val.parse() {
                self.cleaner.max_invalid_sequences = v;
            }
        }
        if let Ok(val) = std::env::var("TLR_WINDOW_CHUNKS_PER_REFILL") {
            if let Ok(v) = val.parse() {
                self.window.chunks_per_refill = v;
            }
        }
        self
    }

    // Validate all configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.materialize.threads == 0 {
            return Err(ReaderError::config(
                "materialize.threads must be greater than 0",
            ));
        }

        if self.window.chunks_per_refill == 0 {
            return Err(ReaderError::config(
                "window.chunks_per_refill must be greater than 0",
            ));
        }

        Ok(())
    }
}
