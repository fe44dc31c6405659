// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stash.toml` loading

use anyhow::Context;
use serde::Deserialize;
use stash_engine::ConsumerConfig;
use std::path::{Path, PathBuf};

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG: &str = "stash.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operation log file
    pub log_path: PathBuf,
    /// Projected store snapshot
    pub snapshot_path: PathBuf,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
    pub consumer: ConsumerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(".stash/oplog.jsonl"),
            snapshot_path: PathBuf::from(".stash/snapshot.json"),
            log_filter: "info".to_string(),
            consumer: ConsumerConfig::default(),
        }
    }
}

impl Config {
    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, log: Option<PathBuf>, snapshot: Option<PathBuf>) -> Self {
        if let Some(log) = log {
            self.log_path = log;
        }
        if let Some(snapshot) = snapshot {
            self.snapshot_path = snapshot;
        }
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
