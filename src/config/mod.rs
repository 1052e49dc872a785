//! TOML configuration for queues and the perf driver.
//!
//! Every table and key is optional; anything left out takes its default.

use anyhow::Context;
use serde::Deserialize;
use std::{fs, io, path::Path};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct QueueConfig {
    /// Buffering limit; anything below 1 means unbounded.
    pub capacity: isize,
    /// Evict the oldest item on overflow instead of blocking writers.
    pub ring: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: -1,
            ring: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PerfConfig {
    pub items: u64,
    pub producers: usize,
    pub consumers: usize,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            items: 1_000_000,
            producers: 1,
            consumers: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub queue: QueueConfig,
    pub perf: PerfConfig,
}

/// Reads and parses the configuration file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse_config(path, &raw)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(raw) => parse_config(path, &raw),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e).with_context(|| format!("reading config file {}", path.display())),
    }
}

fn parse_config(path: &Path, raw: &str) -> Result<Config, anyhow::Error> {
    toml::from_str(raw).with_context(|| format!("parsing config file {}", path.display()))
}
