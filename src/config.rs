//! Configuration management for armie-parser.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (ARMIE_TOP_N, ARMIE_THRESHOLD, ARMIE_MIN_COUNT)
//! 2. Project-local config file (`./armie-parser.toml`)
//! 3. User config file (`~/.config/armie-parser/config.toml`)
//! 4. Built-in defaults
//!
//! Command-line flags override all of these.
//!
//! # Config File Format
//!
//! ```toml
//! # armie-parser.toml
//!
//! # Number of opcodes listed per version
//! top_n = 8
//!
//! # Highlight opcodes only when they differ by more than this percentage
//! threshold = 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

pub const DEFAULT_TOP_N: usize = 8;
pub const DEFAULT_THRESHOLD: u32 = 20;
pub const DEFAULT_MIN_COUNT: u64 = 1000;
pub const DEFAULT_EXPORT_NAME: &str = "ops";

/// armie-parser configuration. Unset fields fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Opcodes listed per version in summaries.
    pub top_n: Option<usize>,

    /// Minimum frequency difference, in percent, for a highlight.
    pub threshold: Option<u32>,

    /// Opcodes at or below this count on both sides are not highlighted.
    pub min_count: Option<u64>,

    /// Base name of the exported opcode tables.
    pub export_name: Option<String>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `armie-parser.toml`
    /// 3. User config `~/.config/armie-parser/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_from_file(Path::new("armie-parser.toml")) {
            config.merge(local_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load with an explicit config file taking the place of the project-local one.
    pub fn load_with(path: &Path) -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        match Self::load_from_file(path) {
            Some(explicit) => config.merge(explicit),
            None => log::warn!("Config file {} not loaded, using defaults", path.display()),
        }

        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold.unwrap_or(DEFAULT_THRESHOLD)
    }

    pub fn min_count(&self) -> u64 {
        self.min_count.unwrap_or(DEFAULT_MIN_COUNT)
    }

    pub fn export_name(&self) -> String {
        self.export_name
            .clone()
            .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string())
    }

    fn load_user_config() -> Option<Self> {
        Self::load_from_file(&Self::user_config_path()?)
    }

    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    fn merge(&mut self, other: Self) {
        if other.top_n.is_some() {
            self.top_n = other.top_n;
        }
        if other.threshold.is_some() {
            self.threshold = other.threshold;
        }
        if other.min_count.is_some() {
            self.min_count = other.min_count;
        }
        if other.export_name.is_some() {
            self.export_name = other.export_name;
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(n) = env_number("ARMIE_TOP_N") {
            self.top_n = Some(n);
        }
        if let Some(t) = env_number("ARMIE_THRESHOLD") {
            self.threshold = Some(t);
        }
        if let Some(m) = env_number("ARMIE_MIN_COUNT") {
            self.min_count = Some(m);
        }
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("armie-parser").join("config.toml"))
    }

    /// Sample config file content.
    pub fn sample_config() -> String {
        r#"# armie-parser configuration
# Place this file at ~/.config/armie-parser/config.toml or ./armie-parser.toml

# Opcodes listed per version (highlights consider twice as many)
top_n = 8

# Highlight opcodes only when their counts differ by more than this percentage
threshold = 20

# Ignore opcodes executed at most this many times in both versions
min_count = 1000

# Base name of the exported opcode tables (<name>.csv, <name>.json)
# export_name = "ops"
"#
        .to_string()
    }
}

fn env_number<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(value) => {
            log::info!("Using {}={} from environment", var, raw);
            Some(value)
        }
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a number", var, raw);
            None
        }
    }
}
