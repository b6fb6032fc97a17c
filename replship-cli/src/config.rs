//! CLI configuration
//!
//! Loads a `ShipConfig` from JSON, holds it in a process-wide cell, and maps
//! its logging section onto `tracing` levels.

use once_cell::sync::OnceCell;
use replship_config::{Component, LogLevel, LoggingConfig, ShipConfig};
use std::path::Path;
use tracing::Level;

static GLOBAL_CONFIG: OnceCell<ShipConfig> = OnceCell::new();

/// Install the process configuration; later calls keep the first value
pub fn init_config(config: ShipConfig) -> &'static ShipConfig {
    GLOBAL_CONFIG.get_or_init(|| config)
}

/// Process configuration, or defaults when none was installed
pub fn config() -> &'static ShipConfig {
    GLOBAL_CONFIG.get_or_init(ShipConfig::default)
}

/// Read a config file; a missing `path` yields defaults
pub fn read_config(path: Option<&Path>) -> Result<ShipConfig, String> {
    let Some(path) = path else {
        return Ok(ShipConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config '{}': {}", path.display(), e))?;
    let config: ShipConfig = serde_json::from_str(&content)
        .map_err(|e| format!("cannot parse config '{}': {}", path.display(), e))?;

    if !config.code_extensions_agree() {
        return Err(format!(
            "config '{}': loader.code_extension '{}' differs from archive.code_extension '{}'",
            path.display(),
            config.loader.code_extension,
            config.archive.code_extension
        ));
    }
    Ok(config)
}

/// Per-target log levels
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    overrides: Vec<(Component, Level)>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            overrides: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Levels from the config file, each made `verbose` steps chattier
    pub fn from_logging(logging: &LoggingConfig, verbose: u8) -> Self {
        let overrides = Component::ALL
            .iter()
            .filter(|c| logging.level_for(**c) != logging.global)
            .map(|c| (*c, raise(to_level(logging.level_for(*c)), verbose)))
            .collect();
        Self {
            global: raise(to_level(logging.global), verbose),
            overrides,
        }
    }

    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> Level {
        self.overrides
            .iter()
            .find(|(component, _)| component.target() == target)
            .map(|(_, level)| *level)
            .unwrap_or(self.global)
    }
}

fn to_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

// tracing orders TRACE as the greatest level
fn raise(level: Level, steps: u8) -> Level {
    const LADDER: [Level; 5] = [
        Level::ERROR,
        Level::WARN,
        Level::INFO,
        Level::DEBUG,
        Level::TRACE,
    ];
    let position = LADDER.iter().position(|l| *l == level).unwrap_or(2);
    LADDER[(position + steps as usize).min(LADDER.len() - 1)]
}
