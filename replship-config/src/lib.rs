//! Replship Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Replship crates.
//!
//! Every type deserializes with `#[serde(default)]`, so a partial JSON document
//! only overrides the fields it names.

use serde::Deserialize;
use std::path::PathBuf;

/// Default marker identifying units generated by the interactive loop
pub const DEFAULT_FRAGMENT_MARKER: &str = "$line";

/// Default extension of compiled-code artifacts
pub const DEFAULT_CODE_EXTENSION: &str = "class";

/// Default file name of every built archive
pub const DEFAULT_ARCHIVE_NAME: &str = "session.jar";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    pub loader: LoaderConfig,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
}

impl ShipConfig {
    /// Whether resolution and packaging select the same artifacts.
    ///
    /// A session resolves units by `loader.code_extension` while builds ship
    /// leaves by `archive.code_extension`; the two must name one extension.
    pub fn code_extensions_agree(&self) -> bool {
        self.loader.code_extension == self.archive.code_extension
    }
}

/// Configuration for module resolution
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Substring that marks a name as a session fragment
    pub fragment_marker: String,
    /// Extension of the artifact a unit name maps to; must equal
    /// `ArchiveConfig::code_extension`
    pub code_extension: String,
    /// Environment variable naming the platform library directory
    pub platform_path_var: String,
}

/// Archive compression
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

/// Configuration for archive builds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Leaf file name used for every build
    pub archive_name: String,
    /// Only leaves with this extension are packaged; must equal
    /// `LoaderConfig::code_extension`
    pub code_extension: String,
    /// Parent of all staging directories (system temp dir when absent)
    pub staging_root: Option<PathBuf>,
    /// Name prefix of each staging directory
    pub staging_prefix: String,
    pub compression: Compression,
}

/// Log verbosity, mirrors `tracing::Level` without depending on it
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Library component, used for per-component log filtering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    Loader,
    Platform,
    Session,
    Workspace,
    Archive,
}

impl Component {
    /// All components, in pipeline order
    pub const ALL: [Component; 5] = [
        Component::Loader,
        Component::Platform,
        Component::Session,
        Component::Workspace,
        Component::Archive,
    ];

    /// Get the string name of the component
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Loader => "loader",
            Component::Platform => "platform",
            Component::Session => "session",
            Component::Workspace => "workspace",
            Component::Archive => "archive",
        }
    }

    /// Get the log target name for this component
    pub fn target(&self) -> String {
        format!("replship::{}", self.as_str())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for every target
    pub global: LogLevel,
    pub loader: Option<LogLevel>,
    pub platform: Option<LogLevel>,
    pub session: Option<LogLevel>,
    pub workspace: Option<LogLevel>,
    pub archive: Option<LogLevel>,
}

impl LoggingConfig {
    /// Effective level for a component, falling back to the global level
    pub fn level_for(&self, component: Component) -> LogLevel {
        let specific = match component {
            Component::Loader => self.loader,
            Component::Platform => self.platform,
            Component::Session => self.session,
            Component::Workspace => self.workspace,
            Component::Archive => self.archive,
        };
        specific.unwrap_or(self.global)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fragment_marker: DEFAULT_FRAGMENT_MARKER.to_string(),
            code_extension: DEFAULT_CODE_EXTENSION.to_string(),
            platform_path_var: "REPLSHIP_PLATFORM_PATH".to_string(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            code_extension: DEFAULT_CODE_EXTENSION.to_string(),
            staging_root: None,
            staging_prefix: "replship-build".to_string(),
            compression: Compression::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global: LogLevel::Info,
            loader: None,
            platform: None,
            session: None,
            workspace: None,
            archive: None,
        }
    }
}
