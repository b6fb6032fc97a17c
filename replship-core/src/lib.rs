//! Replship Core - resolve compiled units and snapshot compiler output
//!
//! Two independent paths share one [`SessionRegistry`]:
//! - resolution: [`ModuleLoader`] answers "give me the unit named X", asking the
//!   active session first for interactive fragments, then its own locations,
//!   then its parent chain and an optional platform resolver;
//! - shipping: [`Packager`] snapshots the active session's output tree into a
//!   fresh staging directory as an ordered archive.
//!
//! Configuration is passed explicitly via parameters, not via global state.

pub mod archive;
pub mod error;
pub mod loader;
pub mod packager;
pub mod platform;
pub mod resolver;
pub mod session;
pub mod source;
pub mod unit;
pub mod workspace;

pub use archive::{list_archive, ArchiveBuilder, ArchiveEntry};
pub use error::{BuildError, LoadError, ProbeError};
pub use loader::{ModuleLoader, ModuleLoaderBuilder};
pub use packager::Packager;
pub use platform::{discover_platform, NoPlatform, PlatformProbe, SystemPlatformProbe};
pub use resolver::UnitResolver;
pub use session::{Session, SessionRegistry};
pub use source::{ArchiveSource, CodeSource, DirectorySource};
pub use unit::{unit_path, CodeUnit};
pub use workspace::{WorkspaceAllocator, WorkspaceDir};

// Re-export config types from replship-config
pub use replship_config::{ArchiveConfig, Compression, LoaderConfig, ShipConfig};
