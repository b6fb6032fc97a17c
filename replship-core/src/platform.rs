//! Platform resolver discovery
//!
//! The host may or may not provide a shared library of units that every
//! loader can fall back to. Whether it does is asked once, when a loader is
//! constructed, and every kind of failure means the same thing: no platform
//! resolver, carry on without it.

use crate::error::ProbeError;
use crate::loader::ModuleLoader;
use crate::resolver::UnitResolver;
use crate::source::DirectorySource;
use once_cell::sync::OnceCell;
use replship_config::LoaderConfig;
use replship_vfs::NativeFileSystem;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

const TARGET: &str = "replship::platform";

/// One-shot capability query for a platform-provided resolver
pub trait PlatformProbe: Send + Sync {
    fn probe(&self) -> Result<Arc<dyn UnitResolver>, ProbeError>;
}

/// Run a probe, treating any failure as "absent"
pub fn discover_platform(probe: &dyn PlatformProbe) -> Option<Arc<dyn UnitResolver>> {
    match probe.probe() {
        Ok(resolver) => {
            debug!(target: TARGET, resolver = resolver.label(), "platform resolver available");
            Some(resolver)
        }
        Err(e) => {
            debug!(target: TARGET, reason = %e, "platform resolver unavailable, continuing without it");
            None
        }
    }
}

/// A probe that never finds a platform resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlatform;

impl PlatformProbe for NoPlatform {
    fn probe(&self) -> Result<Arc<dyn UnitResolver>, ProbeError> {
        Err(ProbeError::Unsupported("platform resolution disabled".to_string()))
    }
}

/// Looks for a platform library directory named by an environment variable
///
/// The lookup happens at most once per probe instance; later calls return
/// the first outcome. Use [`SystemPlatformProbe::shared`] to discover once
/// per process.
pub struct SystemPlatformProbe {
    var: String,
    extension: String,
    outcome: OnceCell<Result<Arc<dyn UnitResolver>, ProbeError>>,
}

impl SystemPlatformProbe {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            var: config.platform_path_var.clone(),
            extension: config.code_extension.clone(),
            outcome: OnceCell::new(),
        }
    }

    /// Process-wide probe, configured by the first caller
    pub fn shared(config: &LoaderConfig) -> &'static SystemPlatformProbe {
        static SHARED: OnceCell<SystemPlatformProbe> = OnceCell::new();
        SHARED.get_or_init(|| SystemPlatformProbe::new(config))
    }

    fn locate(&self) -> Result<Arc<dyn UnitResolver>, ProbeError> {
        let raw = std::env::var_os(&self.var)
            .ok_or_else(|| ProbeError::Unsupported(format!("{} is not set", self.var)))?;
        let dir = PathBuf::from(raw);

        let metadata = std::fs::metadata(&dir).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => ProbeError::Denied(format!("{}: {}", dir.display(), e)),
            _ => ProbeError::MissingCapability(format!("{}: {}", dir.display(), e)),
        })?;
        if !metadata.is_dir() {
            return Err(ProbeError::MissingCapability(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        std::fs::read_dir(&dir)
            .map_err(|e| ProbeError::Denied(format!("{}: {}", dir.display(), e)))?;

        let loader = ModuleLoader::builder("platform")
            .location(DirectorySource::new(
                Arc::new(NativeFileSystem::with_base(&dir)),
                "/",
                self.extension.clone(),
            ))
            .build();
        Ok(Arc::new(loader))
    }
}

impl PlatformProbe for SystemPlatformProbe {
    fn probe(&self) -> Result<Arc<dyn UnitResolver>, ProbeError> {
        self.outcome.get_or_init(|| self.locate()).clone()
    }
}
