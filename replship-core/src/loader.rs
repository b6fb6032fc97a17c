//! Module loader
//!
//! Resolves a unit name through a fixed sequence of stages, stopping at the
//! first one that answers:
//!
//! 1. the active session's resolver, only for names carrying the fragment marker;
//! 2. this loader's own code sources, in registration order;
//! 3. the parent resolver;
//! 4. the platform resolver, if the probe at construction found one.
//!
//! A session miss of any kind falls through to stage 2. Only when every stage
//! misses does `load` fail with `LoadError::NotFound`.
//!
//! Units from this loader's own sources are defined once per name: a
//! per-name reservation serializes the define step, so two threads racing on
//! one name get the same `Arc` while unrelated names resolve in parallel.

use crate::error::LoadError;
use crate::platform::{discover_platform, PlatformProbe};
use crate::resolver::UnitResolver;
use crate::session::SessionRegistry;
use crate::source::CodeSource;
use crate::unit::CodeUnit;
use parking_lot::{Mutex, RwLock};
use replship_config::DEFAULT_FRAGMENT_MARKER;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

const TARGET: &str = "replship::loader";

/// Delegating loader for compiled units
pub struct ModuleLoader {
    label: String,
    locations: Vec<Box<dyn CodeSource>>,
    parent: Option<Arc<dyn UnitResolver>>,
    platform: Option<Arc<dyn UnitResolver>>,
    sessions: Option<Arc<SessionRegistry>>,
    fragment_marker: String,
    /// Units defined by this loader: name → unit
    defined: RwLock<HashMap<String, Arc<CodeUnit>>>,
    /// Per-name reservations for the define step
    define_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ModuleLoader {
    /// Start building a loader with the given label
    pub fn builder(label: impl Into<String>) -> ModuleLoaderBuilder {
        ModuleLoaderBuilder::new(label)
    }

    /// Resolve a unit by name
    pub fn load(&self, name: &str) -> Result<Arc<CodeUnit>, LoadError> {
        if self.is_fragment(name) {
            if let Some(unit) = self.load_from_session(name) {
                return Ok(unit);
            }
        }
        self.load_delegated(name)
    }

    /// Whether the name carries the session-fragment marker
    pub fn is_fragment(&self, name: &str) -> bool {
        !self.fragment_marker.is_empty() && name.contains(&self.fragment_marker)
    }

    /// The unit this loader already defined under `name`, if any
    pub fn find_loaded(&self, name: &str) -> Option<Arc<CodeUnit>> {
        self.defined.read().get(name).cloned()
    }

    /// Number of units defined by this loader
    pub fn defined_count(&self) -> usize {
        self.defined.read().len()
    }

    /// Whether the probe at construction produced a platform resolver
    pub fn has_platform(&self) -> bool {
        self.platform.is_some()
    }

    fn load_from_session(&self, name: &str) -> Option<Arc<CodeUnit>> {
        debug!(target: TARGET, loader = %self.label, name, "trying session resolver");

        let Some(session) = self.sessions.as_ref().and_then(|s| s.current()) else {
            debug!(target: TARGET, name, "no session registered, falling back");
            return None;
        };

        match session.resolver().resolve(name) {
            Ok(unit) => {
                debug!(
                    target: TARGET,
                    name,
                    session = %session.id(),
                    resolver = session.resolver().label(),
                    "resolved by session"
                );
                Some(unit)
            }
            Err(e) => {
                debug!(target: TARGET, name, session = %session.id(), error = %e, "session missed, falling back");
                None
            }
        }
    }

    fn load_delegated(&self, name: &str) -> Result<Arc<CodeUnit>, LoadError> {
        if let Some(unit) = self.find_loaded(name) {
            trace!(target: TARGET, name, "already defined");
            return Ok(unit);
        }

        for location in &self.locations {
            if let Some(bytes) = location.fetch(name)? {
                debug!(target: TARGET, loader = %self.label, name, location = %location.location(), "found in own location");
                return Ok(self.define(name, bytes));
            }
        }

        for (stage, delegate) in [("parent", &self.parent), ("platform", &self.platform)] {
            let Some(delegate) = delegate else {
                continue;
            };
            match delegate.resolve(name) {
                Ok(unit) => {
                    debug!(target: TARGET, name, stage, resolver = delegate.label(), "resolved by delegate");
                    return Ok(unit);
                }
                Err(LoadError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        debug!(target: TARGET, loader = %self.label, name, "not found");
        Err(LoadError::not_found(name))
    }

    fn define(&self, name: &str, bytes: Vec<u8>) -> Arc<CodeUnit> {
        let reservation = self.reservation(name);
        let _guard = reservation.lock();

        // lost the race: another thread defined it while we fetched
        let unit = match self.find_loaded(name) {
            Some(existing) => existing,
            None => {
                let unit = Arc::new(CodeUnit::new(name, bytes, self.label.clone()));
                self.defined
                    .write()
                    .insert(name.to_string(), Arc::clone(&unit));
                unit
            }
        };

        // the name is defined now, so later callers stop at the cache check
        self.define_locks.lock().remove(name);
        unit
    }

    fn reservation(&self, name: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.define_locks.lock().entry(name.to_string()).or_default())
    }
}

impl UnitResolver for ModuleLoader {
    fn label(&self) -> &str {
        &self.label
    }

    fn resolve(&self, name: &str) -> Result<Arc<CodeUnit>, LoadError> {
        self.load(name)
    }
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locations: Vec<String> = self.locations.iter().map(|l| l.location()).collect();
        f.debug_struct("ModuleLoader")
            .field("label", &self.label)
            .field("locations", &locations)
            .field("parent", &self.parent.as_ref().map(|p| p.label().to_string()))
            .field("platform", &self.platform.as_ref().map(|p| p.label().to_string()))
            .field("sessions", &self.sessions.is_some())
            .field("fragment_marker", &self.fragment_marker)
            .field("defined", &self.defined_count())
            .finish()
    }
}

/// Builder for [`ModuleLoader`]
///
/// The platform probe, if any, runs exactly once inside [`ModuleLoaderBuilder::probe`].
pub struct ModuleLoaderBuilder {
    label: String,
    locations: Vec<Box<dyn CodeSource>>,
    parent: Option<Arc<dyn UnitResolver>>,
    platform: Option<Arc<dyn UnitResolver>>,
    sessions: Option<Arc<SessionRegistry>>,
    fragment_marker: String,
}

impl ModuleLoaderBuilder {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            locations: Vec::new(),
            parent: None,
            platform: None,
            sessions: None,
            fragment_marker: DEFAULT_FRAGMENT_MARKER.to_string(),
        }
    }

    /// Append an owned code location; locations are searched in the order added
    pub fn location(mut self, source: impl CodeSource + 'static) -> Self {
        self.locations.push(Box::new(source));
        self
    }

    pub fn parent(mut self, parent: Arc<dyn UnitResolver>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Consult this registry's active session for fragment names
    pub fn sessions(mut self, sessions: Arc<SessionRegistry>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn fragment_marker(mut self, marker: impl Into<String>) -> Self {
        self.fragment_marker = marker.into();
        self
    }

    /// Use a known platform resolver
    pub fn platform(mut self, platform: Arc<dyn UnitResolver>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Run a platform probe now; any failure leaves the loader without one
    pub fn probe(mut self, probe: &dyn PlatformProbe) -> Self {
        self.platform = discover_platform(probe);
        self
    }

    pub fn build(self) -> ModuleLoader {
        ModuleLoader {
            label: self.label,
            locations: self.locations,
            parent: self.parent,
            platform: self.platform,
            sessions: self.sessions,
            fragment_marker: self.fragment_marker,
            defined: RwLock::new(HashMap::new()),
            define_locks: Mutex::new(HashMap::new()),
        }
    }
}
