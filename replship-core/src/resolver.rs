//! Resolver trait
//!
//! A resolver answers "does this name exist, and if so give me its unit".
//! Session resolvers, parents and the platform resolver all sit behind it,
//! and [`crate::ModuleLoader`] implements it so loaders chain as parents.

use crate::error::LoadError;
use crate::unit::CodeUnit;
use std::sync::Arc;

pub trait UnitResolver: Send + Sync {
    /// Short label used in logs and recorded on units this resolver defines
    fn label(&self) -> &str;

    /// Resolve a unit by dotted name
    ///
    /// Returns `LoadError::NotFound` when the name is unknown; any other error
    /// means a location exists but could not be read.
    fn resolve(&self, name: &str) -> Result<Arc<CodeUnit>, LoadError>;
}
