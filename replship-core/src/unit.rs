//! Compiled code units and the name-to-artifact mapping

use std::fmt;

/// A compiled unit, defined by exactly one resolver
///
/// Units are shared as `Arc<CodeUnit>`; a loader hands out the same `Arc`
/// for a name every time once it has defined it.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeUnit {
    name: String,
    bytes: Vec<u8>,
    defined_by: String,
}

impl CodeUnit {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, defined_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            defined_by: defined_by.into(),
        }
    }

    /// Dotted unit name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw compiled bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Label of the resolver that defined this unit
    pub fn defined_by(&self) -> &str {
        &self.defined_by
    }
}

impl fmt::Debug for CodeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeUnit")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("defined_by", &self.defined_by)
            .finish()
    }
}

/// Relative artifact path of a unit (using '/' as separator)
///
/// `None` when the name cannot denote an artifact: an empty segment
/// (including a leading or trailing `.`) or a path separator inside a segment.
///
/// # Examples
/// - "Main" → "Main.class"
/// - "a.b.C" → "a/b/C.class"
/// - "$line3.$read$$iw" → "$line3/$read$$iw.class"
/// - "a..B", ".Secret", "a/B" → None
pub fn unit_path(name: &str, extension: &str) -> Option<String> {
    let valid = name
        .split('.')
        .all(|segment| !segment.is_empty() && !segment.contains(['/', '\\']));
    if !valid {
        return None;
    }

    let mut path = name.replace('.', "/");
    path.push('.');
    path.push_str(extension);
    Some(path)
}
