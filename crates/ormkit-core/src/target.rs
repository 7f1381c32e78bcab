//! Entity type identity.

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

/// Identifies a declared entity type by name.
///
/// Declarations refer to other types through this token instead of a direct
/// reference, so a relation may name a type whose own declarations have not
/// been registered yet. The token is only looked up during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityTarget(String);

impl EntityTarget {
    /// Create a target from a type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The type name, used as the class name for default table naming.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityTarget {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityTarget {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityTarget {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityTarget {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&EntityTarget> for EntityTarget {
    fn from(target: &EntityTarget) -> Self {
        target.clone()
    }
}
