//! Identifiers for HIR nodes.
//!
//! The frontend assigns three kinds of stable identities:
//! - [`DefId`] - declarations (classes, functions, fields)
//! - [`LocalId`] - parameters and local variables within a function
//! - [`LoopId`] - loops, so `break`/`continue` can name the loop they leave

use std::fmt;

use serde::{Deserialize, Serialize};

/// A globally unique identifier for a declaration.
///
/// DefIds are assigned during name resolution and remain stable
/// throughout compilation. The selector keys functions and classes by them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefId {
    /// Module-wide index for this declaration.
    pub index: u32,
}

impl DefId {
    /// Create a new DefId with the given index.
    pub const fn new(index: u32) -> Self {
        Self { index }
    }

    /// The index of this declaration.
    pub const fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Debug for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefId({})", self.index)
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def{}", self.index)
    }
}

/// A variable identifier, unique within the declaring function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId {
    /// Function-local index for this variable.
    pub index: u32,
}

impl LocalId {
    /// Create a new LocalId with the given index.
    pub const fn new(index: u32) -> Self {
        Self { index }
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalId({})", self.index)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.index)
    }
}

/// Identity of a loop expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopId(pub u32);

impl LoopId {
    pub const fn new(id: u32) -> Self {
        LoopId(id)
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'loop{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display() {
        assert_eq!(DefId::new(7).to_string(), "def7");
        assert_eq!(LocalId::new(3).to_string(), "_3");
        assert_eq!(LoopId::new(2).to_string(), "'loop2");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&DefId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: LocalId = serde_json::from_str("9").unwrap();
        assert_eq!(back, LocalId::new(9));
    }
}
