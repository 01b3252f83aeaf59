//! High-level Intermediate Representation (HIR) consumed by selection.
//!
//! The HIR arrives from the frontend fully processed:
//!
//! 1. **Types are resolved** - every expression carries a concrete [`Type`]
//! 2. **Names are resolved** - identifiers are [`DefId`], [`LocalId`] or [`LoopId`]
//! 3. **Layouts are computed** - classes carry a [`FieldLayout`]
//!
//! # HIR Structure
//!
//! - [`Module`] - Root node containing all declarations of a compilation unit
//! - [`Declaration`] - Classes, functions and fields
//! - [`Expr`] - Typed expressions
//!
//! The whole tree is serde-serializable so the CLI can read it as JSON.

pub mod def;
pub mod expr;
pub mod item;
pub mod ty;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use def::{DefId, LocalId, LoopId};
pub use expr::{
    Branch, Call, Callee, CalleeKind, Catch, Expr, ExprKind, FieldRef, LiteralValue,
    TypeOperator, VarargElement,
};
pub use item::{Body, ClassDecl, Declaration, FieldDecl, FieldLayout, FunctionDecl, Origin, Param};
pub use ty::Type;

/// A compilation unit in HIR form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    /// Module name, used for logging only.
    #[serde(default)]
    pub name: String,
    /// Top-level declarations in source order.
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

/// Errors reading a serialized module.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("failed to read module file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse module: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Module {
    pub fn new(name: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            name: name.into(),
            declarations,
        }
    }

    /// Parse a module from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ModuleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a module from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ModuleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Index every declaration (including class members) by its DefId.
    pub fn index(&self) -> HashMap<DefId, &Declaration> {
        fn walk<'a>(decls: &'a [Declaration], out: &mut HashMap<DefId, &'a Declaration>) {
            for decl in decls {
                out.insert(decl.def_id(), decl);
                if let Declaration::Class(class) = decl {
                    walk(&class.members, out);
                }
            }
        }

        let mut out = HashMap::new();
        walk(&self.declarations, &mut out);
        out
    }
}
