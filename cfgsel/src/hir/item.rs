//! HIR items (top-level declarations).
//!
//! This module defines the declarations handed to selection: classes,
//! functions and fields. Field layout is computed upstream and consumed
//! through [`FieldLayout`].

use serde::{Deserialize, Serialize};

use crate::span::Span;
use super::{DefId, Expr, LocalId, Type};

/// A top-level or member declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Declaration {
    Class(ClassDecl),
    Function(FunctionDecl),
    Field(FieldDecl),
}

impl Declaration {
    pub fn def_id(&self) -> DefId {
        match self {
            Declaration::Class(class) => class.def_id,
            Declaration::Function(function) => function.def_id,
            Declaration::Field(field) => field.def_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Declaration::Class(class) => &class.name,
            Declaration::Function(function) => &function.name,
            Declaration::Field(field) => &field.name,
        }
    }
}

/// Field offsets of a class, as computed by the layout pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    /// Field names with their byte offsets, in declaration order.
    #[serde(default)]
    pub fields: Vec<(String, u32)>,
    /// Size of an instance in bytes.
    #[serde(default)]
    pub size: u32,
}

impl FieldLayout {
    pub fn new(fields: Vec<(String, u32)>, size: u32) -> Self {
        Self { fields, size }
    }

    /// Byte offset of the named field.
    pub fn offset_of(&self, name: &str) -> Option<u32> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, offset)| *offset)
    }
}

/// A class declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub def_id: DefId,
    pub name: String,
    #[serde(default)]
    pub layout: FieldLayout,
    /// The always-empty singleton (`Unit`): its instance never needs loading.
    #[serde(default)]
    pub is_unit_singleton: bool,
    #[serde(default)]
    pub members: Vec<Declaration>,
    #[serde(default)]
    pub span: Span,
}

/// Where a function declaration came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Written in source (or synthesized with a real body).
    #[default]
    Defined,
    /// Inherited member copied into a subclass; has no code of its own.
    FakeOverride,
}

/// A function parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub local: LocalId,
    pub name: String,
    pub ty: Type,
}

impl Param {
    pub fn new(local: LocalId, name: impl Into<String>, ty: Type) -> Self {
        Self {
            local,
            name: name.into(),
            ty,
        }
    }
}

/// A function body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    /// `fun f() = expr`
    Expression(Expr),
    /// `fun f() { stmts }`
    Block(Vec<Expr>),
    /// Body produced by a compiler plugin that must be lowered earlier.
    Synthetic,
}

/// A function or constructor declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub def_id: DefId,
    pub name: String,
    /// Value parameters. Constructors and methods receive the instance as
    /// their first parameter.
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: Type,
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub is_constructor: bool,
    /// The class a constructor initializes.
    #[serde(default)]
    pub constructed_class: Option<DefId>,
    #[serde(default)]
    pub span: Span,
}

impl FunctionDecl {
    pub fn returns_unit(&self) -> bool {
        self.return_type.is_unit()
    }
}

/// A field (property backing storage) declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub def_id: DefId,
    pub name: String,
    pub ty: Type,
    /// `None` for top-level (global) fields.
    #[serde(default)]
    pub containing_class: Option<DefId>,
    #[serde(default)]
    pub initializer: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}
