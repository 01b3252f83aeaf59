//! # cfgsel
//!
//! Instruction selection for a managed, class-based language: lowers a
//! typed, name-resolved HIR module into a control-flow graph of basic blocks
//! and three-address instructions for a native code generator.
//!
//! ## Pipeline Position
//!
//! ```text
//! Frontend -> HIR -> [Instruction Selection] -> CFG -> Validation -> Native codegen
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgsel::hir::{Body, DefId, Declaration, Expr, ExprKind, FunctionDecl, LiteralValue, Module, Origin, Type};
//! use cfgsel::{select_module, SelectorConfig};
//!
//! let answer = FunctionDecl {
//!     def_id: DefId::new(0),
//!     name: "answer".into(),
//!     params: vec![],
//!     return_type: Type::Int,
//!     body: Some(Body::Expression(Expr::new(
//!         ExprKind::Literal(LiteralValue::Int(42)),
//!         Type::Int,
//!     ))),
//!     origin: Origin::Defined,
//!     is_constructor: false,
//!     constructed_class: None,
//!     span: Default::default(),
//! };
//! let module = Module::new("demo", vec![Declaration::Function(answer)]);
//!
//! let selection = select_module(&module, &SelectorConfig::default()).unwrap();
//! let text = cfgsel::cfg::print_program(&selection.program);
//! assert!(text.contains("ret 42:i32"));
//! ```
//!
//! ## Module Overview
//!
//! - [`hir`] - The typed input tree
//! - [`cfg`] - The output graph, its printer and validator
//! - [`select`] - The selection pass
//! - [`diagnostics`] - Hard errors and best-effort warnings
//! - [`config`] - Target and pass configuration
//! - [`span`] - Source locations

pub mod cfg;
pub mod config;
pub mod diagnostics;
pub mod hir;
pub mod select;
pub mod span;

pub use config::{ConfigError, SelectorConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, ErrorCode, SelectError};
pub use select::{select_module, Selection};
pub use span::Span;
