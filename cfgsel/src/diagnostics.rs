//! Diagnostic reporting infrastructure.
//!
//! Instruction selection has two failure tiers:
//!
//! - **Hard** failures ([`SelectError`]) are compiler-internal errors. They
//!   abort the whole pass through `Result`.
//! - **Soft** failures ([`Diagnostic`]) mark constructs whose lowering is known
//!   to be incomplete. The selector substitutes a placeholder operand, records
//!   a diagnostic and keeps going.
//!
//! # Diagnostic Codes
//!
//! - **E0500-E0599**: best-effort selection warnings
//! - **E0600-E0699**: CFG validation findings

use std::fmt;

use thiserror::Error;

use crate::span::Span;

/// Diagnostic codes emitted by the selector and the CFG validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // ============================================================
    // Selection (E0500-E0599)
    // ============================================================
    /// A variable was read before any binding was recorded for it.
    UnresolvedVariable = 500,
    /// A coercion the selector does not lower yet.
    UnfinishedCoercion = 501,
    /// Singleton initialization path is not generated.
    SingletonInitialization = 502,
    /// Exception propagation for `throw` is not generated.
    ThrowPropagation = 503,
    /// The dispatcher has no selection routine for this node kind.
    UnsupportedNode = 504,

    // ============================================================
    // Validation (E0600-E0699)
    // ============================================================
    /// A reachable block has no terminal instruction.
    UnterminatedBlock = 600,
    /// An instruction follows a terminal instruction in the same block.
    InstructionAfterTerminal = 601,
    /// A branch or landing edge points outside the function's block arena.
    DanglingBlockReference = 602,
    /// A landing block does not begin with a landing-pad entry.
    MissingLandingPad = 603,
    /// A block is never reached from the function entry.
    UnreachableBlock = 604,
}

impl ErrorCode {
    /// Get the formatted code string (e.g., "E0500").
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a human-readable description of the code.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnresolvedVariable => "variable read without a recorded binding",
            ErrorCode::UnfinishedCoercion => "coercion is not lowered",
            ErrorCode::SingletonInitialization => "singleton initialization is not lowered",
            ErrorCode::ThrowPropagation => "exception propagation is not lowered",
            ErrorCode::UnsupportedNode => "node kind has no selection routine",
            ErrorCode::UnterminatedBlock => "reachable block has no terminator",
            ErrorCode::InstructionAfterTerminal => "instruction after terminator",
            ErrorCode::DanglingBlockReference => "branch to a block outside the function",
            ErrorCode::MissingLandingPad => "landing block without landing-pad entry",
            ErrorCode::UnreachableBlock => "block is unreachable from entry",
        }
    }

    /// Get a help message, if one is useful.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            ErrorCode::UnresolvedVariable => {
                Some("the value degrades to `unit`; check that the declaration precedes the read")
            }
            ErrorCode::UnsupportedNode => {
                Some("lower this construct in an earlier pass before instruction selection")
            }
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// An error that makes the output unusable.
    Error,
    /// A warning: the output is usable but incomplete.
    Warning,
    /// An informational note.
    Note,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Error => write!(f, "error"),
            DiagnosticKind::Warning => write!(f, "warning"),
            DiagnosticKind::Note => write!(f, "note"),
        }
    }
}

/// A compiler diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The kind of diagnostic.
    pub kind: DiagnosticKind,
    /// The diagnostic code.
    pub code: Option<ErrorCode>,
    /// The main message.
    pub message: String,
    /// The primary span.
    pub span: Span,
    /// Suggestions for fixing the issue.
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code: None,
            message: message.into(),
            span,
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code: None,
            message: message.into(),
            span,
            suggestions: Vec::new(),
        }
    }

    /// Set the code. Adds the code's help message if it has one.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        if let Some(help) = code.help() {
            self.suggestions.push(help.to_string());
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{}]: {} at {}", self.kind, code, self.message, self.span)?,
            None => write!(f, "{}: {} at {}", self.kind, self.message, self.span)?,
        }
        for suggestion in &self.suggestions {
            write!(f, "\n  help: {}", suggestion)?;
        }
        Ok(())
    }
}

/// Hard selection failures. Any of these aborts the pass.
#[derive(Debug, Clone, Error)]
pub enum SelectError {
    #[error("unsupported body kind for function `{function}`")]
    UnsupportedBody { function: String, span: Span },

    #[error("no lowering rule for intrinsic `{name}`")]
    UnknownIntrinsic { name: String, span: Span },

    #[error("intrinsic `{name}` expects {expected} argument(s), found {found}")]
    IntrinsicArity {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("field `{field}` accessed on a non-class receiver of type {ty}")]
    PrimitiveReceiver { field: String, ty: String, span: Span },

    #[error("class `{class}` has no field `{field}` in its layout")]
    UnknownField { class: String, field: String, span: Span },

    #[error("`{keyword}` targets a loop that is not being lowered")]
    LoopNotFound { keyword: &'static str, span: Span },

    #[error("integer coercion to non-integer type {ty}")]
    NonIntegerCoercion { ty: String, span: Span },

    #[error("vararg element was neither lowered nor statically evaluated")]
    SpreadVararg { span: Span },

    #[error("delegating constructor call in `{function}`, which has no receiver parameter")]
    MissingReceiver { function: String, span: Span },
}

impl SelectError {
    pub fn span(&self) -> Span {
        match self {
            SelectError::UnsupportedBody { span, .. }
            | SelectError::UnknownIntrinsic { span, .. }
            | SelectError::IntrinsicArity { span, .. }
            | SelectError::PrimitiveReceiver { span, .. }
            | SelectError::UnknownField { span, .. }
            | SelectError::LoopNotFound { span, .. }
            | SelectError::NonIntegerCoercion { span, .. }
            | SelectError::MissingReceiver { span, .. }
            | SelectError::SpreadVararg { span } => *span,
        }
    }
}

impl From<&SelectError> for Diagnostic {
    fn from(error: &SelectError) -> Self {
        Diagnostic::error(format!("internal compiler error: {}", error), error.span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::UnresolvedVariable.as_str(), "E0500");
        assert_eq!(ErrorCode::UnterminatedBlock.as_str(), "E0600");
    }

    #[test]
    fn test_with_code_adds_help() {
        let diag = Diagnostic::warning("x", Span::dummy()).with_code(ErrorCode::UnsupportedNode);
        assert_eq!(diag.code, Some(ErrorCode::UnsupportedNode));
        assert_eq!(diag.suggestions.len(), 1);
        assert!(!diag.is_error());
    }

    #[test]
    fn test_select_error_to_diagnostic() {
        let err = SelectError::UnknownIntrinsic {
            name: "intrinsics.frobnicate".into(),
            span: Span::new(1, 2, 3, 4),
        };
        let diag = Diagnostic::from(&err);
        assert!(diag.is_error());
        assert!(diag.message.contains("intrinsics.frobnicate"));
        assert_eq!(diag.span.start_line, 3);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warning("read of `x`", Span::new(0, 1, 2, 5))
            .with_code(ErrorCode::UnresolvedVariable);
        let text = diag.to_string();
        assert!(text.starts_with("warning[E0500]: read of `x` at 2:5"));
        assert!(text.contains("help:"));
    }
}
