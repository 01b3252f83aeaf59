//! HIR expressions.
//!
//! This module defines the typed expression representation handed to
//! instruction selection. All expressions have a resolved type attached and
//! every name is already resolved to a [`DefId`], [`LocalId`] or [`LoopId`].

use serde::{Deserialize, Serialize};

use crate::span::Span;
use super::{DefId, LocalId, LoopId, Type};

/// A typed expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    /// The expression kind.
    pub kind: ExprKind,
    /// The static type of this expression.
    pub ty: Type,
    /// The source span.
    #[serde(default)]
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Self {
            kind,
            ty,
            span: Span::dummy(),
        }
    }

    /// Attach a span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Whether this expression is the literal `true`.
    pub fn is_true_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(LiteralValue::Boolean(true)))
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
}

/// Type operators applied to a single argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeOperator {
    /// Unchecked reinterpretation: `x as T`.
    Cast,
    /// Checked cast that yields null on failure: `x as? T`.
    SafeCast,
    /// Cast inserted by the type checker; value-preserving.
    ImplicitCast,
    /// Non-null assertion inserted by the type checker.
    ImplicitNotNull,
    /// Evaluate and discard the value.
    CoercionToUnit,
    /// Widen or narrow an integer to another integer width.
    IntegerCoercion,
    /// `x is T`
    InstanceOf,
    /// `x !is T`
    NotInstanceOf,
}

/// What kind of callable a call resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalleeKind {
    /// An ordinary function or method.
    Function,
    /// A function declared as an operator (`plus`, `minus`, ...).
    Operator,
    /// A function with a hand-written lowering rule, looked up by name.
    Intrinsic,
    /// A class initializer.
    Constructor { class: DefId },
}

/// The resolved target of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Callee {
    pub def_id: DefId,
    /// Simple name for ordinary functions and operators; fully qualified
    /// name for intrinsics.
    pub name: String,
    pub kind: CalleeKind,
}

impl Callee {
    pub fn function(def_id: DefId, name: impl Into<String>) -> Self {
        Self {
            def_id,
            name: name.into(),
            kind: CalleeKind::Function,
        }
    }

    pub fn operator(def_id: DefId, name: impl Into<String>) -> Self {
        Self {
            def_id,
            name: name.into(),
            kind: CalleeKind::Operator,
        }
    }

    pub fn intrinsic(def_id: DefId, name: impl Into<String>) -> Self {
        Self {
            def_id,
            name: name.into(),
            kind: CalleeKind::Intrinsic,
        }
    }

    pub fn constructor(def_id: DefId, class: DefId) -> Self {
        Self {
            def_id,
            name: "<init>".to_string(),
            kind: CalleeKind::Constructor { class },
        }
    }
}

/// A call expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    pub callee: Callee,
    #[serde(default)]
    pub dispatch_receiver: Option<Box<Expr>>,
    #[serde(default)]
    pub extension_receiver: Option<Box<Expr>>,
    #[serde(default)]
    pub args: Vec<Expr>,
}

impl Call {
    /// All argument expressions in evaluation order: dispatch receiver,
    /// extension receiver, then value arguments.
    pub fn arguments(&self) -> impl Iterator<Item = &Expr> {
        self.dispatch_receiver
            .as_deref()
            .into_iter()
            .chain(self.extension_receiver.as_deref())
            .chain(self.args.iter())
    }
}

/// One arm of a multi-arm conditional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub condition: Expr,
    pub result: Expr,
}

/// One catch clause of a try expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catch {
    /// The variable the exception is bound to.
    pub parameter: LocalId,
    pub name: String,
    /// The declared exception type tested against.
    pub ty: Type,
    pub result: Expr,
}

/// Reference to a field declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRef {
    pub def_id: DefId,
    pub name: String,
}

/// An element of a vararg argument list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarargElement {
    Expr(Expr),
    /// `*array` spread; must be lowered before selection.
    Spread(Expr),
}

/// The kind of an expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    /// A literal constant.
    Literal(LiteralValue),

    /// `argument <op> type_operand`
    TypeOperator {
        operator: TypeOperator,
        argument: Box<Expr>,
        type_operand: Type,
    },

    /// Function, operator, intrinsic or constructor call.
    Call(Call),

    /// `super(...)`/`this(...)` call from inside a constructor.
    DelegatingConstructorCall {
        callee: Callee,
        #[serde(default)]
        args: Vec<Expr>,
    },

    /// Marker for running a class's property initializers.
    InstanceInitializerCall { class: DefId },

    /// Statement sequence; its value is the value of the last statement.
    Block(Vec<Expr>),

    While {
        loop_id: LoopId,
        condition: Box<Expr>,
        #[serde(default)]
        body: Option<Box<Expr>>,
    },

    DoWhile {
        loop_id: LoopId,
        condition: Box<Expr>,
        #[serde(default)]
        body: Option<Box<Expr>>,
    },

    Break { loop_id: LoopId },

    Continue { loop_id: LoopId },

    Return { target: DefId, value: Box<Expr> },

    /// Multi-arm conditional; arms are tried in order.
    When { branches: Vec<Branch> },

    /// Local variable declaration.
    Variable {
        local: LocalId,
        name: String,
        var_type: Type,
        #[serde(default)]
        initializer: Option<Box<Expr>>,
    },

    /// Assignment to a local variable.
    SetVariable {
        local: LocalId,
        name: String,
        value: Box<Expr>,
    },

    /// Read of a parameter or local variable.
    GetValue { local: LocalId, name: String },

    Vararg { elements: Vec<VarargElement> },

    Throw { value: Box<Expr> },

    Try { body: Box<Expr>, catches: Vec<Catch> },

    GetField {
        field: FieldRef,
        #[serde(default)]
        receiver: Option<Box<Expr>>,
    },

    SetField {
        field: FieldRef,
        #[serde(default)]
        receiver: Option<Box<Expr>>,
        value: Box<Expr>,
    },

    /// Access to a singleton object instance.
    GetObjectValue { class: DefId },

    // Produced by the frontend but lowered by earlier passes; selection has
    // no routine for these.
    StringConcat { args: Vec<Expr> },

    ClassReference { class: DefId },

    FunctionReference { function: DefId },

    EnumEntry { class: DefId, name: String },
}

impl ExprKind {
    /// Short name of the node kind, for diagnostics and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Literal(_) => "literal",
            ExprKind::TypeOperator { .. } => "type operator",
            ExprKind::Call(_) => "call",
            ExprKind::DelegatingConstructorCall { .. } => "delegating constructor call",
            ExprKind::InstanceInitializerCall { .. } => "instance initializer call",
            ExprKind::Block(_) => "block",
            ExprKind::While { .. } => "while loop",
            ExprKind::DoWhile { .. } => "do-while loop",
            ExprKind::Break { .. } => "break",
            ExprKind::Continue { .. } => "continue",
            ExprKind::Return { .. } => "return",
            ExprKind::When { .. } => "when",
            ExprKind::Variable { .. } => "variable declaration",
            ExprKind::SetVariable { .. } => "variable assignment",
            ExprKind::GetValue { .. } => "variable read",
            ExprKind::Vararg { .. } => "vararg",
            ExprKind::Throw { .. } => "throw",
            ExprKind::Try { .. } => "try",
            ExprKind::GetField { .. } => "field read",
            ExprKind::SetField { .. } => "field write",
            ExprKind::GetObjectValue { .. } => "object access",
            ExprKind::StringConcat { .. } => "string concatenation",
            ExprKind::ClassReference { .. } => "class reference",
            ExprKind::FunctionReference { .. } => "function reference",
            ExprKind::EnumEntry { .. } => "enum entry",
        }
    }
}
