//! # Core CFG Types
//!
//! This module defines the instruction-level vocabulary of the CFG.
//!
//! ## Type Hierarchy
//!
//! ```text
//! Function
//! └── Block
//!     └── Vec<Instruction>
//!         ├── Binary { op, def, lhs, rhs }
//!         ├── Load / Store / Alloc / Gep
//!         ├── Call / Invoke
//!         ├── Br / CondBr / Ret      (terminal)
//!         └── ...
//! ```
//!
//! Unlike a statement/terminator split, terminators live in the same
//! instruction list as everything else; a block is terminal when its last
//! instruction is a control transfer.

use std::fmt;

use serde::Serialize;

use super::{FunctionId, KlassId};

// ============================================================================
// Identifiers
// ============================================================================

/// A unique identifier for a block within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    /// The entry block ID (always 0).
    pub const ENTRY: BlockId = BlockId(0);

    /// Create a new BlockId.
    pub const fn new(id: u32) -> Self {
        BlockId(id)
    }

    /// Get the index value.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

// ============================================================================
// Types
// ============================================================================

/// A CFG-level type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Void,
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    /// Untyped pointer.
    Ptr,
    /// Pointer to an instance of a class.
    KlassPtr(KlassId),
    String,
}

impl Type {
    /// Size of a value of this type in bytes.
    pub fn byte_size(&self, pointer_size: u32) -> u32 {
        match self {
            Type::Void => 0,
            Type::Boolean | Type::Byte => 1,
            Type::Short | Type::Char => 2,
            Type::Int | Type::Float => 4,
            Type::Long | Type::Double => 8,
            Type::Ptr | Type::KlassPtr(_) | Type::String => pointer_size,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Byte | Type::Short | Type::Int | Type::Long)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Type::Float | Type::Double)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Boolean => write!(f, "i1"),
            Type::Byte => write!(f, "i8"),
            Type::Short => write!(f, "i16"),
            Type::Int => write!(f, "i32"),
            Type::Long => write!(f, "i64"),
            Type::Float => write!(f, "f32"),
            Type::Double => write!(f, "f64"),
            Type::Char => write!(f, "char"),
            Type::Ptr => write!(f, "ptr"),
            Type::KlassPtr(klass) => write!(f, "ptr<{}>", klass),
            Type::String => write!(f, "str"),
        }
    }
}

// ============================================================================
// Operands
// ============================================================================

/// A named variable. Its type is fixed when it is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub ty: Type,
    pub name: String,
}

impl Variable {
    pub fn new(ty: Type, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }
}

/// The value of a constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstValue {
    Null,
    Bool(bool),
    /// Integer of any width; the width is carried by the constant's type.
    Int(i64),
    Float(f64),
    Char(char),
    String(String),
    /// Address of a named global slot.
    Symbol(String),
    /// Statically collected elements of an array.
    Elements(Vec<Operand>),
}

/// A typed immediate value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constant {
    pub ty: Type,
    pub value: ConstValue,
}

impl Constant {
    pub fn new(ty: Type, value: ConstValue) -> Self {
        Self { ty, value }
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Type::Boolean, ConstValue::Bool(value))
    }

    pub fn int(ty: Type, value: i64) -> Self {
        Self::new(ty, ConstValue::Int(value))
    }

    /// A pointer-typed null.
    pub fn null_ptr() -> Self {
        Self::new(Type::Ptr, ConstValue::Null)
    }

    /// Address of the global slot called `name`.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(Type::Ptr, ConstValue::Symbol(name.into()))
    }
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Variable(Variable),
    Constant(Constant),
    /// Placeholder for "no object".
    Null,
    /// Placeholder for "no value".
    Unit,
}

impl Operand {
    pub fn ty(&self) -> Type {
        match self {
            Operand::Variable(var) => var.ty,
            Operand::Constant(constant) => constant.ty,
            Operand::Null => Type::Ptr,
            Operand::Unit => Type::Void,
        }
    }
}

impl From<Variable> for Operand {
    fn from(var: Variable) -> Self {
        Operand::Variable(var)
    }
}

impl From<Constant> for Operand {
    fn from(constant: Constant) -> Self {
        Operand::Constant(constant)
    }
}

// ============================================================================
// Instructions
// ============================================================================

/// Binary arithmetic opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::SRem => "srem",
        }
    }
}

/// Comparison opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    IcmpEq,
    IcmpNe,
    FcmpEq,
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::IcmpEq => "icmp eq",
            CmpOp::IcmpNe => "icmp ne",
            CmpOp::FcmpEq => "fcmp eq",
        }
    }
}

/// Run-time type tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTestKind {
    IsInstance,
    NotInstance,
}

/// A single CFG instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "inst", rename_all = "snake_case")]
pub enum Instruction {
    Binary {
        op: BinOp,
        def: Variable,
        lhs: Operand,
        rhs: Operand,
    },
    Compare {
        op: CmpOp,
        def: Variable,
        lhs: Operand,
        rhs: Operand,
    },
    /// `def = *(address + offset)`
    Load {
        def: Variable,
        address: Operand,
        offset: u32,
    },
    /// `*(address + offset) = value`
    Store {
        value: Operand,
        address: Operand,
        offset: u32,
    },
    /// Request storage for one instance of `klass`.
    Alloc { def: Variable, klass: KlassId },
    Call {
        callee: FunctionId,
        def: Option<Variable>,
        args: Vec<Operand>,
    },
    /// Call inside a protected region: continues at `normal`, unwinds to `landing`.
    Invoke {
        callee: FunctionId,
        def: Option<Variable>,
        args: Vec<Operand>,
        normal: BlockId,
        landing: BlockId,
    },
    /// Reinterpret `value` as `def.ty`.
    Cast { def: Variable, value: Operand },
    Trunc { def: Variable, value: Operand },
    Sext { def: Variable, value: Operand },
    Bitcast { def: Variable, value: Operand },
    /// `def = base + offset`
    Gep {
        def: Variable,
        base: Operand,
        offset: Operand,
    },
    Br { target: BlockId },
    CondBr {
        cond: Operand,
        if_true: BlockId,
        if_false: BlockId,
    },
    Ret { value: Operand },
    Mov { def: Variable, value: Operand },
    /// Entry of a landing block; binds the in-flight exception.
    LandingPad { def: Variable },
    TypeTest {
        kind: TypeTestKind,
        def: Variable,
        value: Operand,
        ty: Type,
    },
}

impl Instruction {
    /// Whether this instruction transfers control and must end its block.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Instruction::Br { .. }
                | Instruction::CondBr { .. }
                | Instruction::Ret { .. }
                | Instruction::Invoke { .. }
        )
    }

    /// The variable this instruction defines, if any.
    pub fn def(&self) -> Option<&Variable> {
        match self {
            Instruction::Binary { def, .. }
            | Instruction::Compare { def, .. }
            | Instruction::Load { def, .. }
            | Instruction::Alloc { def, .. }
            | Instruction::Cast { def, .. }
            | Instruction::Trunc { def, .. }
            | Instruction::Sext { def, .. }
            | Instruction::Bitcast { def, .. }
            | Instruction::Gep { def, .. }
            | Instruction::Mov { def, .. }
            | Instruction::LandingPad { def }
            | Instruction::TypeTest { def, .. } => Some(def),
            Instruction::Call { def, .. } | Instruction::Invoke { def, .. } => def.as_ref(),
            Instruction::Store { .. }
            | Instruction::Br { .. }
            | Instruction::CondBr { .. }
            | Instruction::Ret { .. } => None,
        }
    }

    /// Blocks control may continue at after this instruction.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Instruction::Br { target } => vec![*target],
            Instruction::CondBr {
                if_true, if_false, ..
            } => vec![*if_true, *if_false],
            Instruction::Invoke {
                normal, landing, ..
            } => vec![*normal, *landing],
            _ => vec![],
        }
    }

    /// The callee of a call or protected call.
    pub fn callee(&self) -> Option<FunctionId> {
        match self {
            Instruction::Call { callee, .. } | Instruction::Invoke { callee, .. } => Some(*callee),
            _ => None,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Instruction::Br { .. } | Instruction::CondBr { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_display() {
        assert_eq!(format!("{}", BlockId::new(5)), "bb5");
        assert_eq!(BlockId::ENTRY.index(), 0);
    }

    #[test]
    fn test_byte_sizes() {
        assert_eq!(Type::Byte.byte_size(8), 1);
        assert_eq!(Type::Short.byte_size(8), 2);
        assert_eq!(Type::Int.byte_size(8), 4);
        assert_eq!(Type::Long.byte_size(8), 8);
        assert_eq!(Type::Ptr.byte_size(4), 4);
        assert_eq!(Type::KlassPtr(KlassId::new(0)).byte_size(8), 8);
    }

    #[test]
    fn test_operand_types() {
        assert_eq!(Operand::Null.ty(), Type::Ptr);
        assert_eq!(Operand::Unit.ty(), Type::Void);
        let var = Operand::from(Variable::new(Type::Long, "%0"));
        assert_eq!(var.ty(), Type::Long);
        assert_eq!(Operand::from(Constant::symbol("g")).ty(), Type::Ptr);
    }

    #[test]
    fn test_terminal_instructions() {
        let br = Instruction::Br { target: BlockId::new(1) };
        let ret = Instruction::Ret { value: Operand::Unit };
        let mov = Instruction::Mov {
            def: Variable::new(Type::Int, "x"),
            value: Constant::int(Type::Int, 1).into(),
        };
        let invoke = Instruction::Invoke {
            callee: FunctionId::new(0),
            def: None,
            args: vec![],
            normal: BlockId::new(2),
            landing: BlockId::new(3),
        };
        assert!(br.is_terminal());
        assert!(ret.is_terminal());
        assert!(invoke.is_terminal());
        assert!(!mov.is_terminal());
        assert_eq!(invoke.successors(), vec![BlockId::new(2), BlockId::new(3)]);
        assert!(!invoke.is_branch());
    }

    #[test]
    fn test_instruction_def() {
        let call = Instruction::Call {
            callee: FunctionId::new(1),
            def: None,
            args: vec![],
        };
        assert!(call.def().is_none());
        assert_eq!(call.callee(), Some(FunctionId::new(1)));

        let load = Instruction::Load {
            def: Variable::new(Type::Int, "%3"),
            address: Operand::Null,
            offset: 8,
        };
        assert_eq!(load.def().map(|v| v.name.as_str()), Some("%3"));
    }

    #[test]
    fn test_instruction_serializes_tagged() {
        let br = Instruction::Br { target: BlockId::new(4) };
        let json = serde_json::to_string(&br).unwrap();
        assert_eq!(json, r#"{"inst":"br","target":4}"#);
    }

    #[test]
    fn test_opcode_field_serializes_beside_tag() {
        let add = Instruction::Binary {
            op: BinOp::Add,
            def: Variable::new(Type::Int, "%0"),
            lhs: Constant::int(Type::Int, 1).into(),
            rhs: Constant::int(Type::Int, 2).into(),
        };
        let json = serde_json::to_value(&add).unwrap();
        assert_eq!(json["inst"], "binary");
        assert_eq!(json["op"], "add");

        let eq = Instruction::Compare {
            op: CmpOp::FcmpEq,
            def: Variable::new(Type::Boolean, "%1"),
            lhs: Operand::Null,
            rhs: Operand::Null,
        };
        let json = serde_json::to_value(&eq).unwrap();
        assert_eq!(json["inst"], "compare");
        assert_eq!(json["op"], "fcmp_eq");
    }
}
