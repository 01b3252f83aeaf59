//! Intrinsic recognition.
//!
//! Intrinsics are callees with a hand-written lowering rule. They are matched
//! by fully qualified name; a name outside the table is a hard failure.

use crate::cfg::{CmpOp, Constant, Instruction, Operand, Type};
use crate::diagnostics::SelectError;
use crate::hir::{Call, Expr};

use super::CfgSelector;

/// The intrinsic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    /// `(a, b)`: bitwise or floating-point equality.
    AreEqualByValue,
    /// `()`: the current continuation. Coroutines are not lowered; yields unit.
    GetContinuation,
    /// `(ptr)`: view a raw pointer as a typed pointer.
    InterpretPointer,
    /// `(ptr)`: the raw value of a typed pointer.
    RawValue,
    /// `(memory, ptr)`: read a primitive of the call's type from `ptr`.
    ReadPrimitive,
    /// `(memory, ptr, value)`: write `value` to `ptr`.
    WritePrimitive,
    /// `(ptr, offset)`: pointer arithmetic.
    PtrPlusLong,
    /// `()`: the null native pointer.
    NullPtr,
    /// `()`: pointer width in bytes.
    PointerSize,
    /// `(ptr)`: pointer as an integer of the call's type.
    PtrToLong,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 10] = [
        Intrinsic::AreEqualByValue,
        Intrinsic::GetContinuation,
        Intrinsic::InterpretPointer,
        Intrinsic::RawValue,
        Intrinsic::ReadPrimitive,
        Intrinsic::WritePrimitive,
        Intrinsic::PtrPlusLong,
        Intrinsic::NullPtr,
        Intrinsic::PointerSize,
        Intrinsic::PtrToLong,
    ];

    /// Look an intrinsic up by its fully qualified name.
    pub fn from_name(name: &str) -> Option<Intrinsic> {
        Self::ALL.into_iter().find(|intrinsic| intrinsic.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::AreEqualByValue => "intrinsics.areEqualByValue",
            Intrinsic::GetContinuation => "intrinsics.getContinuation",
            Intrinsic::InterpretPointer => "intrinsics.interpretPointer",
            Intrinsic::RawValue => "intrinsics.rawValue",
            Intrinsic::ReadPrimitive => "intrinsics.readPrimitive",
            Intrinsic::WritePrimitive => "intrinsics.writePrimitive",
            Intrinsic::PtrPlusLong => "intrinsics.ptrPlusLong",
            Intrinsic::NullPtr => "intrinsics.nullPtr",
            Intrinsic::PointerSize => "intrinsics.pointerSize",
            Intrinsic::PtrToLong => "intrinsics.ptrToLong",
        }
    }

    /// Number of arguments, counting receivers. `None` accepts any count.
    pub fn arity(self) -> Option<usize> {
        match self {
            Intrinsic::GetContinuation => None,
            Intrinsic::NullPtr | Intrinsic::PointerSize => Some(0),
            Intrinsic::InterpretPointer | Intrinsic::RawValue | Intrinsic::PtrToLong => Some(1),
            Intrinsic::AreEqualByValue | Intrinsic::ReadPrimitive | Intrinsic::PtrPlusLong => {
                Some(2)
            }
            Intrinsic::WritePrimitive => Some(3),
        }
    }
}

impl<'m> CfgSelector<'m> {
    pub(super) fn select_intrinsic(&mut self, call: &Call, expr: &Expr) -> Result<Operand, SelectError> {
        let name = &call.callee.name;
        let intrinsic = Intrinsic::from_name(name).ok_or_else(|| SelectError::UnknownIntrinsic {
            name: name.clone(),
            span: expr.span,
        })?;

        let mut args = Vec::new();
        for arg in call.arguments() {
            args.push(self.select_expr(arg)?);
        }
        if let Some(expected) = intrinsic.arity() {
            if args.len() != expected {
                return Err(SelectError::IntrinsicArity {
                    name: name.clone(),
                    expected,
                    found: args.len(),
                    span: expr.span,
                });
            }
        }

        let mut args = args.into_iter();
        let mut next = || args.next().unwrap_or(Operand::Unit);

        let result = match intrinsic {
            Intrinsic::AreEqualByValue => {
                let lhs = next();
                let rhs = next();
                let op = if lhs.ty().is_floating() {
                    CmpOp::FcmpEq
                } else {
                    CmpOp::IcmpEq
                };
                let def = self.builder.fresh_variable(Type::Boolean);
                self.builder.emit(Instruction::Compare { op, def, lhs, rhs })
            }
            Intrinsic::GetContinuation => Operand::Unit,
            Intrinsic::InterpretPointer | Intrinsic::RawValue => next(),
            Intrinsic::ReadPrimitive => {
                let _memory = next();
                let raw = next();
                let ty = self.lower_type(&expr.ty);
                let pointer = self.builder.fresh_variable(Type::Ptr);
                let pointer = self.builder.emit(Instruction::Bitcast {
                    def: pointer,
                    value: raw,
                });
                let def = self.builder.fresh_variable(ty);
                self.builder.emit(Instruction::Load {
                    def,
                    address: pointer,
                    offset: 0,
                })
            }
            Intrinsic::WritePrimitive => {
                let _memory = next();
                let raw = next();
                let value = next();
                let pointer = self.builder.fresh_variable(Type::Ptr);
                let pointer = self.builder.emit(Instruction::Bitcast {
                    def: pointer,
                    value: raw,
                });
                self.builder.emit(Instruction::Store {
                    value,
                    address: pointer,
                    offset: 0,
                });
                Operand::Unit
            }
            Intrinsic::PtrPlusLong => {
                let base = next();
                let offset = next();
                let def = self.builder.fresh_variable(Type::Ptr);
                self.builder.emit(Instruction::Gep { def, base, offset })
            }
            Intrinsic::NullPtr => Operand::Constant(Constant::null_ptr()),
            Intrinsic::PointerSize => {
                Operand::Constant(Constant::int(Type::Int, i64::from(self.pointer_size())))
            }
            Intrinsic::PtrToLong => {
                let value = next();
                let ty = self.lower_type(&expr.ty);
                if value.ty() == ty {
                    value
                } else {
                    let def = self.builder.fresh_variable(ty);
                    self.builder.emit(Instruction::Sext { def, value })
                }
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup_round_trips() {
        for intrinsic in Intrinsic::ALL {
            assert_eq!(Intrinsic::from_name(intrinsic.name()), Some(intrinsic));
        }
        assert_eq!(Intrinsic::from_name("intrinsics.frobnicate"), None);
        assert_eq!(Intrinsic::from_name("areEqualByValue"), None);
    }

    #[test]
    fn test_arity() {
        assert_eq!(Intrinsic::AreEqualByValue.arity(), Some(2));
        assert_eq!(Intrinsic::WritePrimitive.arity(), Some(3));
        assert_eq!(Intrinsic::GetContinuation.arity(), None);
    }
}
