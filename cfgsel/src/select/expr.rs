//! Value-producing constructs: constants, type operators, calls, fields,
//! singletons, locals and varargs.

use tracing::debug;

use crate::cfg::{
    BinOp, CmpOp, ConstValue, Constant, FunctionId, Instruction, Operand, Type, TypeTestKind,
    Variable,
};
use crate::diagnostics::{ErrorCode, SelectError};
use crate::hir::{
    self, Call, Callee, CalleeKind, DefId, Expr, FieldRef, LiteralValue, LocalId, TypeOperator,
    VarargElement,
};
use crate::span::Span;

use super::CfgSelector;

/// Binary opcode for an arithmetic operator function name.
pub fn binop_for(name: &str) -> Option<BinOp> {
    match name {
        "plus" => Some(BinOp::Add),
        "minus" => Some(BinOp::Sub),
        "times" => Some(BinOp::Mul),
        "div" => Some(BinOp::SDiv),
        "rem" | "mod" => Some(BinOp::SRem),
        _ => None,
    }
}

/// Whether an operator call works on value types only: a receiver, one
/// argument, and every operand a primitive or native pointer.
fn is_value_operator(call: &Call) -> bool {
    call.dispatch_receiver.is_some()
        && call.extension_receiver.is_none()
        && call.args.len() == 1
        && call.arguments().all(|arg| arg.ty.is_value_type())
}

impl<'m> CfgSelector<'m> {
    // ========================================================================
    // Constants
    // ========================================================================

    pub(super) fn select_const(&mut self, value: &LiteralValue) -> Operand {
        let constant = match value {
            LiteralValue::Null => return Operand::Null,
            LiteralValue::Boolean(b) => Constant::bool(*b),
            LiteralValue::Byte(v) => Constant::int(Type::Byte, i64::from(*v)),
            LiteralValue::Short(v) => Constant::int(Type::Short, i64::from(*v)),
            LiteralValue::Int(v) => Constant::int(Type::Int, i64::from(*v)),
            LiteralValue::Long(v) => Constant::int(Type::Long, *v),
            LiteralValue::Float(v) => Constant::new(Type::Float, ConstValue::Float(f64::from(*v))),
            LiteralValue::Double(v) => Constant::new(Type::Double, ConstValue::Float(*v)),
            LiteralValue::Char(c) => Constant::new(Type::Char, ConstValue::Char(*c)),
            LiteralValue::String(s) => Constant::new(Type::String, ConstValue::String(s.clone())),
        };
        Operand::Constant(constant)
    }

    // ========================================================================
    // Type operators
    // ========================================================================

    pub(super) fn select_type_operator(
        &mut self,
        operator: TypeOperator,
        argument: &Expr,
        type_operand: &hir::Type,
        span: Span,
    ) -> Result<Operand, SelectError> {
        match operator {
            TypeOperator::Cast | TypeOperator::SafeCast => {
                let value = self.select_expr(argument)?;
                let ty = self.lower_type(type_operand);
                let def = self.builder.fresh_variable(ty);
                Ok(self.builder.emit(Instruction::Cast { def, value }))
            }
            TypeOperator::ImplicitCast => self.select_expr(argument),
            TypeOperator::ImplicitNotNull => {
                self.select_expr(argument)?;
                self.soft_failure(
                    ErrorCode::UnfinishedCoercion,
                    "implicit not-null coercion is not lowered".to_string(),
                    span,
                );
                Ok(Operand::Null)
            }
            TypeOperator::CoercionToUnit => {
                self.select_expr(argument)?;
                Ok(Operand::Unit)
            }
            TypeOperator::IntegerCoercion => self.select_integer_coercion(argument, type_operand, span),
            TypeOperator::InstanceOf | TypeOperator::NotInstanceOf => {
                let value = self.select_expr(argument)?;
                let ty = self.lower_type(type_operand);
                let kind = if operator == TypeOperator::InstanceOf {
                    TypeTestKind::IsInstance
                } else {
                    TypeTestKind::NotInstance
                };
                let def = self.builder.fresh_variable(Type::Boolean);
                Ok(self.builder.emit(Instruction::TypeTest {
                    kind,
                    def,
                    value,
                    ty,
                }))
            }
        }
    }

    /// Equal widths pass through, narrower targets truncate, wider targets
    /// sign-extend. A non-integer operand is returned unchanged.
    fn select_integer_coercion(
        &mut self,
        argument: &Expr,
        type_operand: &hir::Type,
        span: Span,
    ) -> Result<Operand, SelectError> {
        if !type_operand.is_primitive_integer() {
            return Err(SelectError::NonIntegerCoercion {
                ty: type_operand.to_string(),
                span,
            });
        }
        let value = self.select_expr(argument)?;
        if !value.ty().is_integer() {
            // Unit from an unresolved read has no width to convert.
            return Ok(value);
        }
        let target = self.lower_type(type_operand);
        let pointer_size = self.pointer_size();
        let source_size = value.ty().byte_size(pointer_size);
        let target_size = target.byte_size(pointer_size);

        if source_size == target_size {
            return Ok(value);
        }
        let def = self.builder.fresh_variable(target);
        let inst = if target_size < source_size {
            Instruction::Trunc { def, value }
        } else {
            Instruction::Sext { def, value }
        };
        Ok(self.builder.emit(inst))
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Calls are recognized in priority order: intrinsic, arithmetic
    /// operator on value types, constructor, then an ordinary call.
    pub(super) fn select_call(&mut self, call: &Call, expr: &Expr) -> Result<Operand, SelectError> {
        let opcode = match call.callee.kind {
            CalleeKind::Operator if is_value_operator(call) => binop_for(&call.callee.name),
            _ => None,
        };
        match (&call.callee.kind, opcode) {
            (CalleeKind::Intrinsic, _) => self.select_intrinsic(call, expr),
            (_, Some(op)) => self.select_operator(op, call, expr),
            (CalleeKind::Constructor { class }, _) => self.select_constructor_call(call, *class),
            _ => self.select_default_call(call, &expr.ty),
        }
    }

    fn select_operator(&mut self, op: BinOp, call: &Call, expr: &Expr) -> Result<Operand, SelectError> {
        let mut operands = Vec::with_capacity(2);
        for arg in call.arguments() {
            operands.push(self.select_expr(arg)?);
        }
        let rhs = operands.pop().unwrap_or(Operand::Unit);
        let lhs = operands.pop().unwrap_or(Operand::Unit);
        let ty = self.lower_type(&expr.ty);
        let def = self.builder.fresh_variable(ty);
        Ok(self.builder.emit(Instruction::Binary { op, def, lhs, rhs }))
    }

    /// Allocate the instance, then run the initializer on it. The call's
    /// value is the allocation.
    fn select_constructor_call(&mut self, call: &Call, class: DefId) -> Result<Operand, SelectError> {
        let klass = self.klass_id(class);
        let object = self.builder.fresh_variable(Type::KlassPtr(klass));
        self.builder.emit(Instruction::Alloc {
            def: object.clone(),
            klass,
        });

        let mut args = vec![Operand::Variable(object.clone())];
        for arg in call.arguments() {
            args.push(self.select_expr(arg)?);
        }
        let callee = self.callee_for(&call.callee, &args, Type::Void);
        self.generate_call(callee, Type::Void, args);
        Ok(Operand::Variable(object))
    }

    fn select_default_call(&mut self, call: &Call, ty: &hir::Type) -> Result<Operand, SelectError> {
        let mut args = Vec::with_capacity(call.args.len() + 2);
        for arg in call.arguments() {
            args.push(self.select_expr(arg)?);
        }
        let return_type = self.lower_type(ty);
        let callee = self.callee_for(&call.callee, &args, return_type);
        Ok(self.generate_call(callee, return_type, args))
    }

    /// `super(...)` or `this(...)`: the current function's receiver is
    /// passed on to the delegated-to initializer.
    pub(super) fn select_delegating_constructor_call(
        &mut self,
        callee: &Callee,
        args: &[Expr],
        span: Span,
    ) -> Result<Operand, SelectError> {
        let receiver = self
            .builder
            .current_function()
            .parameters
            .first()
            .cloned()
            .ok_or_else(|| SelectError::MissingReceiver {
                function: self.builder.current_function().name.clone(),
                span,
            })?;

        let mut operands = vec![Operand::Variable(receiver)];
        for arg in args {
            operands.push(self.select_expr(arg)?);
        }
        let callee = self.callee_for(callee, &operands, Type::Void);
        Ok(self.generate_call(callee, Type::Void, operands))
    }

    fn callee_for(&mut self, callee: &Callee, args: &[Operand], return_type: Type) -> FunctionId {
        let arg_types: Vec<Type> = args.iter().map(Operand::ty).collect();
        self.declared_function(callee.def_id, &callee.name, &arg_types, return_type)
    }

    /// Emit a call, or a protected call when a landing block is active.
    ///
    /// A protected call ends the current block; the cursor continues in a
    /// fresh normal-continuation block.
    pub(super) fn generate_call(&mut self, callee: FunctionId, return_type: Type, args: Vec<Operand>) -> Operand {
        let def = if return_type == Type::Void {
            None
        } else {
            Some(self.builder.fresh_variable(return_type))
        };
        let result = def.clone().map(Operand::Variable).unwrap_or(Operand::Unit);

        match self.landing {
            Some(landing) => {
                let normal = self.builder.new_block("invoke.cont");
                self.builder.emit(Instruction::Invoke {
                    callee,
                    def,
                    args,
                    normal,
                    landing,
                });
                self.builder.switch_to(normal);
            }
            None => {
                self.builder.emit(Instruction::Call { callee, def, args });
            }
        }
        result
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Address and offset of a field. Instance fields need a class-typed
    /// receiver; fields without one live in a named global slot.
    fn field_address(
        &mut self,
        field: &FieldRef,
        receiver: Option<&Expr>,
        span: Span,
    ) -> Result<(Operand, u32), SelectError> {
        let Some(receiver) = receiver else {
            return Ok((Constant::symbol(field.name.clone()).into(), 0));
        };

        let class = receiver
            .ty
            .as_class()
            .ok_or_else(|| SelectError::PrimitiveReceiver {
                field: field.name.clone(),
                ty: receiver.ty.to_string(),
                span,
            })?;
        let klass = self.klass_id(class);
        let offset = self
            .builder
            .program()
            .klass(klass)
            .and_then(|klass| klass.field_offset(&field.name))
            .ok_or_else(|| SelectError::UnknownField {
                class: self.class_name(class),
                field: field.name.clone(),
                span,
            })?;

        let object = self.select_expr(receiver)?;
        Ok((object, offset))
    }

    pub(super) fn select_get_field(
        &mut self,
        field: &FieldRef,
        receiver: Option<&Expr>,
        ty: &hir::Type,
        span: Span,
    ) -> Result<Operand, SelectError> {
        let (address, offset) = self.field_address(field, receiver, span)?;
        let ty = self.lower_type(ty);
        let def = self.builder.fresh_variable(ty);
        Ok(self.builder.emit(Instruction::Load {
            def,
            address,
            offset,
        }))
    }

    pub(super) fn select_set_field(
        &mut self,
        field: &FieldRef,
        receiver: Option<&Expr>,
        value: &Expr,
        span: Span,
    ) -> Result<Operand, SelectError> {
        let (address, offset) = self.field_address(field, receiver, span)?;
        let value = self.select_expr(value)?;
        self.builder.emit(Instruction::Store {
            value,
            address,
            offset,
        });
        Ok(Operand::Unit)
    }

    // ========================================================================
    // Singletons
    // ========================================================================

    /// Load the cached singleton instance, initializing it when the cache is
    /// still null.
    pub(super) fn select_object_value(&mut self, class: DefId, span: Span) -> Operand {
        if self.class_decl(class).map_or(false, |decl| decl.is_unit_singleton) {
            return Operand::Unit;
        }

        let klass = self.klass_id(class);
        let name = self.class_name(class);
        let instance = self.builder.fresh_variable(Type::KlassPtr(klass));
        self.builder.emit(Instruction::Load {
            def: instance.clone(),
            address: Constant::symbol(format!("{}.instance", name)).into(),
            offset: 0,
        });
        let initialized = self.builder.fresh_variable(Type::Boolean);
        self.builder.emit(Instruction::Compare {
            op: CmpOp::IcmpNe,
            def: initialized.clone(),
            lhs: instance.clone().into(),
            rhs: Operand::Null,
        });

        let continue_block = self.builder.new_block("object.continue");
        let init_block = self.builder.new_block("object.init");
        self.builder.emit(Instruction::CondBr {
            cond: initialized.into(),
            if_true: continue_block,
            if_false: init_block,
        });

        self.builder.switch_to(init_block);
        self.soft_failure(
            ErrorCode::SingletonInitialization,
            format!("initialization of singleton `{}` is not generated", name),
            span,
        );
        self.builder.emit(Instruction::Br {
            target: continue_block,
        });

        self.builder.switch_to(continue_block);
        Operand::Variable(instance)
    }

    // ========================================================================
    // Locals
    // ========================================================================

    pub(super) fn select_variable(
        &mut self,
        local: LocalId,
        initializer: Option<&Expr>,
    ) -> Result<Operand, SelectError> {
        let value = match initializer {
            Some(init) => self.select_expr(init)?,
            None => Operand::Null,
        };
        self.env.bind(local, value);
        Ok(Operand::Unit)
    }

    pub(super) fn select_get_value(&mut self, local: LocalId, name: &str, span: Span) -> Operand {
        match self.env.get(local) {
            Some(operand) => operand.clone(),
            None => {
                self.soft_failure(
                    ErrorCode::UnresolvedVariable,
                    format!("read of `{}` ({}) has no binding", name, local),
                    span,
                );
                Operand::Unit
            }
        }
    }

    /// Move the new value into a slot named after the variable; later reads
    /// see the slot.
    pub(super) fn select_set_variable(
        &mut self,
        local: LocalId,
        name: &str,
        value: &Expr,
    ) -> Result<Operand, SelectError> {
        let value = self.select_expr(value)?;
        let slot = Variable::new(value.ty(), name);
        self.builder.emit(Instruction::Mov {
            def: slot.clone(),
            value,
        });
        self.env.bind(local, Operand::Variable(slot));
        Ok(Operand::Unit)
    }

    // ========================================================================
    // Varargs
    // ========================================================================

    pub(super) fn select_vararg(
        &mut self,
        elements: &[VarargElement],
        ty: &hir::Type,
    ) -> Result<Operand, SelectError> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                VarargElement::Expr(expr) => values.push(self.select_expr(expr)?),
                VarargElement::Spread(expr) => {
                    return Err(SelectError::SpreadVararg { span: expr.span })
                }
            }
        }
        debug!(elements = values.len(), "collected vararg");
        let ty = self.lower_type(ty);
        Ok(Operand::Constant(Constant::new(ty, ConstValue::Elements(values))))
    }
}
