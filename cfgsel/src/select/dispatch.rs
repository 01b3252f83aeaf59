//! Expression dispatch: one selection routine per node kind.

use crate::cfg::Operand;
use crate::diagnostics::{ErrorCode, SelectError};
use crate::hir::{Expr, ExprKind};

use super::CfgSelector;

impl<'m> CfgSelector<'m> {
    /// Lower an expression, returning the operand that holds its value.
    pub(super) fn select_expr(&mut self, expr: &Expr) -> Result<Operand, SelectError> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(self.select_const(value)),
            ExprKind::TypeOperator {
                operator,
                argument,
                type_operand,
            } => self.select_type_operator(*operator, argument, type_operand, expr.span),
            ExprKind::Call(call) => self.select_call(call, expr),
            ExprKind::DelegatingConstructorCall { callee, args } => {
                self.select_delegating_constructor_call(callee, args, expr.span)
            }
            ExprKind::InstanceInitializerCall { .. } => Ok(Operand::Unit),
            ExprKind::Block(statements) => self.select_container(statements),
            ExprKind::While {
                loop_id,
                condition,
                body,
            } => self.select_while(*loop_id, condition, body.as_deref()),
            ExprKind::DoWhile {
                loop_id,
                condition,
                body,
            } => self.select_do_while(*loop_id, condition, body.as_deref()),
            ExprKind::Break { loop_id } => self.select_break(*loop_id, expr.span),
            ExprKind::Continue { loop_id } => self.select_continue(*loop_id, expr.span),
            ExprKind::Return { target, value } => self.select_return(*target, value),
            ExprKind::When { branches } => self.select_when(branches, &expr.ty),
            ExprKind::Variable {
                local, initializer, ..
            } => self.select_variable(*local, initializer.as_deref()),
            ExprKind::SetVariable { local, name, value } => {
                self.select_set_variable(*local, name, value)
            }
            ExprKind::GetValue { local, name } => Ok(self.select_get_value(*local, name, expr.span)),
            ExprKind::Vararg { elements } => self.select_vararg(elements, &expr.ty),
            ExprKind::Throw { value } => self.select_throw(value, expr.span),
            ExprKind::Try { body, catches } => self.select_try(body, catches, &expr.ty),
            ExprKind::GetField { field, receiver } => {
                self.select_get_field(field, receiver.as_deref(), &expr.ty, expr.span)
            }
            ExprKind::SetField {
                field,
                receiver,
                value,
            } => self.select_set_field(field, receiver.as_deref(), value, expr.span),
            ExprKind::GetObjectValue { class } => Ok(self.select_object_value(*class, expr.span)),
            ExprKind::StringConcat { .. }
            | ExprKind::ClassReference { .. }
            | ExprKind::FunctionReference { .. }
            | ExprKind::EnumEntry { .. } => {
                self.soft_failure(
                    ErrorCode::UnsupportedNode,
                    format!("no selection routine for {}", expr.kind.name()),
                    expr.span,
                );
                Ok(Operand::Null)
            }
        }
    }

    /// Lower a statement sequence. Its value is the last statement's value.
    pub(super) fn select_container(&mut self, statements: &[Expr]) -> Result<Operand, SelectError> {
        let mut value = Operand::Unit;
        for statement in statements {
            value = self.select_expr(statement)?;
        }
        Ok(value)
    }
}
