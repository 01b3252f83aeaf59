//! Exception lowering: try/catch regions and throw.
//!
//! The catch chain is built before the protected body so that its header can
//! serve as the landing block of every call inside the body:
//!
//! ```text
//! catch.header:
//!     %e: ptr = landingpad
//!     %t: i1 = instanceof %e, ptr<klassN>
//!     condbr %t, catch.body, catch.next
//! catch.body:
//!     ...; br try.exit
//! catch.next:
//!     ...                          ; last catch, taken unconditionally
//! ```

use tracing::debug;

use crate::cfg::{BlockId, Instruction, Operand, Type, TypeTestKind, Variable};
use crate::diagnostics::{ErrorCode, SelectError};
use crate::hir::{self, Catch, Expr};
use crate::span::Span;

use super::CfgSelector;

impl<'m> CfgSelector<'m> {
    pub(super) fn select_try(
        &mut self,
        body: &Expr,
        catches: &[Catch],
        ty: &hir::Type,
    ) -> Result<Operand, SelectError> {
        let result = if ty.is_unit() || ty.is_nothing() {
            None
        } else {
            let ty = self.lower_type(ty);
            Some(self.builder.fresh_variable(ty))
        };
        let exit_block = self.builder.new_block("try.exit");

        let outer_landing = self.landing;
        if !catches.is_empty() {
            let header = self.select_catches(catches, result.as_ref(), exit_block)?;
            debug!(landing = %header, "entering protected region");
            self.landing = Some(header);
        }

        let value = self.select_expr(body)?;
        self.finish_arm(value, result.as_ref(), exit_block);
        self.landing = outer_landing;

        self.builder.switch_to(exit_block);
        Ok(result.map(Operand::Variable).unwrap_or(Operand::Unit))
    }

    /// Build the catch chain and return its header block. The write cursor
    /// is restored before returning.
    fn select_catches(
        &mut self,
        catches: &[Catch],
        result: Option<&Variable>,
        exit_block: BlockId,
    ) -> Result<BlockId, SelectError> {
        let saved = self.builder.cursor();

        let header = self.builder.new_block("catch.header");
        self.builder.switch_to(header);
        let exception = self.builder.fresh_variable(Type::Ptr);
        self.builder.emit(Instruction::LandingPad {
            def: exception.clone(),
        });
        let exception = Operand::Variable(exception);
        for catch in catches {
            self.env.bind(catch.parameter, exception.clone());
        }

        for (i, catch) in catches.iter().enumerate() {
            if i + 1 < catches.len() {
                let ty = self.lower_type(&catch.ty);
                let matches = self.builder.fresh_variable(Type::Boolean);
                self.builder.emit(Instruction::TypeTest {
                    kind: TypeTestKind::IsInstance,
                    def: matches.clone(),
                    value: exception.clone(),
                    ty,
                });
                let body_block = self.builder.new_block("catch.body");
                let next_block = self.builder.new_block("catch.next");
                self.builder.emit(Instruction::CondBr {
                    cond: matches.into(),
                    if_true: body_block,
                    if_false: next_block,
                });

                self.builder.switch_to(body_block);
                let value = self.select_expr(&catch.result)?;
                self.finish_arm(value, result, exit_block);
                self.builder.switch_to(next_block);
            } else {
                let value = self.select_expr(&catch.result)?;
                self.finish_arm(value, result, exit_block);
            }
        }

        self.builder.set_cursor(saved);
        Ok(header)
    }

    /// The thrown value is evaluated; unwinding to a handler is not generated.
    pub(super) fn select_throw(&mut self, value: &Expr, span: Span) -> Result<Operand, SelectError> {
        self.select_expr(value)?;
        self.soft_failure(
            ErrorCode::ThrowPropagation,
            "exception propagation for `throw` is not generated".to_string(),
            span,
        );
        Ok(Operand::Null)
    }
}
