//! Control-flow lowering: loops, break/continue, return and `when`.
//!
//! ```text
//! while (cond) body           do body while (cond)
//!
//!   br check                    br body
//! check:                      body:
//!   condbr cond, body, exit     ...; br check
//! body:                       check:
//!   ...; br check               condbr cond, body, exit
//! exit:                       exit:
//! ```

use tracing::debug;

use crate::cfg::{Instruction, Operand};
use crate::diagnostics::SelectError;
use crate::hir::{self, Branch, DefId, Expr, LoopId};
use crate::span::Span;

use super::env::LoopContext;
use super::CfgSelector;

impl<'m> CfgSelector<'m> {
    // ========================================================================
    // Loops
    // ========================================================================

    pub(super) fn select_while(
        &mut self,
        loop_id: LoopId,
        condition: &Expr,
        body: Option<&Expr>,
    ) -> Result<Operand, SelectError> {
        let check_block = self.builder.new_block("while.check");
        let body_block = self.builder.new_block("while.body");
        let exit_block = self.builder.new_block("while.exit");
        debug!(loop_id = %loop_id, check = %check_block, "selecting while loop");

        self.builder.emit(Instruction::Br {
            target: check_block,
        });

        self.builder.switch_to(check_block);
        let cond = self.select_expr(condition)?;
        self.builder.emit(Instruction::CondBr {
            cond,
            if_true: body_block,
            if_false: exit_block,
        });

        self.loops.push(LoopContext {
            loop_id,
            check_block,
            exit_block,
        });
        self.builder.switch_to(body_block);
        if let Some(body) = body {
            self.select_expr(body)?;
        }
        self.builder.jump_if_open(check_block);
        self.loops.pop();

        self.builder.switch_to(exit_block);
        Ok(Operand::Unit)
    }

    pub(super) fn select_do_while(
        &mut self,
        loop_id: LoopId,
        condition: &Expr,
        body: Option<&Expr>,
    ) -> Result<Operand, SelectError> {
        let check_block = self.builder.new_block("do.check");
        let body_block = self.builder.new_block("do.body");
        let exit_block = self.builder.new_block("do.exit");
        debug!(loop_id = %loop_id, body = %body_block, "selecting do-while loop");

        self.builder.emit(Instruction::Br { target: body_block });

        self.loops.push(LoopContext {
            loop_id,
            check_block,
            exit_block,
        });
        self.builder.switch_to(body_block);
        if let Some(body) = body {
            self.select_expr(body)?;
        }
        self.builder.jump_if_open(check_block);

        self.builder.switch_to(check_block);
        let cond = self.select_expr(condition)?;
        self.builder.emit(Instruction::CondBr {
            cond,
            if_true: body_block,
            if_false: exit_block,
        });
        self.loops.pop();

        self.builder.switch_to(exit_block);
        Ok(Operand::Unit)
    }

    pub(super) fn select_break(&mut self, loop_id: LoopId, span: Span) -> Result<Operand, SelectError> {
        let frame = self.loops.find(loop_id).copied().ok_or(SelectError::LoopNotFound {
            keyword: "break",
            span,
        })?;
        self.builder.emit(Instruction::Br {
            target: frame.exit_block,
        });
        Ok(Operand::Unit)
    }

    pub(super) fn select_continue(&mut self, loop_id: LoopId, span: Span) -> Result<Operand, SelectError> {
        let frame = self.loops.find(loop_id).copied().ok_or(SelectError::LoopNotFound {
            keyword: "continue",
            span,
        })?;
        self.builder.emit(Instruction::Br {
            target: frame.check_block,
        });
        Ok(Operand::Unit)
    }

    // ========================================================================
    // Return
    // ========================================================================

    pub(super) fn select_return(&mut self, target: DefId, value: &Expr) -> Result<Operand, SelectError> {
        let value = self.select_expr(value)?;
        self.builder.emit(Instruction::Ret {
            value: value.clone(),
        });
        if self.returns_unit(target) {
            Ok(Operand::Unit)
        } else {
            Ok(value)
        }
    }

    // ========================================================================
    // When
    // ========================================================================

    /// Arms are tested in source order. A literal `true` guard makes its arm
    /// unconditional; arms after it are never reached and are not lowered.
    /// A conditional last arm falls through to the exit on `false`.
    pub(super) fn select_when(&mut self, branches: &[Branch], ty: &hir::Type) -> Result<Operand, SelectError> {
        let result = if ty.is_unit() || ty.is_nothing() {
            None
        } else {
            let ty = self.lower_type(ty);
            Some(self.builder.fresh_variable(ty))
        };
        let exit_block = self.builder.new_block("when.exit");

        for (i, branch) in branches.iter().enumerate() {
            if branch.condition.is_true_literal() {
                let value = self.select_expr(&branch.result)?;
                self.finish_arm(value, result.as_ref(), exit_block);
                break;
            }

            let cond = self.select_expr(&branch.condition)?;
            let arm_block = self.builder.new_block("when.arm");
            let next_block = if i + 1 == branches.len() {
                exit_block
            } else {
                self.builder.new_block("when.next")
            };
            self.builder.emit(Instruction::CondBr {
                cond,
                if_true: arm_block,
                if_false: next_block,
            });

            self.builder.switch_to(arm_block);
            let value = self.select_expr(&branch.result)?;
            self.finish_arm(value, result.as_ref(), exit_block);

            self.builder.switch_to(next_block);
        }

        // An empty `when` falls straight through.
        if self.builder.current_block() != exit_block {
            self.builder.jump_if_open(exit_block);
        }
        self.builder.switch_to(exit_block);
        Ok(result.map(Operand::Variable).unwrap_or(Operand::Unit))
    }
}
