//! Per-function lowering state: variable bindings and enclosing loops.

use std::collections::HashMap;

use crate::cfg::{BlockId, Operand};
use crate::hir::{LocalId, LoopId};

/// Maps source variables to the operand currently holding their value.
///
/// Scoped to one function. A later write replaces the earlier binding.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: HashMap<LocalId, Operand>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, local: LocalId, operand: Operand) {
        self.bindings.insert(local, operand);
    }

    pub fn get(&self, local: LocalId) -> Option<&Operand> {
        self.bindings.get(&local)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Context for a loop being lowered (for break/continue).
#[derive(Debug, Clone, Copy)]
pub struct LoopContext {
    /// The loop this context belongs to.
    pub loop_id: LoopId,
    /// Block that evaluates the loop condition (target for continue).
    pub check_block: BlockId,
    /// Block after the loop (target for break).
    pub exit_block: BlockId,
}

/// The loops enclosing the current lowering position, outermost first.
#[derive(Debug, Default)]
pub struct LoopStack {
    frames: Vec<LoopContext>,
}

impl LoopStack {
    pub fn push(&mut self, frame: LoopContext) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<LoopContext> {
        self.frames.pop()
    }

    /// Find the loop with the given identity, searching innermost first.
    pub fn find(&self, loop_id: LoopId) -> Option<&LoopContext> {
        self.frames.iter().rev().find(|frame| frame.loop_id == loop_id)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{Constant, Type};

    #[test]
    fn test_last_writer_wins() {
        let mut env = Environment::new();
        let x = LocalId::new(0);
        env.bind(x, Operand::from(Constant::int(Type::Int, 1)));
        env.bind(x, Operand::from(Constant::int(Type::Int, 2)));
        assert_eq!(env.len(), 1);
        assert_eq!(env.get(x), Some(&Operand::from(Constant::int(Type::Int, 2))));
        assert_eq!(env.get(LocalId::new(1)), None);
    }

    #[test]
    fn test_loop_lookup_innermost_first() {
        let mut loops = LoopStack::default();
        let outer = LoopId::new(0);
        let inner = LoopId::new(1);
        loops.push(LoopContext {
            loop_id: outer,
            check_block: BlockId::new(1),
            exit_block: BlockId::new(3),
        });
        loops.push(LoopContext {
            loop_id: inner,
            check_block: BlockId::new(4),
            exit_block: BlockId::new(6),
        });

        assert_eq!(loops.find(outer).map(|f| f.exit_block), Some(BlockId::new(3)));
        assert_eq!(loops.find(inner).map(|f| f.exit_block), Some(BlockId::new(6)));
        assert!(loops.find(LoopId::new(9)).is_none());

        loops.pop();
        assert!(loops.find(inner).is_none());
    }
}
