//! The function/block builder and its write cursor.
//!
//! The builder owns the [`Program`] under construction and the single active
//! write position. Everything the selector emits goes through [`Builder::emit`].

use tracing::trace;

use crate::cfg::{BlockId, Function, FunctionId, Instruction, Operand, Program, Type, Variable};

/// The single (function, block) write position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub function: FunctionId,
    pub block: BlockId,
}

/// Builder for constructing CFG functions.
pub struct Builder {
    program: Program,
    cursor: Cursor,
}

impl Builder {
    /// Create a builder for a fresh program. The cursor starts at the global
    /// initializer's entry block.
    pub fn new(global_init_name: &str) -> Self {
        let program = Program::new(global_init_name);
        let cursor = Cursor {
            function: program.global_init,
            block: BlockId::ENTRY,
        };
        Self { program, cursor }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// Register a function declaration.
    pub fn new_function(&mut self, name: impl Into<String>, parameters: Vec<Variable>, return_type: Type) -> FunctionId {
        self.program.add_function(name, parameters, return_type)
    }

    /// Open the entry block of `function` and point the cursor at it.
    pub fn begin_function(&mut self, function: FunctionId) {
        let entry = self.function_mut(function).new_block("entry");
        self.cursor = Cursor { function, block: entry };
    }

    fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.program.functions[id.index()]
    }

    /// The function the cursor is in.
    pub fn current_function(&self) -> &Function {
        &self.program.functions[self.cursor.function.index()]
    }

    /// Allocate a new block in the current function. Never links control flow.
    pub fn new_block(&mut self, label: &str) -> BlockId {
        let function = self.cursor.function;
        self.function_mut(function).new_block(label)
    }

    pub fn current_block(&self) -> BlockId {
        self.cursor.block
    }

    /// Move the cursor to another block of the current function.
    pub fn switch_to(&mut self, block: BlockId) {
        self.cursor.block = block;
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Whether the current block already ends in a control transfer.
    pub fn is_terminated(&self) -> bool {
        self.current_function().blocks[self.cursor.block.index()].is_terminal()
    }

    /// Create a variable with a fresh name in the current function.
    pub fn fresh_variable(&mut self, ty: Type) -> Variable {
        let function = self.cursor.function;
        self.function_mut(function).fresh_variable(ty)
    }

    /// Append an instruction to the current block and return the operand it
    /// defines, or unit.
    ///
    /// A terminal block is never written again: if the current block is
    /// terminal, the instruction goes into a fresh unreachable block.
    pub fn emit(&mut self, inst: Instruction) -> Operand {
        if self.is_terminated() {
            let dead = self.new_block("unreachable");
            self.switch_to(dead);
        }
        let result = inst
            .def()
            .cloned()
            .map(Operand::Variable)
            .unwrap_or(Operand::Unit);
        trace!(block = %self.cursor.block, ?inst, "emit");
        let Cursor { function, block } = self.cursor;
        self.function_mut(function).blocks[block.index()].instructions.push(inst);
        result
    }

    /// Branch to `target` unless the current block is already terminal.
    pub fn jump_if_open(&mut self, target: BlockId) {
        if !self.is_terminated() {
            self.emit(Instruction::Br { target });
        }
    }

    /// Finish building and return the program.
    pub fn finish(self) -> Program {
        self.program
    }
}
