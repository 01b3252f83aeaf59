//! # Control-Flow Graph
//!
//! The output of instruction selection: a [`Program`] of [`Function`]s made of
//! [`Block`]s of three-address [`Instruction`]s.
//!
//! ## Ownership
//!
//! - The program owns every function and klass, addressed by
//!   [`FunctionId`] and [`KlassId`].
//! - A function owns its blocks, addressed by [`BlockId`]. Block 0 is the entry.
//! - A function with no blocks is a declaration: it is only ever a callee.
//!
//! ## Pipeline Position
//!
//! ```text
//! HIR -> [Instruction Selection] -> CFG -> Validation -> Native codegen
//! ```

pub mod display;
pub mod types;
pub mod validate;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::hir::FieldLayout;
use crate::span::Span;

pub use display::print_program;
pub use types::{
    BinOp, BlockId, CmpOp, ConstValue, Constant, Instruction, Operand, Type, TypeTestKind,
    Variable,
};
pub use validate::{validate_program, ValidationResults};

/// Handle to a function in a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FunctionId(pub u32);

impl FunctionId {
    pub const fn new(id: u32) -> Self {
        FunctionId(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// Handle to a klass in a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct KlassId(pub u32);

impl KlassId {
    pub const fn new(id: u32) -> Self {
        KlassId(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for KlassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "klass{}", self.0)
    }
}

// ============================================================================
// Klasses
// ============================================================================

/// A class as seen by the backend: a name plus its field layout.
#[derive(Debug, Clone, Serialize)]
pub struct Klass {
    pub id: KlassId,
    pub name: String,
    pub layout: FieldLayout,
}

impl Klass {
    /// Byte offset of the named field.
    pub fn field_offset(&self, name: &str) -> Option<u32> {
        self.layout.offset_of(name)
    }
}

// ============================================================================
// Blocks
// ============================================================================

/// A basic block.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub id: BlockId,
    /// What the block was created for (`entry`, `while.check`, ...).
    pub label: String,
    pub instructions: Vec<Instruction>,
}

impl Block {
    pub fn new(id: BlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            instructions: Vec::new(),
        }
    }

    /// True iff the last instruction transfers control.
    pub fn is_terminal(&self) -> bool {
        self.instructions
            .last()
            .map(Instruction::is_terminal)
            .unwrap_or(false)
    }

    /// The terminal instruction, if the block has one.
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|inst| inst.is_terminal())
    }

    /// Successor blocks.
    pub fn successors(&self) -> Vec<BlockId> {
        match self.terminator() {
            Some(term) => term.successors(),
            None => vec![],
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// A function: parameters, return type and a block arena.
#[derive(Debug, Clone, Serialize)]
pub struct Function {
    pub id: FunctionId,
    pub name: String,
    pub parameters: Vec<Variable>,
    pub return_type: Type,
    pub blocks: Vec<Block>,
    #[serde(skip)]
    pub span: Span,
    #[serde(skip)]
    next_variable: u32,
}

impl Function {
    pub fn new(id: FunctionId, name: impl Into<String>, parameters: Vec<Variable>, return_type: Type) -> Self {
        Self {
            id,
            name: name.into(),
            parameters,
            return_type,
            blocks: Vec::new(),
            span: Span::dummy(),
            next_variable: 0,
        }
    }

    /// A function with no blocks is only referenced, never defined here.
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Allocate a new block and return its ID.
    pub fn new_block(&mut self, label: &str) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(Block::new(id, label));
        id
    }

    /// Get a block by ID.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    /// Get a mutable reference to a block.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.index())
    }

    /// Create a variable with a fresh `%N` name.
    pub fn fresh_variable(&mut self, ty: Type) -> Variable {
        let name = format!("%{}", self.next_variable);
        self.next_variable += 1;
        Variable::new(ty, name)
    }

    /// All instructions, in block order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|block| block.instructions.iter())
    }

    /// Compute predecessors for all blocks.
    pub fn predecessors(&self) -> HashMap<BlockId, Vec<BlockId>> {
        let mut preds: HashMap<_, Vec<_>> = HashMap::new();
        for block in &self.blocks {
            preds.entry(block.id).or_default();
        }
        for block in &self.blocks {
            for succ in block.successors() {
                preds.entry(succ).or_default().push(block.id);
            }
        }
        preds
    }

    /// Which blocks are reachable from the entry block.
    pub fn reachable(&self) -> Vec<bool> {
        let mut visited = vec![false; self.blocks.len()];
        if self.blocks.is_empty() {
            return visited;
        }
        let mut worklist = vec![BlockId::ENTRY];
        while let Some(bb) = worklist.pop() {
            match visited.get_mut(bb.index()) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            if let Some(block) = self.block(bb) {
                worklist.extend(block.successors());
            }
        }
        visited
    }
}

// ============================================================================
// Program
// ============================================================================

/// A whole lowered program.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub functions: Vec<Function>,
    pub klasses: Vec<Klass>,
    /// Runs before program entry; holds global field initializers.
    pub global_init: FunctionId,
}

impl Program {
    /// Create a program containing only the global initializer, with its
    /// entry block open.
    pub fn new(global_init_name: &str) -> Self {
        let mut init = Function::new(FunctionId::new(0), global_init_name, Vec::new(), Type::Void);
        init.new_block("entry");
        Self {
            functions: vec![init],
            klasses: Vec::new(),
            global_init: FunctionId::new(0),
        }
    }

    /// Register a function declaration and return its handle.
    pub fn add_function(&mut self, name: impl Into<String>, parameters: Vec<Variable>, return_type: Type) -> FunctionId {
        let id = FunctionId::new(self.functions.len() as u32);
        self.functions.push(Function::new(id, name, parameters, return_type));
        id
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    pub fn function_mut(&mut self, id: FunctionId) -> Option<&mut Function> {
        self.functions.get_mut(id.index())
    }

    /// Look a function up by name; the first match wins.
    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }

    /// Register a klass and return its handle.
    pub fn add_klass(&mut self, name: impl Into<String>, layout: FieldLayout) -> KlassId {
        let id = KlassId::new(self.klasses.len() as u32);
        self.klasses.push(Klass {
            id,
            name: name.into(),
            layout,
        });
        id
    }

    pub fn klass(&self, id: KlassId) -> Option<&Klass> {
        self.klasses.get(id.index())
    }

    pub fn global_init(&self) -> &Function {
        &self.functions[self.global_init.index()]
    }
}

// ============================================================================
// Tests
// ============================================================================
