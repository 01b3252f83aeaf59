//! # Instruction Selection
//!
//! This module lowers the HIR of a whole module into a CFG [`Program`].
//!
//! ## Selection Process
//!
//! The selector walks the tree once, in declaration order:
//! - Classes register a [`Klass`](crate::cfg::Klass) and recurse into members
//! - Functions get an entry block, a fresh environment and their body lowered
//! - Global field initializers are appended to the global initializer function
//!
//! Expressions return the [`Operand`] holding their value and emit
//! instructions at the builder's write cursor as a side effect.
//!
//! ## Example Lowering
//!
//! ```text
//! // HIR
//! fun f(a: Int, b: Int) = if (a == b) a else b
//!
//! // CFG
//! fun f(a: i32, b: i32) -> i32 {
//! bb0:  ; entry
//!     %1: i1 = call equals(a, b)
//!     condbr %1, bb2, bb3
//! bb1:  ; when.exit
//!     ret %0
//! bb2:  ; when.arm
//!     %0: i32 = mov a
//!     br bb1
//! bb3:  ; when.next
//!     %0: i32 = mov b
//!     br bb1
//! }
//! ```

mod builder;
mod control;
mod dispatch;
mod env;
mod exception;
mod expr;
mod intrinsics;

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::cfg::{
    BlockId, Constant, FunctionId, Instruction, KlassId, Operand, Program, Type, Variable,
};
use crate::config::SelectorConfig;
use crate::diagnostics::{Diagnostic, ErrorCode, SelectError};
use crate::hir::{
    self, Body, ClassDecl, DefId, Declaration, FieldDecl, FieldLayout, FunctionDecl, Module,
    Origin,
};
use crate::span::Span;

pub use builder::{Builder, Cursor};
pub use env::{Environment, LoopContext, LoopStack};
pub use intrinsics::Intrinsic;

/// The result of selecting a module.
#[derive(Debug)]
pub struct Selection {
    pub program: Program,
    /// Best-effort warnings: constructs whose lowering is incomplete.
    pub diagnostics: Vec<Diagnostic>,
}

/// Lower a whole module to a CFG program.
///
/// Hard failures abort the pass; soft failures are collected in
/// [`Selection::diagnostics`].
pub fn select_module(module: &Module, config: &SelectorConfig) -> Result<Selection, SelectError> {
    CfgSelector::new(module, config).run(module)
}

// ============================================================================
// Selector
// ============================================================================

/// Lowers HIR to CFG.
pub struct CfgSelector<'m> {
    /// Every declaration of the module, including class members.
    decls: HashMap<DefId, &'m Declaration>,
    config: &'m SelectorConfig,
    builder: Builder,
    functions: HashMap<DefId, FunctionId>,
    klasses: HashMap<DefId, KlassId>,
    /// Bindings of the function being lowered.
    env: Environment,
    loops: LoopStack,
    /// Unwind target for calls; set inside try bodies.
    landing: Option<BlockId>,
    /// The function being lowered.
    current: Option<&'m FunctionDecl>,
    /// Where the next global initializer is appended.
    global_cursor: Cursor,
    diagnostics: Vec<Diagnostic>,
}

impl<'m> CfgSelector<'m> {
    pub fn new(module: &'m Module, config: &'m SelectorConfig) -> Self {
        let builder = Builder::new(&config.selection.global_init_name);
        let global_cursor = builder.cursor();
        Self {
            decls: module.index(),
            config,
            builder,
            functions: HashMap::new(),
            klasses: HashMap::new(),
            env: Environment::new(),
            loops: LoopStack::default(),
            landing: None,
            current: None,
            global_cursor,
            diagnostics: Vec::new(),
        }
    }

    /// Lower every declaration, then close the global initializer.
    pub fn run(mut self, module: &'m Module) -> Result<Selection, SelectError> {
        info!(module = %module.name, declarations = module.declarations.len(), "selecting module");

        for decl in &module.declarations {
            self.visit_declaration(decl)?;
        }
        self.finish_global_init();

        let program = self.builder.finish();
        info!(
            functions = program.functions.len(),
            klasses = program.klasses.len(),
            warnings = self.diagnostics.len(),
            "selection complete"
        );
        Ok(Selection {
            program,
            diagnostics: self.diagnostics,
        })
    }

    fn visit_declaration(&mut self, decl: &'m Declaration) -> Result<(), SelectError> {
        match decl {
            Declaration::Class(class) => self.visit_class(class),
            Declaration::Function(function) => self.select_function(function),
            Declaration::Field(field) => self.visit_field(field),
        }
    }

    fn visit_class(&mut self, class: &'m ClassDecl) -> Result<(), SelectError> {
        self.klass_id(class.def_id);
        for member in &class.members {
            self.visit_declaration(member)?;
        }
        Ok(())
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn select_function(&mut self, decl: &'m FunctionDecl) -> Result<(), SelectError> {
        if decl.origin == Origin::FakeOverride {
            debug!(function = %decl.name, "skipping fake override");
            return Ok(());
        }

        let id = self.declared_function(decl.def_id, &decl.name, &[], Type::Void);
        let Some(body) = &decl.body else {
            return Ok(());
        };

        debug!(function = %decl.name, id = %id, "selecting function");
        self.builder.begin_function(id);
        if let Some(function) = self.builder.program_mut().function_mut(id) {
            function.span = decl.span;
        }

        self.env = Environment::new();
        self.loops = LoopStack::default();
        self.landing = None;
        self.current = Some(decl);

        let parameters = self.builder.current_function().parameters.clone();
        for (param, var) in decl.params.iter().zip(parameters) {
            self.env.bind(param.local, Operand::Variable(var));
        }

        let value = match body {
            Body::Expression(expr) => self.select_expr(expr)?,
            Body::Block(statements) => {
                for statement in statements {
                    self.select_expr(statement)?;
                }
                Operand::Unit
            }
            Body::Synthetic => {
                return Err(SelectError::UnsupportedBody {
                    function: decl.name.clone(),
                    span: decl.span,
                })
            }
        };

        if !self.builder.is_terminated() {
            let value = if decl.returns_unit() || decl.return_type.is_nothing() {
                Operand::Unit
            } else {
                value
            };
            self.builder.emit(Instruction::Ret { value });
        }

        self.current = None;
        Ok(())
    }

    /// The function registered for `def_id`, declaring it on first use.
    ///
    /// Functions of this module get their declared signature. Anything else
    /// is declared from what the call site knows: `name`, the argument types
    /// and the result type.
    fn declared_function(
        &mut self,
        def_id: DefId,
        name: &str,
        arg_types: &[Type],
        return_type: Type,
    ) -> FunctionId {
        if let Some(&id) = self.functions.get(&def_id) {
            return id;
        }

        let decl = match self.decls.get(&def_id).copied() {
            Some(Declaration::Function(function)) => Some(function),
            _ => None,
        };
        let id = match decl {
            Some(function) => {
                let name = self.function_name(function);
                let parameters = function
                    .params
                    .iter()
                    .map(|param| Variable::new(self.lower_type(&param.ty), param.name.clone()))
                    .collect();
                let return_type = self.lower_type(&function.return_type);
                self.builder.new_function(name, parameters, return_type)
            }
            None => {
                let parameters = arg_types
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| Variable::new(*ty, format!("p{}", i)))
                    .collect();
                self.builder.new_function(name, parameters, return_type)
            }
        };
        self.functions.insert(def_id, id);
        id
    }

    fn function_name(&self, function: &FunctionDecl) -> String {
        match function.constructed_class {
            Some(class) => format!("{}.<init>", self.class_name(class)),
            None => function.name.clone(),
        }
    }

    /// Whether the function `target` returns unit. Falls back to the
    /// function being lowered when `target` is not part of this module.
    fn returns_unit(&self, target: DefId) -> bool {
        match self.decls.get(&target).copied() {
            Some(Declaration::Function(function)) => function.returns_unit(),
            _ => self.current.map(FunctionDecl::returns_unit).unwrap_or(true),
        }
    }

    // ========================================================================
    // Classes and types
    // ========================================================================

    /// The klass registered for `def_id`, registering it on first use.
    fn klass_id(&mut self, def_id: DefId) -> KlassId {
        if let Some(&id) = self.klasses.get(&def_id) {
            return id;
        }
        let (name, layout) = match self.decls.get(&def_id).copied() {
            Some(Declaration::Class(class)) => (class.name.clone(), class.layout.clone()),
            _ => (def_id.to_string(), FieldLayout::default()),
        };
        debug!(class = %name, "registering klass");
        let id = self.builder.program_mut().add_klass(name, layout);
        self.klasses.insert(def_id, id);
        id
    }

    fn class_decl(&self, def_id: DefId) -> Option<&'m ClassDecl> {
        match self.decls.get(&def_id).copied() {
            Some(Declaration::Class(class)) => Some(class),
            _ => None,
        }
    }

    fn class_name(&self, def_id: DefId) -> String {
        self.class_decl(def_id)
            .map(|class| class.name.clone())
            .unwrap_or_else(|| def_id.to_string())
    }

    /// Map a source type onto the CFG type lattice.
    fn lower_type(&mut self, ty: &hir::Type) -> Type {
        match ty {
            hir::Type::Unit | hir::Type::Nothing => Type::Void,
            hir::Type::Boolean => Type::Boolean,
            hir::Type::Byte => Type::Byte,
            hir::Type::Short => Type::Short,
            hir::Type::Int => Type::Int,
            hir::Type::Long => Type::Long,
            hir::Type::Float => Type::Float,
            hir::Type::Double => Type::Double,
            hir::Type::Char => Type::Char,
            hir::Type::String => Type::String,
            hir::Type::NativePtr | hir::Type::Array(_) => Type::Ptr,
            hir::Type::Class(def_id) => Type::KlassPtr(self.klass_id(*def_id)),
        }
    }

    // ========================================================================
    // Global initializer
    // ========================================================================

    /// Append a top-level field's initializer to the global initializer.
    fn visit_field(&mut self, field: &'m FieldDecl) -> Result<(), SelectError> {
        let Some(initializer) = &field.initializer else {
            return Ok(());
        };
        if field.containing_class.is_some() {
            // Instance fields are initialized by their class's constructor.
            return Ok(());
        }

        debug!(field = %field.name, "selecting global initializer");
        let saved_cursor = self.builder.cursor();
        let saved_env = std::mem::take(&mut self.env);
        let saved_landing = self.landing.take();
        let saved_current = self.current.take();
        self.builder.set_cursor(self.global_cursor);

        let value = self.select_expr(initializer)?;
        self.builder.emit(Instruction::Store {
            value,
            address: Constant::symbol(field.name.clone()).into(),
            offset: 0,
        });

        self.global_cursor = self.builder.cursor();
        self.builder.set_cursor(saved_cursor);
        self.env = saved_env;
        self.landing = saved_landing;
        self.current = saved_current;
        Ok(())
    }

    fn finish_global_init(&mut self) {
        self.builder.set_cursor(self.global_cursor);
        if !self.builder.is_terminated() {
            self.builder.emit(Instruction::Ret { value: Operand::Unit });
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Record a best-effort failure and keep going.
    fn soft_failure(&mut self, code: ErrorCode, message: String, span: Span) {
        warn!(code = %code, span = %span, "{}", message);
        self.diagnostics
            .push(Diagnostic::warning(message, span).with_code(code));
    }

    /// If the current block is still open, move `value` into `result` (when
    /// there is one) and branch to `exit`.
    fn finish_arm(&mut self, value: Operand, result: Option<&Variable>, exit: BlockId) {
        if self.builder.is_terminated() {
            return;
        }
        if let Some(result) = result {
            self.builder.emit(Instruction::Mov {
                def: result.clone(),
                value,
            });
        }
        self.builder.emit(Instruction::Br { target: exit });
    }

    fn pointer_size(&self) -> u32 {
        self.config.pointer_size()
    }
}
