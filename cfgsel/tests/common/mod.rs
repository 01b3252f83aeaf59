//! Shared builders for the selection integration tests.
//!
//! Each integration test file is its own crate, so not every helper is used
//! everywhere.

#![allow(dead_code)]

use cfgsel::cfg::{BlockId, Function, FunctionId, Instruction, Program};
use cfgsel::hir::{
    Body, Branch, Call, Callee, ClassDecl, DefId, Declaration, Expr, ExprKind, FieldLayout,
    FunctionDecl, LiteralValue, LocalId, Module, Origin, Param, Type,
};
use cfgsel::{select_module, SelectError, Selection, SelectorConfig};

// ============================================================================
// Expressions
// ============================================================================

pub fn int(value: i32) -> Expr {
    Expr::new(ExprKind::Literal(LiteralValue::Int(value)), Type::Int)
}

pub fn boolean(value: bool) -> Expr {
    Expr::new(ExprKind::Literal(LiteralValue::Boolean(value)), Type::Boolean)
}

pub fn get(local: u32, name: &str, ty: Type) -> Expr {
    Expr::new(
        ExprKind::GetValue {
            local: LocalId::new(local),
            name: name.into(),
        },
        ty,
    )
}

/// An ordinary call to a function identified by `def_id`.
pub fn call(def_id: u32, name: &str, args: Vec<Expr>, ty: Type) -> Expr {
    Expr::new(
        ExprKind::Call(Call {
            callee: Callee::function(DefId::new(def_id), name),
            dispatch_receiver: None,
            extension_receiver: None,
            args,
        }),
        ty,
    )
}

/// `lhs.name(rhs)` through an operator function.
pub fn operator(name: &str, lhs: Expr, rhs: Expr, ty: Type) -> Expr {
    Expr::new(
        ExprKind::Call(Call {
            callee: Callee::operator(DefId::new(900), name),
            dispatch_receiver: Some(Box::new(lhs)),
            extension_receiver: None,
            args: vec![rhs],
        }),
        ty,
    )
}

pub fn intrinsic(name: &str, args: Vec<Expr>, ty: Type) -> Expr {
    Expr::new(
        ExprKind::Call(Call {
            callee: Callee::intrinsic(DefId::new(800), name),
            dispatch_receiver: None,
            extension_receiver: None,
            args,
        }),
        ty,
    )
}

pub fn branch(condition: Expr, result: Expr) -> Branch {
    Branch { condition, result }
}

pub fn when(branches: Vec<Branch>, ty: Type) -> Expr {
    Expr::new(ExprKind::When { branches }, ty)
}

pub fn block(statements: Vec<Expr>, ty: Type) -> Expr {
    Expr::new(ExprKind::Block(statements), ty)
}

// ============================================================================
// Declarations
// ============================================================================

pub fn param(local: u32, name: &str, ty: Type) -> Param {
    Param::new(LocalId::new(local), name, ty)
}

pub fn function(def_id: u32, name: &str, params: Vec<Param>, return_type: Type, body: Body) -> Declaration {
    Declaration::Function(FunctionDecl {
        def_id: DefId::new(def_id),
        name: name.into(),
        params,
        return_type,
        body: Some(body),
        origin: Origin::Defined,
        is_constructor: false,
        constructed_class: None,
        span: Default::default(),
    })
}

/// A unit function `name` whose block body is `statements`.
pub fn procedure(def_id: u32, name: &str, params: Vec<Param>, statements: Vec<Expr>) -> Declaration {
    function(def_id, name, params, Type::Unit, Body::Block(statements))
}

pub fn class(def_id: u32, name: &str, layout: FieldLayout, members: Vec<Declaration>) -> Declaration {
    Declaration::Class(ClassDecl {
        def_id: DefId::new(def_id),
        name: name.into(),
        layout,
        is_unit_singleton: false,
        members,
        span: Default::default(),
    })
}

// ============================================================================
// Running selection
// ============================================================================

pub fn try_select_with(declarations: Vec<Declaration>, config: &SelectorConfig) -> Result<Selection, SelectError> {
    select_module(&Module::new("test", declarations), config)
}

pub fn try_select(declarations: Vec<Declaration>) -> Result<Selection, SelectError> {
    try_select_with(declarations, &SelectorConfig::default())
}

/// Select a module that is expected to lower without a hard failure.
pub fn select(declarations: Vec<Declaration>) -> Selection {
    match try_select(declarations) {
        Ok(selection) => selection,
        Err(err) => panic!("selection failed: {}", err),
    }
}

pub fn find<'p>(program: &'p Program, name: &str) -> &'p Function {
    program
        .function_by_name(name)
        .unwrap_or_else(|| panic!("no function named `{}`", name))
}

pub fn function_id(program: &Program, name: &str) -> FunctionId {
    find(program, name).id
}

/// Instructions of block `index` of `function`.
pub fn insts(function: &Function, index: u32) -> &[Instruction] {
    &function.blocks[index as usize].instructions
}

/// The block whose instructions contain a call (plain or protected) to `callee`.
pub fn block_calling(function: &Function, callee: FunctionId) -> BlockId {
    function
        .blocks
        .iter()
        .find(|block| block.instructions.iter().any(|inst| inst.callee() == Some(callee)))
        .map(|block| block.id)
        .unwrap_or_else(|| panic!("no call to {} in `{}`", callee, function.name))
}

/// The call or invoke instruction targeting `callee`.
pub fn call_to(function: &Function, callee: FunctionId) -> &Instruction {
    function
        .instructions()
        .find(|inst| inst.callee() == Some(callee))
        .unwrap_or_else(|| panic!("no call to {} in `{}`", callee, function.name))
}

/// Assert that every selected program in a test validates cleanly.
pub fn assert_valid(program: &Program) {
    let results = cfgsel::cfg::validate_program(program);
    assert!(
        results.is_ok(),
        "validation errors: {:?}\n{}",
        results.errors,
        cfgsel::cfg::print_program(program)
    );
}
