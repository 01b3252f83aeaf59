//! CFG validation pass.
//!
//! Checks lowered functions for well-formedness before they are handed to
//! native code generation, so malformed graphs are reported against the
//! function that produced them.

use std::collections::HashSet;

use crate::diagnostics::{Diagnostic, ErrorCode};
use crate::cfg::{BlockId, Function, Instruction, Program};

/// Results from CFG validation.
#[derive(Debug, Default)]
pub struct ValidationResults {
    /// Findings that make the graph unusable for code generation.
    pub errors: Vec<Diagnostic>,
    /// Findings about dead code that code generation can drop.
    pub warnings: Vec<Diagnostic>,
}

impl ValidationResults {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate every defined function of a program.
///
/// Callers should emit warnings but only reject the program on errors.
pub fn validate_program(program: &Program) -> ValidationResults {
    let mut results = ValidationResults::default();
    for function in &program.functions {
        if !function.is_declaration() {
            validate_function(program, function, &mut results);
        }
    }
    results
}

/// Validate a single function.
pub fn validate_function(program: &Program, function: &Function, results: &mut ValidationResults) {
    let num_blocks = function.blocks.len();
    let reachable = function.reachable();

    // Blocks that some protected call unwinds to.
    let mut landing_blocks = HashSet::new();

    for block in &function.blocks {
        // Check 1: a terminal instruction may only appear last
        let body_len = block.instructions.len().saturating_sub(1);
        if let Some(pos) = block.instructions[..body_len].iter().position(Instruction::is_terminal) {
            results.errors.push(
                Diagnostic::error(
                    format!(
                        "function `{}`: {} has an instruction after its terminator (position {})",
                        function.name, block.id, pos
                    ),
                    function.span,
                )
                .with_code(ErrorCode::InstructionAfterTerminal),
            );
        }

        // Check 2: reachable blocks are terminated
        if !block.is_terminal() {
            if reachable[block.id.index()] {
                results.errors.push(
                    Diagnostic::error(
                        format!(
                            "function `{}`: reachable block {} ({}) has no terminator",
                            function.name, block.id, block.label
                        ),
                        function.span,
                    )
                    .with_code(ErrorCode::UnterminatedBlock),
                );
            } else {
                results.warnings.push(
                    Diagnostic::warning(
                        format!(
                            "function `{}`: block {} ({}) is unreachable and unterminated",
                            function.name, block.id, block.label
                        ),
                        function.span,
                    )
                    .with_code(ErrorCode::UnreachableBlock),
                );
            }
        }

        // Check 3: branch targets and callees exist
        for inst in &block.instructions {
            for target in inst.successors() {
                if target.index() >= num_blocks {
                    results.errors.push(
                        Diagnostic::error(
                            format!(
                                "function `{}`: {} references non-existent block {} \
                                 (function has {} blocks)",
                                function.name, block.id, target, num_blocks
                            ),
                            function.span,
                        )
                        .with_code(ErrorCode::DanglingBlockReference),
                    );
                }
            }
            if let Some(callee) = inst.callee() {
                if program.function(callee).is_none() {
                    results.errors.push(Diagnostic::error(
                        format!(
                            "function `{}`: {} calls non-existent function {}",
                            function.name, block.id, callee
                        ),
                        function.span,
                    ));
                }
            }
            if let Instruction::Invoke { landing, .. } = inst {
                landing_blocks.insert(*landing);
            }
        }
    }

    // Check 4: landing blocks begin with a landing-pad entry
    let mut landing_blocks: Vec<BlockId> = landing_blocks.into_iter().collect();
    landing_blocks.sort();
    for landing in landing_blocks {
        let Some(block) = function.block(landing) else {
            continue;
        };
        if !matches!(block.instructions.first(), Some(Instruction::LandingPad { .. })) {
            results.errors.push(
                Diagnostic::error(
                    format!(
                        "function `{}`: landing block {} does not start with a landing pad",
                        function.name, landing
                    ),
                    function.span,
                )
                .with_code(ErrorCode::MissingLandingPad),
            );
        }
    }
}
