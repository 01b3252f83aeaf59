//! Text rendering of CFG programs.
//!
//! The format is for humans (debug logs, `cfgsel select --emit text`) and is
//! not meant to be parsed back.
//!
//! ```text
//! fun add(a: i32, b: i32) -> i32 {
//! bb0:  ; entry
//!     %0: i32 = add a, b
//!     ret %0
//! }
//! ```

use std::fmt::{self, Write};

use super::types::{ConstValue, Constant, Instruction, Operand, TypeTestKind, Variable};
use super::{Function, FunctionId, Klass, Program};

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ConstValue::Null => write!(f, "null"),
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Int(v) => write!(f, "{}:{}", v, self.ty),
            ConstValue::Float(v) => write!(f, "{:?}:{}", v, self.ty),
            ConstValue::Char(c) => write!(f, "{:?}", c),
            ConstValue::String(s) => write!(f, "{:?}", s),
            ConstValue::Symbol(name) => write!(f, "@{}", name),
            ConstValue::Elements(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Variable(var) => write!(f, "{}", var),
            Operand::Constant(constant) => write!(f, "{}", constant),
            Operand::Null => write!(f, "null"),
            Operand::Unit => write!(f, "unit"),
        }
    }
}

fn join(operands: &[Operand]) -> String {
    operands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn callee_name(program: &Program, callee: FunctionId) -> String {
    program
        .function(callee)
        .map(|function| function.name.clone())
        .unwrap_or_else(|| callee.to_string())
}

fn write_instruction(out: &mut String, program: &Program, inst: &Instruction) -> fmt::Result {
    if let Some(def) = inst.def() {
        write!(out, "{}: {} = ", def, def.ty)?;
    }
    match inst {
        Instruction::Binary { op, lhs, rhs, .. } => write!(out, "{} {}, {}", op.as_str(), lhs, rhs),
        Instruction::Compare { op, lhs, rhs, .. } => write!(out, "{} {}, {}", op.as_str(), lhs, rhs),
        Instruction::Load { address, offset, .. } => write!(out, "load {}+{}", address, offset),
        Instruction::Store {
            value,
            address,
            offset,
        } => write!(out, "store {}, {}+{}", value, address, offset),
        Instruction::Alloc { klass, .. } => {
            let name = program.klass(*klass).map(|k| k.name.as_str()).unwrap_or("?");
            write!(out, "alloc {}", name)
        }
        Instruction::Call { callee, args, .. } => {
            write!(out, "call {}({})", callee_name(program, *callee), join(args))
        }
        Instruction::Invoke {
            callee,
            args,
            normal,
            landing,
            ..
        } => write!(
            out,
            "invoke {}({}) to {} unwind {}",
            callee_name(program, *callee),
            join(args),
            normal,
            landing
        ),
        Instruction::Cast { value, .. } => write!(out, "cast {}", value),
        Instruction::Trunc { value, .. } => write!(out, "trunc {}", value),
        Instruction::Sext { value, .. } => write!(out, "sext {}", value),
        Instruction::Bitcast { value, .. } => write!(out, "bitcast {}", value),
        Instruction::Gep { base, offset, .. } => write!(out, "gep {}, {}", base, offset),
        Instruction::Br { target } => write!(out, "br {}", target),
        Instruction::CondBr {
            cond,
            if_true,
            if_false,
        } => write!(out, "condbr {}, {}, {}", cond, if_true, if_false),
        Instruction::Ret { value } => write!(out, "ret {}", value),
        Instruction::Mov { value, .. } => write!(out, "mov {}", value),
        Instruction::LandingPad { .. } => write!(out, "landingpad"),
        Instruction::TypeTest {
            kind, value, ty, ..
        } => match kind {
            TypeTestKind::IsInstance => write!(out, "instanceof {}, {}", value, ty),
            TypeTestKind::NotInstance => write!(out, "!instanceof {}, {}", value, ty),
        },
    }
}

fn write_klass(out: &mut String, klass: &Klass) -> fmt::Result {
    write!(out, "klass {} {{", klass.name)?;
    for (i, (name, offset)) in klass.layout.fields.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        write!(out, "{}{}: +{}", sep, name, offset)?;
    }
    writeln!(out, " }} size {}", klass.layout.size)
}

fn write_function(out: &mut String, program: &Program, function: &Function) -> fmt::Result {
    let keyword = if function.is_declaration() { "declare" } else { "fun" };
    write!(out, "{} {}(", keyword, function.name)?;
    for (i, param) in function.parameters.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        write!(out, "{}: {}", param, param.ty)?;
    }
    write!(out, ") -> {}", function.return_type)?;

    if function.is_declaration() {
        return writeln!(out);
    }

    writeln!(out, " {{")?;
    for block in &function.blocks {
        writeln!(out, "{}:  ; {}", block.id, block.label)?;
        for inst in &block.instructions {
            write!(out, "    ")?;
            write_instruction(out, program, inst)?;
            writeln!(out)?;
        }
    }
    writeln!(out, "}}")
}

/// Render a whole program as text.
pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_program(&mut out, program);
    out
}

fn write_program(out: &mut String, program: &Program) -> fmt::Result {
    for klass in &program.klasses {
        write_klass(out, klass)?;
    }
    if !program.klasses.is_empty() {
        writeln!(out)?;
    }
    for (i, function) in program.functions.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write_function(out, program, function)?;
    }
    Ok(())
}

/// Render one function as text.
pub fn print_function(program: &Program, function: &Function) -> String {
    let mut out = String::new();
    let _ = write_function(&mut out, program, function);
    out
}
