//! cfgsel CLI
//!
//! Runs instruction selection over a serialized HIR module.
//!
//! # Usage
//!
//! ```text
//! cfgsel [OPTIONS] <COMMAND>
//!
//! Commands:
//!   select    Lower a module and print the resulting CFG
//!   validate  Lower a module and check the CFG for well-formedness
//!
//! Options:
//!   -v, --verbose  Increase verbosity (can be repeated)
//!   -q, --quiet    Suppress non-error output
//!   -h, --help     Print help information
//!   -V, --version  Print version information
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::trace;
use tracing_subscriber::EnvFilter;

use cfgsel::cfg::{print_program, validate_program, Program};
use cfgsel::diagnostics::Diagnostic;
use cfgsel::hir::Module;
use cfgsel::{select_module, SelectorConfig};

/// Instruction selection from typed HIR to a control-flow graph
#[derive(Parser)]
#[command(name = "cfgsel")]
#[command(version)]
#[command(about = "Lower typed HIR modules to a control-flow graph", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower a module and print the resulting CFG
    ///
    /// Reads a JSON-serialized HIR module, runs instruction selection,
    /// validates the result (unless disabled in the config) and prints it.
    Select(SelectArgs),

    /// Lower a module and check the CFG for well-formedness
    ///
    /// Exits with status 1 if selection fails or validation finds errors.
    Validate(FileArgs),
}

#[derive(Args)]
struct FileArgs {
    /// HIR module to process (JSON)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Configuration file (cfgsel.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct SelectArgs {
    #[command(flatten)]
    input: FileArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = Emit::Text)]
    emit: Emit,
}

/// How to print the CFG
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Human-readable listing
    Text,
    /// Pretty-printed JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Select(args) => cmd_select(args, cli.quiet),
        Commands::Validate(args) => cmd_validate(args, cli.quiet),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = match (quiet, verbose) {
        (true, _) | (false, 0) => "error",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &FileArgs) -> Result<SelectorConfig, ExitCode> {
    match &args.config {
        Some(path) => SelectorConfig::from_path(path).map_err(|e| {
            eprintln!("Error loading config '{}': {}", path.display(), e);
            ExitCode::from(1)
        }),
        None => Ok(SelectorConfig::default()),
    }
}

fn load_module(args: &FileArgs) -> Result<Module, ExitCode> {
    Module::from_path(&args.file).map_err(|e| {
        eprintln!("Error reading module '{}': {}", args.file.display(), e);
        ExitCode::from(1)
    })
}

/// Load inputs and run selection, reporting soft diagnostics.
fn run_selection(args: &FileArgs, quiet: bool) -> Result<(Program, SelectorConfig), ExitCode> {
    let config = load_config(args)?;
    let module = load_module(args)?;

    let selection = select_module(&module, &config).map_err(|err| {
        eprintln!("{}", Diagnostic::from(&err));
        ExitCode::from(1)
    })?;

    if !quiet {
        for diag in &selection.diagnostics {
            eprintln!("{}", diag);
        }
    }
    trace!(program = %print_program(&selection.program), "selected program");
    Ok((selection.program, config))
}

/// Validate and report. Returns false if there were errors.
fn report_validation(program: &Program, quiet: bool) -> bool {
    let results = validate_program(program);
    if !quiet {
        for warning in &results.warnings {
            eprintln!("{}", warning);
        }
    }
    for error in &results.errors {
        eprintln!("{}", error);
    }
    results.is_ok()
}

fn cmd_select(args: &SelectArgs, quiet: bool) -> ExitCode {
    let (program, config) = match run_selection(&args.input, quiet) {
        Ok(result) => result,
        Err(code) => return code,
    };

    if config.selection.validate && !report_validation(&program, quiet) {
        eprintln!("CFG validation failed.");
        return ExitCode::from(1);
    }

    match args.emit {
        Emit::Text => print!("{}", print_program(&program)),
        Emit::Json => match serde_json::to_string_pretty(&program) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing program: {}", e);
                return ExitCode::from(1);
            }
        },
    }
    ExitCode::SUCCESS
}

fn cmd_validate(args: &FileArgs, quiet: bool) -> ExitCode {
    let (program, _) = match run_selection(args, quiet) {
        Ok(result) => result,
        Err(code) => return code,
    };

    if !report_validation(&program, quiet) {
        eprintln!("CFG validation failed.");
        return ExitCode::from(1);
    }
    if !quiet {
        let defined = program.functions.iter().filter(|f| !f.is_declaration()).count();
        eprintln!(
            "CFG is well-formed: {} function(s) defined, {} declared only.",
            defined,
            program.functions.len() - defined
        );
    }
    ExitCode::SUCCESS
}
