//! The cli parser defined via the clap crate.

use clap::{Args, Parser, ValueEnum};

use bfkit::EndOfInputAction;

/// The clap cli interface commands.
#[derive(Parser)]
#[command(version, about, long_about = None)]
#[derive(Debug, PartialEq, Clone)]
pub enum CliCommand {
    /// Loads a program and runs it
    Run(RunArgs),
    /// Pretty-prints a program, one opcode run per line, indented by loop depth
    Indent(SourceArgs),
    /// Strips comments from a program and rewraps it at 75 columns
    Minimize(SourceArgs),
}

/// Arguments for the `run` command.
#[derive(Args)]
#[derive(Debug, PartialEq, Clone)]
pub struct RunArgs {
    /// Path to the program, or - to read it from stdin
    pub file_path: String,

    /// Executes # instructions by dumping the tape to stderr
    #[arg(long, short, default_value_t = false)]
    pub debug: bool,

    /// What a , instruction stores once input has run out
    #[arg(long, value_enum, default_value = "zero")]
    pub on_eof: OnEof,
}

/// Arguments for the commands that only need a program.
#[derive(Args)]
#[derive(Debug, PartialEq, Clone)]
pub struct SourceArgs {
    /// Path to the program, or - to read it from stdin
    pub file_path: String,
}

/// End-of-input policies selectable from the command line.
#[derive(ValueEnum)]
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum OnEof {
    /// Store a 0 in the current cell
    Zero,
    /// Store the EOF sentinel (-1) in the current cell
    Eof,
    /// Leave the current cell untouched
    Nothing,
}

impl From<OnEof> for EndOfInputAction {
    fn from(value: OnEof) -> Self {
        match value {
            OnEof::Zero => EndOfInputAction::StoreZero,
            OnEof::Eof => EndOfInputAction::StoreEof,
            OnEof::Nothing => EndOfInputAction::DoNothing,
        }
    }
}
