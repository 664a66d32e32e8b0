use std::fs::File;
use std::io::{self, Read};
use std::process::ExitCode;
use std::sync::OnceLock;

use clap::Parser;
use colored::Colorize;
use either::Either;
use regex::bytes::Regex;

use bfkit::{Buffer, Interpreter, Program};

mod clap_cli;
use clap_cli::{CliCommand, RunArgs, SourceArgs};

fn main() -> ExitCode {
    match CliCommand::parse() {
        CliCommand::Run(args) => run(args),
        CliCommand::Indent(args) => render(args, bfkit::render::indent),
        CliCommand::Minimize(args) => render(args, bfkit::render::minimize),
    }
}

fn run(args: RunArgs) -> ExitCode {
    let source = match read_source(&args.file_path) {
        Ok(source) => source,
        Err(error) => return report(&args.file_path, &error),
    };

    let mut interpreter = Interpreter::new();
    if let Err(error) = interpreter.program_mut().load(&source) {
        return report("Load error", &error);
    }

    interpreter.configuration_mut().set_debug_enabled(args.debug);
    interpreter
        .configuration_mut()
        .set_end_of_input_action(args.on_eof.into());

    if let Err(error) = interpreter.run() {
        return report("Runtime error", &error);
    }

    ExitCode::SUCCESS
}

fn render(args: SourceArgs, renderer: fn(&Program) -> String) -> ExitCode {
    let source = match read_source(&args.file_path) {
        Ok(source) => source,
        Err(error) => return report(&args.file_path, &error),
    };

    let mut program = Program::new();
    if let Err(error) = program.load(&source) {
        return report("Load error", &error);
    }

    print!("{}", renderer(&program));
    ExitCode::SUCCESS
}

/// Slurps a program from a file, or from stdin when `path` is `-`.
fn read_source(path: &str) -> io::Result<Buffer> {
    let mut reader = match path {
        "-" => Either::Left(io::stdin()),
        path => Either::Right(File::open(path)?),
    };

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    Ok(Buffer::from(strip_shebang(&bytes)))
}

/// Skips a leading `#!…` line so executable scripts load cleanly. The
/// loader itself treats `#` as a debug instruction, so the stripping has
/// to happen before the bytes reach it.
fn strip_shebang(bytes: &[u8]) -> &[u8] {
    static SHEBANG: OnceLock<Regex> = OnceLock::new();
    let shebang = SHEBANG.get_or_init(|| Regex::new(r"\A#![^\n]*\n?").unwrap());

    match shebang.find(bytes) {
        Some(line) => &bytes[line.end()..],
        None => bytes,
    }
}

fn report(prefix: &str, error: &dyn std::error::Error) -> ExitCode {
    let banner = format!("{prefix}:");
    eprintln!("{} {error}", banner.as_str().red().bold());
    ExitCode::FAILURE
}
