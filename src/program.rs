//! A loaded program: an instruction tree plus its embedded input.

use crate::buffer::Buffer;
use crate::error::Error;
use crate::instruction::Instruction;
use crate::loader;

/// A Brainfuck program and, optionally, its input.
///
/// Source can carry input inline, separated from the code by a bang:
/// loading `",+.!sometext"` produces the code `,+.` and the input
/// `sometext`. Everything after the first `!` is input, including further
/// `!` bytes and anything that looks like code.
///
/// A program can be shared by several interpreters as long as it is not
/// modified after being handed to them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    instructions: Instruction,
    input: Buffer,
}

impl Program {
    /// Creates an empty program: a single `Nop` and no input.
    pub fn new() -> Program {
        Program {
            instructions: Instruction::new(),
            input: Buffer::new(0),
        }
    }

    /// Loads `source`, replacing the current instruction tree and input.
    ///
    /// On failure the program is left exactly as it was: no partial tree
    /// is ever installed.
    pub fn load(&mut self, source: &Buffer) -> Result<(), Error> {
        let (instructions, input) = loader::parse(source)?;

        self.instructions = instructions;
        self.input = input;

        Ok(())
    }

    /// The root of the instruction tree. Never missing: an empty program
    /// holds a single `Nop`.
    pub fn instructions(&self) -> &Instruction {
        &self.instructions
    }

    /// Installs a pre-built instruction tree, dropping the old one.
    pub fn set_instructions(&mut self, instructions: Instruction) {
        self.instructions = instructions;
    }

    /// The embedded input. Size 0 means the program carries none.
    pub fn input(&self) -> &Buffer {
        &self.input
    }

    /// Installs a pre-built input buffer, dropping the old one.
    pub fn set_input(&mut self, input: Buffer) {
        self.input = input;
    }
}
