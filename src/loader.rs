//! Turns raw source bytes into an instruction tree.
//!
//! Loading happens in two passes. A pre-pass walks the code section once
//! and rejects unbalanced brackets, so the structural pass below never has
//! to back out of a half-built tree. The structural pass then consumes the
//! bytes, coalescing runs of identical simple opcodes into single
//! instructions and recursing once per `[` to build loop bodies.
//!
//! Only the nine opcode bytes and the `!` separator mean anything; every
//! other byte is a comment. The bytes after the first `!` are not code:
//! they are copied verbatim into the residual input buffer.

use crate::buffer::Buffer;
use crate::error::Error;
use crate::instruction::{Instruction, Opcode};

/// Separates a program's code from its embedded input.
const BANG: u8 = b'!';

/// Parses `source` into an instruction tree and the residual input that
/// followed the first `!`, if any.
pub(crate) fn parse(source: &Buffer) -> Result<(Instruction, Buffer), Error> {
    check_balance(source.as_slice())?;

    let mut parser = Parser {
        bytes: source.as_slice(),
        position: 0,
        input_start: None,
    };

    let instructions = chain(parser.parse_region());

    let input = match parser.input_start {
        Some(start) => Buffer::from(&parser.bytes[start..]),
        None => Buffer::new(0),
    };

    Ok((instructions, input))
}

/// Rejects programs whose brackets don't pair up. The scan stops at the
/// first `!`: brackets in the input section are just input.
fn check_balance(bytes: &[i8]) -> Result<(), Error> {
    let mut open = 0i64;

    for byte in bytes {
        match *byte as u8 {
            BANG => break,
            b'[' => open += 1,
            b']' => {
                open -= 1;
                // A loop closed before being opened.
                if open < 0 {
                    return Err(Error::UnbalancedBrackets);
                }
            }
            _ => {}
        }
    }

    if open != 0 {
        return Err(Error::UnbalancedBrackets);
    }

    Ok(())
}

struct Parser<'a> {
    bytes: &'a [i8],
    position: usize,
    /// Offset of the first residual input byte, set when `!` is found.
    input_start: Option<usize>,
}

impl Parser<'_> {
    /// Parses one region: the top level of the program, or the body of a
    /// loop. Returns when the bytes run out, when `!` starts the input
    /// section, or right after emitting the `LoopEnd` that closes the
    /// region.
    fn parse_region(&mut self) -> Vec<Instruction> {
        let mut nodes = Vec::new();

        while self.position < self.bytes.len() {
            let byte = self.bytes[self.position] as u8;

            if byte == BANG {
                self.position += 1;
                self.input_start = Some(self.position);
                break;
            }

            let opcode = match Opcode::from_symbol(byte) {
                Some(opcode) => opcode,
                None => {
                    // Comment byte.
                    self.position += 1;
                    continue;
                }
            };

            match opcode {
                Opcode::LoopBegin => {
                    self.position += 1;

                    let body = self.parse_region();

                    let mut node = Instruction::new();
                    node.set_opcode(Opcode::LoopBegin);
                    node.set_loop_body(Some(chain(body)));
                    nodes.push(node);

                    // A bang inside the body pre-empts the whole parse.
                    if self.input_start.is_some() {
                        break;
                    }
                }
                Opcode::LoopEnd => {
                    self.position += 1;

                    let mut node = Instruction::new();
                    node.set_opcode(Opcode::LoopEnd);
                    nodes.push(node);

                    return nodes;
                }
                _ => {
                    // Coalesce the whole run of identical opcodes into a
                    // single instruction.
                    let start = self.position;
                    while self.position < self.bytes.len()
                        && self.bytes[self.position] as u8 == byte
                    {
                        self.position += 1;
                    }

                    let mut node = Instruction::new();
                    node.set_opcode(opcode);
                    node.set_quantity(self.position - start);
                    nodes.push(node);
                }
            }
        }

        nodes
    }
}

/// Links a region's instructions into a chain. An empty region becomes a
/// single `Nop`, so a tree root is never missing.
fn chain(nodes: Vec<Instruction>) -> Instruction {
    let mut chained: Option<Instruction> = None;

    for mut node in nodes.into_iter().rev() {
        node.set_next(chained.take());
        chained = Some(node);
    }

    chained.unwrap_or_else(Instruction::new)
}
