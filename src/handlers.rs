//! Default handlers backed by the standard streams.
//!
//! These are what an [`Interpreter`] falls back to when the caller installs
//! nothing: input is read from stdin a line at a time, output bytes go to
//! stdout, and `#` dumps the tape to stderr. They follow the same contract
//! as caller-supplied handlers and can also be installed explicitly.

use std::io::{self, BufRead, Write};

use crate::buffer::Buffer;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::tape::Tape;

/// Feeds the interpreter one line of raw bytes from stdin.
///
/// At end of input on stdin the interpreter is fed an empty buffer, which
/// is how a handler signals that nothing more is coming.
pub fn read_line_from_stdin(interpreter: &mut Interpreter) -> Result<(), Error> {
    let mut line = Vec::new();
    io::stdin().lock().read_until(b'\n', &mut line)?;

    interpreter.feed(Buffer::from(line.as_slice()));
    Ok(())
}

/// Writes one byte to stdout, flushing right away so interactive programs
/// stay responsive.
pub fn write_byte_to_stdout(_interpreter: &mut Interpreter, byte: i8) -> Result<(), Error> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(&[byte as u8])?;
    stdout.flush()?;
    Ok(())
}

/// Dumps the interpreter's tape to stderr. See [`dump_tape`] for the
/// format.
pub fn dump_tape_to_stderr(interpreter: &mut Interpreter) -> Result<(), Error> {
    let mut stderr = io::stderr().lock();
    dump_tape(interpreter.tape_mut(), &mut stderr)
}

/// Writes a snapshot of every visited cell to `out`, leaving the cursor
/// where it was.
///
/// The snapshot looks like `[A 0x1 <B>]`: cells from the beginning of the
/// tape to its end, separated by spaces, the current cell wrapped in
/// `<`…`>`. Printable bytes are shown as characters, everything else in
/// hex. The cursor position is saved on the bookmark stack for the
/// duration of the walk.
pub fn dump_tape<W: Write>(tape: &mut Tape, out: &mut W) -> Result<(), Error> {
    tape.push_bookmark();

    // Walk to the beginning, remembering how far the cursor was so it can
    // be marked on the way back.
    let mut steps: isize = 0;
    while !tape.is_at_beginning() {
        tape.move_left();
        steps += 1;
    }

    let result = dump_cells(tape, steps, out);

    tape.pop_bookmark();
    result.map_err(Error::from)
}

fn dump_cells<W: Write>(tape: &mut Tape, mut steps: isize, out: &mut W) -> io::Result<()> {
    write!(out, "[")?;

    loop {
        if steps == 0 {
            write!(out, "<")?;
        }

        let value = tape.value();
        if (33..=126).contains(&value) {
            write!(out, "{}", value as u8 as char)?;
        } else {
            write!(out, "0x{:X}", value as u8)?;
        }

        if steps == 0 {
            write!(out, ">")?;
        }

        if tape.is_at_end() {
            break;
        }

        write!(out, " ")?;
        tape.move_right();
        steps -= 1;
    }

    writeln!(out, "]")
}
