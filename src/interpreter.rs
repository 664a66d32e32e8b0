//! The tree-walking execution engine.
//!
//! An [`Interpreter`] ties together a [`Configuration`], a [`Program`] and
//! a [`Tape`], and mediates every side effect through three pluggable
//! handlers: input for `,`, output for `.`, debug for `#`. When a handler
//! is not installed the matching stdin/stdout/stderr default from
//! [`handlers`](crate::handlers) is used.
//!
//! Once set up, an interpreter can run its program as many times as
//! needed. Each run starts fresh with respect to the input cursor and the
//! loop stack, but the tape is deliberately *not* re-initialized between
//! runs; callers that want a pristine tape install a new one.

use std::mem;

use crate::buffer::Buffer;
use crate::config::{Configuration, EndOfInputAction};
use crate::error::Error;
use crate::handlers;
use crate::instruction::{Instruction, Opcode};
use crate::program::Program;
use crate::tape::Tape;
use crate::EOF;

/// Called when the program needs input. The handler is expected to call
/// [`Interpreter::feed`] with whatever it obtained; not feeding at all is
/// tolerated and treated as end of input.
pub type InputHandler = Box<dyn FnMut(&mut Interpreter) -> Result<(), Error>>;

/// Called with the current cell's value when the program prints.
pub type OutputHandler = Box<dyn FnMut(&mut Interpreter, i8) -> Result<(), Error>>;

/// Called when the program hits a `#` and debugging is enabled. The
/// default implementation dumps the whole tape, using the bookmark stack
/// to restore the cursor afterwards.
pub type DebugHandler = Box<dyn FnMut(&mut Interpreter) -> Result<(), Error>>;

/// Executes a [`Program`] against a [`Tape`].
pub struct Interpreter {
    configuration: Configuration,
    program: Program,
    tape: Tape,

    input_handler: Option<InputHandler>,
    output_handler: Option<OutputHandler>,
    debug_handler: Option<DebugHandler>,

    /// Input currently being consumed by `,` instructions.
    input: Buffer,
    input_offset: usize,
    /// True when the program shipped embedded input; the input handler is
    /// then never consulted, and exhausting the buffer is final.
    had_input: bool,
    end_reached: bool,
}

impl Interpreter {
    /// Creates an interpreter with a default configuration, an empty
    /// program, a fresh tape and no handlers installed.
    pub fn new() -> Interpreter {
        Interpreter {
            configuration: Configuration::new(),
            program: Program::new(),
            tape: Tape::new(),
            input_handler: None,
            output_handler: None,
            debug_handler: None,
            input: Buffer::new(0),
            input_offset: 0,
            had_input: false,
            end_reached: false,
        }
    }

    /// Runs the loaded program to completion.
    ///
    /// Returns the first error a handler reported, or
    /// [`Error::UnbalancedBrackets`] if a hand-built instruction tree
    /// enters or leaves a loop it shouldn't. Writes performed before a
    /// failure stay on the tape.
    pub fn run(&mut self) -> Result<(), Error> {
        // The tree is walked by reference, so the program is parked
        // outside of self for the duration of the run; handlers see an
        // empty program if they go looking.
        let program = mem::take(&mut self.program);

        self.input = program.input().clone();
        self.input_offset = 0;
        self.had_input = self.input.size() > 0;
        self.end_reached = false;

        let result = self.execute(program.instructions());

        self.program = program;
        result
    }

    fn execute(&mut self, root: &Instruction) -> Result<(), Error> {
        let mut current = Some(root);
        let mut stack: Vec<&Instruction> = Vec::new();

        while let Some(instruction) = current {
            match instruction.opcode() {
                Opcode::Nop => {}

                Opcode::MoveLeft => self.tape.move_left_by(instruction.quantity()),
                Opcode::MoveRight => self.tape.move_right_by(instruction.quantity()),
                Opcode::Increase => self.tape.increase_by(instruction.quantity()),
                Opcode::Decrease => self.tape.decrease_by(instruction.quantity()),

                Opcode::LoopBegin => {
                    // Enter the body only while the current cell is not
                    // zero; otherwise fall through to the instruction
                    // after the loop.
                    if self.tape.value() != 0 {
                        stack.push(instruction);
                        current = instruction.loop_body();
                        continue;
                    }
                }

                Opcode::LoopEnd => {
                    // The popped LoopBegin re-checks its condition.
                    match stack.pop() {
                        Some(begin) => {
                            current = Some(begin);
                            continue;
                        }
                        None => return Err(Error::UnbalancedBrackets),
                    }
                }

                Opcode::Read => {
                    // Every unit of quantity consumes input, but only the
                    // last byte lands on the tape: earlier ones would be
                    // overwritten anyway.
                    let mut byte = EOF;
                    for _ in 0..instruction.quantity() {
                        byte = self.read_byte()?;
                    }

                    if byte == EOF {
                        match self.configuration.end_of_input_action() {
                            EndOfInputAction::StoreZero => self.tape.set_value(0),
                            EndOfInputAction::StoreEof => self.tape.set_value(EOF),
                            EndOfInputAction::DoNothing => {}
                        }
                    } else {
                        self.tape.set_value(byte);
                    }
                }

                Opcode::Print => {
                    // Stop at the first failure, even if more repetitions
                    // were requested.
                    for _ in 0..instruction.quantity() {
                        let byte = self.tape.value();
                        self.write_output(byte)?;
                    }
                }

                Opcode::Debug => {
                    if self.configuration.debug_enabled() {
                        for _ in 0..instruction.quantity() {
                            self.request_debug()?;
                        }
                    }
                }
            }

            current = instruction.next();
        }

        // Instructions left on the stack mean a loop was never closed.
        if !stack.is_empty() {
            return Err(Error::UnbalancedBrackets);
        }

        Ok(())
    }

    /// Retrieves one byte of input, or [`EOF`] once input is exhausted.
    ///
    /// Embedded input is consumed first and is final: once it runs out the
    /// input handler is never consulted. Without embedded input, running
    /// dry asks the handler for more; a handler that feeds nothing (or an
    /// empty buffer) marks the end of input for good.
    fn read_byte(&mut self) -> Result<i8, Error> {
        if self.end_reached {
            return Ok(EOF);
        }

        if self.input_offset < self.input.size() {
            let byte = self.input.get(self.input_offset);
            self.input_offset += 1;
            return Ok(byte);
        }

        if self.had_input {
            self.end_reached = true;
            return Ok(EOF);
        }

        self.request_input()?;

        if self.input_offset < self.input.size() {
            let byte = self.input.get(self.input_offset);
            self.input_offset += 1;
            Ok(byte)
        } else {
            self.end_reached = true;
            Ok(EOF)
        }
    }

    /// Replaces the interpreter's input with `input` and rewinds the
    /// cursor. Meant to be called by input handlers; feeding an empty
    /// buffer signals that no more input is available this round.
    pub fn feed(&mut self, input: Buffer) {
        self.input = input;
        self.input_offset = 0;
        self.end_reached = false;
    }

    // The handler slot is vacated while the handler runs so it can borrow
    // the interpreter mutably; if the handler installed a replacement in
    // the meantime, the replacement wins.

    fn request_input(&mut self) -> Result<(), Error> {
        match self.input_handler.take() {
            Some(mut handler) => {
                let result = handler(self);
                if self.input_handler.is_none() {
                    self.input_handler = Some(handler);
                }
                result
            }
            None => handlers::read_line_from_stdin(self),
        }
    }

    fn write_output(&mut self, byte: i8) -> Result<(), Error> {
        match self.output_handler.take() {
            Some(mut handler) => {
                let result = handler(self, byte);
                if self.output_handler.is_none() {
                    self.output_handler = Some(handler);
                }
                result
            }
            None => handlers::write_byte_to_stdout(self, byte),
        }
    }

    fn request_debug(&mut self) -> Result<(), Error> {
        match self.debug_handler.take() {
            Some(mut handler) => {
                let result = handler(self);
                if self.debug_handler.is_none() {
                    self.debug_handler = Some(handler);
                }
                result
            }
            None => handlers::dump_tape_to_stderr(self),
        }
    }

    /// Installs the handler consulted when the program needs input.
    pub fn set_input_handler(
        &mut self,
        handler: impl FnMut(&mut Interpreter) -> Result<(), Error> + 'static,
    ) {
        self.input_handler = Some(Box::new(handler));
    }

    /// Installs the handler receiving the program's output.
    pub fn set_output_handler(
        &mut self,
        handler: impl FnMut(&mut Interpreter, i8) -> Result<(), Error> + 'static,
    ) {
        self.output_handler = Some(Box::new(handler));
    }

    /// Installs the handler invoked by `#` instructions.
    pub fn set_debug_handler(
        &mut self,
        handler: impl FnMut(&mut Interpreter) -> Result<(), Error> + 'static,
    ) {
        self.debug_handler = Some(Box::new(handler));
    }

    /// The interpreter's configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Mutable access to the configuration. Must not be used to change it
    /// while a run is in progress.
    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    /// Replaces the configuration.
    pub fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = configuration;
    }

    /// The program this interpreter runs.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Mutable access to the program, typically to `load` into it.
    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// Replaces the program.
    pub fn set_program(&mut self, program: Program) {
        self.program = program;
    }

    /// The memory tape.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Mutable access to the tape. The default debug handler uses this to
    /// walk the tape; the bookmark stack lets it restore the cursor.
    pub fn tape_mut(&mut self) -> &mut Tape {
        &mut self.tape
    }

    /// Replaces the tape, e.g. to start the next run from a clean slate.
    pub fn set_tape(&mut self, tape: Tape) {
        self.tape = tape;
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// An interpreter with `source` loaded and its output captured into
    /// the returned shared buffer.
    fn buffered(source: &str) -> (Interpreter, Rc<RefCell<Vec<u8>>>) {
        let mut interpreter = Interpreter::new();
        interpreter
            .program_mut()
            .load(&Buffer::from(source))
            .unwrap();

        let output = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&output);
        interpreter.set_output_handler(move |_, byte| {
            sink.borrow_mut().push(byte as u8);
            Ok(())
        });

        (interpreter, output)
    }

    #[test]
    fn empty_program_succeeds_and_leaves_the_tape_alone() {
        let mut interpreter = Interpreter::new();
        interpreter.program_mut().load(&Buffer::from("")).unwrap();

        interpreter.run().unwrap();

        assert_eq!(interpreter.tape().value(), 0);
        assert!(interpreter.tape().is_at_beginning());
        assert!(interpreter.tape().is_at_end());
    }

    #[test]
    fn embedded_input_echo() {
        let (mut interpreter, output) = buffered(",.!A");

        interpreter.run().unwrap();

        assert_eq!(*output.borrow(), b"A");
    }

    #[test]
    fn nested_loop_arithmetic() {
        let (mut interpreter, output) = buffered("+++[>++<-]>.");

        interpreter.run().unwrap();

        assert_eq!(*output.borrow(), b"\x06");
        assert_eq!(interpreter.tape().value(), 6);
        interpreter.tape_mut().move_left();
        assert_eq!(interpreter.tape().value(), 0);
    }

    #[test]
    fn coalesced_run_executes_fully() {
        let mut interpreter = Interpreter::new();
        interpreter
            .program_mut()
            .load(&Buffer::from("+++++"))
            .unwrap();

        interpreter.run().unwrap();

        assert_eq!(interpreter.tape().value(), 5);
    }

    #[test]
    fn skipped_loop_is_never_entered() {
        // The cell is zero, so the loop body (which would print) is dead.
        let (mut interpreter, output) = buffered("[.]");

        interpreter.run().unwrap();

        assert!(output.borrow().is_empty());
    }

    #[test]
    fn end_of_input_policies() {
        for (action, expected) in [
            (EndOfInputAction::StoreZero, 0),
            (EndOfInputAction::StoreEof, EOF),
            (EndOfInputAction::DoNothing, 9),
        ] {
            let mut interpreter = Interpreter::new();
            interpreter.program_mut().load(&Buffer::from(",")).unwrap();
            interpreter
                .configuration_mut()
                .set_end_of_input_action(action);

            // A 9 left on the tape shows whether the cell was touched.
            interpreter.tape_mut().set_value(9);

            // Input handler that never feeds.
            interpreter.set_input_handler(|_| Ok(()));

            interpreter.run().unwrap();
            assert_eq!(interpreter.tape().value(), expected, "{action:?}");
        }
    }

    #[test]
    fn debug_respects_the_configuration() {
        let calls = Rc::new(RefCell::new(0));

        let mut interpreter = Interpreter::new();
        interpreter.program_mut().load(&Buffer::from("#")).unwrap();

        let counter = Rc::clone(&calls);
        interpreter.set_debug_handler(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        interpreter.run().unwrap();
        assert_eq!(*calls.borrow(), 0);

        interpreter.configuration_mut().set_debug_enabled(true);
        interpreter.run().unwrap();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn handlers_interleave_in_source_order() {
        let output = Rc::new(RefCell::new(Vec::new()));

        let mut interpreter = Interpreter::new();
        interpreter
            .program_mut()
            .load(&Buffer::from(",.,#."))
            .unwrap();
        interpreter.configuration_mut().set_debug_enabled(true);

        interpreter.set_input_handler(|interpreter| {
            interpreter.feed(Buffer::from("whatever"));
            Ok(())
        });

        let sink = Rc::clone(&output);
        interpreter.set_output_handler(move |_, byte| {
            sink.borrow_mut().push(byte as u8);
            Ok(())
        });

        let sink = Rc::clone(&output);
        interpreter.set_debug_handler(move |_| {
            sink.borrow_mut().push(b'0');
            Ok(())
        });

        interpreter.run().unwrap();

        // Reads 'w', prints it, reads 'h', debugs, prints 'h'.
        assert_eq!(*output.borrow(), b"w0h");
    }

    #[test]
    fn handler_feed_is_consumed_across_reads() {
        let feeds = Rc::new(RefCell::new(0));

        let mut interpreter = Interpreter::new();
        interpreter
            .program_mut()
            .load(&Buffer::from(",>,"))
            .unwrap();

        let counter = Rc::clone(&feeds);
        interpreter.set_input_handler(move |interpreter| {
            *counter.borrow_mut() += 1;
            interpreter.feed(Buffer::from("xy"));
            Ok(())
        });

        interpreter.run().unwrap();

        // One feed covered both reads.
        assert_eq!(*feeds.borrow(), 1);
        assert_eq!(interpreter.tape().value(), b'y' as i8);
        interpreter.tape_mut().move_left();
        assert_eq!(interpreter.tape().value(), b'x' as i8);
    }

    #[test]
    fn multi_quantity_read_keeps_the_last_byte() {
        let mut interpreter = Interpreter::new();
        interpreter
            .program_mut()
            .load(&Buffer::from(",,!AB"))
            .unwrap();

        interpreter.run().unwrap();

        assert_eq!(interpreter.tape().value(), b'B' as i8);
    }

    #[test]
    fn exhausted_embedded_input_never_calls_the_handler() {
        let calls = Rc::new(RefCell::new(0));

        let mut interpreter = Interpreter::new();
        interpreter
            .program_mut()
            .load(&Buffer::from(",,!A"))
            .unwrap();
        interpreter
            .configuration_mut()
            .set_end_of_input_action(EndOfInputAction::StoreEof);

        let counter = Rc::clone(&calls);
        interpreter.set_input_handler(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        interpreter.run().unwrap();

        assert_eq!(*calls.borrow(), 0);
        assert_eq!(interpreter.tape().value(), EOF);
    }

    #[test]
    fn feeding_an_empty_buffer_ends_input() {
        let mut interpreter = Interpreter::new();
        interpreter.program_mut().load(&Buffer::from(",")).unwrap();
        interpreter
            .configuration_mut()
            .set_end_of_input_action(EndOfInputAction::StoreEof);

        interpreter.set_input_handler(|interpreter| {
            interpreter.feed(Buffer::new(0));
            Ok(())
        });

        interpreter.run().unwrap();

        assert_eq!(interpreter.tape().value(), EOF);
    }

    #[test]
    fn handler_errors_abort_the_run() {
        let (mut interpreter, _) = buffered("+.");
        interpreter.set_output_handler(|_, _| Err(Error::Io("sink is closed".into())));

        assert_eq!(
            interpreter.run().unwrap_err(),
            Error::Io("sink is closed".into())
        );
        // The increase before the failing print stays on the tape.
        assert_eq!(interpreter.tape().value(), 1);
    }

    #[test]
    fn failing_input_handler_propagates() {
        let mut interpreter = Interpreter::new();
        interpreter.program_mut().load(&Buffer::from(",")).unwrap();
        interpreter.set_input_handler(|_| Err(Error::Io("tty gone".into())));

        assert_eq!(
            interpreter.run().unwrap_err(),
            Error::Io("tty gone".into())
        );
    }

    #[test]
    fn multi_quantity_print_stops_at_the_first_failure() {
        let attempts = Rc::new(RefCell::new(0));

        let mut interpreter = Interpreter::new();
        interpreter
            .program_mut()
            .load(&Buffer::from("+....."))
            .unwrap();

        let counter = Rc::clone(&attempts);
        interpreter.set_output_handler(move |_, _| {
            *counter.borrow_mut() += 1;
            if *counter.borrow() == 2 {
                Err(Error::Io("broken pipe".into()))
            } else {
                Ok(())
            }
        });

        assert!(interpreter.run().is_err());
        assert_eq!(*attempts.borrow(), 2);
    }

    #[test]
    fn runtime_unbalanced_brackets_are_caught() {
        // Hand-built [+++ : the loop body never closes.
        let mut begin = Instruction::new();
        begin.set_opcode(Opcode::LoopBegin);

        let mut body = Instruction::new();
        body.set_opcode(Opcode::Increase);
        body.set_quantity(3);
        begin.set_loop_body(Some(body));

        let mut interpreter = Interpreter::new();
        interpreter.program_mut().set_instructions(begin);
        interpreter.tape_mut().set_value(42);

        assert_eq!(interpreter.run().unwrap_err(), Error::UnbalancedBrackets);

        // And a bare ] : leaving a loop that was never entered.
        let mut end = Instruction::new();
        end.set_opcode(Opcode::LoopEnd);

        let mut interpreter = Interpreter::new();
        interpreter.program_mut().set_instructions(end);

        assert_eq!(interpreter.run().unwrap_err(), Error::UnbalancedBrackets);
    }

    #[test]
    fn reruns_replay_embedded_input() {
        let (mut interpreter, output) = buffered(",.!A");

        interpreter.run().unwrap();
        interpreter.run().unwrap();

        assert_eq!(*output.borrow(), b"AA");
    }

    #[test]
    fn the_tape_carries_over_between_runs() {
        let mut interpreter = Interpreter::new();
        interpreter.program_mut().load(&Buffer::from("+")).unwrap();

        interpreter.run().unwrap();
        interpreter.run().unwrap();

        assert_eq!(interpreter.tape().value(), 2);
    }
}
