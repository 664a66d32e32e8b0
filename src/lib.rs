//! A Brainfuck language toolkit.
//!
//! The toolkit parses source bytes into a run-length-coalesced
//! [`Instruction`] tree, and executes that tree with a tree-walking
//! [`Interpreter`] against an infinitely growing [`Tape`] of signed bytes.
//! All I/O goes through pluggable handlers, so programs can just as well
//! talk to stdin/stdout as to in-memory buffers in a test.
//!
//! ```
//! use bfkit::{Buffer, Interpreter};
//!
//! let mut interpreter = Interpreter::new();
//! interpreter.program_mut().load(&Buffer::from("++>+++[<+>-]<."))?;
//! interpreter.run()?;
//!
//! assert_eq!(interpreter.tape().value(), 5);
//! # Ok::<(), bfkit::Error>(())
//! ```
//!
//! Source can embed its own input after a `!` separator; see [`Program`].

mod buffer;
mod config;
mod error;
mod instruction;
mod interpreter;
mod loader;
mod program;
mod tape;

pub mod handlers;
pub mod render;

pub use buffer::Buffer;
pub use config::{Configuration, EndOfInputAction};
pub use error::Error;
pub use instruction::{Instruction, Opcode};
pub use interpreter::{DebugHandler, InputHandler, Interpreter, OutputHandler};
pub use program::Program;
pub use tape::Tape;

/// The end-of-input sentinel stored by the `StoreEof` policy.
///
/// Defined here rather than borrowed from the platform: it is exactly `-1`
/// as a signed byte, everywhere.
pub const EOF: i8 = -1;

/// The toolkit's version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
