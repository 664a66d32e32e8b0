//! Error values shared by the whole toolkit.

use thiserror::Error;

/// An error produced while loading or running a program.
///
/// The set of kinds is closed: the loader only ever reports
/// [`UnbalancedBrackets`](Error::UnbalancedBrackets), the interpreter
/// surfaces handler failures as [`Io`](Error::Io) (or whatever error the
/// handler itself returned), and [`InputOutOfRange`](Error::InputOutOfRange)
/// is reserved for callers that layer an encoding check on top of the
/// byte-oriented core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An input, output or debug handler failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A loop was closed before being opened, or never closed at all.
    #[error("unbalanced brackets")]
    UnbalancedBrackets,

    /// An input byte fell outside the accepted range.
    ///
    /// The core never produces this on its own; it exists so callers that
    /// validate their input don't need a second error type.
    #[error("input out of range")]
    InputOutOfRange,
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}
