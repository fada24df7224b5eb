//! Parse faults surfaced to callers.

use alloc::string::{String, ToString};

use thiserror::Error;

use crate::engine::Fault;

/// A fatal parse fault, positioned in the input.
///
/// The message and position are copied out of the engine at the moment of
/// failure, so the value stays meaningful however long it outlives the
/// session. The session itself is invalidated by the fault: every later
/// parse call that supplies input reports this same error.
///
/// # Examples
///
/// ```
/// use xmlwave::CallbackParser;
///
/// let err = CallbackParser::new().parse_str("<a><b></a>").unwrap_err();
/// assert_eq!(err.to_string(), "mismatched tag at line 1, column 6");
/// assert_eq!(err.message(), "mismatched tag");
/// assert_eq!((err.line(), err.column()), (1, 6));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    message: String,
    line: usize,
    column: usize,
}

impl ParseError {
    /// The fault description, without position.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 1-based line of the fault.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// 0-based column of the fault.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }
}

impl From<Fault> for ParseError {
    fn from(fault: Fault) -> Self {
        Self {
            message: fault.kind.message().to_string(),
            line: fault.line,
            column: fault.column,
        }
    }
}

/// Any failure of a reader-driven parse.
#[derive(Debug, Error)]
pub enum Error {
    /// The document is not well-formed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Reading from the input stream failed. The session is left where
    /// the last chunk ended and can resume from another reader.
    #[cfg(feature = "std")]
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}
