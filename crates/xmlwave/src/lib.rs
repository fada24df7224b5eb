//! A streaming, event-driven XML parser.
//!
//! Feed a document as one string or chunk by chunk from a byte stream;
//! element starts (with their attributes), element ends, character data,
//! and processing instructions are dispatched to a consumer as soon as
//! they are parsed, and malformed input surfaces a [`ParseError`] carrying
//! the line and column of the fault. No document tree is ever built, so
//! memory stays proportional to nesting depth rather than document size.
//!
//! Consume events either by implementing [`SaxHandler`] and overriding
//! the methods you need, or by registering closures on a
//! [`CallbackParser`].
#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod attrs;
mod engine;
mod error;
mod event;
mod handler;
mod session;

#[cfg(test)]
mod tests;

pub use error::{Error, ParseError};
pub use event::{Attributes, Event};
pub use handler::{DefaultHandler, SaxHandler};
pub use session::{CallbackParser, DEFAULT_CHUNK_SIZE, SaxParser};
