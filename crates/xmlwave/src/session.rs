//! Parsing sessions.
//!
//! A session owns one tokenizing engine for its whole lifetime and drives
//! a consumer with the events the engine produces. [`SaxParser`] dispatches
//! to a [`SaxHandler`] implementation; [`CallbackParser`] is the closure
//! flavor of the same session for consumers that would rather register
//! per-event callbacks than implement the trait.

use alloc::{boxed::Box, string::String};

#[cfg(feature = "std")]
use alloc::vec;

use crate::{
    attrs,
    engine::{Token, Tokenizer},
    error::ParseError,
    event::{Attributes, Event},
    handler::{self, SaxHandler},
};

#[cfg(feature = "std")]
use crate::error::Error;

/// Default read-buffer size for [`SaxParser::parse_reader`], in bytes.
///
/// One buffer of this size is allocated per reader parse and reused for
/// every chunk. Override it per call with
/// [`SaxParser::parse_reader_with_chunk_size`].
pub const DEFAULT_CHUNK_SIZE: usize = 10240;

/// A parsing session dispatching to a [`SaxHandler`].
///
/// Handler methods run synchronously during `parse` calls, each event
/// delivered as soon as its input has been consumed. The engine's state
/// persists across calls, so a session interrupted mid-document (for
/// example by an I/O error) resumes exactly where it stopped.
///
/// A session parses one document. `parse_str` finalizes it in one call;
/// `parse_reader` finalizes when the stream reports end of input. After a
/// parse fault the session is invalidated and every later call that
/// supplies input reports the first fault again.
///
/// # Examples
///
/// ```
/// use xmlwave::{DefaultHandler, SaxParser};
///
/// let mut parser = SaxParser::new(DefaultHandler);
/// assert!(parser.parse_str("<doc>ok</doc>").is_ok());
/// ```
#[derive(Debug)]
pub struct SaxParser<H> {
    engine: Tokenizer,
    handler: H,
}

impl<H: SaxHandler> SaxParser<H> {
    /// Creates a session dispatching to `handler`.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self {
            engine: Tokenizer::new(),
            handler,
        }
    }

    /// Shared access to the handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Exclusive access to the handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consumes the session and returns the handler.
    #[must_use]
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Parses `input` as the complete remainder of the document.
    ///
    /// An empty `input` feeds nothing, dispatches nothing, and leaves the
    /// session untouched. Otherwise the input is finalized: a document
    /// that is still incomplete when `input` ends is a fault.
    ///
    /// # Errors
    ///
    /// Returns the positioned [`ParseError`] of the first fault. Events
    /// for everything parsed before the fault have already been
    /// dispatched by the time it is returned.
    pub fn parse_str(&mut self, input: &str) -> Result<(), ParseError> {
        if input.is_empty() {
            return Ok(());
        }
        self.engine.feed(input.as_bytes());
        self.engine.finish();
        self.pump()
    }

    /// Parses `reader` to end of stream with [`DEFAULT_CHUNK_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for a malformed document and
    /// [`Error::Io`] when the reader fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    ///
    /// use xmlwave::{DefaultHandler, SaxParser};
    ///
    /// let mut parser = SaxParser::new(DefaultHandler);
    /// parser.parse_reader(Cursor::new("<doc><item/></doc>")).unwrap();
    /// ```
    #[cfg(feature = "std")]
    pub fn parse_reader<R: std::io::Read>(&mut self, reader: R) -> Result<(), Error> {
        self.parse_reader_with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Parses `reader`, requesting up to `chunk_size` bytes per read.
    ///
    /// Chunks need not align with character or token boundaries; the
    /// engine carries split UTF-8 sequences and half-read constructs
    /// across reads. A read of zero bytes ends the document, except that
    /// a stream exhausted on its very first read returns `Ok` without
    /// finalizing the session. Interrupted reads are retried. A
    /// `chunk_size` of zero is treated as one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for a malformed document and
    /// [`Error::Io`] when the reader fails. After an I/O error the
    /// document is not finalized; a later call continues it.
    #[cfg(feature = "std")]
    pub fn parse_reader_with_chunk_size<R: std::io::Read>(
        &mut self,
        mut reader: R,
        chunk_size: usize,
    ) -> Result<(), Error> {
        let mut buf = vec![0u8; chunk_size.max(1)];
        let mut first = true;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            };
            if n == 0 {
                if first {
                    return Ok(());
                }
                self.engine.finish();
                return self.pump().map_err(Error::Parse);
            }
            first = false;
            self.engine.feed(&buf[..n]);
            self.pump()?;
        }
    }

    /// Drains the engine, dispatching every completed event, and stops at
    /// the first fault.
    fn pump(&mut self) -> Result<(), ParseError> {
        loop {
            let token = match self.engine.next_token() {
                Some(Ok(token)) => token,
                Some(Err(fault)) => return Err(fault.into()),
                None => return Ok(()),
            };
            let event = match token {
                Token::StartTag { name, attributes } => Event::ElementStart {
                    name,
                    attributes: attrs::from_pairs(attributes),
                },
                Token::EndTag { name } => Event::ElementEnd { name },
                Token::Text(text) => Event::CharacterData { text },
                Token::Pi { target, data } => Event::ProcessingInstruction { target, data },
            };
            handler::dispatch(&mut self.handler, event);
        }
    }
}

// ---------------------------------------------------------------------------
// Callback sessions
// ---------------------------------------------------------------------------

/// Closure slots, one per event kind, each defaulting to a no-op.
struct HandlerSlots<'h> {
    element_start: Box<dyn FnMut(String, Attributes) + 'h>,
    element_end: Box<dyn FnMut(String) + 'h>,
    character_data: Box<dyn FnMut(String) + 'h>,
    processing_instruction: Box<dyn FnMut(String, String) + 'h>,
}

impl Default for HandlerSlots<'_> {
    fn default() -> Self {
        Self {
            element_start: Box::new(|_, _| {}),
            element_end: Box::new(|_| {}),
            character_data: Box::new(|_| {}),
            processing_instruction: Box::new(|_, _| {}),
        }
    }
}

impl SaxHandler for HandlerSlots<'_> {
    fn element_start(&mut self, name: String, attributes: Attributes) {
        (self.element_start)(name, attributes);
    }

    fn element_end(&mut self, name: String) {
        (self.element_end)(name);
    }

    fn character_data(&mut self, text: String) {
        (self.character_data)(text);
    }

    fn processing_instruction(&mut self, target: String, data: String) {
        (self.processing_instruction)(target, data);
    }
}

/// A parsing session with registerable per-event callbacks.
///
/// The closure flavor of [`SaxParser`]: install callbacks for the events
/// you want, before or between `parse` calls, and the rest stay no-ops.
/// Setting a callback again replaces the previous one. Callbacks may
/// borrow from the enclosing scope; the borrow ends with the parser.
///
/// # Examples
///
/// ```
/// use xmlwave::CallbackParser;
///
/// let mut lines = Vec::new();
/// let mut parser = CallbackParser::new();
/// parser.set_character_data_handler(|text| lines.push(text));
/// parser.parse_str("<poem>Crossing the Bar</poem>").unwrap();
/// drop(parser);
/// assert_eq!(lines, ["Crossing the Bar"]);
/// ```
pub struct CallbackParser<'h> {
    inner: SaxParser<HandlerSlots<'h>>,
}

impl Default for CallbackParser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> CallbackParser<'h> {
    /// Creates a session with every callback a no-op.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: SaxParser::new(HandlerSlots::default()),
        }
    }

    /// Installs the element-start callback.
    pub fn set_element_start_handler<F>(&mut self, handler: F)
    where
        F: FnMut(String, Attributes) + 'h,
    {
        self.inner.handler_mut().element_start = Box::new(handler);
    }

    /// Installs the element-end callback.
    pub fn set_element_end_handler<F>(&mut self, handler: F)
    where
        F: FnMut(String) + 'h,
    {
        self.inner.handler_mut().element_end = Box::new(handler);
    }

    /// Installs the character-data callback.
    pub fn set_character_data_handler<F>(&mut self, handler: F)
    where
        F: FnMut(String) + 'h,
    {
        self.inner.handler_mut().character_data = Box::new(handler);
    }

    /// Installs the processing-instruction callback.
    pub fn set_processing_instruction_handler<F>(&mut self, handler: F)
    where
        F: FnMut(String, String) + 'h,
    {
        self.inner.handler_mut().processing_instruction = Box::new(handler);
    }

    /// Parses `input` as the complete remainder of the document.
    ///
    /// # Errors
    ///
    /// Returns the positioned [`ParseError`] of the first fault; see
    /// [`SaxParser::parse_str`].
    pub fn parse_str(&mut self, input: &str) -> Result<(), ParseError> {
        self.inner.parse_str(input)
    }

    /// Parses `reader` to end of stream with [`DEFAULT_CHUNK_SIZE`].
    ///
    /// # Errors
    ///
    /// See [`SaxParser::parse_reader`].
    #[cfg(feature = "std")]
    pub fn parse_reader<R: std::io::Read>(&mut self, reader: R) -> Result<(), Error> {
        self.inner.parse_reader(reader)
    }

    /// Parses `reader`, requesting up to `chunk_size` bytes per read.
    ///
    /// # Errors
    ///
    /// See [`SaxParser::parse_reader_with_chunk_size`].
    #[cfg(feature = "std")]
    pub fn parse_reader_with_chunk_size<R: std::io::Read>(
        &mut self,
        reader: R,
        chunk_size: usize,
    ) -> Result<(), Error> {
        self.inner.parse_reader_with_chunk_size(reader, chunk_size)
    }
}
