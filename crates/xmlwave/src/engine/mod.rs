//! The incremental XML tokenizer.
//!
//! [`Tokenizer`] consumes raw bytes chunk by chunk and yields low-level
//! [`Token`]s. Whenever the buffered input runs out in the middle of a
//! construct it suspends, keeping every scratch accumulator and the state
//! variant it stopped in, and resumes from that exact point when more
//! bytes are fed. The session layer owns one tokenizer, pumps it after
//! every feed, and translates tokens and faults into the public event and
//! error types.
//!
//! The tokenizer checks well-formedness of whatever it consumes: tag
//! nesting via an open-element stack, the character classes of names and
//! content, and the placement rules for the XML declaration and DOCTYPE.
//! The first fault is latched and every later call reports it again.
#![allow(clippy::single_match_else)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::inline_always)]

mod buffer;
mod chars;
mod entities;

use alloc::{string::String, vec::Vec};

use self::{
    buffer::Buffer,
    chars::{is_name_char, is_name_start_char, is_xml_char, is_xml_whitespace},
};

// ---------------------------------------------------------------------------
// Tokens and faults
// ---------------------------------------------------------------------------

/// One low-level signal from the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// A start tag. Attributes are in document order with duplicates
    /// preserved; folding them into a map is the session's concern.
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// An end tag. An empty-element tag produces `StartTag` then `EndTag`.
    EndTag { name: String },
    /// One character-data fragment.
    Text(String),
    /// A processing instruction.
    Pi { target: String, data: String },
}

/// Every way the tokenizer can reject input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FaultKind {
    NoElements,
    InvalidToken,
    UnclosedToken,
    PartialChar,
    TagMismatch,
    JunkAfterDocElement,
    UndefinedEntity,
    BadCharRef,
    MisplacedXmlPi,
    Syntax,
    Finished,
}

impl FaultKind {
    /// The human-readable message for this fault.
    pub(crate) fn message(self) -> &'static str {
        match self {
            Self::NoElements => "no element found",
            Self::InvalidToken => "not well-formed (invalid token)",
            Self::UnclosedToken => "unclosed token",
            Self::PartialChar => "partial character",
            Self::TagMismatch => "mismatched tag",
            Self::JunkAfterDocElement => "junk after document element",
            Self::UndefinedEntity => "undefined entity",
            Self::BadCharRef => "reference to invalid character number",
            Self::MisplacedXmlPi => "XML or text declaration not at start of entity",
            Self::Syntax => "syntax error",
            Self::Finished => "parsing finished",
        }
    }
}

/// A fault frozen at the position where the tokenizer raised it.
///
/// Lines are 1-based and columns 0-based. Structural faults carry the
/// position of the `<` or `&` that opened the offending construct;
/// character-level faults carry the position of the character itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fault {
    pub(crate) kind: FaultKind,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

// ---------------------------------------------------------------------------
// Lexer state
// ---------------------------------------------------------------------------

/// A peeked character from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeekedChar {
    /// The buffer is empty but more input may still be fed.
    Empty,
    /// The next unconsumed character.
    Char(char),
    /// The buffer is empty and the input has been finalized.
    EndOfInput,
}

use PeekedChar::*;

/// Tokenizer state, one variant per resumption point.
///
/// A chunk boundary can interrupt any construct, so every position inside
/// a tag, reference, comment, CDATA section, DOCTYPE, or processing
/// instruction that consumes input has its own variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the root element.
    Prolog,
    /// Character data inside the root element.
    Text,
    /// After the root element closed.
    Epilog,
    /// Consumed `<`.
    Markup,
    StartTagName,
    BeforeAttribute,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValue,
    AfterAttributeValue,
    /// Consumed the `/` of `<name .../`.
    EmptyTagClose,
    /// Consumed `</`.
    EndTagOpen,
    EndTagName,
    AfterEndTagName,
    /// Consumed `&` in character data.
    Reference,
    /// Consumed `&` in an attribute value.
    AttributeReference,
    /// Consumed `<!`.
    Bang,
    /// Consumed `<!-`.
    CommentOpen,
    Comment,
    /// Consumed one `-` inside a comment.
    CommentDash,
    /// Consumed `--` inside a comment; only `>` may follow.
    CommentEnd,
    /// Matching `CDATA[`; the index is the progress through the keyword.
    CdataOpen(u8),
    Cdata,
    /// Consumed one `]` inside a CDATA section.
    CdataBracket,
    /// Consumed `]]` inside a CDATA section.
    CdataEnd,
    /// Matching `OCTYPE`; the index is the progress through the keyword.
    DoctypeOpen(u8),
    /// Skipping the DOCTYPE declaration, including its internal subset.
    Doctype,
    PiTarget,
    PiBeforeData,
    PiData,
    /// Consumed `?` inside a processing instruction.
    PiEnd,
    /// Skipping the XML declaration.
    XmlDecl,
    /// Consumed `?` inside the XML declaration.
    XmlDeclEnd,
}

const CDATA_KEYWORD: &[u8] = b"CDATA[";
const DOCTYPE_KEYWORD: &[u8] = b"OCTYPE";

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// The incremental XML tokenizer.
///
/// Feed bytes with [`feed`](Self::feed), mark the end of the document
/// with [`finish`](Self::finish), and drain signals with
/// [`next_token`](Self::next_token) after every feed. `next_token`
/// returns `None` when the buffered input is exhausted: after `finish`
/// that means the document is complete, otherwise more input is awaited.
#[derive(Debug)]
pub(crate) struct Tokenizer {
    source: Buffer,
    end_of_input: bool,
    /// The previous chunk ended in an invalid UTF-8 sequence; reported
    /// once the decoded prefix has been consumed.
    decode_failed: bool,

    /// Position of the next unconsumed character (line 1-based, column
    /// 0-based).
    line: usize,
    column: usize,
    /// Position of the `<` that opened the current markup construct.
    token_line: usize,
    token_column: usize,
    /// Position of the `&` that opened the current reference.
    ref_line: usize,
    ref_column: usize,

    state: State,

    /// Pending character data, flushed as one `Text` fragment.
    text: String,
    /// Run of trailing literal `]` characters in `text`, capped at two.
    /// The literal sequence `]]>` may not appear in character data.
    bracket_run: u8,
    /// Name scratch: element name, end-tag name, or PI target.
    name: String,
    attr_name: String,
    attr_value: String,
    /// Completed attribute pairs of the current start tag.
    attributes: Vec<(String, String)>,
    /// Reference scratch, the body between `&` and `;`.
    entity: String,
    /// PI data scratch.
    data: String,
    /// Quote character that opened the current attribute value.
    quote: char,
    /// Bracket depth inside the DOCTYPE internal subset.
    subset_depth: usize,
    /// Quote inside the DOCTYPE declaration, if one is open.
    subset_quote: Option<char>,

    /// Names of the open elements, innermost last.
    open_elements: Vec<String>,
    /// Second token of an empty-element tag.
    pending: Option<Token>,

    /// At least one character has been consumed.
    consumed_any: bool,
    /// The root element has started.
    seen_root: bool,
    /// A DOCTYPE declaration has been consumed.
    seen_doctype: bool,
    /// `<?xml ...?>` would still be the document's XML declaration.
    decl_allowed: bool,
    /// Copy of `decl_allowed` captured at the `<` of the current markup.
    decl_position: bool,

    /// First fault, latched for the rest of the session.
    failure: Option<Fault>,
}

impl Tokenizer {
    pub(crate) fn new() -> Self {
        Self {
            source: Buffer::new(),
            end_of_input: false,
            decode_failed: false,
            line: 1,
            column: 0,
            token_line: 1,
            token_column: 0,
            ref_line: 1,
            ref_column: 0,
            state: State::Prolog,
            text: String::new(),
            bracket_run: 0,
            name: String::new(),
            attr_name: String::new(),
            attr_value: String::new(),
            attributes: Vec::new(),
            entity: String::new(),
            data: String::new(),
            quote: '"',
            subset_depth: 0,
            subset_quote: None,
            open_elements: Vec::new(),
            pending: None,
            consumed_any: false,
            seen_root: false,
            seen_doctype: false,
            decl_allowed: true,
            decl_position: false,
            failure: None,
        }
    }

    /// Makes `chunk` available to the lexer.
    ///
    /// Feeding a non-empty chunk after the input was finalized latches the
    /// `parsing finished` fault; feeding after any fault is ignored.
    pub(crate) fn feed(&mut self, chunk: &[u8]) {
        if self.failure.is_some() || self.decode_failed || chunk.is_empty() {
            return;
        }
        if self.end_of_input {
            self.fail_here(FaultKind::Finished);
            return;
        }
        if self.source.push_bytes(chunk).is_err() {
            // Keep lexing the decoded prefix; the fault is raised when the
            // lexer reaches the end of it.
            self.decode_failed = true;
        }
    }

    /// Marks the end of input; no further chunks will be fed.
    pub(crate) fn finish(&mut self) {
        self.end_of_input = true;
    }

    /// Lexes until one token completes, a fault is raised, or the
    /// buffered input runs out.
    ///
    /// Returns `None` when more input is needed (or, after
    /// [`finish`](Self::finish), when the document completed cleanly).
    /// Once any call returns a fault, every later call returns the same
    /// fault.
    pub(crate) fn next_token(&mut self) -> Option<Result<Token, Fault>> {
        if let Some(fault) = self.failure {
            return Some(Err(fault));
        }
        if let Some(token) = self.pending.take() {
            return Some(Ok(token));
        }
        loop {
            let step = match self.peek_char() {
                Empty => return self.suspend(),
                EndOfInput => return self.finalize(),
                Char(c) => self.step(c),
            };
            match step {
                Ok(Some(token)) => return Some(Ok(token)),
                Ok(None) => {}
                Err(fault) => return Some(Err(fault)),
            }
        }
    }

    // -- input ------------------------------------------------------------

    #[inline(always)]
    fn peek_char(&mut self) -> PeekedChar {
        if let Some(c) = self.source.peek() {
            return Char(c);
        }
        if self.end_of_input { EndOfInput } else { Empty }
    }

    #[inline(always)]
    fn advance_char(&mut self) {
        if let Some(c) = self.source.next() {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
            self.consumed_any = true;
        }
    }

    // -- faults -----------------------------------------------------------

    /// Latches and returns the first fault; later calls return the
    /// original one unchanged.
    fn fail(&mut self, kind: FaultKind, line: usize, column: usize) -> Fault {
        *self.failure.get_or_insert(Fault { kind, line, column })
    }

    fn fail_here(&mut self, kind: FaultKind) -> Fault {
        self.fail(kind, self.line, self.column)
    }

    fn fail_at_token(&mut self, kind: FaultKind) -> Fault {
        self.fail(kind, self.token_line, self.token_column)
    }

    fn fail_at_ref(&mut self, kind: FaultKind) -> Fault {
        self.fail(kind, self.ref_line, self.ref_column)
    }

    // -- suspension and finalization --------------------------------------

    /// The buffered input ran out mid-document.
    ///
    /// Character data accumulated so far is flushed as a fragment, so
    /// events are delivered as soon as their input has been consumed
    /// rather than when the next construct begins.
    fn suspend(&mut self) -> Option<Result<Token, Fault>> {
        if let Some(fragment) = self.take_text_fragment() {
            return Some(Ok(fragment));
        }
        if self.decode_failed {
            return Some(Err(self.fail_here(FaultKind::InvalidToken)));
        }
        None
    }

    /// The buffered input ran out and no more will come.
    fn finalize(&mut self) -> Option<Result<Token, Fault>> {
        if let Some(fragment) = self.take_text_fragment() {
            return Some(Ok(fragment));
        }
        if self.decode_failed {
            return Some(Err(self.fail_here(FaultKind::InvalidToken)));
        }
        if self.source.has_partial() {
            return Some(Err(self.fail_here(FaultKind::PartialChar)));
        }
        match self.state {
            State::Epilog => None,
            State::Prolog if !self.consumed_any => None,
            State::Prolog | State::Text => {
                Some(Err(self.fail_here(FaultKind::NoElements)))
            }
            State::Reference | State::AttributeReference => {
                Some(Err(self.fail(FaultKind::UnclosedToken, self.ref_line, self.ref_column)))
            }
            _ => Some(Err(self.fail_at_token(FaultKind::UnclosedToken))),
        }
    }

    /// Flushes accumulated character data as one fragment, when the
    /// lexer is inside content. Pending CDATA brackets whose meaning is
    /// still undecided are held back in the state, not the text.
    fn take_text_fragment(&mut self) -> Option<Token> {
        let in_content = matches!(
            self.state,
            State::Text | State::Cdata | State::CdataBracket | State::CdataEnd
        );
        if in_content && !self.text.is_empty() {
            return Some(Token::Text(core::mem::take(&mut self.text)));
        }
        None
    }

    // -- construct transitions --------------------------------------------

    /// Records the `<` position and enters markup.
    fn open_markup(&mut self) {
        self.token_line = self.line;
        self.token_column = self.column;
        self.decl_position = self.decl_allowed;
        self.decl_allowed = false;
        // Markup interrupts any literal `]]` run in character data.
        self.bracket_run = 0;
        self.advance_char();
        self.state = State::Markup;
    }

    /// Records the `&` position and enters a reference.
    fn open_reference(&mut self, state: State) {
        self.ref_line = self.line;
        self.ref_column = self.column;
        self.advance_char();
        self.entity.clear();
        self.state = state;
    }

    /// The state to resume once a markup construct closes.
    fn content_state(&self) -> State {
        if self.open_elements.is_empty() {
            if self.seen_root { State::Epilog } else { State::Prolog }
        } else {
            State::Text
        }
    }

    /// Completes a start tag.
    fn open_element(&mut self) -> Token {
        let name = core::mem::take(&mut self.name);
        self.seen_root = true;
        self.open_elements.push(name.clone());
        self.state = State::Text;
        Token::StartTag {
            name,
            attributes: core::mem::take(&mut self.attributes),
        }
    }

    /// Completes an empty-element tag; the matching end tag is queued
    /// without ever touching the open-element stack.
    fn open_empty_element(&mut self) -> Token {
        let name = core::mem::take(&mut self.name);
        self.seen_root = true;
        self.pending = Some(Token::EndTag { name: name.clone() });
        self.state = self.content_state();
        Token::StartTag {
            name,
            attributes: core::mem::take(&mut self.attributes),
        }
    }

    /// Completes an end tag, which must match the innermost open element.
    fn close_element(&mut self) -> Result<Option<Token>, Fault> {
        if self.open_elements.last() != Some(&self.name) {
            return Err(self.fail_at_token(FaultKind::TagMismatch));
        }
        self.open_elements.pop();
        let name = core::mem::take(&mut self.name);
        self.state = self.content_state();
        Ok(Some(Token::EndTag { name }))
    }

    /// The PI target is complete; decide between a processing instruction
    /// and the XML declaration.
    ///
    /// Only the exact target `xml` at the very start of the document is
    /// the declaration; any case variant of the reserved name anywhere
    /// else is a fault.
    fn finish_pi_target(&mut self, at_question: bool) -> Result<Option<Token>, Fault> {
        if self.name.eq_ignore_ascii_case("xml") {
            if self.decl_position && self.name == "xml" {
                self.name.clear();
                self.state = if at_question { State::XmlDeclEnd } else { State::XmlDecl };
                return Ok(None);
            }
            return Err(self.fail_at_token(FaultKind::MisplacedXmlPi));
        }
        self.data.clear();
        self.state = if at_question { State::PiEnd } else { State::PiBeforeData };
        Ok(None)
    }

    // -- the state machine -------------------------------------------------

    /// Processes one buffered character.
    ///
    /// `Ok(Some(token))` emits, `Ok(None)` consumed or changed state, and
    /// `Err` is a fault. An arm that emits by leaving the character
    /// unconsumed (flushing text at `<`) re-processes it on the next call.
    #[allow(clippy::too_many_lines)]
    fn step(&mut self, c: char) -> Result<Option<Token>, Fault> {
        use State::*;
        match self.state {
            Prolog => match c {
                '\u{FEFF}' if !self.consumed_any => {
                    self.advance_char();
                    Ok(None)
                }
                '<' => {
                    self.open_markup();
                    Ok(None)
                }
                c if is_xml_whitespace(c) => {
                    self.decl_allowed = false;
                    self.advance_char();
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::Syntax)),
            },

            // Markup, references, and faults all flush accumulated text
            // first, without consuming the character; it is re-processed
            // on the next call with the accumulator empty.
            Text => match c {
                '<' => match self.take_text_fragment() {
                    Some(fragment) => Ok(Some(fragment)),
                    None => {
                        self.open_markup();
                        Ok(None)
                    }
                },
                '&' => match self.take_text_fragment() {
                    Some(fragment) => Ok(Some(fragment)),
                    None => {
                        self.bracket_run = 0;
                        self.open_reference(Reference);
                        Ok(None)
                    }
                },
                ']' => {
                    self.advance_char();
                    self.text.push(']');
                    self.bracket_run = (self.bracket_run + 1).min(2);
                    Ok(None)
                }
                '>' if self.bracket_run >= 2 => match self.take_text_fragment() {
                    Some(fragment) => Ok(Some(fragment)),
                    None => Err(self.fail_here(FaultKind::InvalidToken)),
                },
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.text.push(c);
                    self.bracket_run = 0;
                    Ok(None)
                }
                _ => match self.take_text_fragment() {
                    Some(fragment) => Ok(Some(fragment)),
                    None => Err(self.fail_here(FaultKind::InvalidToken)),
                },
            },

            Epilog => match c {
                '<' => {
                    self.open_markup();
                    Ok(None)
                }
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::JunkAfterDocElement)),
            },

            Markup => match c {
                '/' => {
                    if self.open_elements.is_empty() {
                        let kind = if self.seen_root {
                            FaultKind::JunkAfterDocElement
                        } else {
                            FaultKind::Syntax
                        };
                        return Err(self.fail_at_token(kind));
                    }
                    self.advance_char();
                    self.state = EndTagOpen;
                    Ok(None)
                }
                '?' => {
                    self.advance_char();
                    self.name.clear();
                    self.state = PiTarget;
                    Ok(None)
                }
                '!' => {
                    self.advance_char();
                    self.state = Bang;
                    Ok(None)
                }
                c if is_name_start_char(c) => {
                    if self.seen_root && self.open_elements.is_empty() {
                        return Err(self.fail_at_token(FaultKind::JunkAfterDocElement));
                    }
                    self.advance_char();
                    self.name.clear();
                    self.name.push(c);
                    self.state = StartTagName;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            StartTagName => match c {
                c if is_name_char(c) => {
                    self.advance_char();
                    self.name.push(c);
                    Ok(None)
                }
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    self.state = BeforeAttribute;
                    Ok(None)
                }
                '/' => {
                    self.advance_char();
                    self.state = EmptyTagClose;
                    Ok(None)
                }
                '>' => {
                    self.advance_char();
                    Ok(Some(self.open_element()))
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            BeforeAttribute => match c {
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    Ok(None)
                }
                '/' => {
                    self.advance_char();
                    self.state = EmptyTagClose;
                    Ok(None)
                }
                '>' => {
                    self.advance_char();
                    Ok(Some(self.open_element()))
                }
                c if is_name_start_char(c) => {
                    self.advance_char();
                    self.attr_name.clear();
                    self.attr_name.push(c);
                    self.state = AttributeName;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            AttributeName => match c {
                c if is_name_char(c) => {
                    self.advance_char();
                    self.attr_name.push(c);
                    Ok(None)
                }
                '=' => {
                    self.advance_char();
                    self.state = BeforeAttributeValue;
                    Ok(None)
                }
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    self.state = AfterAttributeName;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            AfterAttributeName => match c {
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    Ok(None)
                }
                '=' => {
                    self.advance_char();
                    self.state = BeforeAttributeValue;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            BeforeAttributeValue => match c {
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    Ok(None)
                }
                '"' | '\'' => {
                    self.advance_char();
                    self.quote = c;
                    self.attr_value.clear();
                    self.state = AttributeValue;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            AttributeValue => match c {
                c if c == self.quote => {
                    self.advance_char();
                    let name = core::mem::take(&mut self.attr_name);
                    let value = core::mem::take(&mut self.attr_value);
                    self.attributes.push((name, value));
                    self.state = AfterAttributeValue;
                    Ok(None)
                }
                '&' => {
                    self.open_reference(AttributeReference);
                    Ok(None)
                }
                '<' => Err(self.fail_here(FaultKind::InvalidToken)),
                // Literal whitespace normalizes to a space; whitespace
                // that arrives via a character reference does not.
                '\t' | '\n' => {
                    self.advance_char();
                    self.attr_value.push(' ');
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.attr_value.push(c);
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            AfterAttributeValue => match c {
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    self.state = BeforeAttribute;
                    Ok(None)
                }
                '/' => {
                    self.advance_char();
                    self.state = EmptyTagClose;
                    Ok(None)
                }
                '>' => {
                    self.advance_char();
                    Ok(Some(self.open_element()))
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            EmptyTagClose => match c {
                '>' => {
                    self.advance_char();
                    Ok(Some(self.open_empty_element()))
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            EndTagOpen => match c {
                c if is_name_start_char(c) => {
                    self.advance_char();
                    self.name.clear();
                    self.name.push(c);
                    self.state = EndTagName;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            EndTagName => match c {
                c if is_name_char(c) => {
                    self.advance_char();
                    self.name.push(c);
                    Ok(None)
                }
                '>' => {
                    self.advance_char();
                    self.close_element()
                }
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    self.state = AfterEndTagName;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            AfterEndTagName => match c {
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    Ok(None)
                }
                '>' => {
                    self.advance_char();
                    self.close_element()
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            Reference => self.step_reference(c, false),
            AttributeReference => self.step_reference(c, true),

            Bang => match c {
                '-' => {
                    self.advance_char();
                    self.state = CommentOpen;
                    Ok(None)
                }
                '[' => {
                    if self.open_elements.is_empty() {
                        return Err(self.fail_here(FaultKind::InvalidToken));
                    }
                    self.advance_char();
                    self.state = CdataOpen(0);
                    Ok(None)
                }
                'D' => {
                    if self.seen_root || self.seen_doctype {
                        return Err(self.fail_here(FaultKind::InvalidToken));
                    }
                    self.advance_char();
                    self.state = DoctypeOpen(0);
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            CommentOpen => match c {
                '-' => {
                    self.advance_char();
                    self.state = Comment;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            Comment => match c {
                '-' => {
                    self.advance_char();
                    self.state = CommentDash;
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            CommentDash => match c {
                '-' => {
                    self.advance_char();
                    self.state = CommentEnd;
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.state = Comment;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            // `--` may only close the comment.
            CommentEnd => match c {
                '>' => {
                    self.advance_char();
                    self.state = self.content_state();
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            CdataOpen(progress) => {
                if c == char::from(CDATA_KEYWORD[usize::from(progress)]) {
                    self.advance_char();
                    self.state = if usize::from(progress) + 1 == CDATA_KEYWORD.len() {
                        Cdata
                    } else {
                        CdataOpen(progress + 1)
                    };
                    Ok(None)
                } else {
                    Err(self.fail_here(FaultKind::InvalidToken))
                }
            }

            Cdata => match c {
                ']' => {
                    self.advance_char();
                    self.state = CdataBracket;
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.text.push(c);
                    Ok(None)
                }
                _ => match self.take_text_fragment() {
                    Some(fragment) => Ok(Some(fragment)),
                    None => Err(self.fail_here(FaultKind::InvalidToken)),
                },
            },

            CdataBracket => match c {
                ']' => {
                    self.advance_char();
                    self.state = CdataEnd;
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.text.push(']');
                    self.text.push(c);
                    self.state = Cdata;
                    Ok(None)
                }
                _ => match self.take_text_fragment() {
                    Some(fragment) => Ok(Some(fragment)),
                    None => Err(self.fail_here(FaultKind::InvalidToken)),
                },
            },

            CdataEnd => match c {
                '>' => {
                    self.advance_char();
                    self.state = self.content_state();
                    // The section's content joins the surrounding text;
                    // it was never scanned for markup.
                    Ok(self.take_text_fragment())
                }
                // A longer bracket run keeps the extras as content.
                ']' => {
                    self.advance_char();
                    self.text.push(']');
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.text.push(']');
                    self.text.push(']');
                    self.text.push(c);
                    self.state = Cdata;
                    Ok(None)
                }
                _ => match self.take_text_fragment() {
                    Some(fragment) => Ok(Some(fragment)),
                    None => Err(self.fail_here(FaultKind::InvalidToken)),
                },
            },

            DoctypeOpen(progress) => {
                if c == char::from(DOCTYPE_KEYWORD[usize::from(progress)]) {
                    self.advance_char();
                    if usize::from(progress) + 1 == DOCTYPE_KEYWORD.len() {
                        self.subset_depth = 0;
                        self.subset_quote = None;
                        self.state = Doctype;
                    } else {
                        self.state = DoctypeOpen(progress + 1);
                    }
                    Ok(None)
                } else {
                    Err(self.fail_here(FaultKind::InvalidToken))
                }
            }

            Doctype => {
                if let Some(quote) = self.subset_quote {
                    if !is_xml_char(c) {
                        return Err(self.fail_here(FaultKind::InvalidToken));
                    }
                    self.advance_char();
                    if c == quote {
                        self.subset_quote = None;
                    }
                    return Ok(None);
                }
                match c {
                    '"' | '\'' => {
                        self.advance_char();
                        self.subset_quote = Some(c);
                        Ok(None)
                    }
                    '[' => {
                        self.advance_char();
                        self.subset_depth += 1;
                        Ok(None)
                    }
                    ']' => {
                        self.advance_char();
                        self.subset_depth = self.subset_depth.saturating_sub(1);
                        Ok(None)
                    }
                    '>' if self.subset_depth == 0 => {
                        self.advance_char();
                        self.seen_doctype = true;
                        self.state = Prolog;
                        Ok(None)
                    }
                    c if is_xml_char(c) => {
                        self.advance_char();
                        Ok(None)
                    }
                    _ => Err(self.fail_here(FaultKind::InvalidToken)),
                }
            }

            PiTarget => match c {
                c if self.name.is_empty() && is_name_start_char(c) => {
                    self.advance_char();
                    self.name.push(c);
                    Ok(None)
                }
                c if !self.name.is_empty() && is_name_char(c) => {
                    self.advance_char();
                    self.name.push(c);
                    Ok(None)
                }
                c if !self.name.is_empty() && is_xml_whitespace(c) => {
                    self.advance_char();
                    self.finish_pi_target(false)
                }
                '?' if !self.name.is_empty() => {
                    self.advance_char();
                    self.finish_pi_target(true)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            PiBeforeData => match c {
                c if is_xml_whitespace(c) => {
                    self.advance_char();
                    Ok(None)
                }
                '?' => {
                    self.advance_char();
                    self.state = PiEnd;
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.data.push(c);
                    self.state = PiData;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            PiData => match c {
                '?' => {
                    self.advance_char();
                    self.state = PiEnd;
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.data.push(c);
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            PiEnd => match c {
                '>' => {
                    self.advance_char();
                    self.state = self.content_state();
                    Ok(Some(Token::Pi {
                        target: core::mem::take(&mut self.name),
                        data: core::mem::take(&mut self.data),
                    }))
                }
                '?' => {
                    self.advance_char();
                    self.data.push('?');
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.data.push('?');
                    self.data.push(c);
                    self.state = PiData;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            XmlDecl => match c {
                '?' => {
                    self.advance_char();
                    self.state = XmlDeclEnd;
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },

            XmlDeclEnd => match c {
                '>' => {
                    self.advance_char();
                    // The declaration is consumed whole and never emitted.
                    self.state = Prolog;
                    Ok(None)
                }
                '?' => {
                    self.advance_char();
                    Ok(None)
                }
                c if is_xml_char(c) => {
                    self.advance_char();
                    self.state = XmlDecl;
                    Ok(None)
                }
                _ => Err(self.fail_here(FaultKind::InvalidToken)),
            },
        }
    }

    /// Lexes one character of a reference body.
    ///
    /// The body is accumulated raw and decoded at the terminating `;`.
    /// Expansion pushes the decoded character straight into the value
    /// being built, so it can never pair with neighbors to form markup
    /// or a `]]>` terminator.
    fn step_reference(&mut self, c: char, in_attribute: bool) -> Result<Option<Token>, Fault> {
        match c {
            ';' if self.entity.is_empty() => Err(self.fail_at_ref(FaultKind::InvalidToken)),
            ';' => {
                self.advance_char();
                match entities::decode(&self.entity) {
                    Ok(decoded) => {
                        if in_attribute {
                            self.attr_value.push(decoded);
                            self.state = State::AttributeValue;
                        } else {
                            self.text.push(decoded);
                            self.state = State::Text;
                        }
                        Ok(None)
                    }
                    Err(kind) => Err(self.fail_at_ref(kind)),
                }
            }
            '#' if self.entity.is_empty() => {
                self.advance_char();
                self.entity.push('#');
                Ok(None)
            }
            c if self.entity.starts_with('#') && c.is_ascii_alphanumeric() => {
                self.advance_char();
                self.entity.push(c);
                Ok(None)
            }
            c if self.entity.is_empty() && is_name_start_char(c) => {
                self.advance_char();
                self.entity.push(c);
                Ok(None)
            }
            c if !self.entity.is_empty()
                && !self.entity.starts_with('#')
                && is_name_char(c) =>
            {
                self.advance_char();
                self.entity.push(c);
                Ok(None)
            }
            _ => Err(self.fail_at_ref(FaultKind::InvalidToken)),
        }
    }
}
