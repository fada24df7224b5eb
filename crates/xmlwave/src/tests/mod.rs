//! Test suites and shared helpers.

mod callbacks;
mod property_roundtrip;
mod snapshot_events;

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use crate::{Attributes, Event, ParseError, SaxHandler, SaxParser};

/// Records every dispatched event in order.
#[derive(Debug, Default)]
pub(crate) struct RecordingHandler {
    pub(crate) events: Vec<Event>,
}

impl SaxHandler for RecordingHandler {
    fn element_start(&mut self, name: String, attributes: Attributes) {
        self.events.push(Event::ElementStart { name, attributes });
    }

    fn element_end(&mut self, name: String) {
        self.events.push(Event::ElementEnd { name });
    }

    fn character_data(&mut self, text: String) {
        self.events.push(Event::CharacterData { text });
    }

    fn processing_instruction(&mut self, target: String, data: String) {
        self.events.push(Event::ProcessingInstruction { target, data });
    }
}

/// Parses `input` in one call and returns the dispatched events.
pub(crate) fn events_ok(input: &str) -> Vec<Event> {
    let mut parser = SaxParser::new(RecordingHandler::default());
    parser.parse_str(input).unwrap();
    parser.into_handler().events
}

/// Parses malformed `input` and returns the events dispatched before the
/// fault alongside the error.
pub(crate) fn events_and_error(input: &str) -> (Vec<Event>, ParseError) {
    let mut parser = SaxParser::new(RecordingHandler::default());
    let err = parser.parse_str(input).unwrap_err();
    (parser.into_handler().events, err)
}

pub(crate) fn parse_error(input: &str) -> ParseError {
    events_and_error(input).1
}

pub(crate) fn assert_err_contains(err: &ParseError, message: &str, line: usize, column: usize) {
    assert!(
        err.message().contains(message),
        "expected {message:?} in {:?}",
        err.message()
    );
    assert_eq!(
        (err.line(), err.column()),
        (line, column),
        "position of {err}"
    );
}

// Shorthand event constructors.

pub(crate) fn start(name: &str, attributes: &[(&str, &str)]) -> Event {
    Event::ElementStart {
        name: name.to_string(),
        attributes: attributes
            .iter()
            .map(|&(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    }
}

pub(crate) fn end(name: &str) -> Event {
    Event::ElementEnd {
        name: name.to_string(),
    }
}

pub(crate) fn chardata(text: &str) -> Event {
    Event::CharacterData {
        text: text.to_string(),
    }
}

pub(crate) fn pi(target: &str, data: &str) -> Event {
    Event::ProcessingInstruction {
        target: target.to_string(),
        data: data.to_string(),
    }
}

/// Merges adjacent `CharacterData` events.
///
/// Fragmentation is engine-defined, so equivalence checks between two
/// parses of the same text compare coalesced sequences.
pub(crate) fn coalesce(events: &[Event]) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::new();
    for event in events {
        if let (Some(Event::CharacterData { text: merged }), Event::CharacterData { text }) =
            (out.last_mut(), event)
        {
            merged.push_str(text);
            continue;
        }
        out.push(event.clone());
    }
    out
}

/// Property-test iteration count: thorough on CI, quick locally, a token
/// few under Miri.
#[cfg(not(any(miri, feature = "test-fast")))]
pub(crate) fn num_tests() -> u64 {
    if is_ci::cached() { 10_000 } else { 1_000 }
}

#[cfg(all(not(miri), feature = "test-fast"))]
pub(crate) fn num_tests() -> u64 {
    100
}

#[cfg(miri)]
pub(crate) fn num_tests() -> u64 {
    10
}

/// A reader that hands out one prepared chunk per `read` call, so tests
/// control exactly where the feed boundaries fall.
#[cfg(feature = "std")]
pub(crate) struct ChunkedReader {
    chunks: Vec<Vec<u8>>,
    next: usize,
}

#[cfg(feature = "std")]
impl ChunkedReader {
    pub(crate) fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self { chunks, next: 0 }
    }
}

#[cfg(feature = "std")]
impl std::io::Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.chunks.get(self.next).is_some_and(Vec::is_empty) {
            self.next += 1;
        }
        let Some(chunk) = self.chunks.get_mut(self.next) else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        chunk.drain(..n);
        Ok(n)
    }
}
