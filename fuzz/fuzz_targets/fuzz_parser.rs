//! Differential target: a document parsed whole and the same document
//! parsed in arbitrary chunks must dispatch equivalent events and fail
//! identically.
#![no_main]

use std::io::{self, Read};

use libfuzzer_sys::fuzz_target;
use xmlwave::{Attributes, Error, Event, ParseError, SaxHandler, SaxParser};

const HEADER: usize = 4; // little-endian split seed

/// Records every dispatched event in order.
#[derive(Default)]
struct Recorder {
    events: Vec<Event>,
}

impl SaxHandler for Recorder {
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

/// Hands out one prepared chunk per `read` call.
struct Chunks {
    chunks: Vec<Vec<u8>>,
    next: usize,
}

impl Read for Chunks {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
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

/// Parses `chunks` as one document; returns the dispatched events and the
/// fault, if any.
fn outcome(chunks: Vec<Vec<u8>>) -> (Vec<Event>, Option<ParseError>) {
    let mut parser = SaxParser::new(Recorder::default());
    let fault = match parser.parse_reader(Chunks { chunks, next: 0 }) {
        Ok(()) => None,
        Err(Error::Parse(e)) => Some(e),
        Err(Error::Io(e)) => unreachable!("in-memory reader failed: {e}"),
    };
    (parser.into_handler().events, fault)
}

/// Merges adjacent character-data events; fragmentation is allowed to
/// differ between the two parses, the concatenated text is not.
fn coalesce(events: Vec<Event>) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::new();
    for event in events {
        if let (Some(Event::CharacterData { text: merged }), Event::CharacterData { text }) =
            (out.last_mut(), &event)
        {
            merged.push_str(text);
            continue;
        }
        out.push(event);
    }
    out
}

/// Split `data` into chunks of a size derived from the fixed seed.
///
/// * `split_seed` may be any value.
/// * Each chunk is at least one byte.
/// * Splits land anywhere, including inside multi-byte UTF-8 sequences.
fn split_into_chunks(data: &[u8], split_seed: usize) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < data.len() {
        let remaining = data.len() - start;
        let size = (split_seed % remaining) + 1;
        chunks.push(data[start..start + size].to_vec());
        start += size;
    }
    chunks
}

fn parser(data: &[u8]) {
    if data.len() <= HEADER {
        return;
    }
    let split_seed = u32::from_le_bytes(data[..HEADER].try_into().unwrap()) as usize;
    let data = &data[HEADER..];

    let (whole_events, whole_fault) = outcome(vec![data.to_vec()]);
    let (chunk_events, chunk_fault) = outcome(split_into_chunks(data, split_seed));

    assert_eq!(coalesce(whole_events), coalesce(chunk_events));
    assert_eq!(whole_fault, chunk_fault);
}

fuzz_target!(|data: &[u8]| parser(data));
