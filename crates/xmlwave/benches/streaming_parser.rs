//! Benchmark – `xmlwave::SaxParser`
#![allow(missing_docs)]

use std::{hint::black_box, io::Cursor, time::Duration};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use xmlwave::{Attributes, SaxHandler, SaxParser};

/// Counts dispatched events so the parse result can be black-boxed by
/// Criterion (to prevent the compiler from optimising the work away).
#[derive(Default)]
struct CountingHandler {
    events: usize,
}

impl SaxHandler for CountingHandler {
    fn element_start(&mut self, _name: String, _attributes: Attributes) {
        self.events += 1;
    }

    fn element_end(&mut self, _name: String) {
        self.events += 1;
    }

    fn character_data(&mut self, _text: String) {
        self.events += 1;
    }

    fn processing_instruction(&mut self, _target: String, _data: String) {
        self.events += 1;
    }
}

/// Produce a *deterministic* XML document whose textual representation is
/// exactly `target_len` bytes, so that each benchmark scenario operates on
/// the same amount of data.
fn make_xml_payload(target_len: usize) -> String {
    let open = "<doc>";
    let close = "</doc>";
    let item = "<item kind=\"row\">cell&amp;data</item>";
    let overhead = open.len() + close.len();
    assert!(target_len >= overhead, "target_len must be >= {overhead}");

    let mut s = String::with_capacity(target_len);
    s.push_str(open);
    while s.len() + item.len() + close.len() <= target_len {
        s.push_str(item);
    }
    // Pad with character data so the document is exactly `target_len`
    // bytes no matter how the item markup divides into it.
    while s.len() < target_len - close.len() {
        s.push('a');
    }
    s.push_str(close);
    debug_assert_eq!(s.len(), target_len);
    s
}

/// Run the parser over `payload` split into `parts` reads.  Returns the
/// number of events dispatched so the result can be black-boxed.
fn run_sax_parser(payload: &str, parts: usize) -> usize {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts); // ceiling division

    let mut parser = SaxParser::new(CountingHandler::default());
    parser
        .parse_reader_with_chunk_size(Cursor::new(payload.as_bytes()), chunk_size)
        .unwrap();
    parser.into_handler().events
}

fn bench_sax_parser(c: &mut Criterion) {
    let payload = make_xml_payload(10_000);

    let mut group = c.benchmark_group("sax_parser_split");

    group.bench_function("parse_str", |b| {
        b.iter(|| {
            let mut parser = SaxParser::new(CountingHandler::default());
            parser.parse_str(black_box(&payload)).unwrap();
            black_box(parser.into_handler().events);
        });
    });

    for &parts in &[1usize, 100, 1_000] {
        group.bench_with_input(
            BenchmarkId::new("parse_reader", parts),
            &parts,
            |b, &parts| {
                b.iter(|| {
                    let count = run_sax_parser(black_box(&payload), parts);
                    black_box(count);
                });
            },
        );
    }
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(5))
            .measurement_time(Duration::from_secs(10));
    }
    c
}

criterion_group! { name = benches; config = criterion(); targets = bench_sax_parser }
criterion_main!(benches);
