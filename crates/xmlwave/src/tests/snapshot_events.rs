//! Snapshot test that pins the exact sequence of [`Event`]s dispatched for
//! a moderately involved document.  The test is particularly useful to
//! catch unintended behaviour changes when the engine is modified.

use alloc::vec::Vec;

// Enable the `yaml` feature for a more human-readable snapshot format.
use insta::{assert_snapshot, assert_yaml_snapshot};

use super::{events_ok, parse_error};
use crate::Event;

#[test]
fn snapshot_document_events() {
    let events: Vec<Event> = events_ok(
        "<list><item topic=\"news\">first</item><?page break?><item>second</item></list>",
    );

    // Inline snapshot taken from a known-good run via `cargo insta review`.
    assert_yaml_snapshot!(events, @r"
    - ElementStart:
        name: list
        attributes: {}
    - ElementStart:
        name: item
        attributes:
          topic: news
    - CharacterData:
        text: first
    - ElementEnd:
        name: item
    - ProcessingInstruction:
        target: page
        data: break
    - ElementStart:
        name: item
        attributes: {}
    - CharacterData:
        text: second
    - ElementEnd:
        name: item
    - ElementEnd:
        name: list
    ");
}

#[test]
fn snapshot_error_display() {
    assert_snapshot!(parse_error("<a></b>"), @"mismatched tag at line 1, column 3");
}
