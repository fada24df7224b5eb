//! Callback-registration sessions.

use alloc::{format, vec::Vec};
use core::cell::{Cell, RefCell};

use super::assert_err_contains;
use crate::CallbackParser;

#[test]
fn every_callback_kind_fires_in_document_order() {
    let log = RefCell::new(Vec::new());
    let mut parser = CallbackParser::new();
    parser.set_element_start_handler(|name, attributes| {
        log.borrow_mut()
            .push(format!("start {name} {}", attributes["a"]));
    });
    parser.set_processing_instruction_handler(|target, data| {
        log.borrow_mut().push(format!("pi {target} {data}"));
    });
    parser.set_character_data_handler(|text| {
        log.borrow_mut().push(format!("text {text}"));
    });
    parser.set_element_end_handler(|name| {
        log.borrow_mut().push(format!("end {name}"));
    });

    parser.parse_str("<x a=\"1\"><?go now?>hi</x>").unwrap();
    drop(parser);
    assert_eq!(
        log.into_inner(),
        ["start x 1", "pi go now", "text hi", "end x"]
    );
}

#[test]
fn unset_callbacks_ignore_their_events() {
    let mut parser = CallbackParser::default();
    parser.parse_str("<x a=\"1\"><?go now?>hi<y/></x>").unwrap();
}

#[test]
fn setting_a_handler_again_replaces_the_previous_one() {
    let calls = Cell::new(0usize);
    let mut parser = CallbackParser::new();
    parser.set_element_end_handler(|_| unreachable!("replaced before parsing"));
    parser.set_element_end_handler(|name| {
        assert_eq!(name, "only");
        calls.set(calls.get() + 1);
    });
    parser.parse_str("<only/>").unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn parse_faults_surface_through_callback_sessions() {
    let starts = Cell::new(0usize);
    let mut parser = CallbackParser::new();
    parser.set_element_start_handler(|_, _| starts.set(starts.get() + 1));
    let err = parser.parse_str("<a><b></a>").unwrap_err();
    assert_err_contains(&err, "mismatched tag", 1, 6);
    assert_eq!(starts.get(), 2);
}

#[test]
fn callbacks_may_borrow_surrounding_state() {
    let mut names = Vec::new();
    {
        let mut parser = CallbackParser::new();
        parser.set_element_start_handler(|name, _| names.push(name));
        parser.parse_str("<a><b/><c/></a>").unwrap();
    }
    assert_eq!(names, ["a", "b", "c"]);
}

#[cfg(feature = "std")]
#[test]
fn reader_parsing_drives_callbacks() {
    use std::io::Cursor;

    let items = Cell::new(0usize);
    let mut parser = CallbackParser::new();
    parser.set_element_start_handler(|name, _| {
        if name == "item" {
            items.set(items.get() + 1);
        }
    });
    parser
        .parse_reader(Cursor::new("<list><item/><item/><item/></list>"))
        .unwrap();
    assert_eq!(items.get(), 3);
}
