//! Consumer-side event handling.

use alloc::string::String;

use crate::event::{Attributes, Event};

/// Receives parse events from a session.
///
/// Every method has a no-op default body, so an implementation overrides
/// only the events it cares about and the rest are dropped silently.
/// Handlers run synchronously on the `parse` call stack, before the
/// session consumes any further input.
///
/// # Examples
///
/// ```
/// use xmlwave::{Attributes, SaxHandler, SaxParser};
///
/// #[derive(Default)]
/// struct Depth {
///     current: usize,
///     deepest: usize,
/// }
///
/// impl SaxHandler for Depth {
///     fn element_start(&mut self, _name: String, _attributes: Attributes) {
///         self.current += 1;
///         self.deepest = self.deepest.max(self.current);
///     }
///
///     fn element_end(&mut self, _name: String) {
///         self.current -= 1;
///     }
/// }
///
/// let mut parser = SaxParser::new(Depth::default());
/// parser.parse_str("<a><b><c/></b></a>").unwrap();
/// assert_eq!(parser.handler().deepest, 3);
/// ```
#[allow(unused_variables)]
pub trait SaxHandler {
    /// Called for each start tag, including empty-element tags.
    fn element_start(&mut self, name: String, attributes: Attributes) {}

    /// Called for each end tag; an empty-element tag ends immediately
    /// after it starts.
    fn element_end(&mut self, name: String) {}

    /// Called for each character-data fragment.
    fn character_data(&mut self, text: String) {}

    /// Called for each processing instruction.
    fn processing_instruction(&mut self, target: String, data: String) {}
}

/// A handler that ignores every event.
///
/// Parsing with it checks well-formedness and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

impl SaxHandler for DefaultHandler {}

/// Fans one event out to the matching handler method.
pub(crate) fn dispatch<H: SaxHandler>(handler: &mut H, event: Event) {
    match event {
        Event::ElementStart { name, attributes } => handler.element_start(name, attributes),
        Event::ElementEnd { name } => handler.element_end(name),
        Event::CharacterData { text } => handler.character_data(text),
        Event::ProcessingInstruction { target, data } => {
            handler.processing_instruction(target, data);
        }
    }
}
