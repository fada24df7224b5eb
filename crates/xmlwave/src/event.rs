//! Structured events dispatched to handlers.

use alloc::{collections::BTreeMap, string::String};

/// Attribute map of one start tag.
///
/// Keys are unique: when a start tag repeats an attribute name, the value
/// written last wins. Iteration is in key order, not document order.
pub type Attributes = BTreeMap<String, String>;

/// One event produced while parsing.
///
/// Events are transient: the session hands each one to the active handler
/// by value as soon as its input has been consumed, and retains nothing.
///
/// # Examples
///
/// ```
/// use xmlwave::Event;
///
/// let event = Event::CharacterData { text: "hi".into() };
/// assert_eq!(event, Event::CharacterData { text: "hi".into() });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Event {
    /// A start tag completed, including the start of an empty-element tag.
    ElementStart {
        /// Element name as written in the document.
        name: String,
        /// The folded attribute map.
        attributes: Attributes,
    },
    /// An end tag completed; an empty-element tag ends immediately after
    /// it starts.
    ElementEnd {
        /// Element name, always equal to the matching start tag's name.
        name: String,
    },
    /// One fragment of character data.
    ///
    /// Contiguous document text may arrive as several fragments, split at
    /// CDATA boundaries, at comments and processing instructions, at
    /// references, and at input chunk boundaries. Concatenated in order,
    /// the fragments give the document text exactly.
    CharacterData {
        /// The fragment, always complete UTF-8 characters.
        text: String,
    },
    /// A processing instruction.
    ProcessingInstruction {
        /// The target name.
        target: String,
        /// Everything between the target and the closing `?>`, with
        /// leading whitespace removed; empty when the instruction has no
        /// data.
        data: String,
    },
}
