//! Generated documents parse to their own canonical event sequences.

use quickcheck::QuickCheck;

use super::{arbitrary::XmlDocument, coalesce, events_ok, num_tests};

#[test]
fn generated_documents_parse_to_their_canonical_events() {
    fn prop(doc: XmlDocument) -> bool {
        let rendered = doc.render();
        let parsed = events_ok(&rendered);
        coalesce(&parsed) == coalesce(&doc.canonical_events())
    }

    QuickCheck::new()
        .tests(num_tests())
        .quickcheck(prop as fn(XmlDocument) -> bool);
}
