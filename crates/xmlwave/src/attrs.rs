//! Attribute folding.

use alloc::{string::String, vec::Vec};

use crate::event::Attributes;

/// Folds the attribute pairs of one start tag into a map.
///
/// Pairs arrive in document order, so inserting front to back makes the
/// last occurrence of a repeated name win.
pub(crate) fn from_pairs(pairs: Vec<(String, String)>) -> Attributes {
    let mut attributes = Attributes::new();
    for (name, value) in pairs {
        attributes.insert(name, value);
    }
    attributes
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::from_pairs;

    #[test]
    fn folds_pairs_in_document_order() {
        let map = from_pairs(vec![
            ("x".to_string(), "1".to_string()),
            ("y".to_string(), "2".to_string()),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("x"), Some(&"1".to_string()));
        assert_eq!(map.get("y"), Some(&"2".to_string()));
    }

    #[test]
    fn repeated_name_keeps_the_last_value() {
        let map = from_pairs(vec![
            ("x".to_string(), "first".to_string()),
            ("x".to_string(), "last".to_string()),
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x"), Some(&"last".to_string()));
    }
}
