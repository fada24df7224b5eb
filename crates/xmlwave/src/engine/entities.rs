//! Reference decoding.

use super::{FaultKind, chars::is_xml_char};

/// Decodes the body of one reference, the text between `&` and `;`.
///
/// The five predefined entities and decimal or hexadecimal character
/// references resolve to a single character. Everything else is a fault:
/// entity declarations are never collected from a DOCTYPE, so any other
/// name is undefined, and a character reference must denote a code point
/// the document could contain literally.
pub(crate) fn decode(body: &str) -> Result<char, FaultKind> {
    match body {
        "amp" => Ok('&'),
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "apos" => Ok('\''),
        "quot" => Ok('"'),
        _ => match body.strip_prefix('#') {
            Some(number) => decode_char_ref(number),
            None => Err(FaultKind::UndefinedEntity),
        },
    }
}

fn decode_char_ref(number: &str) -> Result<char, FaultKind> {
    let parsed = match number.strip_prefix('x') {
        Some(hex) if !hex.is_empty() => u32::from_str_radix(hex, 16),
        Some(_) => return Err(FaultKind::BadCharRef),
        None if number.is_empty() => return Err(FaultKind::BadCharRef),
        None => number.parse(),
    };
    let Ok(value) = parsed else {
        return Err(FaultKind::BadCharRef);
    };
    match char::from_u32(value) {
        Some(c) if is_xml_char(c) => Ok(c),
        _ => Err(FaultKind::BadCharRef),
    }
}

#[cfg(test)]
mod tests {
    use super::{FaultKind, decode};

    #[test]
    fn predefined_entities_decode() {
        assert_eq!(decode("amp"), Ok('&'));
        assert_eq!(decode("lt"), Ok('<'));
        assert_eq!(decode("gt"), Ok('>'));
        assert_eq!(decode("apos"), Ok('\''));
        assert_eq!(decode("quot"), Ok('"'));
    }

    #[test]
    fn character_references_decode_in_both_bases() {
        assert_eq!(decode("#65"), Ok('A'));
        assert_eq!(decode("#x41"), Ok('A'));
        assert_eq!(decode("#x2603"), Ok('☃'));
        assert_eq!(decode("#10"), Ok('\n'));
    }

    #[test]
    fn unknown_names_are_undefined() {
        assert_eq!(decode("nbsp"), Err(FaultKind::UndefinedEntity));
        assert_eq!(decode("AMP"), Err(FaultKind::UndefinedEntity));
    }

    #[test]
    fn invalid_code_points_are_rejected() {
        assert_eq!(decode("#0"), Err(FaultKind::BadCharRef));
        assert_eq!(decode("#xD800"), Err(FaultKind::BadCharRef));
        assert_eq!(decode("#x110000"), Err(FaultKind::BadCharRef));
        assert_eq!(decode("#"), Err(FaultKind::BadCharRef));
        assert_eq!(decode("#x"), Err(FaultKind::BadCharRef));
        assert_eq!(decode("#xG1"), Err(FaultKind::BadCharRef));
    }
}
