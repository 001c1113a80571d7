//! C-style escaping and unescaping of the quoted string literals used
//! by PO field values (`msgid "..."`, `msgstr "..."`, ...).
//!
//! Only the five escape sequences gettext itself emits are handled:
//! `\\`, `\"`, `\n`, `\t`, `\r`. This is deliberately narrower than a
//! general C string unescaper; any other backslash-letter pair found
//! while parsing a catalog is a [`EscapingError::InvalidEscapedCharacter`].

use crate::errors::EscapingError;

/// Escapes a raw field value for embedding inside a double-quoted PO
/// string literal.
///
/// Order matters: the backslash itself must be escaped first, or the
/// backslashes introduced by the other replacements would themselves
/// be re-escaped.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses [`escape`]: turns the escaped content of a quoted string
/// literal back into the raw value it represents.
///
/// Returns [`EscapingError::EscapeAtEndOfString`] if the text ends in
/// a lone backslash, and [`EscapingError::InvalidEscapedCharacter`]
/// for any escape other than the five gettext emits.
pub fn unescape(text: &str) -> Result<String, EscapingError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => {
                return Err(EscapingError::EscapeAtEndOfString {
                    text: text.to_string(),
                })
            }
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                return Err(EscapingError::InvalidEscapedCharacter {
                    text: text.to_string(),
                    character: other,
                })
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_roundtrips_the_c_escape_characters() {
        for raw in ["\n", "\t", "\r", "\"", "\\", "aa\"bb\n\\t\r"] {
            assert_eq!(unescape(&escape(raw)).unwrap(), raw);
        }
    }

    #[test]
    fn escape_basic() {
        assert_eq!(escape("aa\"bb"), "aa\\\"bb");
        assert_eq!(escape("aa\nbb"), "aa\\nbb");
        assert_eq!(escape("aa\tbb"), "aa\\tbb");
        assert_eq!(escape("aa\rbb"), "aa\\rbb");
        assert_eq!(escape("aa\\bb"), "aa\\\\bb");
    }

    #[test]
    fn unescape_rejects_trailing_backslash() {
        assert_eq!(
            unescape("aa\\"),
            Err(EscapingError::EscapeAtEndOfString {
                text: "aa\\".to_string()
            })
        );
    }

    #[test]
    fn unescape_rejects_unknown_escape() {
        assert_eq!(
            unescape("aa\\xbb"),
            Err(EscapingError::InvalidEscapedCharacter {
                text: "aa\\xbb".to_string(),
                character: 'x',
            })
        );
    }
}
