//! JSON text in the form Concourse tooling writes it.
//!
//! Objects and arrays use `", "` and `": "` separators, and every
//! non-ASCII character is written as a `\uXXXX` escape (UTF-16 surrogate
//! pairs outside the basic plane). Equal values always encode to the same
//! bytes, which matters wherever encoded JSON becomes part of a version.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io::{self, Write};

/// Encodes `value` on one line.
///
/// ```
/// use serde_json::json;
///
/// let encoded = concourse_flat::json::encode(&json!([{"name": "café"}]));
/// assert_eq!(encoded, r#"[{"name": "caf\u00e9"}]"#);
/// ```
#[must_use]
pub fn encode(value: &Value) -> String {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    // Serializing a `Value` into memory cannot fail, and the formatter only
    // ever writes ASCII.
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buffer).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

/// Encodes `value` over several lines, indenting each level by `indent`
/// spaces.
#[must_use]
pub fn encode_indented(value: &Value, indent: usize) -> String {
    let indent = " ".repeat(indent);
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(
        &mut buffer,
        PrettyFormatter::with_indent(indent.as_bytes()),
    );
    let pretty = match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buffer).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    };
    escape_non_ascii(&pretty)
}

/// Non-ASCII characters only ever occur inside JSON strings, so escaping
/// them across the whole document keeps it valid.
fn escape_non_ascii(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            escaped.push(ch);
        } else {
            let mut units = [0_u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    escaped
}

/// Spaced separators and ASCII-only strings.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..index])?;
            let mut units = [0_u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spaced_separators() {
        let value = json!({"versions": [{"ref": "1"}, {"ref": "2"}], "n": 3});
        assert_eq!(
            encode(&value),
            r#"{"versions": [{"ref": "1"}, {"ref": "2"}], "n": 3}"#
        );
        assert_eq!(encode(&json!([])), "[]");
    }

    #[test]
    fn non_ascii_text_is_escaped() {
        assert_eq!(encode(&json!("café ☕")), r#""caf\u00e9 \u2615""#);
        assert_eq!(encode(&json!("🚀")), r#""\ud83d\ude80""#);
        assert_eq!(encode(&json!({"ключ": 1})), r#"{"\u043a\u043b\u044e\u0447": 1}"#);
    }

    #[test]
    fn escapes_survive_parsing() {
        let value = json!({"name": "naïve 🚀", "quote": "\"/\\"});
        let parsed: Value = serde_json::from_str(&encode(&value)).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn indented_output() {
        let value = json!([{"name": "é"}]);
        assert_eq!(
            encode_indented(&value, 2),
            "[\n  {\n    \"name\": \"\\u00e9\"\n  }\n]"
        );
        assert_eq!(encode_indented(&json!([]), 4), "[]");
    }
}
