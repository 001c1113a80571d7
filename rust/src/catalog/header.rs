//! Header field storage and the header-derived accessors described in
//! SPEC_FULL.md 4.3 ("Header-derived accessors", "`update_header`").
//!
//! Grounded in `pology/catalog.py`'s `Catalog.header`/`Header` glue:
//! the header is just the catalog's empty-key entry, and its `msgstr`
//! is a newline-joined `Key: value` block. We keep that block parsed
//! into an ordered list of pairs so that `update_header` can rewrite
//! individual fields without disturbing the others' order, and so that
//! catalog equality (SPEC_FULL.md 3, "Equality") can compare headers
//! field-by-field instead of as an opaque string. Each field is a
//! [`MonPair`], the container kit's change-counted key/value slot
//! (SPEC_FULL.md 3, "A scalar, list, set, and pair container").

use crate::message::Message;
use crate::monitored::MonPair;

/// An ordered `Key: value` field list, as parsed out of the header
/// entry's `msgstr`. Order is preserved on parse; `set` updates a
/// field in place if present, otherwise appends it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pairs: Vec<MonPair<String, String>>,
}

impl HeaderFields {
    pub fn parse(raw: &str) -> Self {
        let mut pairs = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match line.split_once(':') {
                Some((key, value)) => {
                    pairs.push(MonPair::new(key.trim().to_string(), value.trim().to_string()));
                }
                None => pairs.push(MonPair::new(line.trim().to_string(), String::new())),
            }
        }
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.first().eq_ignore_ascii_case(key))
            .map(|p| p.second().as_str())
    }

    /// Reads `key`, falling back to `X-<key>` if the plain field is
    /// absent, per SPEC_FULL.md's header-derived accessors.
    pub fn get_with_x_fallback(&self, key: &str) -> Option<&str> {
        self.get(key)
            .or_else(|| self.get(&format!("X-{key}")))
    }

    /// Sets `key` to `value`, preserving its existing position, or
    /// appending it at the end if it wasn't present.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(pair) = self
            .pairs
            .iter_mut()
            .find(|p| p.first().eq_ignore_ascii_case(key))
        {
            pair.set_second(value);
        } else {
            self.pairs.push(MonPair::new(key.to_string(), value));
        }
    }

    /// Inserts `key` right after `after_key` if `after_key` is
    /// present and `key` is not already set; otherwise behaves like
    /// [`Self::set`]. Used to place `Language` after `Language-Team`
    /// as `update_header` requires.
    pub fn set_after(&mut self, key: &str, after_key: &str, value: impl Into<String>) {
        let value = value.into();
        if self.get(key).is_some() {
            self.set(key, value);
            return;
        }
        if let Some(pos) = self
            .pairs
            .iter()
            .position(|p| p.first().eq_ignore_ascii_case(after_key))
        {
            self.pairs.insert(pos + 1, MonPair::new(key.to_string(), value));
        } else {
            self.pairs.push(MonPair::new(key.to_string(), value));
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|p| !p.first().eq_ignore_ascii_case(key));
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MonPair<String, String>> {
        self.pairs.iter()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for pair in &self.pairs {
            out.push_str(pair.first());
            out.push_str(": ");
            out.push_str(pair.second());
            out.push('\n');
        }
        out
    }
}

/// Typed results of the header-derived accessors: `None` means the
/// field is wholly absent from the header ("undetermined"), which is
/// distinct from an accessor returning an empty-but-present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapping {
    Basic,
    None,
    Field,
}

impl Wrapping {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "none" => Some(Self::None),
            "field" => Some(Self::Field),
            _ => None,
        }
    }
}

/// Extracts the header pairs from the catalog's header message,
/// re-parsing its `msgstr[0]` each time (the header entry is small
/// and this keeps the parsed form honest with whatever mutation the
/// caller just did directly on the message).
pub(crate) fn fields_of(header: &Message) -> HeaderFields {
    HeaderFields::parse(header.msgstr_at(0).unwrap_or(""))
}

pub(crate) fn set_fields(header: &mut Message, fields: &HeaderFields) {
    header.set_msgstr(vec![fields.render()]);
}

/// Reads the `language` header-derived accessor: `Language`.
pub fn language(header: &Message) -> Option<String> {
    fields_of(header).get("Language").map(String::from)
}

pub fn set_language(header: &mut Message, value: &str) {
    let mut fields = fields_of(header);
    fields.set_after("Language", "Language-Team", value);
    set_fields(header, &fields);
}

/// Reads the `accelerator` header-derived accessor:
/// `Accelerator-Marker`, falling back to `X-Accelerator-Marker`.
pub fn accelerator(header: &Message) -> Option<Vec<char>> {
    fields_of(header)
        .get_with_x_fallback("Accelerator-Marker")
        .map(|v| v.chars().collect())
}

pub fn set_accelerator(header: &mut Message, value: &str) {
    let mut fields = fields_of(header);
    fields.set("Accelerator-Marker", value);
    set_fields(header, &fields);
}

/// Reads the `markup` header-derived accessor: `Text-Markup`, falling
/// back to `X-Text-Markup`. Value is a comma-separated list of
/// markup type names (e.g. `"html,kde"`).
pub fn markup(header: &Message) -> Option<Vec<String>> {
    fields_of(header)
        .get_with_x_fallback("Text-Markup")
        .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
}

pub fn set_markup(header: &mut Message, value: &str) {
    let mut fields = fields_of(header);
    fields.set("Text-Markup", value);
    set_fields(header, &fields);
}

/// Reads the `environment` header-derived accessor: `Environment`,
/// falling back to `X-Environment`.
pub fn environment(header: &Message) -> Option<Vec<String>> {
    fields_of(header)
        .get_with_x_fallback("Environment")
        .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
}

pub fn set_environment(header: &mut Message, value: &str) {
    let mut fields = fields_of(header);
    fields.set("Environment", value);
    set_fields(header, &fields);
}

/// Reads the `wrapping` header-derived accessor: `Wrapping`, falling
/// back to `X-Wrapping`.
pub fn wrapping(header: &Message) -> Option<Wrapping> {
    fields_of(header)
        .get_with_x_fallback("Wrapping")
        .and_then(Wrapping::parse)
}

pub fn set_wrapping(header: &mut Message, value: Wrapping) {
    let mut fields = fields_of(header);
    let text = match value {
        Wrapping::Basic => "basic",
        Wrapping::None => "none",
        Wrapping::Field => "field",
    };
    fields.set("Wrapping", text);
    set_fields(header, &fields);
}

pub fn encoding(header: &Message) -> Option<String> {
    let content_type = fields_of(header).get("Content-Type")?.to_string();
    content_type
        .split("charset=")
        .nth(1)
        .map(|s| s.trim().to_string())
}

pub fn set_encoding(header: &mut Message, encoding: &str) {
    let mut fields = fields_of(header);
    fields.set(
        "Content-Type",
        format!("text/plain; charset={encoding}"),
    );
    set_fields(header, &fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with(raw: &str) -> Message {
        let mut msg = Message::header();
        msg.set_msgstr(vec![raw.to_string()]);
        msg
    }

    #[test]
    fn parses_and_renders_in_order() {
        let fields = HeaderFields::parse(
            "Project-Id-Version: foo\nLanguage: fr\nX-Generator: pocheck\n",
        );
        assert_eq!(fields.get("Language"), Some("fr"));
        assert_eq!(
            fields.render(),
            "Project-Id-Version: foo\nLanguage: fr\nX-Generator: pocheck\n"
        );
    }

    #[test]
    fn set_after_places_language_after_language_team() {
        let mut fields = HeaderFields::parse("Language-Team: French\n");
        fields.set_after("Language", "Language-Team", "fr");
        assert_eq!(
            fields.render(),
            "Language-Team: French\nLanguage: fr\n"
        );
    }

    #[test]
    fn x_prefixed_fallback() {
        let header = header_with("X-Accelerator-Marker: &\n");
        assert_eq!(accelerator(&header), Some(vec!['&']));
    }

    #[test]
    fn undetermined_is_none() {
        let header = header_with("Project-Id-Version: foo\n");
        assert_eq!(language(&header), None);
        assert_eq!(wrapping(&header), None);
    }

    #[test]
    fn encoding_reads_charset() {
        let header =
            header_with("Content-Type: text/plain; charset=ISO-8859-1\n");
        assert_eq!(encoding(&header), Some("ISO-8859-1".to_string()));
    }
}
