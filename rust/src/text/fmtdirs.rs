//! `remove_fmtdirs`, SPEC_FULL.md 4.6.
//!
//! Grounded in `misc/resolve.py::remove_fmtdirs`/`_remove_fmtdirs_c`/
//! `_remove_fmtdirs_python`/`_remove_fmtdirs_qt`.

use lazy_static::lazy_static;
use regex::Regex;

/// A printf-style format family a message's `-format` flag may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    C,
    Python,
    Qt,
}

impl Format {
    /// Parses a gettext format-flag keyword (`c-format`, `python-format`,
    /// `qt-format`, `kde-format`, or the bare keyword without the
    /// `-format` suffix).
    pub fn parse(keyword: &str) -> Option<Self> {
        let keyword = keyword.to_lowercase();
        let keyword = keyword.strip_suffix("-format").unwrap_or(&keyword);
        match keyword {
            "c" => Some(Self::C),
            "python" => Some(Self::Python),
            "qt" | "kde" => Some(Self::Qt),
            _ => None,
        }
    }
}

lazy_static! {
    static ref C_TAIL: Regex = Regex::new(r"^[ +-]?\d*\.?\d*[a-zA-Z]").unwrap();
    static ref PYTHON_TAIL: Regex =
        Regex::new(r"^(\(.*?\))?[ +-]?\d*\.?\d*[a-zA-Z]").unwrap();
    static ref QT_TAIL: Regex = Regex::new(r"^L?\d{1,2}").unwrap();
}

/// Removes printf-style format directives of `format` from `text`,
/// replacing each with `subs` (empty string removes outright).
pub fn remove_fmtdirs(text: &str, format: Format, subs: &str) -> String {
    match format {
        Format::C => remove_c(text, subs),
        Format::Python => remove_c(&remove_python(text, subs), subs),
        Format::Qt => remove_qt(text, subs),
    }
}

fn remove_c(text: &str, subs: &str) -> String {
    let mut out = String::new();
    let mut p = 0usize;
    loop {
        let Some(hit) = text[p..].find('%') else {
            out.push_str(&text[p..]);
            break;
        };
        let hit = p + hit;
        out.push_str(&text[p..hit]);
        p = hit + 1;
        if text[p..].starts_with('%') {
            out.push('%');
            p += 1;
            continue;
        }
        if let Some(m) = C_TAIL.find(&text[p..]) {
            p += m.end();
            out.push_str(subs);
        }
    }
    out
}

fn remove_python(text: &str, subs: &str) -> String {
    let mut out = String::new();
    let mut p = 0usize;
    loop {
        let Some(hit) = text[p..].find('%') else {
            out.push_str(&text[p..]);
            break;
        };
        let hit = p + hit;
        out.push_str(&text[p..hit]);
        p = hit + 1;
        if text[p..].starts_with('%') {
            out.push('%');
            p += 1;
            continue;
        }
        if let Some(m) = PYTHON_TAIL.find(&text[p..]) {
            p += m.end();
            out.push_str(subs);
        }
    }
    out
}

fn remove_qt(text: &str, subs: &str) -> String {
    let mut out = String::new();
    let mut p = 0usize;
    loop {
        let Some(hit) = text[p..].find('%') else {
            out.push_str(&text[p..]);
            break;
        };
        let hit = p + hit;
        out.push_str(&text[p..hit]);
        p = hit + 1;
        if let Some(m) = QT_TAIL.find(&text[p..]) {
            p += m.end();
            out.push_str(subs);
        } else {
            out.push('%');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_c_directives_and_keeps_escaped_percent() {
        assert_eq!(
            remove_fmtdirs("%d men on a %s man's 100%% chest.", Format::C, ""),
            " men on a  man's 100% chest."
        );
    }

    #[test]
    fn removes_python_named_directives() {
        assert_eq!(
            remove_fmtdirs(
                "%(num)d men on a %(attrib)s man's chest.",
                Format::Python,
                ""
            ),
            " men on a  man's chest."
        );
    }

    #[test]
    fn removes_qt_positional_directives() {
        assert_eq!(
            remove_fmtdirs("%1 men on a %2 man's chest.", Format::Qt, ""),
            " men on a  man's chest."
        );
    }

    #[test]
    fn format_parse_strips_format_suffix() {
        assert_eq!(Format::parse("c-format"), Some(Format::C));
        assert_eq!(Format::parse("python-format"), Some(Format::Python));
        assert_eq!(Format::parse("kde-format"), Some(Format::Qt));
        assert_eq!(Format::parse("unknown-format"), None);
    }
}
