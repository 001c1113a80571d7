//! The PO catalog parser: byte stream -> encoding + ordered entries.
//!
//! Grounded in `pology/catalog.py`'s `_read_lines_and_encoding` and
//! `_parse_po_file`: a hand-written two-context (life/age) state
//! machine over physical lines, rather than a grammar/parser-combinator
//! approach, since PO's field continuation rules don't nest.

use crate::errors::{CatalogSyntaxError, MaybeFilename};
use crate::escaping::unescape;
use crate::message::{LineCache, Message, ModSnapshot, SourceRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldContext {
    None,
    Msgctxt,
    Msgid,
    MsgidPlural,
    Msgstr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgeContext {
    Current,
    Previous,
}

#[derive(Default)]
struct PendingFields {
    manual_comment: Vec<String>,
    auto_comment: Vec<String>,
    source: Vec<SourceRef>,
    flag: Vec<String>,
    obsolete: bool,
    msgctxt_previous: Vec<String>,
    msgid_previous: Vec<String>,
    msgid_plural_previous: Vec<String>,
    msgctxt: Vec<String>,
    msgid: Vec<String>,
    msgid_plural: Vec<String>,
    msgstr: Vec<Vec<String>>,
    refline: i64,
    refentry: i64,

    raw_manual_comment: Vec<String>,
    raw_auto_comment: Vec<String>,
    raw_source: Vec<String>,
    raw_flag: Vec<String>,
    raw_msgctxt_previous: Vec<String>,
    raw_msgid_previous: Vec<String>,
    raw_msgid_plural_previous: Vec<String>,
    raw_msgctxt: Vec<String>,
    raw_msgid: Vec<String>,
    raw_msgid_plural: Vec<String>,
    raw_msgstr: Vec<String>,
}

impl PendingFields {
    fn new() -> Self {
        Self {
            refline: -1,
            refentry: -1,
            ..Default::default()
        }
    }
}

/// The outcome of parsing a byte stream: the detected entries, the
/// encoding used to decode them, and (in header-only mode) whatever
/// source remained unconsumed after the first entry.
pub struct ParsedCatalog {
    pub messages: Vec<Message>,
    pub encoding: String,
    pub tail: Option<String>,
}

/// Splits `bytes` into lines using whichever of `\r\n`, `\n`, `\r`
/// appears most often (ties favor the first checked, i.e. the longer
/// terminator), and decodes them under the catalog's declared or
/// assumed encoding.
///
/// Besides the decoded lines, returns which of them were actually
/// followed by the detected terminator (`has_term`, false only for a
/// terminator-less trailing fragment) and the terminator itself, so a
/// caller needing the exact unconsumed tail of the source can rejoin
/// a line range byte-faithfully instead of concatenating bare content.
fn read_lines_and_encoding(
    bytes: &[u8],
    maybe_filename: &MaybeFilename,
) -> Result<(Vec<String>, Vec<bool>, String, String), CatalogSyntaxError> {
    let mut best_term: &[u8] = b"\n";
    let mut best_count = 0usize;
    for term in [b"\r\n".as_slice(), b"\n".as_slice(), b"\r".as_slice()] {
        let count = bytes.windows(term.len()).filter(|w| *w == term).count();
        if count > best_count {
            best_count = count;
            best_term = term;
        }
    }

    let mut raw_lines: Vec<Vec<u8>> = Vec::new();
    let mut has_term: Vec<bool> = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + best_term.len() <= bytes.len() {
        if &bytes[i..i + best_term.len()] == best_term {
            raw_lines.push(bytes[start..i].to_vec());
            has_term.push(true);
            i += best_term.len();
            start = i;
        } else {
            i += 1;
        }
    }
    if start < bytes.len() {
        raw_lines.push(bytes[start..].to_vec());
        has_term.push(false);
    }

    let encoding = detect_encoding(&raw_lines);

    let mut lines = Vec::with_capacity(raw_lines.len());
    for (idx, raw) in raw_lines.iter().enumerate() {
        let decoded = match encoding.as_str() {
            "UTF-8" | "utf-8" | "utf8" => {
                String::from_utf8(raw.clone()).map_err(|e| {
                    CatalogSyntaxError::DecodeError {
                        maybe_filename: maybe_filename.clone(),
                        line: idx + 1,
                        column: e.utf8_error().valid_up_to(),
                        encoding: encoding.clone(),
                    }
                })?
            }
            _ => String::from_utf8_lossy(raw).into_owned(),
        };
        lines.push(decoded);
    }
    let terminator = String::from_utf8(best_term.to_vec()).unwrap();
    Ok((lines, has_term, terminator, encoding))
}

fn detect_encoding(raw_lines: &[Vec<u8>]) -> String {
    for raw in raw_lines {
        let trimmed = trim_bytes(raw);
        if trimmed.starts_with(b"#:") {
            break;
        }
        if let Some(pos) = find_subsequence(raw, b"charset=") {
            let rest = &raw[pos + 8..];
            let end = rest
                .iter()
                .position(|b| *b == b'\\' || *b == b'"' || *b == b'\n')
                .unwrap_or(rest.len());
            let enc = String::from_utf8_lossy(&rest[..end]).trim().to_string();
            if !enc.is_empty() && enc.to_uppercase() != "CHARSET" {
                return enc;
            }
        }
    }
    "UTF-8".to_string()
}

fn trim_bytes(b: &[u8]) -> &[u8] {
    let mut start = 0;
    let mut end = b.len();
    while start < end && b[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && b[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    &b[start..end]
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Extracts the content between the first and last `"` on `line` and
/// C-unescapes it.
fn parse_quoted(
    line: &str,
    lno: usize,
    maybe_filename: &MaybeFilename,
) -> Result<String, CatalogSyntaxError> {
    let first = line.find('"').ok_or_else(|| {
        CatalogSyntaxError::ExpectedContinuation {
            maybe_filename: maybe_filename.clone(),
            line: lno,
        }
    })?;
    let last = line.rfind('"').ok_or_else(|| {
        CatalogSyntaxError::ExpectedContinuation {
            maybe_filename: maybe_filename.clone(),
            line: lno,
        }
    })?;
    if last <= first {
        return Err(CatalogSyntaxError::UnescapedDoubleQuoteFound {
            maybe_filename: maybe_filename.clone(),
            line: lno,
            index: first,
        });
    }
    let inner = &line[first + 1..last];
    if inner.contains('"') {
        // A bare quote inside the body, not escaped by a preceding
        // backslash, means the line was malformed.
        let mut prev_backslash = false;
        for (idx, ch) in inner.char_indices() {
            if ch == '"' && !prev_backslash {
                return Err(CatalogSyntaxError::UnescapedDoubleQuoteFound {
                    maybe_filename: maybe_filename.clone(),
                    line: lno,
                    index: first + 1 + idx,
                });
            }
            prev_backslash = ch == '\\' && !prev_backslash;
        }
    }
    unescape(inner).map_err(|_| CatalogSyntaxError::UnescapedDoubleQuoteFound {
        maybe_filename: maybe_filename.clone(),
        line: lno,
        index: first,
    })
}

fn join_or_none(fragments: &[String]) -> Option<String> {
    if fragments.is_empty() {
        None
    } else {
        Some(fragments.concat())
    }
}

/// Parses a full PO byte stream into entries.
///
/// `headonly`: stop after the first entry (the header) and capture
/// everything unconsumed past it, verbatim, into `tail`.
pub fn parse_po(
    bytes: &[u8],
    filename: Option<&str>,
    headonly: bool,
) -> Result<ParsedCatalog, CatalogSyntaxError> {
    let maybe_filename = match filename {
        Some(name) => MaybeFilename::new(name, true),
        None => MaybeFilename::new(&String::from_utf8_lossy(bytes), false),
    };

    let (mut lines, has_term, terminator, encoding) =
        read_lines_and_encoding(bytes, &maybe_filename)?;
    let source_line_count = lines.len();
    lines.push(String::new());

    let mut messages: Vec<Message> = Vec::new();
    let mut pending = PendingFields::new();
    let mut field_context = FieldContext::None;
    let mut eno: i64 = 0;
    let mut msgstr_i: usize = 0;
    let mut tail: Option<String> = None;

    let nlines = lines.len();
    let mut lno = 0usize;

    macro_rules! try_finish {
        () => {
            if field_context == FieldContext::Msgstr {
                let msg = finish_message(std::mem::replace(
                    &mut pending,
                    PendingFields::new(),
                ));
                messages.push(msg);
                field_context = FieldContext::None;
                if headonly {
                    let offset = if lno < nlines { 1 } else { 0 };
                    let idx = lno - offset;
                    let mut rest = String::new();
                    if idx < source_line_count {
                        for (j, content) in lines[idx..source_line_count].iter().enumerate() {
                            rest.push_str(content);
                            if has_term[idx + j] {
                                rest.push_str(&terminator);
                            }
                        }
                    }
                    tail = Some(rest);
                    lno = nlines;
                }
            }
        };
    }

    while lno < nlines {
        let line_raw = lines[lno].clone();
        lno += 1;
        let line_no = lno;
        let mut line = line_raw.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let mut string_follows = true;
        let mut life_context_obsolete = false;
        let mut age_context = AgeContext::Current;

        if line.starts_with('#') {
            if line.starts_with("#~|") {
                line = line[3..].trim_start().to_string();
                age_context = AgeContext::Previous;
                life_context_obsolete = pending.obsolete;
            } else if line.starts_with("#~") {
                line = line[2..].trim_start().to_string();
                life_context_obsolete = true;
            } else if line.starts_with("#|") {
                line = line[2..].trim_start().to_string();
                age_context = AgeContext::Previous;
            } else if line.starts_with("#:") {
                try_finish!();
                string_follows = false;
                for srcref in line[2..].split(' ') {
                    let srcref = srcref.trim();
                    if srcref.is_empty() {
                        continue;
                    }
                    if let Some((path, lineno)) = srcref.rsplit_once(':') {
                        match lineno.parse::<u32>() {
                            Ok(n) if n > 0 => {
                                pending.source.push(SourceRef::new(
                                    path.to_string(),
                                    Some(n),
                                ));
                            }
                            _ => {
                                pending.source.push(SourceRef::new(
                                    srcref.to_string(),
                                    None,
                                ));
                            }
                        }
                    } else {
                        pending
                            .source
                            .push(SourceRef::new(srcref.to_string(), None));
                    }
                }
                pending.raw_source.push(line_raw.clone());
            } else if line.starts_with("#,") {
                try_finish!();
                string_follows = false;
                for flag in line[2..].split(',') {
                    let flag = flag.trim();
                    if !flag.is_empty() {
                        pending.flag.push(flag.to_string());
                    }
                }
                pending.raw_flag.push(line_raw.clone());
            } else if line.starts_with("#.") {
                try_finish!();
                string_follows = false;
                pending
                    .auto_comment
                    .push(line[2..].trim_start().to_string());
                pending.raw_auto_comment.push(line_raw.clone());
            } else {
                try_finish!();
                string_follows = false;
                pending
                    .manual_comment
                    .push(line[1..].trim_start().to_string());
                pending.raw_manual_comment.push(line_raw.clone());
            }
        }

        if !line.is_empty() && string_follows {
            if line.starts_with("msgctxt") {
                try_finish!();
                field_context = FieldContext::Msgctxt;
                line = line[7..].trim_start().to_string();
            } else if line.starts_with("msgid_plural") {
                field_context = FieldContext::MsgidPlural;
                line = line[12..].trim_start().to_string();
            } else if line.starts_with("msgid") {
                try_finish!();
                if life_context_obsolete {
                    pending.obsolete = true;
                }
                field_context = FieldContext::Msgid;
                if age_context == AgeContext::Current {
                    pending.refline = line_no as i64;
                    pending.refentry = eno;
                    eno += 1;
                }
                line = line[5..].trim_start().to_string();
            } else if line.starts_with("msgstr") {
                field_context = FieldContext::Msgstr;
                line = line[6..].trim_start().to_string();
                msgstr_i = 0;
                if let Some(rest) = line.strip_prefix('[') {
                    let digits: String =
                        rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                    if digits.is_empty() {
                        return Err(CatalogSyntaxError::MalformedMsgstrIndex {
                            maybe_filename,
                            line: line_no,
                            index: 0,
                        });
                    }
                    msgstr_i = digits.parse().unwrap_or(0);
                    let after_digits = &rest[digits.len()..].trim_start();
                    if let Some(stripped) = after_digits.strip_prefix(']') {
                        line = stripped.trim_start().to_string();
                    } else {
                        return Err(CatalogSyntaxError::MalformedMsgstrIndex {
                            maybe_filename,
                            line: line_no,
                            index: digits.len(),
                        });
                    }
                }
                while pending.msgstr.len() <= msgstr_i {
                    pending.msgstr.push(Vec::new());
                }
            } else if !line.starts_with('"') {
                return Err(CatalogSyntaxError::Custom {
                    maybe_filename,
                    line: line_no,
                    index: 0,
                    message: "unknown field name".to_string(),
                });
            }
        }

        if !line.is_empty() && string_follows {
            if line.starts_with('"') {
                let s = parse_quoted(&line, line_no, &maybe_filename)?;
                if age_context == AgeContext::Previous {
                    match field_context {
                        FieldContext::Msgctxt => {
                            pending.msgctxt_previous.push(s);
                            pending
                                .raw_msgctxt_previous
                                .push(line_raw.clone());
                        }
                        FieldContext::Msgid => {
                            pending.msgid_previous.push(s);
                            pending.raw_msgid_previous.push(line_raw.clone());
                        }
                        FieldContext::MsgidPlural => {
                            pending.msgid_plural_previous.push(s);
                            pending
                                .raw_msgid_plural_previous
                                .push(line_raw.clone());
                        }
                        _ => {}
                    }
                } else {
                    match field_context {
                        FieldContext::Msgctxt => {
                            pending.msgctxt.push(s);
                            pending.raw_msgctxt.push(line_raw.clone());
                        }
                        FieldContext::Msgid => {
                            pending.msgid.push(s);
                            pending.raw_msgid.push(line_raw.clone());
                        }
                        FieldContext::MsgidPlural => {
                            pending.msgid_plural.push(s);
                            pending.raw_msgid_plural.push(line_raw.clone());
                        }
                        FieldContext::Msgstr => {
                            pending.msgstr[msgstr_i].push(s);
                            pending.raw_msgstr.push(line_raw.clone());
                        }
                        FieldContext::None => {}
                    }
                }
            } else {
                return Err(CatalogSyntaxError::ExpectedContinuation {
                    maybe_filename,
                    line: line_no,
                });
            }
        }
    }

    try_finish!();

    if messages.is_empty() {
        return Err(CatalogSyntaxError::MissingHeader { maybe_filename });
    }

    for (i, msg) in messages.iter().enumerate() {
        if i > 0 && msg.msgid().is_empty() && msg.msgctxt().is_none() {
            return Err(CatalogSyntaxError::EmptyKey {
                maybe_filename: maybe_filename.clone(),
                line: msg.refline.max(0) as usize,
            });
        }
    }

    Ok(ParsedCatalog {
        messages,
        encoding,
        tail,
    })
}

fn finish_message(pending: PendingFields) -> Message {
    let mut msg = Message::new(join_or_none(&pending.msgid).unwrap_or_default());
    msg.set_manual_comment(pending.manual_comment);
    msg.set_auto_comment(pending.auto_comment);
    msg.set_source(pending.source);
    for flag in pending.flag {
        msg.add_flag(flag);
    }
    msg.set_obsolete(pending.obsolete);
    msg.set_msgctxt_previous(join_or_none(&pending.msgctxt_previous));
    msg.set_msgid_previous(join_or_none(&pending.msgid_previous));
    msg.set_msgid_plural_previous(join_or_none(
        &pending.msgid_plural_previous,
    ));
    msg.set_msgctxt(join_or_none(&pending.msgctxt));
    msg.set_msgid_plural(join_or_none(&pending.msgid_plural));
    let msgstr: Vec<String> = pending
        .msgstr
        .iter()
        .map(|fragments| fragments.concat())
        .collect();
    msg.set_msgstr(if msgstr.is_empty() {
        vec![String::new()]
    } else {
        msgstr
    });
    msg.refline = pending.refline;
    msg.refentry = pending.refentry;

    msg.cache = LineCache {
        manual_comment: Some(pending.raw_manual_comment),
        auto_comment: Some(pending.raw_auto_comment),
        source: Some(pending.raw_source),
        flag: Some(pending.raw_flag),
        msgctxt_previous: Some(pending.raw_msgctxt_previous),
        msgid_previous: Some(pending.raw_msgid_previous),
        msgid_plural_previous: Some(pending.raw_msgid_plural_previous),
        msgctxt: Some(pending.raw_msgctxt),
        msgid: Some(pending.raw_msgid),
        msgid_plural: Some(pending.raw_msgid_plural),
        msgstr: Some(pending.raw_msgstr),
    };
    msg.snapshot = ModSnapshot::default();
    msg.commit();
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> ParsedCatalog {
        parse_po(src.as_bytes(), None, false).unwrap()
    }

    #[test]
    fn parses_header_and_one_entry() {
        let src = "msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=UTF-8\\n\"\n\nmsgid \"hello\"\nmsgstr \"bonjour\"\n";
        let parsed = parse(src);
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[1].msgid(), "hello");
        assert_eq!(parsed.messages[1].msgstr(), ["bonjour"]);
    }

    #[test]
    fn rejects_missing_header() {
        let result = parse_po(b"", None, false);
        assert!(matches!(
            result,
            Err(CatalogSyntaxError::MissingHeader { .. })
        ));
    }

    #[test]
    fn parses_plural_entries() {
        let src = "msgid \"\"\nmsgstr \"\"\n\nmsgid \"file\"\nmsgid_plural \"files\"\nmsgstr[0] \"fichier\"\nmsgstr[1] \"fichiers\"\n";
        let parsed = parse(src);
        assert_eq!(parsed.messages[1].msgid_plural(), Some("files"));
        assert_eq!(
            parsed.messages[1].msgstr(),
            ["fichier", "fichiers"]
        );
    }

    #[test]
    fn parses_fuzzy_and_previous_fields() {
        let src = concat!(
            "msgid \"\"\nmsgstr \"\"\n\n",
            "#, fuzzy\n",
            "#| msgid \"old\"\n",
            "msgid \"new\"\n",
            "msgstr \"nouveau\"\n",
        );
        let parsed = parse(src);
        let entry = &parsed.messages[1];
        assert!(entry.fuzzy());
        assert_eq!(entry.msgid_previous(), Some("old"));
    }

    #[test]
    fn parses_obsolete_entries() {
        let src = "msgid \"\"\nmsgstr \"\"\n\n#~ msgid \"gone\"\n#~ msgstr \"parti\"\n";
        let parsed = parse(src);
        assert!(parsed.messages[1].obsolete());
    }

    #[test]
    fn detects_non_utf8_charset_header() {
        let src = "msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n";
        let parsed = parse(src);
        assert_eq!(parsed.encoding, "ISO-8859-1");
    }

    #[test]
    fn headonly_captures_tail_verbatim() {
        let src = "msgid \"\"\nmsgstr \"\"\n\n#: x\nmsgid \"a\"\nmsgstr \"b\"\n";
        let parsed = parse_po(src.as_bytes(), None, true).unwrap();
        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(
            parsed.tail.as_deref(),
            Some("#: x\nmsgid \"a\"\nmsgstr \"b\"\n")
        );
    }

    #[test]
    fn headonly_tail_preserves_crlf_terminators() {
        let src = "msgid \"\"\r\nmsgstr \"\"\r\n\r\n#: x\r\nmsgid \"a\"\r\nmsgstr \"b\"\r\n";
        let parsed = parse_po(src.as_bytes(), None, true).unwrap();
        assert_eq!(
            parsed.tail.as_deref(),
            Some("#: x\r\nmsgid \"a\"\r\nmsgstr \"b\"\r\n")
        );
    }

    #[test]
    fn headonly_tail_without_trailing_terminator() {
        let src = "msgid \"\"\nmsgstr \"\"\n\n#: x\nmsgid \"a\"\nmsgstr \"b\"";
        let parsed = parse_po(src.as_bytes(), None, true).unwrap();
        assert_eq!(
            parsed.tail.as_deref(),
            Some("#: x\nmsgid \"a\"\nmsgstr \"b\"")
        );
    }

    #[test]
    fn headonly_with_no_further_entries_has_empty_tail() {
        let src = "msgid \"\"\nmsgstr \"\"\n";
        let parsed = parse_po(src.as_bytes(), None, true).unwrap();
        assert_eq!(parsed.tail.as_deref(), Some(""));
    }
}
