//! The message entry model: one record of a PO catalog, its derived
//! fields, its change-tracking ("monitored") storage, and its
//! reuse-or-rerender serialization.
//!
//! Grounded in `file/message.py`'s `Message_base`/`Message` classes
//! and in the teacher's `entry.rs`/`POEntry`, generalized to drop the
//! MO-specific duality and to add the line-cache reuse machinery
//! `catalog.rs`'s `sync` relies on to keep round-trips byte-faithful.

use std::collections::HashSet;
use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

use crate::escaping::escape;
use crate::monitored::{MonSet, MonVal, MonVec};
use crate::traits::Merge;
use crate::twrapper::wrap;

/// Default field-wrapping width, matching the `msgfmt`/`xgettext`
/// convention also used by the teacher crate this was grown from.
pub const DEFAULT_WRAPWIDTH: usize = 78;

/// A source reference: a file path and an optional line number
/// (`0` on the wire means "no line", modeled here as `None`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub path: String,
    pub line: Option<u32>,
}

impl SourceRef {
    pub fn new(path: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.path, line),
            None => write!(f, "{}", self.path),
        }
    }
}

/// The `T`/`F`/`U`/`OT`/`OF`/`OU` classification from `state()` in the
/// original: translated/fuzzy/untranslated, each doubled for the
/// obsolete case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    Translated,
    Fuzzy,
    Untranslated,
    ObsoleteTranslated,
    ObsoleteFuzzy,
    ObsoleteUntranslated,
}

impl MessageState {
    pub fn code(&self) -> &'static str {
        match self {
            MessageState::Translated => "T",
            MessageState::Fuzzy => "F",
            MessageState::Untranslated => "U",
            MessageState::ObsoleteTranslated => "OT",
            MessageState::ObsoleteFuzzy => "OF",
            MessageState::ObsoleteUntranslated => "OU",
        }
    }
}

/// Raw lines captured at load time, per field bucket, so that an
/// untouched entry can be reserialized byte-for-byte instead of being
/// re-rendered (see `SPEC_FULL.md` 4.2).
#[derive(Debug, Clone, Default)]
pub(crate) struct LineCache {
    pub manual_comment: Option<Vec<String>>,
    pub auto_comment: Option<Vec<String>>,
    pub source: Option<Vec<String>>,
    pub flag: Option<Vec<String>>,
    pub msgctxt_previous: Option<Vec<String>>,
    pub msgid_previous: Option<Vec<String>>,
    pub msgid_plural_previous: Option<Vec<String>>,
    pub msgctxt: Option<Vec<String>>,
    pub msgid: Option<Vec<String>>,
    pub msgid_plural: Option<Vec<String>>,
    pub msgstr: Option<Vec<String>>,
}

/// Modification-counter snapshot taken the last time the cache above
/// was filled (on load, or after a forced re-render on sync). A
/// bucket is "dirty" when the live field's current modcount differs
/// from its snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ModSnapshot {
    pub manual_comment: u32,
    pub auto_comment: u32,
    pub source: u32,
    pub flag: u32,
    pub msgctxt_previous: u32,
    pub msgid_previous: u32,
    pub msgid_plural_previous: u32,
    pub msgctxt: u32,
    pub msgid: u32,
    pub msgid_plural: u32,
    pub msgstr: u32,
}

/// One message entry: a header, a translation, or an obsolete record.
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) manual_comment: MonVec<String>,
    pub(crate) auto_comment: MonVec<String>,
    pub(crate) source: MonVec<SourceRef>,
    pub(crate) flag: MonSet,
    pub(crate) obsolete: MonVal<bool>,
    pub(crate) msgctxt_previous: MonVal<Option<String>>,
    pub(crate) msgid_previous: MonVal<Option<String>>,
    pub(crate) msgid_plural_previous: MonVal<Option<String>>,
    pub(crate) msgctxt: MonVal<Option<String>>,
    pub(crate) msgid: MonVal<String>,
    pub(crate) msgid_plural: MonVal<Option<String>>,
    pub(crate) msgstr: MonVec<String>,
    /// File line number and zero-based entry index at last load;
    /// implementation state only, never serialized.
    pub refline: i64,
    pub refentry: i64,
    pub(crate) cache: LineCache,
    pub(crate) snapshot: ModSnapshot,
}

impl Default for Message {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl Message {
    pub fn new(msgid: impl Into<String>) -> Self {
        Self {
            manual_comment: MonVec::new(vec![]),
            auto_comment: MonVec::new(vec![]),
            source: MonVec::new(vec![]),
            flag: MonSet::default(),
            obsolete: MonVal::new(false),
            msgctxt_previous: MonVal::new(None),
            msgid_previous: MonVal::new(None),
            msgid_plural_previous: MonVal::new(None),
            msgctxt: MonVal::new(None),
            msgid: MonVal::new(msgid.into()),
            msgid_plural: MonVal::new(None),
            msgstr: MonVec::new(vec![]),
            refline: -1,
            refentry: -1,
            cache: LineCache::default(),
            snapshot: ModSnapshot::default(),
        }
    }

    pub fn header() -> Self {
        let mut msg = Self::new(String::new());
        msg.msgstr.push(String::new());
        msg
    }

    // --- plain accessors -------------------------------------------------

    pub fn msgctxt(&self) -> Option<&str> {
        self.msgctxt.get().as_deref()
    }

    pub fn set_msgctxt(&mut self, value: Option<String>) {
        self.msgctxt.set(value);
    }

    pub fn msgid(&self) -> &str {
        self.msgid.get()
    }

    pub fn set_msgid(&mut self, value: impl Into<String>) {
        self.msgid.set(value.into());
    }

    pub fn msgid_plural(&self) -> Option<&str> {
        self.msgid_plural.get().as_deref()
    }

    pub fn set_msgid_plural(&mut self, value: Option<String>) {
        self.msgid_plural.set(value);
    }

    pub fn msgstr(&self) -> &[String] {
        self.msgstr.as_slice()
    }

    pub fn set_msgstr(&mut self, values: Vec<String>) {
        self.msgstr.set_all(values);
    }

    pub fn msgstr_at(&self, index: usize) -> Option<&str> {
        self.msgstr.get(index).map(|s| s.as_str())
    }

    pub fn source(&self) -> &[SourceRef] {
        self.source.as_slice()
    }

    pub fn set_source(&mut self, refs: Vec<SourceRef>) {
        self.source.set_all(refs);
    }

    pub fn push_source(&mut self, reference: SourceRef) {
        self.source.push(reference);
    }

    pub fn manual_comment(&self) -> &[String] {
        self.manual_comment.as_slice()
    }

    pub fn set_manual_comment(&mut self, lines: Vec<String>) {
        self.manual_comment.set_all(lines);
    }

    pub fn auto_comment(&self) -> &[String] {
        self.auto_comment.as_slice()
    }

    pub fn set_auto_comment(&mut self, lines: Vec<String>) {
        self.auto_comment.set_all(lines);
    }

    pub fn flags(&self) -> &HashSet<String> {
        self.flag.as_set()
    }

    pub fn add_flag(&mut self, flag: impl Into<String>) {
        self.flag.insert(flag.into());
    }

    pub fn remove_flag(&mut self, flag: &str) {
        self.flag.remove(flag);
    }

    pub fn obsolete(&self) -> bool {
        *self.obsolete.get()
    }

    pub fn set_obsolete(&mut self, value: bool) {
        self.obsolete.set(value);
    }

    pub fn msgctxt_previous(&self) -> Option<&str> {
        self.msgctxt_previous.get().as_deref()
    }

    pub fn msgid_previous(&self) -> Option<&str> {
        self.msgid_previous.get().as_deref()
    }

    pub fn msgid_plural_previous(&self) -> Option<&str> {
        self.msgid_plural_previous.get().as_deref()
    }

    pub fn set_msgctxt_previous(&mut self, value: Option<String>) {
        self.msgctxt_previous.set(value);
    }

    pub fn set_msgid_previous(&mut self, value: Option<String>) {
        self.msgid_previous.set(value);
    }

    pub fn set_msgid_plural_previous(&mut self, value: Option<String>) {
        self.msgid_plural_previous.set(value);
    }

    // --- derived fields ----------------------------------------------

    /// Whether this is the (empty msgctxt, empty msgid) header entry.
    pub fn is_header(&self) -> bool {
        self.msgctxt().is_none() && self.msgid().is_empty()
    }

    /// `key` = canonical serialization of (msgctxt, msgid), using a
    /// separator byte that cannot occur in either (`\x00`), and a
    /// distinct sentinel byte (`\x01`) standing in for "no msgctxt".
    pub fn key(&self) -> String {
        match self.msgctxt() {
            Some(ctx) => format!("{}\x00{}", ctx, self.msgid()),
            None => format!("\x01\x00{}", self.msgid()),
        }
    }

    /// `fmt` = canonical serialization of the fields that determine
    /// whether two entries render identically: key fields, plural,
    /// translations, fuzziness, obsolete-ness.
    pub fn fmt_key(&self) -> String {
        let mut parts = vec![
            self.key(),
            self.msgid_plural().unwrap_or("").to_string(),
            self.msgstr().join("\x02"),
            self.fuzzy().to_string(),
            self.obsolete().to_string(),
        ];
        parts.push(String::new());
        parts.join("\x04")
    }

    /// `inv` = `fmt` extended with manual comments and the
    /// previous-fields, i.e. everything that round-trips through a
    /// full reserialization.
    pub fn inv_key(&self) -> String {
        format!(
            "{}\x04{}\x04{}\x04{}\x04{}",
            self.fmt_key(),
            self.manual_comment().join("\x02"),
            self.msgctxt_previous().unwrap_or(""),
            self.msgid_previous().unwrap_or(""),
            self.msgid_plural_previous().unwrap_or(""),
        )
    }

    pub fn fuzzy(&self) -> bool {
        self.flag.contains("fuzzy")
    }

    /// Setting `fuzzy = true` adds the flag; setting it to `false`
    /// removes the flag **and** clears all three previous-fields.
    pub fn set_fuzzy(&mut self, value: bool) {
        if value {
            self.flag.insert("fuzzy".to_string());
        } else {
            self.flag.remove("fuzzy");
            self.msgctxt_previous.set(None);
            self.msgid_previous.set(None);
            self.msgid_plural_previous.set(None);
        }
    }

    pub fn translated(&self) -> bool {
        !self.fuzzy() && self.msgstr().iter().any(|s| !s.is_empty())
    }

    pub fn untranslated(&self) -> bool {
        !self.fuzzy() && self.msgstr().iter().all(|s| s.is_empty())
    }

    /// The first flag containing the substring `-format`, else empty.
    pub fn format(&self) -> String {
        let mut flags: Vec<&String> = self.flag.iter().collect();
        flags.sort();
        flags
            .into_iter()
            .find(|f| f.contains("-format"))
            .cloned()
            .unwrap_or_default()
    }

    pub fn state(&self) -> MessageState {
        use MessageState::*;
        match (self.obsolete(), self.fuzzy(), self.translated()) {
            (false, true, _) => Fuzzy,
            (false, false, true) => Translated,
            (false, false, false) => Untranslated,
            (true, true, _) => ObsoleteFuzzy,
            (true, false, true) => ObsoleteTranslated,
            (true, false, false) => ObsoleteUntranslated,
        }
    }

    /// Merges translation-relevant fields from `other` into `self`:
    /// translations, plural form, fuzziness and previous-fields.
    /// Comments and source references are left untouched, matching
    /// `Message_base.merge`'s default (non-comment-merging) behavior.
    /// Returns whether anything actually changed.
    pub fn merge_translation(&mut self, other: &Message) -> bool {
        let mut changed = false;
        if self.msgid_plural() != other.msgid_plural() {
            self.set_msgid_plural(other.msgid_plural().map(String::from));
            changed = true;
        }
        if self.msgstr() != other.msgstr() {
            self.set_msgstr(other.msgstr().to_vec());
            changed = true;
        }
        if self.fuzzy() != other.fuzzy() {
            self.set_fuzzy(other.fuzzy());
            changed = true;
        }
        if other.fuzzy() {
            if self.msgctxt_previous() != other.msgctxt_previous() {
                self.set_msgctxt_previous(
                    other.msgctxt_previous().map(String::from),
                );
                changed = true;
            }
            if self.msgid_previous() != other.msgid_previous() {
                self.set_msgid_previous(
                    other.msgid_previous().map(String::from),
                );
                changed = true;
            }
            if self.msgid_plural_previous()
                != other.msgid_plural_previous()
            {
                self.set_msgid_plural_previous(
                    other.msgid_plural_previous().map(String::from),
                );
                changed = true;
            }
        }
        changed
    }

    /// Marks every field bucket's cache as current, recording the
    /// live modification counters as the new snapshot. Called by the
    /// parser right after an entry has been fully read from its raw
    /// lines, and by the serializer after a forced full re-render.
    pub(crate) fn commit(&mut self) {
        self.snapshot = ModSnapshot {
            manual_comment: self.manual_comment.modcount(),
            auto_comment: self.auto_comment.modcount(),
            source: self.source.modcount(),
            flag: self.flag.modcount(),
            msgctxt_previous: self.msgctxt_previous.modcount(),
            msgid_previous: self.msgid_previous.modcount(),
            msgid_plural_previous: self.msgid_plural_previous.modcount(),
            msgctxt: self.msgctxt.modcount(),
            msgid: self.msgid.modcount(),
            msgid_plural: self.msgid_plural.modcount(),
            msgstr: self.msgstr.modcount(),
        };
    }

    fn dirty_manual_comment(&self) -> bool {
        self.manual_comment.modcount() != self.snapshot.manual_comment
            || self.cache.manual_comment.is_none()
    }
    fn dirty_auto_comment(&self) -> bool {
        self.auto_comment.modcount() != self.snapshot.auto_comment
            || self.cache.auto_comment.is_none()
    }
    fn dirty_source(&self) -> bool {
        self.source.modcount() != self.snapshot.source
            || self.cache.source.is_none()
    }
    fn dirty_flag(&self) -> bool {
        self.flag.modcount() != self.snapshot.flag
            || self.cache.flag.is_none()
    }
    fn dirty_previous(&self) -> bool {
        self.msgctxt_previous.modcount() != self.snapshot.msgctxt_previous
            || self.msgid_previous.modcount() != self.snapshot.msgid_previous
            || self.msgid_plural_previous.modcount()
                != self.snapshot.msgid_plural_previous
            || self.cache.msgctxt_previous.is_none()
            || self.cache.msgid_previous.is_none()
            || self.cache.msgid_plural_previous.is_none()
    }
    fn dirty_keyfields(&self) -> bool {
        self.msgctxt.modcount() != self.snapshot.msgctxt
            || self.msgid.modcount() != self.snapshot.msgid
            || self.msgid_plural.modcount() != self.snapshot.msgid_plural
            || self.cache.msgctxt.is_none()
            || self.cache.msgid.is_none()
    }
    fn dirty_msgstr(&self) -> bool {
        if self.msgstr.modcount() != self.snapshot.msgstr
            || self.msgid_plural.modcount() != self.snapshot.msgid_plural
            || self.cache.msgstr.is_none()
        {
            return true;
        }
        // Plurality change forces regeneration even without a bump:
        // a cached single-line msgstr with plural now set, or a
        // cached msgstr[N] rendering with plural now absent.
        if let Some(lines) = &self.cache.msgstr {
            let cached_is_plural =
                lines.first().map(|l| l.contains("msgstr[")).unwrap_or(false);
            let now_is_plural = self.msgid_plural().is_some();
            if cached_is_plural != now_is_plural {
                return true;
            }
        }
        false
    }

    /// Renders this entry's PO text. `force` re-renders every field
    /// bucket regardless of dirty bits (used by `to_string`/explicit
    /// dumps); catalog serialization on sync passes `force = false`
    /// so that untouched entries reuse their cached lines verbatim.
    pub fn render(&mut self, wrapwidth: usize, force: bool) -> String {
        if force
            || self.dirty_manual_comment()
            || self.dirty_auto_comment()
            || self.dirty_source()
            || self.dirty_flag()
            || self.dirty_previous()
            || self.dirty_keyfields()
            || self.dirty_msgstr()
        {
            self.rerender_all(wrapwidth);
        }
        let mut out = String::new();
        for bucket in [
            &self.cache.manual_comment,
            &self.cache.auto_comment,
            &self.cache.source,
            &self.cache.flag,
            &self.cache.msgctxt_previous,
            &self.cache.msgid_previous,
            &self.cache.msgid_plural_previous,
            &self.cache.msgctxt,
            &self.cache.msgid,
            &self.cache.msgid_plural,
            &self.cache.msgstr,
        ] {
            if let Some(lines) = bucket {
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out
    }

    fn rerender_all(&mut self, wrapwidth: usize) {
        let comment_prefix = if self.obsolete() { "#~ " } else { "# " };
        let auto_prefix = if self.obsolete() { "#~. " } else { "#. " };
        self.cache.manual_comment = Some(wrap_comment_lines(
            self.manual_comment(),
            comment_prefix,
            wrapwidth,
        ));
        self.cache.auto_comment = Some(wrap_comment_lines(
            self.auto_comment(),
            auto_prefix,
            wrapwidth,
        ));

        self.cache.source = if self.obsolete() || self.source().is_empty()
        {
            Some(vec![])
        } else {
            let joined = self
                .source()
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            Some(wrap_prefixed(&joined, "#: ", wrapwidth))
        };

        self.cache.flag = if self.flag.is_empty() {
            Some(vec![])
        } else {
            let mut flags: Vec<String> =
                self.flag.iter().cloned().collect();
            flags.sort();
            if let Some(pos) = flags.iter().position(|f| f == "fuzzy") {
                let fuzzy = flags.remove(pos);
                flags.insert(0, fuzzy);
            }
            Some(vec![format!("#, {}", flags.join(", "))])
        };

        let prev_prefix =
            if self.obsolete() { "#~|" } else { "#|" };
        self.cache.msgctxt_previous = render_optional_field(
            "msgctxt",
            self.msgctxt_previous(),
            prev_prefix,
            wrapwidth,
        );
        self.cache.msgid_previous = render_optional_field(
            "msgid",
            self.msgid_previous(),
            prev_prefix,
            wrapwidth,
        );
        self.cache.msgid_plural_previous = render_optional_field(
            "msgid_plural",
            self.msgid_plural_previous(),
            prev_prefix,
            wrapwidth,
        );

        let delflag = if self.obsolete() { "#~ " } else { "" };
        self.cache.msgctxt = match self.msgctxt() {
            Some(ctx) => {
                Some(render_field("msgctxt", ctx, delflag, wrapwidth))
            }
            None => Some(vec![]),
        };
        self.cache.msgid = Some(render_field(
            "msgid",
            self.msgid(),
            delflag,
            wrapwidth,
        ));
        self.cache.msgid_plural = match self.msgid_plural() {
            Some(plural) => Some(render_field(
                "msgid_plural",
                plural,
                delflag,
                wrapwidth,
            )),
            None => Some(vec![]),
        };

        let mut msgstr_lines = vec![];
        if self.msgid_plural().is_some() {
            let count = self.msgstr().len().max(1);
            for i in 0..count {
                let value = self.msgstr_at(i).unwrap_or("");
                msgstr_lines.extend(render_field(
                    &format!("msgstr[{}]", i),
                    value,
                    delflag,
                    wrapwidth,
                ));
            }
        } else {
            let value = self.msgstr_at(0).unwrap_or("");
            msgstr_lines.extend(render_field(
                "msgstr", value, delflag, wrapwidth,
            ));
        }
        self.cache.msgstr = Some(msgstr_lines);

        self.commit();
    }
}

fn render_field(
    name: &str,
    value: &str,
    delflag: &str,
    wrapwidth: usize,
) -> Vec<String> {
    let escaped = escape(value);
    let real_width =
        unicode_width::UnicodeWidthStr::width(escaped.as_str())
            + unicode_width::UnicodeWidthStr::width(name)
            + delflag.graphemes(true).count()
            + 3;
    let fragments = if real_width > wrapwidth && wrapwidth > 0 {
        let mut frags = vec!["".to_string()];
        frags.extend(wrap(&escaped, wrapwidth));
        frags
    } else {
        vec![escaped]
    };
    let mut lines = Vec::with_capacity(fragments.len());
    for (i, frag) in fragments.iter().enumerate() {
        if i == 0 {
            lines.push(format!("{}{} \"{}\"", delflag, name, frag));
        } else {
            lines.push(format!("{}\"{}\"", delflag, frag));
        }
    }
    lines
}

fn render_optional_field(
    name: &str,
    value: Option<&str>,
    prefix: &str,
    wrapwidth: usize,
) -> Option<Vec<String>> {
    match value {
        Some(v) => {
            Some(render_field(name, v, &format!("{} ", prefix), wrapwidth))
        }
        None => Some(vec![]),
    }
}

fn wrap_comment_lines(
    lines: &[String],
    prefix: &str,
    wrapwidth: usize,
) -> Vec<String> {
    let mut out = vec![];
    for line in lines {
        if line.graphemes(true).count() + prefix.len() > wrapwidth
            && wrapwidth > prefix.len()
        {
            for wrapped in wrap(line, wrapwidth - prefix.len()) {
                out.push(format!("{}{}", prefix, wrapped));
            }
        } else {
            out.push(format!("{}{}", prefix, line));
        }
    }
    out
}

fn wrap_prefixed(text: &str, prefix: &str, wrapwidth: usize) -> Vec<String> {
    if text.graphemes(true).count() + prefix.len() > wrapwidth
        && wrapwidth > prefix.len()
    {
        wrap(text, wrapwidth - prefix.len())
            .into_iter()
            .map(|w| format!("{}{}", prefix, w))
            .collect()
    } else {
        vec![format!("{}{}", prefix, text)]
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clone = self.clone();
        write!(f, "{}", clone.render(DEFAULT_WRAPWIDTH, true))
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.inv_key() == other.inv_key()
    }
}

impl Merge for Message {
    fn merge(&mut self, other: Self) {
        self.merge_translation(&other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzzy_flag_roundtrip() {
        let mut msg = Message::new("hello");
        assert!(!msg.fuzzy());
        msg.set_fuzzy(true);
        assert!(msg.fuzzy());
        assert!(msg.flags().contains("fuzzy"));
    }

    #[test]
    fn clearing_fuzzy_clears_previous_fields() {
        let mut msg = Message::new("hello");
        msg.set_fuzzy(true);
        msg.set_msgid_previous(Some("old".to_string()));
        msg.set_fuzzy(false);
        assert_eq!(msg.msgid_previous(), None);
    }

    #[test]
    fn translated_and_untranslated_are_exclusive() {
        let mut msg = Message::new("hello");
        msg.set_msgstr(vec!["".to_string()]);
        assert!(msg.untranslated());
        assert!(!msg.translated());

        msg.set_msgstr(vec!["bonjour".to_string()]);
        assert!(msg.translated());
        assert!(!msg.untranslated());

        msg.set_fuzzy(true);
        assert!(!msg.translated());
        assert!(!msg.untranslated());
    }

    #[test]
    fn state_classification() {
        let mut msg = Message::new("hello");
        msg.set_msgstr(vec!["".to_string()]);
        assert_eq!(msg.state(), MessageState::Untranslated);
        msg.set_msgstr(vec!["bonjour".to_string()]);
        assert_eq!(msg.state(), MessageState::Translated);
        msg.set_obsolete(true);
        assert_eq!(msg.state(), MessageState::ObsoleteTranslated);
    }

    #[test]
    fn key_distinguishes_context() {
        let mut a = Message::new("hello");
        let mut b = Message::new("hello");
        b.set_msgctxt(Some("menu".to_string()));
        assert_ne!(a.key(), b.key());
        a.set_msgctxt(Some("menu".to_string()));
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn render_basic_entry() {
        let mut msg = Message::new("hello");
        msg.set_msgstr(vec!["bonjour".to_string()]);
        let rendered = msg.render(DEFAULT_WRAPWIDTH, true);
        assert_eq!(rendered, "msgid \"hello\"\nmsgstr \"bonjour\"\n");
    }

    #[test]
    fn render_escapes_quotes_and_newlines() {
        let mut msg = Message::new("aa\"bb");
        msg.set_msgstr(vec!["".to_string()]);
        assert_eq!(
            msg.render(DEFAULT_WRAPWIDTH, true),
            "msgid \"aa\\\"bb\"\nmsgstr \"\"\n",
        );
    }

    #[test]
    fn render_plural_and_flags() {
        let mut msg = Message::new("file");
        msg.set_msgid_plural(Some("files".to_string()));
        msg.set_msgstr(vec!["fichier".to_string(), "fichiers".to_string()]);
        msg.add_flag("c-format");
        let rendered = msg.render(DEFAULT_WRAPWIDTH, true);
        assert!(rendered.contains("#, c-format\n"));
        assert!(rendered.contains("msgid_plural \"files\"\n"));
        assert!(rendered.contains("msgstr[0] \"fichier\"\n"));
        assert!(rendered.contains("msgstr[1] \"fichiers\"\n"));
    }

    #[test]
    fn render_obsolete_prefixes_every_line() {
        let mut msg = Message::new("hello");
        msg.set_msgstr(vec!["bonjour".to_string()]);
        msg.set_obsolete(true);
        let rendered = msg.render(DEFAULT_WRAPWIDTH, true);
        assert_eq!(rendered, "#~ msgid \"hello\"\n#~ msgstr \"bonjour\"\n");
    }
}
