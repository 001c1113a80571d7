//! The in-memory PO catalog: an ordered sequence of [`Message`]
//! entries plus a separately typed header, with O(1) key lookup,
//! bulk insertion, delayed removal, and byte-faithful serialization.
//!
//! Grounded in `pology/catalog.py`'s `Catalog` class; generalized away
//! from its metadata-hashmap header representation to the
//! [`header::HeaderFields`] ordered pair list described in
//! SPEC_FULL.md 4.3.

pub mod header;
pub mod insert;
pub mod parser;
pub mod plural;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::errors::CatalogSyntaxError;
use crate::message::Message;

use header::{HeaderFields, Wrapping};
use insert::{insertion_heuristic, resolve_explicit_position, AddRequest, Position};
use plural::PluralSpec;

/// Aggregate error raised by file-backed catalog operations (load,
/// sync-to-disk): either an I/O failure or a parse failure, since
/// callers of `Catalog::load_file`/`Catalog::sync_to_file` usually
/// want to handle both without threading two separate `Result` types.
#[derive(Debug)]
pub enum CatalogError {
    Io { path: String, source: io::Error },
    Syntax(CatalogSyntaxError),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io { path, source } => {
                write!(f, "I/O error on {path}: {source}")
            }
            CatalogError::Syntax(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<CatalogSyntaxError> for CatalogError {
    fn from(e: CatalogSyntaxError) -> Self {
        CatalogError::Syntax(e)
    }
}

/// Options accepted by [`Catalog::sync`] and [`Catalog::sync_to_file`].
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Re-render every entry regardless of its dirty bit.
    pub force: bool,
    /// Resize plural `msgstr` vectors that are entirely empty to the
    /// header-declared plural count (SPEC_FULL.md 4.2, "Plural fitting").
    pub fitplural: bool,
    /// Skip hoisting out-of-place obsolete entries to the end.
    pub noobsend: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            force: false,
            fitplural: true,
            noobsend: false,
        }
    }
}

fn message_key(msgctxt: Option<&str>, msgid: &str) -> String {
    match msgctxt {
        Some(ctx) => format!("{ctx}\x00{msgid}"),
        None => format!("\x01\x00{msgid}"),
    }
}

/// The catalog itself: header, ordered entries, encoding, and the
/// verbatim tail captured in header-only parses.
#[derive(Debug)]
pub struct Catalog {
    header: Message,
    messages: Vec<Message>,
    index: HashMap<String, usize>,
    encoding: String,
    tail: Option<String>,
    pub wrapwidth: usize,
    pending_removal: std::collections::HashSet<String>,
    inverse_map: Option<HashMap<String, Vec<usize>>>,
    plural_cache: Option<(String, PluralSpec)>,
    filename: Option<String>,
}

impl Catalog {
    /// Parses `content` as a full PO catalog.
    pub fn parse(content: &str) -> Result<Self, CatalogSyntaxError> {
        Self::parse_bytes(content.as_bytes(), None)
    }

    /// Parses `bytes` as a full PO catalog, attaching `filename` to
    /// any diagnostics raised.
    pub fn parse_bytes(
        bytes: &[u8],
        filename: Option<&str>,
    ) -> Result<Self, CatalogSyntaxError> {
        let parsed = parser::parse_po(bytes, filename, false)?;
        Self::from_parsed(parsed, filename)
    }

    /// Parses just the header of `content`, capturing everything past
    /// it verbatim into `tail` (SPEC_FULL.md 4.1, "Header-only mode").
    pub fn parse_header_only(
        content: &str,
        filename: Option<&str>,
    ) -> Result<Self, CatalogSyntaxError> {
        let parsed = parser::parse_po(content.as_bytes(), filename, true)?;
        Self::from_parsed(parsed, filename)
    }

    fn from_parsed(
        parsed: parser::ParsedCatalog,
        filename: Option<&str>,
    ) -> Result<Self, CatalogSyntaxError> {
        let mut messages = parsed.messages;
        let header = messages.remove(0);
        let mut catalog = Self {
            header,
            messages,
            index: HashMap::new(),
            encoding: parsed.encoding,
            tail: parsed.tail,
            wrapwidth: crate::message::DEFAULT_WRAPWIDTH,
            pending_removal: Default::default(),
            inverse_map: None,
            plural_cache: None,
            filename: filename.map(String::from),
        };
        catalog.rebuild_index();
        Ok(catalog)
    }

    /// Loads and parses a PO file from disk.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse_bytes(&bytes, path.to_str())?)
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, msg) in self.messages.iter().enumerate() {
            self.index.insert(msg.key(), i);
        }
        self.inverse_map = None;
    }

    // --- basic access -----------------------------------------------

    pub fn header(&self) -> &Message {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Message {
        &mut self.header
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn set_encoding(&mut self, encoding: impl Into<String>) {
        self.encoding = encoding.into();
        header::set_encoding(&mut self.header, &self.encoding);
    }

    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, name: Option<String>) {
        self.filename = name;
    }

    /// The base name of the catalog's filename, used by the rule
    /// matcher's `cat` validity constraint.
    pub fn basename(&self) -> String {
        match &self.filename {
            Some(path) => Path::new(path)
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Key-indexed exact lookup.
    pub fn get(&self, msgctxt: Option<&str>, msgid: &str) -> Option<&Message> {
        self.index
            .get(&message_key(msgctxt, msgid))
            .map(|&i| &self.messages[i])
    }

    pub fn get_mut(
        &mut self,
        msgctxt: Option<&str>,
        msgid: &str,
    ) -> Option<&mut Message> {
        let pos = *self.index.get(&message_key(msgctxt, msgid))?;
        Some(&mut self.messages[pos])
    }

    pub fn position_of(&self, msgctxt: Option<&str>, msgid: &str) -> Option<usize> {
        self.index.get(&message_key(msgctxt, msgid)).copied()
    }

    // --- bulk add / insertion heuristic ------------------------------

    /// Bulk-inserts or replaces `requests` per SPEC_FULL.md 4.3
    /// ("Bulk add"). Returns, per request in input order, the final
    /// position of a newly inserted message, or `None` if it replaced
    /// an existing entry in place.
    pub fn add_more(
        &mut self,
        requests: Vec<AddRequest>,
        synonyms: &HashMap<String, String>,
        cumulative: bool,
    ) -> Result<Vec<Option<usize>>, String> {
        let pre_call_len = self.messages.len();
        let mut results: Vec<Option<usize>> = vec![None; requests.len()];
        let mut to_insert: Vec<(usize, usize, Message)> = Vec::new();

        for (req_idx, req) in requests.into_iter().enumerate() {
            let key = req.message.key();
            if let Some(&existing_pos) = self.index.get(&key) {
                self.messages[existing_pos] = req.message;
                results[req_idx] = None;
                continue;
            }
            let position = match req.position {
                Position::Explicit(pos) => {
                    resolve_explicit_position(pos, pre_call_len)?
                }
                Position::Auto => {
                    insertion_heuristic(&self.messages, &req.message, synonyms)
                        .position
                }
            };
            to_insert.push((position, req_idx, req.message));
        }

        to_insert.sort_by_key(|(pos, _, _)| *pos);
        if !cumulative {
            for (offset, (pos, _, _)) in to_insert.iter_mut().enumerate() {
                *pos += offset;
            }
        }

        for (pos, req_idx, msg) in to_insert {
            let pos = pos.min(self.messages.len());
            self.messages.insert(pos, msg);
            results[req_idx] = Some(pos);
        }

        self.rebuild_index();
        Ok(results)
    }

    pub fn push(&mut self, message: Message) -> usize {
        let key = message.key();
        if let Some(&pos) = self.index.get(&key) {
            self.messages[pos] = message;
            return pos;
        }
        self.messages.push(message);
        let pos = self.messages.len() - 1;
        self.index.insert(key, pos);
        pos
    }

    /// Marks the entry with this key for removal at the next `sync`
    /// (or `sync_map`) call rather than removing it immediately
    /// (SPEC_FULL.md 4.3, "Delayed removal").
    pub fn remove_on_sync(&mut self, msgctxt: Option<&str>, msgid: &str) {
        self.pending_removal.insert(message_key(msgctxt, msgid));
    }

    fn apply_pending_removal(&mut self) {
        if self.pending_removal.is_empty() {
            return;
        }
        self.messages
            .retain(|m| !self.pending_removal.contains(&m.key()));
        self.pending_removal.clear();
        self.rebuild_index();
    }

    /// Rebuilds the key index and applies delayed removals without
    /// producing serialized output (SPEC_FULL.md 4.3, "Delayed
    /// removal": "or `sync_map` if the caller wants just the index
    /// refresh without writing").
    pub fn sync_map(&mut self) {
        self.apply_pending_removal();
        self.inverse_map = None;
    }

    // --- obsolete reordering / plural fitting / serialize -----------

    fn hoist_obsolete(&mut self) {
        let obstop = self
            .messages
            .iter()
            .rposition(|m| !m.obsolete())
            .map(|p| p + 1)
            .unwrap_or(0);
        let mut hoisted: Vec<Message> = Vec::new();
        let mut kept: Vec<Message> = Vec::new();
        for (i, msg) in std::mem::take(&mut self.messages).into_iter().enumerate() {
            if msg.obsolete() && i < obstop {
                hoisted.push(msg);
            } else {
                kept.push(msg);
            }
        }
        let insert_at = kept
            .iter()
            .rposition(|m| !m.obsolete())
            .map(|p| p + 1)
            .unwrap_or(0);
        for (offset, msg) in hoisted.into_iter().enumerate() {
            kept.insert(insert_at + offset, msg);
        }
        self.messages = kept;
    }

    fn fit_plurals(&mut self) {
        let nplurals = self.plural_spec().map(|s| s.nplurals).unwrap_or(1);
        for msg in self.messages.iter_mut() {
            if msg.msgid_plural().is_none() {
                continue;
            }
            let all_empty = msg.msgstr().iter().all(|s| s.is_empty());
            if all_empty && msg.msgstr().len() != nplurals {
                msg.set_msgstr(vec![String::new(); nplurals]);
            }
        }
    }

    /// Re-renders the catalog to PO text, applying delayed removal,
    /// obsolete hoisting, and (if requested) plural fitting first.
    pub fn sync(&mut self, options: SyncOptions) -> String {
        self.apply_pending_removal();
        if !options.noobsend {
            self.hoist_obsolete();
        }
        if options.fitplural {
            self.fit_plurals();
        }
        self.rebuild_index();

        let mut out = String::new();
        out.push_str(&self.header.clone().render(self.wrapwidth, options.force));
        out.push('\n');
        for (i, msg) in self.messages.iter_mut().enumerate() {
            msg.refentry = i as i64;
            out.push_str(&msg.render(self.wrapwidth, options.force));
            out.push('\n');
        }
        if let Some(tail) = &self.tail {
            out.push_str(tail);
        }
        out
    }

    /// Serializes and atomically writes the catalog to `path`: render
    /// to a sibling temporary file in the destination directory, then
    /// rename it into place (SPEC_FULL.md 4.2, "Atomic write").
    pub fn sync_to_file(
        &mut self,
        path: impl AsRef<Path>,
        options: SyncOptions,
    ) -> Result<(), CatalogError> {
        let path = path.as_ref();
        let text = self.sync(options);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let tmp_name = format!(
            ".{}.pocheck-tmp",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "catalog.po".to_string())
        );
        let tmp_path = dir.join(tmp_name);
        fs::write(&tmp_path, text.as_bytes()).map_err(|source| CatalogError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        match fs::rename(&tmp_path, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Platforms that disallow overwriting rename: move the
                // destination aside, rename the temp into place, then
                // remove the backup.
                let backup = dir.join(format!(
                    ".{}.pocheck-bak",
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "catalog.po".to_string())
                ));
                if path.exists() {
                    fs::rename(path, &backup).map_err(|source| CatalogError::Io {
                        path: backup.display().to_string(),
                        source,
                    })?;
                }
                fs::rename(&tmp_path, path).map_err(|source| CatalogError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                let _ = fs::remove_file(&backup);
                Ok(())
            }
        }
    }

    // --- plural / header-derived accessors --------------------------

    pub fn plural_spec(&mut self) -> Option<&PluralSpec> {
        let fields = header::fields_of(&self.header);
        let raw = fields.get("Plural-Forms")?.to_string();
        if self
            .plural_cache
            .as_ref()
            .map(|(cached, _)| cached == &raw)
            != Some(true)
        {
            let spec = PluralSpec::parse(&raw).ok()?;
            self.plural_cache = Some((raw, spec));
        }
        self.plural_cache.as_ref().map(|(_, spec)| spec)
    }

    pub fn language(&self) -> Option<String> {
        header::language(&self.header)
    }

    pub fn set_language(&mut self, value: &str) {
        header::set_language(&mut self.header, value);
    }

    pub fn accelerator(&self) -> Option<Vec<char>> {
        header::accelerator(&self.header)
    }

    pub fn set_accelerator(&mut self, value: &str) {
        header::set_accelerator(&mut self.header, value);
    }

    pub fn markup(&self) -> Option<Vec<String>> {
        header::markup(&self.header)
    }

    pub fn set_markup(&mut self, value: &str) {
        header::set_markup(&mut self.header, value);
    }

    pub fn environment(&self) -> Option<Vec<String>> {
        header::environment(&self.header)
    }

    pub fn set_environment(&mut self, value: &str) {
        header::set_environment(&mut self.header, value);
    }

    pub fn wrapping(&self) -> Option<Wrapping> {
        header::wrapping(&self.header)
    }

    pub fn set_wrapping(&mut self, value: Wrapping) {
        header::set_wrapping(&mut self.header, value);
    }

    /// Convenience header editor (SPEC_FULL.md 4.3, "`update_header`").
    /// `project`/`langname`/`langcode` given as `Some("")` remove the
    /// corresponding field instead of leaving it unmodified.
    #[allow(clippy::too_many_arguments)]
    pub fn update_header(
        &mut self,
        project: Option<&str>,
        langname: Option<&str>,
        langcode: Option<&str>,
        title: Option<&str>,
        copyright: Option<&str>,
        license: Option<&str>,
        name: Option<&str>,
        email: Option<&str>,
        year: &str,
        revision_timestamp: &str,
    ) {
        let varmap = |project: &str, langname: &str, langcode: &str| {
            let mut map = HashMap::new();
            map.insert(
                "basename".to_string(),
                self.basename().trim_end_matches(".po").to_string(),
            );
            map.insert("poname".to_string(), self.basename());
            map.insert("project".to_string(), project.to_string());
            map.insert("langname".to_string(), langname.to_string());
            map.insert("langcode".to_string(), langcode.to_string());
            map
        };

        let project_value = project.unwrap_or_default();
        let langname_value = langname.unwrap_or_default();
        let langcode_value = langcode.unwrap_or_default();
        let vars = varmap(project_value, langname_value, langcode_value);

        if let Some(title) = title {
            let expanded = crate::text::vars::expand_vars(title, &vars, '%')
                .unwrap_or_else(|_| title.to_string());
            let mut comments = self.header.manual_comment().to_vec();
            if let Some(first) = comments.first_mut() {
                *first = expanded;
            } else {
                comments.push(expanded);
            }
            self.header.set_manual_comment(comments);
        }

        if let Some(copyright) = copyright {
            let expanded = crate::text::vars::expand_vars(copyright, &vars, '%')
                .unwrap_or_else(|_| copyright.to_string());
            let mut comments = self.header.manual_comment().to_vec();
            comments.push(expanded);
            self.header.set_manual_comment(comments);
        }

        if let Some(license) = license {
            let expanded = crate::text::vars::expand_vars(license, &vars, '%')
                .unwrap_or_else(|_| license.to_string());
            let mut comments = self.header.manual_comment().to_vec();
            comments.push(expanded);
            self.header.set_manual_comment(comments);
        }

        match project {
            Some("") => {
                let mut fields = header::fields_of(&self.header);
                fields.remove("Project-Id-Version");
                header::set_fields(&mut self.header, &fields);
            }
            Some(project) => {
                let mut fields = header::fields_of(&self.header);
                fields.set("Project-Id-Version", project);
                header::set_fields(&mut self.header, &fields);
            }
            None => {}
        }

        match langname {
            Some("") => {
                let mut fields = header::fields_of(&self.header);
                fields.remove("Language-Team");
                header::set_fields(&mut self.header, &fields);
            }
            Some(langname) => {
                let mut fields = header::fields_of(&self.header);
                fields.set("Language-Team", langname);
                header::set_fields(&mut self.header, &fields);
            }
            None => {}
        }

        match langcode {
            Some("") => {
                let mut fields = header::fields_of(&self.header);
                fields.remove("Language");
                header::set_fields(&mut self.header, &fields);
            }
            Some(langcode) => self.set_language(langcode),
            None => {}
        }

        if let (Some(name), Some(email)) = (name, email) {
            let mut fields = header::fields_of(&self.header);
            fields.set("Last-Translator", format!("{name} <{email}>"));
            header::set_fields(&mut self.header, &fields);

            let mut comments = self.header.manual_comment().to_vec();
            let marker = format!("{name} <{email}>,");
            if let Some(existing) = comments
                .iter_mut()
                .find(|c| c.starts_with(&marker))
            {
                if !existing.contains(year) {
                    let trimmed = existing.trim_end_matches('.').to_string();
                    *existing = format!("{trimmed}, {year}.");
                }
            } else {
                comments.push(format!("{name} <{email}>, {year}."));
                self.header.set_manual_comment(comments);
            }
        }

        let mut fields = header::fields_of(&self.header);
        fields.set("PO-Revision-Date", revision_timestamp);
        header::set_fields(&mut self.header, &fields);
    }

    // --- selection queries --------------------------------------------

    pub fn select_by_key(&self, msgctxt: Option<&str>, msgid: &str) -> Option<&Message> {
        self.get(msgctxt, msgid)
    }

    /// Matches both `msgctxt` and `msgid` via regex (when `case` or a
    /// pattern is given) or falls back to an exact [`Self::get`] when
    /// both sides are plain strings.
    pub fn select_by_key_match<'a>(
        &'a self,
        ctx_pattern: Option<&str>,
        id_pattern: &str,
        exact_ctx: bool,
        exact_id: bool,
        case_sensitive: bool,
    ) -> Vec<&'a Message> {
        if exact_ctx && exact_id {
            return self.get(ctx_pattern, id_pattern).into_iter().collect();
        }
        let build = |pat: &str| -> Option<regex::Regex> {
            regex::RegexBuilder::new(pat)
                .case_insensitive(!case_sensitive)
                .build()
                .ok()
        };
        let ctx_re = if exact_ctx { None } else { ctx_pattern.and_then(build) };
        let id_re = if exact_id { None } else { build(id_pattern) };

        self.messages
            .iter()
            .filter(|m| {
                let ctx_ok = if exact_ctx {
                    m.msgctxt() == ctx_pattern
                } else if let Some(re) = &ctx_re {
                    re.is_match(m.msgctxt().unwrap_or(""))
                } else {
                    ctx_pattern.is_none()
                };
                let id_ok = if exact_id {
                    m.msgid() == id_pattern
                } else if let Some(re) = &id_re {
                    re.is_match(m.msgid())
                } else {
                    true
                };
                ctx_ok && id_ok
            })
            .collect()
    }

    pub fn select_by_msgid<'a>(&'a self, msgid: &str) -> Vec<&'a Message> {
        self.messages.iter().filter(|m| m.msgid() == msgid).collect()
    }

    /// Orders non-obsolete entries by decreasing string similarity of
    /// `msgid` to `needle` above `cutoff` (`[0.0, 1.0]`), grounded in
    /// `pology/catalog.py`'s use of `difflib.get_close_matches`.
    pub fn select_by_msgid_fuzzy<'a>(
        &'a self,
        needle: &str,
        cutoff: f64,
        wobs: bool,
    ) -> Vec<&'a Message> {
        let mut scored: Vec<(f64, &Message)> = self
            .messages
            .iter()
            .filter(|m| wobs || !m.obsolete())
            .map(|m| (strsim::normalized_levenshtein(needle, m.msgid()), m))
            .filter(|(score, _)| *score >= cutoff)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, m)| m).collect()
    }

    fn ensure_inverse_map(&mut self) {
        if self.inverse_map.is_some() {
            return;
        }
        let mut map: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, msg) in self.messages.iter().enumerate() {
            if let Some(first) = msg.msgstr_at(0) {
                map.entry(first.to_string()).or_default().push(i);
            }
        }
        self.inverse_map = Some(map);
    }

    pub fn select_by_msgstr(&mut self, msgstr: &str) -> Vec<&Message> {
        self.ensure_inverse_map();
        let indices = self
            .inverse_map
            .as_ref()
            .and_then(|m| m.get(msgstr))
            .cloned()
            .unwrap_or_default();
        indices.into_iter().map(|i| &self.messages[i]).collect()
    }

    pub fn translated_entries(&self, wobs: bool) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| (wobs || !m.obsolete()) && m.translated())
            .collect()
    }

    pub fn untranslated_entries(&self, wobs: bool) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| (wobs || !m.obsolete()) && m.untranslated())
            .collect()
    }

    pub fn obsolete_entries(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.obsolete()).collect()
    }

    pub fn fuzzy_entries(&self, wobs: bool) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| (wobs || !m.obsolete()) && m.fuzzy())
            .collect()
    }

    pub fn percent_translated(&self) -> f64 {
        let live: Vec<&Message> =
            self.messages.iter().filter(|m| !m.obsolete()).collect();
        if live.is_empty() {
            return 100.0;
        }
        let translated = live.iter().filter(|m| m.translated()).count();
        (translated as f64 / live.len() as f64) * 100.0
    }

    /// Groups non-obsolete messages by their first source-reference
    /// file, preserving first-appearance order of both files and
    /// messages within each file.
    pub fn messages_by_source(&self) -> Vec<(String, Vec<&Message>)> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&Message>> = HashMap::new();
        for msg in self.messages.iter().filter(|m| !m.obsolete()) {
            let Some(first) = msg.source().first() else {
                continue;
            };
            if !groups.contains_key(&first.path) {
                order.push(first.path.clone());
            }
            groups.entry(first.path.clone()).or_default().push(msg);
        }
        order
            .into_iter()
            .map(|file| {
                let msgs = groups.remove(&file).unwrap_or_default();
                (file, msgs)
            })
            .collect()
    }

    /// Sorts source references within each message, then sorts
    /// messages by `(lowercased primary file, line)`. Rebuilds the
    /// index (via `sync_map`) only if the order actually changed.
    pub fn sort_by_source(&mut self) {
        let mut changed = false;
        for msg in self.messages.iter_mut() {
            let mut refs = msg.source().to_vec();
            refs.sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));
            if refs != msg.source() {
                msg.set_source(refs);
                changed = true;
            }
        }

        let key_of = |m: &Message| -> (String, u32) {
            match m.source().first() {
                Some(r) => (r.path.to_lowercase(), r.line.unwrap_or(0)),
                None => (String::new(), 0),
            }
        };
        let before: Vec<String> = self.messages.iter().map(|m| m.key()).collect();
        self.messages
            .sort_by(|a, b| key_of(a).cmp(&key_of(b)));
        let after: Vec<String> = self.messages.iter().map(|m| m.key()).collect();
        if changed || before != after {
            self.sync_map();
        }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clone_header = self.header.clone();
        write!(f, "{}", clone_header.render(self.wrapwidth, true))?;
        writeln!(f)?;
        for msg in &self.messages {
            let mut clone = msg.clone();
            write!(f, "{}", clone.render(self.wrapwidth, true))?;
            writeln!(f)?;
        }
        if let Some(tail) = &self.tail {
            write!(f, "{tail}")?;
        }
        Ok(())
    }
}

impl PartialEq for Catalog {
    /// Two catalogs are equal iff they have the same length, equal
    /// headers (fields compared as an ordered list, so the same
    /// fields in a different order make headers unequal), and
    /// pairwise-equal entries at every position (SPEC_FULL.md 3,
    /// "Equality"; §9 Open Question 3).
    fn eq(&self, other: &Self) -> bool {
        if self.messages.len() != other.messages.len() {
            return false;
        }
        let self_fields = header::fields_of(&self.header);
        let other_fields = header::fields_of(&other.header);
        if self_fields != other_fields {
            return false;
        }
        self.messages
            .iter()
            .zip(other.messages.iter())
            .all(|(a, b)| a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = concat!(
        "msgid \"\"\n",
        "msgstr \"Content-Type: text/plain; charset=UTF-8\\n",
        "Plural-Forms: nplurals=2; plural=(n != 1);\\n\"\n",
        "\n",
        "msgid \"hello\"\n",
        "msgstr \"bonjour\"\n",
        "\n",
        "#~ msgid \"gone\"\n",
        "#~ msgstr \"parti\"\n",
    );

    #[test]
    fn loads_and_indexes_entries() {
        let catalog = Catalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get(None, "hello").unwrap().msgstr_at(0),
            Some("bonjour")
        );
        assert_eq!(catalog.position_of(None, "hello"), Some(0));
    }

    #[test]
    fn roundtrip_without_mutation_preserves_bytes() {
        let mut catalog = Catalog::parse(SAMPLE).unwrap();
        let out = catalog.sync(SyncOptions {
            force: false,
            fitplural: false,
            noobsend: true,
        });
        assert_eq!(out.trim_end(), SAMPLE.trim_end());
    }

    #[test]
    fn obsolete_hoist_moves_misplaced_obsolete_to_end() {
        let src = concat!(
            "msgid \"\"\nmsgstr \"\"\n\n",
            "msgid \"m1\"\nmsgstr \"t1\"\n\n",
            "#~ msgid \"m2\"\n#~ msgstr \"t2\"\n\n",
            "msgid \"m3\"\nmsgstr \"t3\"\n",
        );
        let mut catalog = Catalog::parse(src).unwrap();
        catalog.sync(SyncOptions::default());
        let ids: Vec<&str> = catalog.messages().iter().map(|m| m.msgid()).collect();
        assert_eq!(ids, vec!["m1", "m3", "m2"]);
    }

    #[test]
    fn plural_fitting_resizes_empty_plural_msgstr() {
        let src = concat!(
            "msgid \"\"\n",
            "msgstr \"Plural-Forms: nplurals=3; plural=n==1 ? 0 : 2;\\n\"\n",
            "\n",
            "msgid \"file\"\nmsgid_plural \"files\"\n",
            "msgstr[0] \"\"\nmsgstr[1] \"\"\n",
        );
        let mut catalog = Catalog::parse(src).unwrap();
        catalog.sync(SyncOptions {
            force: false,
            fitplural: true,
            noobsend: true,
        });
        assert_eq!(catalog.get(None, "file").unwrap().msgstr().len(), 3);
    }

    #[test]
    fn delayed_removal_happens_on_sync() {
        let mut catalog = Catalog::parse(SAMPLE).unwrap();
        catalog.remove_on_sync(None, "hello");
        assert!(catalog.get(None, "hello").is_some());
        catalog.sync_map();
        assert!(catalog.get(None, "hello").is_none());
    }

    #[test]
    fn update_header_langcode_then_language_round_trips() {
        let mut catalog = Catalog::parse(SAMPLE).unwrap();
        catalog.update_header(
            None, None, Some("fr"), None, None, None, None, None, "2024", "2024-01-01 00:00+0000",
        );
        assert_eq!(catalog.language(), Some("fr".to_string()));
    }

    #[test]
    fn equality_considers_header_field_order() {
        let a = Catalog::parse(SAMPLE).unwrap();
        let b = Catalog::parse(SAMPLE).unwrap();
        assert!(a == b);
    }
}
