//! The rule DSL parser: tokenizer and directive dispatcher over rule
//! files, SPEC_FULL.md 4.4.
//!
//! Grounded in `misc/rules.py`'s `_parseRuleLine`/`_findEndQuote`
//! (tokenizer) and `loadRulesFromFile` (directive dispatcher).
//! `include` is resolved by pre-expanding the line stream (splicing
//! an included file's tokenized lines in place) rather than by the
//! source's mutable file-stack, which is behaviorally equivalent
//! since both approaches process the spliced lines strictly in
//! order and share the same rule/group-building state across the
//! splice point.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use super::filters::{
    self, compose_on_parts, compose_pattern_filter, filter_record, parse_general_fields,
    signature_with_parts, FilterKind, FilterRecord, FilterRegistry, FilterStack,
};
use super::hook::HookRegistry;
use super::{MsgFilter, PatternFilter, Rule, TriggerPart};
use crate::errors::{IOError, IdentError, MaybeFilename, RuleSyntaxError};

lazy_static! {
    static ref FIELD_NAME_RX: Regex = Regex::new(r"^!?[a-z][\w-]*$").unwrap();
}

/// One field parsed off a rule-file line: either the trigger pair
/// (`_rule_start` in the source) or a plain `name[=value]` field.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParsedField {
    Trigger {
        part: String,
        pattern: String,
        mods: String,
    },
    Named {
        name: String,
        value: Option<String>,
    },
}

/// Scans the matching close-quote for the quote character at
/// `chars[pos]`, unescaping `\<quote>` to the literal quote and
/// leaving any other backslash escape untouched (SPEC_FULL.md 4.4
/// Quoted value escapes). Returns the close-quote index and the
/// unescaped value.
fn find_end_quote(chars: &[char], pos: usize) -> Result<(usize, String), String> {
    let quote = chars[pos];
    let mut epos = pos + 1;
    let llen = chars.len();
    let mut out = String::new();
    while epos < llen {
        let c = chars[epos];
        if c == '\\' {
            epos += 1;
            if epos >= llen {
                break;
            }
            let c2 = chars[epos];
            if c2 != quote {
                out.push(c);
            }
            out.push(c2);
        } else if c == quote {
            return Ok((epos, out));
        } else {
            out.push(c);
        }
        epos += 1;
    }
    Err("non-terminated quoted string".to_string())
}

/// Tokenizes one already-continuation-joined logical line. Grounded
/// in `_parseRuleLine`.
fn tokenize_line(line: &str) -> Result<Vec<ParsedField>, String> {
    let chars: Vec<char> = line.chars().collect();
    let llen = chars.len();
    let mut fields: Vec<ParsedField> = Vec::new();
    let mut p = 0usize;
    let mut in_modifiers = false;

    while p < llen {
        while p < llen && chars[p].is_whitespace() {
            p += 1;
        }
        if p >= llen || chars[p] == '#' {
            break;
        }

        if fields.is_empty() && (chars[p] == '[' || chars[p] == '{') {
            let bropn = chars[p];
            let (brcls, fname) = if bropn == '{' { ('}', "msgid") } else { (']', "msgstr") };
            let p1 = p + 1;
            let mut balance = 1i32;
            loop {
                p += 1;
                if p >= llen {
                    break;
                }
                if chars[p] == bropn {
                    balance += 1;
                } else if chars[p] == brcls {
                    balance -= 1;
                    if balance == 0 {
                        break;
                    }
                }
            }
            if balance > 0 {
                return Err("unbalanced brackets in shorthand trigger pattern".to_string());
            }
            let pattern: String = chars[p1..p].iter().collect();
            fields.push(ParsedField::Trigger {
                part: fname.to_string(),
                pattern,
                mods: String::new(),
            });
            p += 1;
            in_modifiers = true;
        } else if fields.is_empty() && chars[p] == '*' {
            p += 1;
            while p < llen && chars[p].is_whitespace() {
                p += 1;
            }
            if p >= llen {
                return Err("missing match keyword in trigger pattern".to_string());
            }
            let p1 = p;
            while p < llen && (chars[p].is_alphanumeric() || chars[p] == '_') {
                p += 1;
            }
            let fname: String = chars[p1..p].iter().collect();
            while p < llen && chars[p].is_whitespace() {
                p += 1;
            }
            if p >= llen {
                return Err("no pattern after the trigger keyword".to_string());
            }
            let (end, unescaped) = find_end_quote(&chars, p)?;
            fields.push(ParsedField::Trigger {
                part: fname,
                pattern: unescaped,
                mods: String::new(),
            });
            p = end + 1;
            in_modifiers = true;
        } else if in_modifiers {
            let p1 = p;
            while p < llen && !chars[p].is_whitespace() {
                p += 1;
            }
            let mods: String = chars[p1..p].iter().collect();
            if let Some(ParsedField::Trigger { mods: m, .. }) = fields.last_mut() {
                m.push_str(&mods);
            }
        } else {
            let p1 = p;
            while p < llen && !chars[p].is_whitespace() && chars[p] != '=' {
                p += 1;
            }
            let fname: String = chars[p1..p].iter().collect();
            if !FIELD_NAME_RX.is_match(&fname) {
                return Err(format!("invalid field name: {fname}"));
            }
            if p >= llen || chars[p].is_whitespace() {
                fields.push(ParsedField::Named { name: fname, value: None });
            } else {
                p += 1; // skip '='
                if p >= llen || chars[p].is_whitespace() {
                    fields.push(ParsedField::Named {
                        name: fname,
                        value: Some(String::new()),
                    });
                } else {
                    let (end, unescaped) = find_end_quote(&chars, p)?;
                    fields.push(ParsedField::Named {
                        name: fname,
                        value: Some(unescaped),
                    });
                    p = end + 1;
                }
            }
        }
    }

    Ok(fields)
}

/// One tokenized logical line plus the physical position it started
/// at, for diagnostics, and the file it came from (after include
/// splicing).
struct RuleLine {
    fields: Vec<ParsedField>,
    lineno: usize,
    filepath: String,
    comment_only: bool,
}

fn join_continuations(text: &str) -> Vec<(usize, String)> {
    let raw: Vec<&str> = text.lines().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let start_lno = i + 1;
        let mut joined = String::new();
        loop {
            let line = raw[i];
            if let Some(stripped) = line.strip_suffix('\\') {
                joined.push_str(stripped);
                i += 1;
                if i >= raw.len() {
                    break;
                }
            } else {
                joined.push_str(line);
                i += 1;
                break;
            }
        }
        out.push((start_lno, joined));
    }
    out.push((raw.len() + 1, String::new())); // sentinel blank line
    out
}

/// Error union for rule-file loading: I/O failure reading the file
/// or an included file, a tokenizer/directive syntax error, or a
/// duplicate rule identifier.
#[derive(Debug)]
pub enum RuleFileError {
    Io(IOError),
    Syntax(RuleSyntaxError),
    Ident(IdentError),
}

impl fmt::Display for RuleFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleFileError::Io(e) => write!(f, "{e}"),
            RuleFileError::Syntax(e) => write!(f, "{e}"),
            RuleFileError::Ident(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RuleFileError {}

impl From<RuleSyntaxError> for RuleFileError {
    fn from(e: RuleSyntaxError) -> Self {
        RuleFileError::Syntax(e)
    }
}

impl From<IdentError> for RuleFileError {
    fn from(e: IdentError) -> Self {
        RuleFileError::Ident(e)
    }
}

fn expand_includes(
    path: &Path,
    seen: &mut Vec<PathBuf>,
) -> Result<Vec<RuleLine>, RuleFileError> {
    let filepath = path.to_string_lossy().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| {
        RuleFileError::Io(IOError::Read {
            path: filepath.clone(),
            source,
        })
    })?;
    seen.push(path.to_path_buf());

    let mut out = Vec::new();
    for (lineno, line) in join_continuations(&content) {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            continue;
        }
        let fields = tokenize_line(&line).map_err(|_| {
            RuleSyntaxError::UnbalancedBrackets {
                maybe_filename: MaybeFilename::new(&filepath, true),
                line: lineno,
            }
        })?;

        let is_include = matches!(
            fields.first(),
            Some(ParsedField::Named { name, .. }) if name == "include"
        );
        if is_include {
            let file_field = fields.iter().find_map(|f| match f {
                ParsedField::Named { name, value } if name == "file" => value.clone(),
                _ => None,
            });
            let relative = file_field.ok_or_else(|| {
                RuleSyntaxError::UnknownDirective {
                    maybe_filename: MaybeFilename::new(&filepath, true),
                    line: lineno,
                    keyword: "include (missing 'file' field)".to_string(),
                }
            })?;
            let included_path = if Path::new(&relative).is_absolute() {
                PathBuf::from(&relative)
            } else {
                path.parent().unwrap_or(Path::new(".")).join(&relative)
            };
            if included_path.extension().map(|e| e == "rules").unwrap_or(false) {
                log::warn!(
                    "including one rules file into another, '{}' from '{}'",
                    included_path.display(),
                    filepath
                );
            }
            let nested = expand_includes(&included_path, seen)?;
            out.extend(nested);
            continue;
        }

        out.push(RuleLine {
            fields,
            lineno,
            filepath: filepath.clone(),
            comment_only: false,
        });
    }
    Ok(out)
}

/// Per-file accumulation of rules, shared across a `loadRules`-style
/// multi-file load via the caller-provided [`FilterRegistry`].
#[derive(Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

#[derive(Default, Clone)]
struct RuleBuilder {
    active: bool,
    valid: Vec<Vec<(String, String)>>,
    pattern: String,
    msgpart: String,
    hint: Option<String>,
    id: Option<String>,
    disabled: bool,
    casesens: bool,
    environ: Option<String>,
    local_msg_filters: Option<Vec<(FilterRecord, MsgFilter)>>,
    local_pattern_filters: Option<Vec<(FilterRecord, PatternFilter)>>,
}

impl RuleBuilder {
    fn reset(&mut self) {
        *self = RuleBuilder {
            casesens: true,
            ..Default::default()
        };
    }
}

struct LoadState<'a> {
    registry: &'a HookRegistry,
    filters: &'a mut FilterRegistry,
    stat: bool,
    env: Option<&'a str>,
    global_msg_filters: Vec<(FilterRecord, MsgFilter)>,
    global_pattern_filters: Vec<(FilterRecord, PatternFilter)>,
    global_environ: Option<String>,
    valid_groups: HashMap<String, Vec<Vec<(String, String)>>>,
    ident_lines: HashMap<String, (usize, Option<String>)>,
}

/// Loads and parses a `.rules` file (with `include` splicing already
/// resolved), returning the rules it defines. Mirrors
/// `loadRulesFromFile`; `filters` is expected to be shared across a
/// `loadRules`-style batch of files so identical filter pipelines are
/// composed once (SPEC_FULL.md 4.4 Filter deduplication).
pub fn load_rules_file(
    path: &Path,
    registry: &HookRegistry,
    filters: &mut FilterRegistry,
    stat: bool,
    env: Option<&str>,
) -> Result<RuleSet, RuleFileError> {
    let lines = expand_includes(path, &mut Vec::new())?;
    parse_lines(&lines, registry, filters, stat, env)
}

/// Parses rule-file text already loaded into memory (no `include`
/// resolution; a rule file that uses `include` must go through
/// [`load_rules_file`]). Useful for in-memory fixtures and tests.
pub fn parse_rules_str(
    text: &str,
    filename: &str,
    registry: &HookRegistry,
    filters: &mut FilterRegistry,
    stat: bool,
    env: Option<&str>,
) -> Result<RuleSet, RuleFileError> {
    let mut lines = Vec::new();
    for (lineno, line) in join_continuations(text) {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            continue;
        }
        let fields = tokenize_line(&line).map_err(|_| {
            RuleSyntaxError::UnbalancedBrackets {
                maybe_filename: MaybeFilename::new(filename, true),
                line: lineno,
            }
        })?;
        if matches!(fields.first(), Some(ParsedField::Named { name, .. }) if name == "include") {
            return Err(RuleFileError::Syntax(RuleSyntaxError::UnknownDirective {
                maybe_filename: MaybeFilename::new(filename, true),
                line: lineno,
                keyword: "include (use load_rules_file for files with includes)".to_string(),
            }));
        }
        lines.push(RuleLine {
            fields,
            lineno,
            filepath: filename.to_string(),
            comment_only: false,
        });
    }
    parse_lines(&lines, registry, filters, stat, env)
}

fn parse_lines(
    lines: &[RuleLine],
    registry: &HookRegistry,
    filters: &mut FilterRegistry,
    stat: bool,
    env: Option<&str>,
) -> Result<RuleSet, RuleFileError> {
    let mut state = LoadState {
        registry,
        filters,
        stat,
        env,
        global_msg_filters: Vec::new(),
        global_pattern_filters: Vec::new(),
        global_environ: None,
        valid_groups: HashMap::new(),
        ident_lines: HashMap::new(),
    };

    let mut rules = Vec::new();
    let mut rule = RuleBuilder {
        casesens: true,
        ..Default::default()
    };
    let mut in_group = false;
    let mut group_name = String::new();

    for line in lines {
        if line.comment_only {
            continue;
        }

        let starts_block = line.fields.is_empty() || matches!(line.fields.first(), Some(ParsedField::Trigger { .. }));
        if starts_block {
            if rule.active {
                finalize_rule(&mut rule, &mut state, &mut rules)?;
            } else if in_group {
                state.valid_groups.insert(std::mem::take(&mut group_name), std::mem::take(&mut rule.valid));
                in_group = false;
            }
            rule.valid.clear();
        }

        if line.fields.is_empty() {
            continue;
        }

        match &line.fields[0] {
            ParsedField::Trigger { part, pattern, mods } => {
                rule.active = true;
                if TriggerPart::parse(part).is_none() {
                    return Err(RuleSyntaxError::UnknownMessagePart {
                        maybe_filename: MaybeFilename::new(&line.filepath, true),
                        line: line.lineno,
                        part: part.clone(),
                    }
                    .into());
                }
                rule.msgpart = part.clone();
                rule.pattern = pattern.clone();
                rule.casesens = !mods.contains('i');
            }

            ParsedField::Named { name, value } if name == "valid" => {
                if !rule.active && !in_group {
                    return Err(RuleSyntaxError::UnknownDirective {
                        maybe_filename: MaybeFilename::new(&line.filepath, true),
                        line: line.lineno,
                        keyword: "valid (outside of rule or validity group)".to_string(),
                    }
                    .into());
                }
                let _ = value;
                let entry: Vec<(String, String)> = line.fields[1..]
                    .iter()
                    .map(|f| match f {
                        ParsedField::Named { name, value } => {
                            (name.clone(), value.clone().unwrap_or_default())
                        }
                        ParsedField::Trigger { .. } => unreachable!(),
                    })
                    .collect();
                rule.valid.push(entry);
            }

            ParsedField::Named { name, value } if name == "hint" => {
                require_in_rule(rule.active, "hint", line)?;
                rule.hint = value.clone();
            }

            ParsedField::Named { name, value: _ } if name == "id" => {
                require_in_rule(rule.active, "id", line)?;
                let ident_value = field_value(&line.fields, 0);
                if let Some(ident) = ident_value {
                    if let Some((prev_line, prev_environ)) = state.ident_lines.get(&ident) {
                        if *prev_environ == state.global_environ {
                            return Err(IdentError {
                                maybe_filename: MaybeFilename::new(&line.filepath, true),
                                id: ident,
                                line: line.lineno,
                                prev_line: *prev_line,
                            }
                            .into());
                        }
                    }
                    state.ident_lines.insert(ident.clone(), (line.lineno, state.global_environ.clone()));
                    rule.id = Some(ident);
                }
            }

            ParsedField::Named { name, .. } if name == "disabled" => {
                require_in_rule(rule.active, "disabled", line)?;
                rule.disabled = true;
            }

            ParsedField::Named { name, .. } if name == "validGroup" => {
                if in_group {
                    return Err(RuleSyntaxError::UnknownDirective {
                        maybe_filename: MaybeFilename::new(&line.filepath, true),
                        line: line.lineno,
                        keyword: "validGroup (inside a validity group)".to_string(),
                    }
                    .into());
                }
                let target = field_value(&line.fields, 1).ok_or_else(|| RuleSyntaxError::UndefinedGroup {
                    maybe_filename: MaybeFilename::new(&line.filepath, true),
                    line: line.lineno,
                    name: String::new(),
                })?;
                if rule.active {
                    let group = state.valid_groups.get(&target).ok_or_else(|| RuleSyntaxError::UndefinedGroup {
                        maybe_filename: MaybeFilename::new(&line.filepath, true),
                        line: line.lineno,
                        name: target.clone(),
                    })?;
                    rule.valid.extend(group.clone());
                } else {
                    in_group = true;
                    group_name = target;
                }
            }

            ParsedField::Named { name, .. } if name == "environment" => {
                if in_group {
                    return Err(RuleSyntaxError::UnknownDirective {
                        maybe_filename: MaybeFilename::new(&line.filepath, true),
                        line: line.lineno,
                        keyword: "environment (inside a validity group)".to_string(),
                    }
                    .into());
                }
                let env_name = field_value(&line.fields, 1);
                if rule.active {
                    rule.environ = env_name;
                } else {
                    state.global_environ = env_name;
                }
            }

            ParsedField::Named { name, .. }
                if name.starts_with("addFilter") || name == "removeFilter" || name == "clearFilters" =>
            {
                handle_filter_directive(name, &line.fields[1..], &mut rule, &mut state, line)?;
            }

            ParsedField::Named { name, .. } => {
                return Err(RuleSyntaxError::UnknownDirective {
                    maybe_filename: MaybeFilename::new(&line.filepath, true),
                    line: line.lineno,
                    keyword: name.clone(),
                }
                .into());
            }
        }
    }

    if rule.active {
        finalize_rule(&mut rule, &mut state, &mut rules)?;
    }

    Ok(RuleSet { rules })
}

fn require_in_rule(active: bool, directive: &str, line: &RuleLine) -> Result<(), RuleFileError> {
    if active {
        Ok(())
    } else {
        Err(RuleSyntaxError::UnknownDirective {
            maybe_filename: MaybeFilename::new(&line.filepath, true),
            line: line.lineno,
            keyword: format!("{directive} (outside of rule)"),
        }
        .into())
    }
}

fn field_value(fields: &[ParsedField], index: usize) -> Option<String> {
    match fields.get(index) {
        Some(ParsedField::Named { value, .. }) => value.clone(),
        _ => None,
    }
}

fn handle_filter_directive(
    directive: &str,
    rest_fields: &[ParsedField],
    rule: &mut RuleBuilder,
    state: &mut LoadState,
    line: &RuleLine,
) -> Result<(), RuleFileError> {
    let current_environ = rule.environ.clone().or_else(|| state.global_environ.clone());

    if rule.active {
        if rule.local_msg_filters.is_none() {
            rule.local_msg_filters = Some(state.global_msg_filters.clone());
        }
        if rule.local_pattern_filters.is_none() {
            rule.local_pattern_filters = Some(state.global_pattern_filters.clone());
        }
    }

    let (msg_filters, pattern_filters): (&mut Vec<_>, &mut Vec<_>) = if rule.active {
        (
            rule.local_msg_filters.as_mut().unwrap(),
            rule.local_pattern_filters.as_mut().unwrap(),
        )
    } else {
        (&mut state.global_msg_filters, &mut state.global_pattern_filters)
    };

    let raw_fields: Vec<(String, Option<String>)> = rest_fields
        .iter()
        .map(|f| match f {
            ParsedField::Named { name, value } => (name.clone(), value.clone()),
            ParsedField::Trigger { .. } => unreachable!(),
        })
        .collect();

    if let Some(filter_type) = directive.strip_prefix("addFilter") {
        let general = parse_general_fields(&raw_fields).map_err(|message| custom_error(line, message))?;
        let mut environments = general.environments.clone();
        if environments.is_none() {
            if let Some(env) = &current_environ {
                environments = Some(vec![env.clone()]);
            }
        }

        let kind = match filter_type {
            "Regex" => {
                let (func, sig) = filters::create_regex_filter(&general.rest)
                    .map_err(|message| custom_error(line, message))?;
                (FilterKind::Regex(func), sig)
            }
            "Hook" => filters::create_hook_filter(state.registry, &general.rest)
                .map_err(|message| custom_error(line, message))?,
            other => {
                return Err(RuleSyntaxError::UnknownFilterType {
                    maybe_filename: MaybeFilename::new(&line.filepath, true),
                    line: line.lineno,
                    filter_type: other.to_string(),
                }
                .into())
            }
        };
        let (kind, base_sig) = kind;

        let msg_parts: Vec<_> = general
            .parts
            .iter()
            .copied()
            .filter(|p| *p != super::filters::FilterOn::Pattern)
            .collect();
        if !msg_parts.is_empty() {
            let sig = signature_with_parts(&base_sig, &msg_parts);
            let record = filter_record(general.handles.clone(), environments.clone(), sig, msg_parts.clone());
            msg_filters.push((record, compose_on_parts(kind.clone(), &msg_parts)));
        }
        let pattern_parts: Vec<_> = general
            .parts
            .iter()
            .copied()
            .filter(|p| *p == super::filters::FilterOn::Pattern)
            .collect();
        if !pattern_parts.is_empty() && (state.env.is_none() || environments.as_ref().map(|e| state.env.map(|se| e.iter().any(|n| n == se)).unwrap_or(false)).unwrap_or(true)) {
            let sig = signature_with_parts(&base_sig, &pattern_parts);
            let record = filter_record(general.handles, environments, sig, pattern_parts.clone());
            pattern_filters.push((record, compose_pattern_filter(kind)));
        }
    } else if directive == "removeFilter" {
        let handle_field = raw_fields
            .iter()
            .find(|(n, _)| n == "handle")
            .and_then(|(_, v)| v.clone())
            .ok_or_else(|| custom_error(line, "mandatory field 'handle' missing in removeFilter directive".to_string()))?;
        let env_field = raw_fields.iter().find(|(n, _)| n == "env").and_then(|(_, v)| v.clone());
        let handles: HashSet<String> = handle_field.split(',').map(|s| s.trim().to_string()).collect();

        let mut stack = FilterStack {
            msg: std::mem::take(msg_filters),
            pattern: std::mem::take(pattern_filters),
        };
        let unseen = stack.remove(&handles, env_field.as_deref(), current_environ.as_deref());
        *msg_filters = stack.msg;
        *pattern_filters = stack.pattern;
        if !unseen.is_empty() {
            return Err(custom_error(
                line,
                format!(
                    "no filters with these handles to remove: {}",
                    unseen.into_iter().collect::<Vec<_>>().join(", ")
                ),
            )
            .into());
        }
    } else {
        // clearFilters
        if !raw_fields.is_empty() {
            return Err(custom_error(line, "expected no fields in all-filter removal directive".to_string()).into());
        }
        msg_filters.clear();
        pattern_filters.clear();
    }

    Ok(())
}

fn finalize_rule(
    rule: &mut RuleBuilder,
    state: &mut LoadState,
    rules: &mut Vec<Rule>,
) -> Result<(), RuleFileError> {
    let msg_stack = rule
        .local_msg_filters
        .take()
        .unwrap_or_else(|| state.global_msg_filters.clone());
    let pattern_stack = rule
        .local_pattern_filters
        .take()
        .unwrap_or_else(|| state.global_pattern_filters.clone());

    let mfilter = state.filters.compose_message(&msg_stack);
    let rfilter = state.filters.compose_pattern(&pattern_stack);

    let Some(part) = TriggerPart::parse(&rule.msgpart) else {
        rule.reset();
        return Ok(());
    };

    let built = Rule::new(
        &rule.pattern,
        part,
        rule.hint.clone(),
        rule.valid.clone(),
        state.stat,
        rule.casesens,
        rule.id.clone(),
        rule.disabled,
        rule.environ.clone().or_else(|| state.global_environ.clone()),
        mfilter,
        rfilter.as_ref(),
    );
    rules.push(built);
    rule.reset();
    Ok(())
}

fn custom_error(line: &RuleLine, message: String) -> RuleSyntaxError {
    RuleSyntaxError::Custom {
        maybe_filename: MaybeFilename::new(&line.filepath, true),
        line: line.lineno,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_shorthand_msgid_trigger() {
        let fields = tokenize_line(r"{\bfoo}i").unwrap();
        assert_eq!(
            fields,
            vec![ParsedField::Trigger {
                part: "msgid".to_string(),
                pattern: r"\bfoo".to_string(),
                mods: "i".to_string(),
            }]
        );
    }

    #[test]
    fn tokenizes_shorthand_msgstr_trigger() {
        let fields = tokenize_line(r"[\bbar]").unwrap();
        assert_eq!(
            fields,
            vec![ParsedField::Trigger {
                part: "msgstr".to_string(),
                pattern: r"\bbar".to_string(),
                mods: String::new(),
            }]
        );
    }

    #[test]
    fn tokenizes_verbose_trigger() {
        let fields = tokenize_line(r"*msgctxt/foo/i").unwrap();
        assert_eq!(
            fields,
            vec![ParsedField::Trigger {
                part: "msgctxt".to_string(),
                pattern: "foo".to_string(),
                mods: "i".to_string(),
            }]
        );
    }

    #[test]
    fn tokenizes_valid_directive() {
        let fields = tokenize_line(r#"valid msgstr="\bbar""#).unwrap();
        assert_eq!(
            fields,
            vec![
                ParsedField::Named {
                    name: "valid".to_string(),
                    value: None,
                },
                ParsedField::Named {
                    name: "msgstr".to_string(),
                    value: Some(r"\bbar".to_string()),
                },
            ]
        );
    }

    #[test]
    fn unbalanced_brackets_error() {
        assert!(tokenize_line(r"{\bfoo").is_err());
    }

    #[test]
    fn parses_simple_rule() {
        let text = "{\\bfoo}i\nvalid msgstr=\"\\bbar\"\nhint=\"say bar instead\"\n";
        let registry = HookRegistry::new();
        let mut filters = FilterRegistry::new();
        let set = parse_rules_str(text, "t.rules", &registry, &mut filters, false, None).unwrap();
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.rules[0].hint.as_deref(), Some("say bar instead"));
        assert!(!set.rules[0].casesens);
    }

    #[test]
    fn duplicate_ident_errors() {
        let text = "{a}\nid=\"x\"\n\n{b}\nid=\"x\"\n";
        let registry = HookRegistry::new();
        let mut filters = FilterRegistry::new();
        let err = parse_rules_str(text, "t.rules", &registry, &mut filters, false, None);
        assert!(matches!(err, Err(RuleFileError::Ident(_))));
    }
}
