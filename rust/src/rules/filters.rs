//! Filter directive construction and deduplicated composition,
//! SPEC_FULL.md 3 (Filter set), 4.4 (Filter construction/deduplication).
//!
//! Grounded in `misc/rules.py`'s `_filterCreateRegex`/`_filterCreateHook`,
//! `_msgFilterSetOnParts`/`_msgFilterComposeFinal`,
//! `_ruleFilterSetOnParts`/`_ruleFilterComposeFinal`, and `_filterFinalSig`.

use std::collections::HashMap;
use std::collections::HashSet;
use std::rc::Rc;

use regex::{Regex, RegexBuilder};

use super::hook::{Hook, HookRegistry};
use super::{MsgFilter, PatternFilter};
use crate::catalog::Catalog;
use crate::message::Message;

/// A message part a filter can edit, `_filterKnownMsgParts` plus the
/// rule-string part `pattern` (`_filterKnownRuleParts`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOn {
    Msg,
    Msgid,
    Msgstr,
    PMsgid,
    PMsgstr,
    Pattern,
}

impl FilterOn {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "msg" => Some(Self::Msg),
            "msgid" => Some(Self::Msgid),
            "msgstr" => Some(Self::Msgstr),
            "pmsgid" => Some(Self::PMsgid),
            "pmsgstr" => Some(Self::PMsgstr),
            "pattern" => Some(Self::Pattern),
            _ => None,
        }
    }

    fn is_msg_part(self) -> bool {
        !matches!(self, Self::Pattern)
    }
}

/// One registered filter: the handles it can be removed by, the
/// environments it is restricted to (`None` = all), the composed
/// function, and its dedup signature.
#[derive(Clone)]
pub struct FilterRecord {
    pub handles: HashSet<String>,
    pub environments: Option<Vec<String>>,
    pub signature: String,
    on_parts: Vec<FilterOn>,
}

/// An in-flight filter directive list, split into the message-filter
/// records and the pattern-filter records that apply to the rules
/// that follow (global scope) or a single rule (local scope),
/// mirroring `globalMsgFilters`/`msgFilters` and
/// `globalRuleFilters`/`ruleFilters` in `loadRulesFromFile`.
#[derive(Clone, Default)]
pub struct FilterStack {
    pub msg: Vec<(FilterRecord, MsgFilter)>,
    pub pattern: Vec<(FilterRecord, PatternFilter)>,
}

impl FilterStack {
    pub fn clear(&mut self) {
        self.msg.clear();
        self.pattern.clear();
    }

    /// Removes every filter record carrying one of `handles`, within
    /// `env` (skip entirely if `env_field` names environments that
    /// don't include the operating environment). Returns handles that
    /// matched nothing, for the caller to report as an error.
    pub fn remove(
        &mut self,
        handles: &HashSet<String>,
        env_field: Option<&str>,
        operating_env: Option<&str>,
    ) -> HashSet<String> {
        if let Some(fenv) = env_field {
            let listed: Vec<&str> = fenv.split(',').map(str::trim).collect();
            let active = operating_env
                .map(|e| listed.contains(&e))
                .unwrap_or(false);
            if !active {
                return HashSet::new();
            }
        }

        let mut seen = HashSet::new();
        self.msg.retain(|(rec, _)| {
            let common: HashSet<_> = rec.handles.intersection(handles).cloned().collect();
            if common.is_empty() {
                true
            } else {
                seen.extend(common);
                false
            }
        });
        self.pattern.retain(|(rec, _)| {
            let common: HashSet<_> = rec.handles.intersection(handles).cloned().collect();
            if common.is_empty() {
                true
            } else {
                seen.extend(common);
                false
            }
        });
        handles.difference(&seen).cloned().collect()
    }
}

/// A parsed `on=`/`handle=`/`env=` prelude common to every filter
/// directive, with the directive-specific fields left over in `rest`.
/// Grounded in `_filterParseGeneral`.
pub struct GeneralFields {
    pub handles: HashSet<String>,
    pub parts: Vec<FilterOn>,
    pub environments: Option<Vec<String>>,
    pub rest: Vec<(String, String)>,
}

pub fn parse_general_fields(fields: &[(String, Option<String>)]) -> Result<GeneralFields, String> {
    let mut handles = HashSet::new();
    let mut parts = Vec::new();
    let mut environments = None;
    let mut rest = Vec::new();

    for (name, value) in fields {
        let value = value.clone().unwrap_or_default();
        match name.as_str() {
            "handle" => {
                handles = value.split(',').map(|s| s.trim().to_string()).collect();
            }
            "on" => {
                parts.clear();
                for part in value.split(',').map(str::trim) {
                    match FilterOn::parse(part) {
                        Some(p) => parts.push(p),
                        None => return Err(format!("unknown part for filter to act on: {part}")),
                    }
                }
            }
            "env" => {
                environments = Some(value.split(',').map(|s| s.trim().to_string()).collect());
            }
            _ => rest.push((name.clone(), value)),
        }
    }

    if parts.is_empty() {
        return Err("no parts specified for the filter to act on".to_string());
    }

    Ok(GeneralFields {
        handles,
        parts,
        environments,
        rest,
    })
}

/// Builds the regex-substitution function and its signature for
/// `addFilterRegex`. Grounded in `_filterCreateRegex`.
pub fn create_regex_filter(rest: &[(String, String)]) -> Result<(Rc<dyn Fn(&str) -> String>, String), String> {
    let mut match_str = None;
    let mut repl = String::new();
    let mut case_sens = false;
    for (name, value) in rest {
        match name.as_str() {
            "match" => match_str = Some(value.clone()),
            "repl" => repl = value.clone(),
            "case" => case_sens = parse_fancy_bool(value)?,
            other => return Err(format!("unknown field '{other}' in addFilterRegex directive")),
        }
    }
    let match_str = match_str.ok_or_else(|| "mandatory field 'match' missing".to_string())?;

    let re = RegexBuilder::new(&match_str)
        .case_insensitive(!case_sens)
        .build()
        .map_err(|e| e.to_string())?;

    let signature = format!("{match_str}\u{4}{repl}\u{4}{case_sens}");
    let func: Rc<dyn Fn(&str) -> String> = Rc::new(move |text: &str| re.replace_all(text, repl.as_str()).into_owned());
    Ok((func, signature))
}

fn parse_fancy_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(format!("cannot ascribe boolean value to '{other}'")),
    }
}

/// A text-only function, the common shape of both a resolved direct
/// hook and the output of `addFilterRegex`.
pub type TextFunc = Rc<dyn Fn(&str) -> Option<String>>;

/// Builds a text filter and its signature for `addFilterHook`.
/// Grounded in `_filterCreateHook`; only [`Hook::PureText`] and
/// [`Hook::FromText`] hooks are usable as message-part filters here
/// (a `Hook::Mutating` hook is wired up through [`FilterOn::Msg`]
/// separately since it needs the whole message, not a text slot).
pub fn create_hook_filter(
    registry: &HookRegistry,
    rest: &[(String, String)],
) -> Result<(FilterKind, String), String> {
    let mut name = None;
    let mut factory = None;
    for (field_name, value) in rest {
        match field_name.as_str() {
            "name" => name = Some(value.clone()),
            "factory" => factory = Some(value.clone()),
            other => return Err(format!("unknown field '{other}' in addFilterHook directive")),
        }
    }
    let name = name.ok_or_else(|| "mandatory field 'name' missing".to_string())?;

    let factory_args = match &factory {
        Some(raw) if !raw.trim().is_empty() => {
            Some(super::hook::parse_factory_args(raw).map_err(|e| e.to_string())?)
        }
        Some(_) => Some(Vec::new()),
        None => None,
    };

    let hook = registry
        .resolve(&name, factory_args.as_deref())
        .map_err(|e| e.to_string())?;

    let mut sig_parts = vec![name];
    if let Some(raw) = &factory {
        sig_parts.push(raw.clone());
    }
    let signature = sig_parts.join("\u{4}");

    Ok((FilterKind::Hook(hook), signature))
}

/// Either a pure regex substitution or a resolved hook, the two
/// filter directive kinds carried through rule parsing before being
/// chained onto the message/pattern slots they target.
#[derive(Clone)]
pub enum FilterKind {
    Regex(Rc<dyn Fn(&str) -> String>),
    Hook(Hook),
}

impl FilterKind {
    fn apply_text(&self, text: &str) -> Option<String> {
        match self {
            FilterKind::Regex(f) => Some(f(text)),
            FilterKind::Hook(Hook::PureText(f)) => f(text),
            FilterKind::Hook(Hook::FromText(_)) | FilterKind::Hook(Hook::Mutating(_)) => None,
        }
    }
}

/// Chains a [`FilterKind`] onto the message parts it targets,
/// producing one closure that edits a `Message` in place given its
/// catalog. Grounded in `_msgFilterSetOnParts` + `_filterOnMsg*`.
pub fn compose_on_parts(kind: FilterKind, parts: &[FilterOn]) -> MsgFilter {
    let msg_parts: Vec<FilterOn> = parts.iter().copied().filter(|p| p.is_msg_part()).collect();
    Rc::new(move |msg: &mut Message, cat: &Catalog, _env: Option<&str>| {
        for part in &msg_parts {
            match part {
                FilterOn::Msg => {
                    if let FilterKind::Hook(Hook::Mutating(f)) = &kind {
                        f(cat, msg);
                    }
                }
                FilterOn::Msgid => {
                    if let Some(replacement) = kind.apply_text(msg.msgid()) {
                        msg.set_msgid(replacement);
                    }
                    if let Some(plural) = msg.msgid_plural() {
                        if let Some(replacement) = kind.apply_text(plural) {
                            msg.set_msgid_plural(Some(replacement));
                        }
                    }
                }
                FilterOn::Msgstr => {
                    let mut values = msg.msgstr().to_vec();
                    for value in &mut values {
                        if let Some(replacement) = kind.apply_text(value) {
                            *value = replacement;
                        }
                    }
                    msg.set_msgstr(values);
                }
                FilterOn::PMsgid => {
                    if let Some(replacement) = kind.apply_text(msg.msgid()) {
                        msg.set_msgid(replacement);
                    }
                    if let Some(plural) = msg.msgid_plural() {
                        if let Some(replacement) = kind.apply_text(plural) {
                            msg.set_msgid_plural(Some(replacement));
                        }
                    }
                }
                FilterOn::PMsgstr => {
                    let mut values = msg.msgstr().to_vec();
                    for value in &mut values {
                        if let Some(replacement) = kind.apply_text(value) {
                            *value = replacement;
                        }
                    }
                    msg.set_msgstr(values);
                }
                FilterOn::Pattern => {}
            }
        }
    })
}

/// Wraps a [`FilterKind`] as a pattern (rule-string) filter, applied
/// at compile time to the trigger and `valid` regex source strings.
/// Grounded in `_filterOnPattern`.
pub fn compose_pattern_filter(kind: FilterKind) -> PatternFilter {
    Rc::new(move |pattern: &str| kind.apply_text(pattern).unwrap_or_else(|| pattern.to_string()))
}

/// Canonical signature over an ordered filter-record list, used both
/// to key the dedup cache and as each record's own `signature` field
/// contribution. Grounded in `_filterFinalSig`.
pub fn final_signature(records: &[FilterRecord]) -> String {
    records
        .iter()
        .map(|r| r.signature.as_str())
        .collect::<Vec<_>>()
        .join("\u{5}")
}

/// Extends a base signature with the canonical, sorted parts list a
/// filter directive was composed onto. Grounded in the
/// `sig + "\x04" + ",".join(parts)` suffix in
/// `_msgFilterSetOnParts`/`_ruleFilterSetOnParts`.
pub fn signature_with_parts(base: &str, parts: &[FilterOn]) -> String {
    let mut names: Vec<&str> = parts
        .iter()
        .map(|p| match p {
            FilterOn::Msg => "msg",
            FilterOn::Msgid => "msgid",
            FilterOn::Msgstr => "msgstr",
            FilterOn::PMsgid => "pmsgid",
            FilterOn::PMsgstr => "pmsgstr",
            FilterOn::Pattern => "pattern",
        })
        .collect();
    names.sort_unstable();
    format!("{base}\u{4}{}", names.join(","))
}

pub fn filter_record(
    handles: HashSet<String>,
    environments: Option<Vec<String>>,
    signature: String,
    on_parts: Vec<FilterOn>,
) -> FilterRecord {
    FilterRecord {
        handles,
        environments,
        signature,
        on_parts,
    }
}

/// Process-scope cache from filter-list signature to composed
/// closure, so rule files whose filter stacks are byte-identical
/// share one composition (`seenMsgFilters`/`seenRuleFilters` in
/// `loadRulesFromFile`).
#[derive(Default)]
pub struct FilterRegistry {
    msg_cache: HashMap<String, MsgFilter>,
    pattern_cache: HashMap<String, PatternFilter>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composes (or reuses, by signature) the final message filter
    /// for a rule's message-filter stack. `None` when the stack is
    /// empty. Grounded in `_msgFilterComposeFinal`.
    pub fn compose_message(&mut self, stack: &[(FilterRecord, MsgFilter)]) -> Option<MsgFilter> {
        if stack.is_empty() {
            return None;
        }
        let records: Vec<FilterRecord> = stack.iter().map(|(r, _)| r.clone()).collect();
        let sig = final_signature(&records);
        if let Some(cached) = self.msg_cache.get(&sig) {
            return Some(cached.clone());
        }
        let entries: Vec<(Option<Vec<String>>, MsgFilter)> =
            stack.iter().map(|(r, f)| (r.environments.clone(), f.clone())).collect();
        let composed: MsgFilter = Rc::new(move |msg: &mut Message, cat: &Catalog, env: Option<&str>| {
            for (fenvs, func) in &entries {
                let applies = match fenvs {
                    None => true,
                    Some(list) => env.map(|e| list.iter().any(|n| n == e)).unwrap_or(false),
                };
                if applies {
                    func(msg, cat, env);
                }
            }
        });
        self.msg_cache.insert(sig, composed.clone());
        Some(composed)
    }

    /// Composes (or reuses) the final pattern filter for a rule's
    /// pattern-filter stack. Grounded in `_ruleFilterComposeFinal`.
    pub fn compose_pattern(&mut self, stack: &[(FilterRecord, PatternFilter)]) -> Option<PatternFilter> {
        if stack.is_empty() {
            return None;
        }
        let records: Vec<FilterRecord> = stack.iter().map(|(r, _)| r.clone()).collect();
        let sig = final_signature(&records);
        if let Some(cached) = self.pattern_cache.get(&sig) {
            return Some(cached.clone());
        }
        let funcs: Vec<PatternFilter> = stack.iter().map(|(_, f)| f.clone()).collect();
        let composed: PatternFilter = Rc::new(move |value: &str| {
            let mut value = value.to_string();
            for func in &funcs {
                value = func(&value);
            }
            value
        });
        self.pattern_cache.insert(sig, composed.clone());
        Some(composed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_filter_substitutes() {
        let rest = vec![
            ("match".to_string(), "foo".to_string()),
            ("repl".to_string(), "bar".to_string()),
        ];
        let (func, sig) = create_regex_filter(&rest).unwrap();
        assert_eq!(func("a foo b"), "a bar b");
        assert!(sig.contains("foo"));
    }

    #[test]
    fn general_fields_require_on() {
        let fields = vec![("handle".to_string(), Some("h1".to_string()))];
        assert!(parse_general_fields(&fields).is_err());
    }

    #[test]
    fn general_fields_parse_parts() {
        let fields = vec![
            ("on".to_string(), Some("msgid,msgstr".to_string())),
            ("handle".to_string(), Some("h1, h2".to_string())),
        ];
        let parsed = parse_general_fields(&fields).unwrap();
        assert_eq!(parsed.parts, vec![FilterOn::Msgid, FilterOn::Msgstr]);
        assert!(parsed.handles.contains("h1"));
        assert!(parsed.handles.contains("h2"));
    }
}
