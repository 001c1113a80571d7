//! External hook contract, SPEC_FULL.md 4.7.
//!
//! Grounded in `misc/langdep.py::split_req`/`get_hook`/`get_hook_lreq`.
//! Dynamic module loading is replaced by [`HookRegistry`], a static
//! table callers populate ahead of time (SPEC_FULL.md 9, hook loading
//! design note).

use std::collections::HashMap;
use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::catalog::Catalog;
use crate::message::Message;

lazy_static! {
    static ref LANG_RX: Regex = Regex::new(r"^[a-z]{2,3}(_[A-Z]{2})?(@\w+)?$").unwrap();
    static ref PATH_RX: Regex = Regex::new(r"(?i)^([a-z][\w-]*(\.|$))+$").unwrap();
    static ref ITEM_RX: Regex = Regex::new(r"(?i)^[a-z][\w-]*$").unwrap();
}

/// A parsed hook request, `[lang:]path[/item][~args]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookRequest {
    pub lang: Option<String>,
    pub path: String,
    pub item: Option<String>,
    pub args: Option<String>,
}

/// Splits a hook request string into its components, normalizing
/// hyphens in `path`/`item` to underscores. Grounded in `split_req`,
/// which splits on the last `~`, then the last `/`, then the first
/// `:`, validating each piece against its grammar.
pub fn split_req(request: &str) -> Result<HookRequest, String> {
    let (rest, args) = match request.rfind('~') {
        Some(pos) => (&request[..pos], Some(request[pos + 1..].to_string())),
        None => (request, None),
    };

    let (rest, item) = match rest.rfind('/') {
        Some(pos) => (&rest[..pos], Some(rest[pos + 1..].to_string())),
        None => (rest, None),
    };

    let (lang, path) = match rest.find(':') {
        Some(pos) => (Some(rest[..pos].to_string()), &rest[pos + 1..]),
        None => (None, rest),
    };

    if let Some(lang) = &lang {
        if !LANG_RX.is_match(lang) {
            return Err(format!("invalid language '{lang}' in item request '{request}'"));
        }
    }
    if !PATH_RX.is_match(path) {
        return Err(format!("invalid path '{path}' in item request '{request}'"));
    }
    if let Some(item) = &item {
        if !ITEM_RX.is_match(item) {
            return Err(format!("invalid item '{item}' in item request '{request}'"));
        }
    }

    Ok(HookRequest {
        lang,
        path: path.replace('-', "_"),
        item: item.map(|i| i.replace('-', "_")),
        args,
    })
}

/// A hook, one of the three call signatures described in SPEC_FULL.md
/// 4.7. `Mutating` edits the message in place; `FromText` maps one
/// field's text to a (possibly absent) replacement, with the catalog
/// and message available for context; `PureText` is context-free.
#[derive(Clone)]
pub enum Hook {
    Mutating(Rc<dyn Fn(&Catalog, &mut Message)>),
    FromText(Rc<dyn Fn(&Catalog, &Message, &str) -> Option<String>>),
    PureText(Rc<dyn Fn(&str) -> Option<String>>),
}

/// A literal argument parsed from a `factory=` field, in the same
/// shape a caller would write in a function-call argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Parses a comma-separated, Python-literal-like argument list (as
/// used in `factory="..."` fields) into a sequence of [`ArgValue`]s.
/// Each argument is a quoted string, a number, or `True`/`False`.
pub fn parse_factory_args(raw: &str) -> Result<Vec<ArgValue>, String> {
    let mut args = Vec::new();
    for part in split_top_level_commas(raw) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if (part.starts_with('\'') && part.ends_with('\'') && part.len() >= 2)
            || (part.starts_with('"') && part.ends_with('"') && part.len() >= 2)
        {
            args.push(ArgValue::Str(part[1..part.len() - 1].to_string()));
        } else if part == "True" {
            args.push(ArgValue::Bool(true));
        } else if part == "False" {
            args.push(ArgValue::Bool(false));
        } else if let Ok(n) = part.parse::<f64>() {
            args.push(ArgValue::Num(n));
        } else {
            return Err(format!("cannot parse factory argument '{part}'"));
        }
    }
    Ok(args)
}

fn split_top_level_commas(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut cur = String::new();
    for c in raw.chars() {
        match quote {
            Some(q) => {
                cur.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    cur.push(c);
                }
                '(' | '[' => {
                    depth += 1;
                    cur.push(c);
                }
                ')' | ']' => {
                    depth -= 1;
                    cur.push(c);
                }
                ',' if depth == 0 => {
                    out.push(std::mem::take(&mut cur));
                }
                _ => cur.push(c),
            },
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

type HookFactory = Rc<dyn Fn(&[ArgValue]) -> Result<Hook, String>>;

enum Entry {
    Direct(Hook),
    Factory(HookFactory),
}

/// A static replacement for dynamic `pology.l10n.<lang>.hook.<name>`
/// module loading: callers register named hooks ahead of time, and
/// [`HookRegistry::resolve`] looks one up by request string.
#[derive(Default, Clone)]
pub struct HookRegistry {
    entries: HashMap<(Option<String>, String, String), Entry>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directly-callable hook under `(lang, path, item)`.
    /// `item` defaults to `"process"` when absent from a request,
    /// mirroring `get_hook`'s default function name.
    pub fn register(&mut self, lang: Option<&str>, path: &str, item: &str, hook: Hook) {
        self.entries.insert(
            (lang.map(str::to_string), path.to_string(), item.to_string()),
            Entry::Direct(hook),
        );
    }

    /// Registers a hook factory: a function from parsed `factory=`
    /// arguments to a concrete hook, used when `addFilterHook` carries
    /// a `factory=` field.
    pub fn register_factory(
        &mut self,
        lang: Option<&str>,
        path: &str,
        item: &str,
        factory: impl Fn(&[ArgValue]) -> Result<Hook, String> + 'static,
    ) {
        self.entries.insert(
            (lang.map(str::to_string), path.to_string(), item.to_string()),
            Entry::Factory(Rc::new(factory)),
        );
    }

    /// Parses `request` and looks up the named hook, applying `args`
    /// (parsed from a `factory=` field, if any) when the entry is a
    /// factory. `item` defaults to `"process"`.
    pub fn resolve(&self, request: &str, factory_args: Option<&[ArgValue]>) -> Result<Hook, String> {
        let req = split_req(request)?;
        let item = req.item.unwrap_or_else(|| "process".to_string());
        let key = (req.lang, req.path, item);
        match self.entries.get(&key) {
            Some(Entry::Direct(hook)) => Ok(hook.clone()),
            Some(Entry::Factory(factory)) => factory(factory_args.unwrap_or(&[])),
            None => Err(format!("no hook registered for request '{request}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_full_request() {
        let req = split_req("sr:remove-subs/remove-accel-msg~'&'").unwrap();
        assert_eq!(req.lang.as_deref(), Some("sr"));
        assert_eq!(req.path, "remove_subs");
        assert_eq!(req.item.as_deref(), Some("remove_accel_msg"));
        assert_eq!(req.args.as_deref(), Some("'&'"));
    }

    #[test]
    fn splits_bare_path() {
        let req = split_req("remove-subs/remove-accel-msg").unwrap();
        assert_eq!(req.lang, None);
        assert_eq!(req.path, "remove_subs");
        assert_eq!(req.item.as_deref(), Some("remove_accel_msg"));
        assert_eq!(req.args, None);
    }

    #[test]
    fn rejects_invalid_language() {
        assert!(split_req("frans:foo").is_err());
    }

    #[test]
    fn parses_factory_args() {
        let args = parse_factory_args("'~', 3, True").unwrap();
        assert_eq!(
            args,
            vec![
                ArgValue::Str("~".to_string()),
                ArgValue::Num(3.0),
                ArgValue::Bool(true),
            ]
        );
    }

    #[test]
    fn registry_resolves_registered_pure_text_hook() {
        let mut reg = HookRegistry::new();
        reg.register(
            None,
            "remove_subs",
            "process",
            Hook::PureText(Rc::new(|text: &str| Some(text.to_uppercase()))),
        );
        let hook = reg.resolve("remove-subs", None).unwrap();
        match hook {
            Hook::PureText(f) => assert_eq!(f("hi"), Some("HI".to_string())),
            _ => panic!("wrong hook kind"),
        }
    }
}
