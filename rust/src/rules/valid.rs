//! `valid` subdirective model and evaluation, SPEC_FULL.md 4.4/4.5.
//!
//! Grounded in `misc/rules.py::Rule.setValid`/`Rule._is_valid`.

use regex::Regex;

use crate::catalog::Catalog;
use crate::message::Message;

/// A `valid` constraint keyword. `Env`/`Cat` carry a comma-separated
/// list of names; the rest carry a compiled regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidKeyword {
    Env,
    Cat,
    Span,
    After,
    Before,
    Ctx,
    Msgid,
    Msgstr,
}

impl ValidKeyword {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "env" => Some(Self::Env),
            "cat" => Some(Self::Cat),
            "span" => Some(Self::Span),
            "after" => Some(Self::After),
            "before" => Some(Self::Before),
            "ctx" => Some(Self::Ctx),
            "msgid" => Some(Self::Msgid),
            "msgstr" => Some(Self::Msgstr),
            _ => None,
        }
    }

    fn is_list(self) -> bool {
        matches!(self, Self::Env | Self::Cat)
    }
}

#[derive(Debug, Clone)]
pub enum ValidValue {
    List(Vec<String>),
    Regex(Regex),
}

/// One `key=value` (or `!key=value`) field within a `valid` entry.
#[derive(Debug, Clone)]
pub struct ValidConstraint {
    pub keyword: ValidKeyword,
    pub negate: bool,
    pub value: ValidValue,
}

impl ValidConstraint {
    /// Builds a constraint from a raw field name/value pair.
    /// `value` has already had any rule filter applied to its
    /// source text. Returns `None` (with the caller expected to warn
    /// and skip) when `name` is not a known keyword.
    pub fn build(name: &str, value: &str, casesens: bool) -> Result<Option<Self>, String> {
        let (negate, bare) = match name.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        let Some(keyword) = ValidKeyword::parse(bare) else {
            return Ok(None);
        };
        let value = if keyword.is_list() {
            ValidValue::List(value.split(',').map(|s| s.trim().to_string()).collect())
        } else {
            let mut builder = regex::RegexBuilder::new(value);
            builder.case_insensitive(!casesens);
            let re = builder.build().map_err(|e| e.to_string())?;
            ValidValue::Regex(re)
        };
        Ok(Some(Self {
            keyword,
            negate,
            value,
        }))
    }
}

/// One `valid` line: all constraints must match for the entry as a
/// whole to except the current trigger match.
pub type ValidEntry = Vec<ValidConstraint>;

/// Evaluates whether `ventry` excepts the match at `span` within
/// `text`, for `msg` in `cat` under operating environment `env`.
/// Grounded in `Rule._is_valid`.
#[allow(clippy::too_many_arguments)]
pub fn is_valid(
    ventry: &ValidEntry,
    span: (usize, usize),
    text: &str,
    msg: &Message,
    cat: &Catalog,
    env: Option<&str>,
) -> bool {
    for constraint in ventry {
        let mut matched = match (&constraint.keyword, &constraint.value) {
            (ValidKeyword::Env, ValidValue::List(names)) => {
                env.map(|e| names.iter().any(|n| n == e)).unwrap_or(false)
            }
            (ValidKeyword::Cat, ValidValue::List(names)) => {
                names.iter().any(|n| n == &cat.basename())
            }
            (ValidKeyword::Span, ValidValue::Regex(re)) => re.is_match(&text[span.0..span.1]),
            (ValidKeyword::After, ValidValue::Regex(re)) => re
                .find_iter(&text[..span.0])
                .any(|m| m.end() == span.0),
            (ValidKeyword::Before, ValidValue::Regex(re)) => re
                .find_at(text, span.1)
                .map(|m| m.start() == span.1)
                .unwrap_or(false),
            (ValidKeyword::Ctx, ValidValue::Regex(re)) => re.is_match(msg.msgctxt().unwrap_or("")),
            (ValidKeyword::Msgid, ValidValue::Regex(re)) => {
                re.is_match(msg.msgid()) || re.is_match(msg.msgid_plural().unwrap_or(""))
            }
            (ValidKeyword::Msgstr, ValidValue::Regex(re)) => {
                msg.msgstr().iter().any(|s| re.is_match(s))
            }
            _ => unreachable!("list/regex keyword pairing is fixed at construction"),
        };
        if constraint.negate {
            matched = !matched;
        }
        if !matched {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn cat_named(name: &str) -> Catalog {
        let content = format!(
            "msgid \"\"\nmsgstr \"\"\n\"Project-Id-Version: x\\n\"\n",
        );
        let mut c = Catalog::parse(&content).unwrap();
        c.set_filename(Some(format!("{name}.po")));
        c
    }

    #[test]
    fn span_constraint_matches_inside_trigger_text() {
        let c = ValidConstraint::build("span", "^Foo", true).unwrap().unwrap();
        let msg = Message::new("Foo bar");
        let cat = cat_named("x");
        assert!(is_valid(&vec![c], (0, 3), "Foo bar", &msg, &cat, None));
    }

    #[test]
    fn negated_cat_constraint() {
        let c = ValidConstraint::build("!cat", "other", true).unwrap().unwrap();
        let msg = Message::new("x");
        let cat = cat_named("mine");
        assert!(is_valid(&vec![c], (0, 1), "x", &msg, &cat, None));
    }

    #[test]
    fn unknown_keyword_is_none() {
        assert!(ValidConstraint::build("bogus", "x", true).unwrap().is_none());
    }
}
