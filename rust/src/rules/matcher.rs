//! The rule matcher: applies a rule's trigger and validity entries to
//! a message, SPEC_FULL.md 4.5.
//!
//! Grounded in `misc/rules.py`'s `Rule.process`.

use std::time::Instant;

use super::valid::is_valid;
use super::{Rule, TriggerPart};
use crate::catalog::Catalog;
use crate::message::Message;

/// One group of non-excepted trigger matches for a single (field,
/// index) slot of a message, e.g. all failing spans found in
/// `msgstr[1]`. Grounded in the `failed_spans` dict built by
/// `Rule.process`, keyed by `(part, item)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    pub field: &'static str,
    pub index: usize,
    pub spans: Vec<(usize, usize)>,
    pub text: String,
}

/// Applies `rule` to `msg` within `cat` under operating environment
/// `env`, returning the non-excepted trigger matches. An empty
/// result means the rule passed the message (or did not apply at
/// all: wrong environment, disabled, or an uncompilable trigger).
///
/// Unless `nofilter` is set, a filtered clone of `msg` is matched
/// instead of `msg` itself, mirroring `Rule._filter_message`'s
/// `MessageUnsafe` copy.
pub fn match_message(
    rule: &Rule,
    msg: &Message,
    cat: &Catalog,
    env: Option<&str>,
    nofilter: bool,
) -> Vec<MatchFailure> {
    let Some(pattern) = rule.pattern() else {
        return Vec::new();
    };

    if let Some(required) = &rule.environ {
        if env != Some(required.as_str()) {
            return Vec::new();
        }
    }
    if rule.disabled {
        return Vec::new();
    }

    let start = rule.stat.then(Instant::now);

    let filtered;
    let msg = if !nofilter {
        if let Some(filter) = &rule.mfilter {
            let mut clone = msg.clone();
            filter(&mut clone, cat, env);
            filtered = clone;
            &filtered
        } else {
            msg
        }
    } else {
        msg
    };

    let text_spec: Vec<(&'static str, usize, &str)> = match rule.msgpart {
        TriggerPart::Msgid => vec![
            ("msgid", 0, msg.msgid()),
            ("msgid_plural", 0, msg.msgid_plural().unwrap_or("")),
        ],
        TriggerPart::Msgstr => msg
            .msgstr()
            .iter()
            .enumerate()
            .map(|(i, s)| ("msgstr", i, s.as_str()))
            .collect(),
        TriggerPart::Msgctxt => vec![("msgctxt", 0, msg.msgctxt().unwrap_or(""))],
        TriggerPart::MsgidSingular => vec![("msgid", 0, msg.msgid())],
        TriggerPart::MsgidPlural => vec![("msgid_plural", 0, msg.msgid_plural().unwrap_or(""))],
        TriggerPart::MsgstrIndex(i) => {
            vec![("msgstr", i, msg.msgstr_at(i).unwrap_or(""))]
        }
    };

    let mut failures: Vec<MatchFailure> = Vec::new();
    for (field, index, text) in text_spec {
        let matches: Vec<_> = pattern.find_iter(text).collect();
        if matches.is_empty() {
            continue;
        }

        let mut spans = Vec::new();
        for m in matches {
            let span = (m.start(), m.end());
            let excepted = rule
                .valid
                .iter()
                .any(|entry| is_valid(entry, span, text, msg, cat, env));
            if !excepted {
                spans.push(span);
            }
        }
        if !spans.is_empty() {
            failures.push(MatchFailure {
                field,
                index,
                spans,
                text: text.to_string(),
            });
        }
    }

    rule.bump_count();
    if let Some(started) = start {
        rule.add_elapsed(started.elapsed().as_secs_f64() * 1000.0);
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::valid::ValidConstraint;
    use crate::rules::Rule;

    fn cat() -> Catalog {
        Catalog::parse("msgid \"\"\nmsgstr \"\"\n\"Project-Id-Version: x\\n\"\n").unwrap()
    }

    #[test]
    fn valid_entry_excepts_match() {
        let valid_entry = vec![ValidConstraint::build("msgstr", r"\bbar", true).unwrap().unwrap()];
        let rule = Rule::new(
            r"\bfoo",
            TriggerPart::Msgid,
            None,
            vec![],
            false,
            true,
            None,
            false,
            None,
            None,
            None,
        );
        let mut rule = rule;
        rule.valid.push(valid_entry);

        let mut msg = Message::new("foo bar");
        msg.set_msgstr(vec!["qux bar".to_string()]);
        let cat = cat();
        let failures = match_message(&rule, &msg, &cat, None, true);
        assert!(failures.is_empty());
    }

    #[test]
    fn unexcepted_match_reports_span() {
        let rule = Rule::new(
            r"\bfoo",
            TriggerPart::Msgid,
            None,
            vec![],
            false,
            true,
            None,
            false,
            None,
            None,
            None,
        );
        let mut msg = Message::new("foo");
        msg.set_msgstr(vec!["qux".to_string()]);
        let cat = cat();
        let failures = match_message(&rule, &msg, &cat, None, true);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "msgid");
        assert_eq!(failures[0].spans, vec![(0, 3)]);
    }

    #[test]
    fn wrong_environment_passes_silently() {
        let rule = Rule::new(
            r"\bfoo",
            TriggerPart::Msgid,
            None,
            vec![],
            false,
            true,
            None,
            false,
            Some("kde".to_string()),
            None,
            None,
        );
        let msg = Message::new("foo");
        let cat = cat();
        assert!(match_message(&rule, &msg, &cat, Some("gnome"), true).is_empty());
        assert!(!match_message(&rule, &msg, &cat, Some("kde"), true).is_empty());
    }

    #[test]
    fn disabled_rule_passes_silently() {
        let rule = Rule::new(
            r"\bfoo", TriggerPart::Msgid, None, vec![], false, true, None, true, None, None, None,
        );
        let msg = Message::new("foo");
        let cat = cat();
        assert!(match_message(&rule, &msg, &cat, None, true).is_empty());
    }
}
