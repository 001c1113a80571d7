//! The rule engine: trigger + validity matching over messages, SPEC_FULL.md
//! 3 (Rule/Filter set) and 4.4/4.5.
//!
//! Grounded in `misc/rules.py`'s `Rule` class and its module-level
//! filter-composition helpers. The DSL tokenizer/directive dispatcher
//! lives in [`parser`], matching proper in [`matcher`].

pub mod filters;
pub mod hook;
pub mod matcher;
pub mod parser;
pub mod valid;

use std::cell::Cell;
use std::rc::Rc;

use regex::{Regex, RegexBuilder};

pub use filters::{FilterRecord, FilterRegistry};
pub use hook::{ArgValue, Hook, HookRequest, HookRegistry};
pub use matcher::{match_message, MatchFailure};
pub use parser::RuleSet;
pub use valid::{ValidConstraint, ValidEntry, ValidKeyword, ValidValue};

use crate::catalog::Catalog;
use crate::message::Message;

/// A composed message filter: edits a cloned message in place, given
/// the catalog it belongs to and the operating environment (already
/// resolved against the filter's own environment list at compose
/// time; see [`filters::compose_message_filters`]).
pub type MsgFilter = Rc<dyn Fn(&mut Message, &Catalog, Option<&str>)>;

/// A composed rule-string filter, applied once at rule-compile time
/// to the trigger pattern and every `valid` regex source string
/// (`_ruleFilterComposeFinal` in the source; the only rule part the
/// source ever dispatches on is `"pattern"`, so this crate does not
/// carry the part tag through the call).
pub type PatternFilter = Rc<dyn Fn(&str) -> String>;

/// The message part a rule's trigger matches against, SPEC_FULL.md 4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPart {
    Msgctxt,
    Msgid,
    Msgstr,
    MsgidSingular,
    MsgidPlural,
    MsgstrIndex(usize),
}

impl TriggerPart {
    /// Parses a trigger keyword (`msgid`, `msgstr_3`, ...). Returns
    /// `None` for anything not in `_trigger_msgparts`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "msgctxt" => Some(Self::Msgctxt),
            "msgid" => Some(Self::Msgid),
            "msgstr" => Some(Self::Msgstr),
            "msgid_singular" => Some(Self::MsgidSingular),
            "msgid_plural" => Some(Self::MsgidPlural),
            _ => name.strip_prefix("msgstr_").and_then(|n| {
                n.parse::<usize>().ok().map(Self::MsgstrIndex)
            }),
        }
    }
}

/// A message-matching rule: compiled trigger, validity exceptions,
/// bookkeeping, and the composed filters applied before matching.
/// SPEC_FULL.md 3 (Rule).
pub struct Rule {
    pattern: Option<Regex>,
    pub raw_pattern: String,
    pub msgpart: TriggerPart,
    pub casesens: bool,
    pub valid: Vec<ValidEntry>,
    pub hint: Option<String>,
    pub id: Option<String>,
    pub disabled: bool,
    pub environ: Option<String>,
    pub mfilter: Option<MsgFilter>,
    pub stat: bool,
    count: Cell<u64>,
    time_ms: Cell<f64>,
}

impl Rule {
    /// Builds and compiles a rule, mirroring `Rule.__init__` +
    /// `setPattern` + `setValid`. `rfilter`, when present, is applied
    /// to the trigger pattern and to every `valid` regex source
    /// string before compilation (`self.rfilter(pattern, "pattern")`).
    ///
    /// An invalid trigger regex does not fail construction: the rule
    /// is built disabled and a warning is logged, matching
    /// `setPattern`'s "Invalid pattern ..., disabling rule" behavior,
    /// so that one malformed rule in a large file does not abort
    /// loading the rest.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pattern: &str,
        msgpart: TriggerPart,
        hint: Option<String>,
        raw_valid: Vec<Vec<(String, String)>>,
        stat: bool,
        casesens: bool,
        id: Option<String>,
        mut disabled: bool,
        environ: Option<String>,
        mfilter: Option<MsgFilter>,
        rfilter: Option<&PatternFilter>,
    ) -> Self {
        let filtered_pattern = match rfilter {
            Some(f) => f(pattern),
            None => pattern.to_string(),
        };

        let compiled = RegexBuilder::new(&filtered_pattern)
            .case_insensitive(!casesens)
            .build();
        let compiled = match compiled {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("invalid pattern '{filtered_pattern}', disabling rule: {e}");
                disabled = true;
                None
            }
        };

        let mut valid = Vec::with_capacity(raw_valid.len());
        for item in raw_valid {
            let mut entry = Vec::with_capacity(item.len());
            for (key, value) in item {
                let value = match rfilter {
                    Some(f) => f(&value),
                    None => value,
                };
                match ValidConstraint::build(&key, &value, casesens) {
                    Ok(Some(constraint)) => entry.push(constraint),
                    Ok(None) => {
                        log::warn!("invalid keyword '{key}' in valid definition, skipping")
                    }
                    Err(e) => log::warn!("invalid 'valid' definition '{key}={value}': {e}"),
                }
            }
            valid.push(entry);
        }

        Self {
            pattern: compiled,
            raw_pattern: pattern.to_string(),
            msgpart,
            casesens,
            valid,
            hint,
            id,
            disabled,
            environ,
            mfilter,
            stat,
            count: Cell::new(0),
            time_ms: Cell::new(0.0),
        }
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    /// Number of times [`matcher::match_message`] has been invoked for
    /// this rule (incremented regardless of `stat`, matching
    /// `self.count += 1` in `Rule.process`).
    pub fn call_count(&self) -> u64 {
        self.count.get()
    }

    /// Cumulative time spent in `match_message`, in milliseconds;
    /// only accumulated when [`Rule::stat`] is set (`self.stat`).
    pub fn elapsed_ms(&self) -> f64 {
        self.time_ms.get()
    }

    pub(crate) fn bump_count(&self) {
        self.count.set(self.count.get() + 1);
    }

    pub(crate) fn add_elapsed(&self, ms: f64) {
        if self.stat {
            self.time_ms.set(self.time_ms.get() + ms);
        }
    }
}
