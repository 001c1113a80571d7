//! The sieve contract: the lifecycle a batch processor consuming a
//! catalog is expected to follow, SPEC_FULL.md 4.8.
//!
//! Grounded in the `Sieve` classes of `sieve/check_xml_kde4.py` and
//! `sieve/find_messages.py`: a `setup`/`process`/`finalize` lifecycle
//! plus the two driver flags each implementation sets in its
//! constructor (`caller_monitored`, `caller_sync`). Locating and
//! driving sieves over a set of catalog files is outside this crate
//! (SPEC_FULL.md 1, Non-goals); this module only specifies the
//! interface a driver built on top of it would call.

use crate::catalog::Catalog;
use crate::message::Message;

/// A batch processor run once per message across one or more
/// catalogs.
///
/// A driver is expected to call [`Sieve::setup`] once, then
/// [`Sieve::process`] for each non-excluded entry of each catalog in
/// turn, then [`Sieve::finalize`] after the last one. [`Sieve::needs_monitored`]
/// and [`Sieve::needs_sync`] answer the same two questions the source's
/// `caller_monitored`/`caller_sync` instance flags do, but as methods
/// rather than fields set mid-construction, since a sieve's answer
/// does not depend on per-instance state the way its parameters do.
pub trait Sieve {
    /// Validates and records the sieve's parameters. The default
    /// implementation accepts anything, matching a sieve with no
    /// `setup_sieve` parameters of its own (e.g. `find_messages.py`).
    fn setup(&mut self, _params: &SieveParams) -> Result<(), String> {
        Ok(())
    }

    /// Examines (and, if [`Sieve::needs_sync`] is set, may mutate)
    /// one message from `cat`. Called once per non-excluded entry.
    fn process(&mut self, msg: &mut Message, cat: &Catalog);

    /// Called once after the last catalog has been processed, for
    /// any summary reporting.
    fn finalize(&mut self) {}

    /// Whether the driver must hand [`Sieve::process`] messages from
    /// a catalog opened in monitored mode (change-tracking enabled),
    /// rather than a plain parse. Mirrors `caller_monitored`; sieves
    /// that only read fields, like both grounding examples, leave
    /// this `false`.
    fn needs_monitored(&self) -> bool {
        false
    }

    /// Whether the driver must write the catalog back to disk after
    /// processing. Mirrors `caller_sync`; both grounding examples
    /// leave this `false` since they only report, never edit.
    fn needs_sync(&self) -> bool {
        false
    }
}

/// The parameter bag a driver passes to [`Sieve::setup`].
///
/// Grounded in the `params` object `setup_sieve(p)` configures in the
/// source (`p.add_param(name, type, defval=...)`): an open string-keyed
/// map rather than a fixed struct, since each sieve declares its own
/// parameter set. Locating and parsing the parameters themselves
/// (command-line flags, config files) is outside this crate; a driver
/// is expected to populate this bag from whatever source it uses.
#[derive(Debug, Clone, Default)]
pub struct SieveParams {
    values: std::collections::HashMap<String, String>,
}

impl SieveParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|s| s.as_str())
    }

    /// Parses a parameter as a boolean the way `p.add_param(..., bool, ...)`
    /// accepts it: the literal strings `"1"`, `"true"`, `"yes"` (case
    /// insensitive) are truthy, anything else is not.
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.get(name) {
            None => default,
            Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSieve {
        translated: u64,
    }

    impl Sieve for CountingSieve {
        fn process(&mut self, msg: &mut Message, _cat: &Catalog) {
            if msg.translated() {
                self.translated += 1;
            }
        }
    }

    fn cat() -> Catalog {
        Catalog::parse("msgid \"\"\nmsgstr \"\"\n\"Project-Id-Version: x\\n\"\n").unwrap()
    }

    #[test]
    fn default_flags_are_false() {
        let sieve = CountingSieve { translated: 0 };
        assert!(!sieve.needs_monitored());
        assert!(!sieve.needs_sync());
    }

    #[test]
    fn process_counts_translated_messages() {
        let mut sieve = CountingSieve { translated: 0 };
        let cat = cat();
        let mut msg = Message::new("foo");
        msg.set_msgstr(vec!["bar".to_string()]);
        sieve.process(&mut msg, &cat);
        let mut untranslated = Message::new("baz");
        sieve.process(&mut untranslated, &cat);
        assert_eq!(sieve.translated, 1);
    }

    #[test]
    fn params_bool_parsing() {
        let mut params = SieveParams::new();
        params.set("strict", "true");
        assert!(params.get_bool("strict", false));
        assert!(!params.get_bool("lokalize", false));
        assert!(params.get_bool("lokalize", true));
    }
}
