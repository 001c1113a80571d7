//! `remove_literals`, SPEC_FULL.md 4.6.
//!
//! Grounded in `misc/resolve.py::remove_literals` and its
//! `_remove_literals_*` heuristic matchers: URLs, emails, web
//! hostnames, command names/options, and home-relative paths/globs.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref URL_RX: Regex = Regex::new(r"\S+://\S*[\w&=]").unwrap();
    static ref WEB_RX: Regex = Regex::new(r"\w{3,}(\.[\w-]{2,})+").unwrap();
    static ref EMAIL_RX: Regex = Regex::new(r"\w[\w.-]*@\w+\.[\w.-]*\w").unwrap();
    static ref CMD_RX: Regex = Regex::new(r"(?i)[a-z\d_-]+\(\d\)").unwrap();
    static ref CMDOPT_RX: Regex = Regex::new(r"(?i)(?:^|\s)-[a-zA-Z\d]+").unwrap();
    static ref CMDOPTLONG_RX: Regex = Regex::new(r"(?i)(?:^|\s)--[a-zA-Z\d-]+").unwrap();
    static ref FILEHOME_RX: Regex = Regex::new(r"~(/[\w.-]+)+/?").unwrap();
    static ref FILEEXT_RX: Regex = Regex::new(r"(?i)\*\.[a-zA-Z\d]+").unwrap();
}

/// Removes `substrs` (verbatim), then `regexes`, then (if `heuristic`)
/// URLs, emails, web hostnames, command names/options, and
/// home-relative paths/globs, replacing each hit with `subs`.
pub fn remove_literals(
    text: &str,
    subs: &str,
    substrs: &[&str],
    regexes: &[&Regex],
    heuristic: bool,
) -> String {
    let mut text = text.to_string();
    for substr in substrs {
        text = text.replace(substr, subs);
    }
    for regex in regexes {
        text = regex.replace_all(&text, subs).into_owned();
    }

    if heuristic {
        text = URL_RX.replace_all(&text, subs).into_owned();
        text = EMAIL_RX.replace_all(&text, subs).into_owned();
        text = WEB_RX.replace_all(&text, subs).into_owned();
        text = CMD_RX.replace_all(&text, subs).into_owned();
        text = CMDOPT_RX.replace_all(&text, subs).into_owned();
        text = CMDOPTLONG_RX.replace_all(&text, subs).into_owned();
        text = FILEHOME_RX.replace_all(&text, subs).into_owned();
        text = FILEEXT_RX.replace_all(&text, subs).into_owned();
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_urls_and_emails() {
        let out = remove_literals(
            "See https://example.com/page or mail me at dev@example.com.",
            "",
            &[],
            &[],
            true,
        );
        assert_eq!(out, "See  or mail me at .");
    }

    #[test]
    fn removes_command_and_options() {
        let out = remove_literals("run ls(1) with -a or --all", "", &[], &[], true);
        assert!(!out.contains("ls(1)"));
        assert!(!out.contains("-a"));
        assert!(!out.contains("--all"));
    }

    #[test]
    fn removes_home_paths_and_globs() {
        let out = remove_literals(
            "edit ~/.config/app.conf and keep *.bak files",
            "",
            &[],
            &[],
            true,
        );
        assert!(!out.contains("~/.config"));
        assert!(!out.contains("*.bak"));
    }

    #[test]
    fn applies_explicit_substrs_and_regexes_first() {
        let re = Regex::new(r"TODO:\w+").unwrap();
        let out = remove_literals("drop BRAND and TODO:fixme", "", &["BRAND"], &[&re], false);
        assert_eq!(out, "drop  and ");
    }
}
