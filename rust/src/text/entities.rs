//! `resolve_entities`, SPEC_FULL.md 4.6.
//!
//! Grounded in `misc/resolve.py::resolve_entities`: scans for `&name;`
//! references, with an upper/lowercase fallback and recursive
//! re-resolution until a fixed point, plus `strsim`-based near-match
//! suggestions for unknown names (replacing `difflib.get_close_matches`).

use std::collections::{HashMap, HashSet};

use super::alternatives::first_to_upper;

fn first_to_lower(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Scans `entname;` starting at a position right after an `&`,
/// returning the entity name if the tail matches
/// `[\w_:][\w\d._:-]*;`.
fn match_entity_tail(rest: &[char]) -> Option<(String, usize)> {
    if rest.is_empty() {
        return None;
    }
    let first = rest[0];
    if !(first.is_alphanumeric() || first == '_' || first == ':') {
        return None;
    }
    let mut end = 1;
    while end < rest.len() {
        let c = rest[end];
        if c.is_alphanumeric() || c == '.' || c == '_' || c == ':' || c == '-' {
            end += 1;
        } else {
            break;
        }
    }
    if end < rest.len() && rest[end] == ';' {
        Some((rest[..end].iter().collect(), end + 1))
    } else {
        None
    }
}

/// Up to 3 near-matches for `name` among `entities`' keys with
/// normalized similarity above a fixed cutoff, used for the
/// `log::warn!` suggestion line when an entity is unresolved.
fn near_matches(name: &str, entities: &HashMap<String, String>) -> Vec<String> {
    let mut scored: Vec<(f64, &String)> = entities
        .keys()
        .map(|k| (strsim::normalized_levenshtein(name, k), k))
        .filter(|(score, _)| *score >= 0.6)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(3).map(|(_, k)| k.clone()).collect()
}

/// Replaces `&name;` references in `text` with their looked-up values,
/// re-running over the output until no further reference resolves (a
/// fixed point), so that entity values may themselves reference other
/// entities. Returns `(resolved_text, resolved_names, unknown_names)`.
pub fn resolve_entities(
    text: &str,
    entities: &HashMap<String, String>,
    ignored: &HashSet<String>,
    fcap: bool,
    nalts: usize,
    althead: &str,
    srcname: Option<&str>,
) -> (String, Vec<String>, Vec<String>) {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut resolved = Vec::new();
    let mut unknown = Vec::new();

    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] != '&' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        out.push('&');
        i += 1;

        let Some((entname_orig, consumed)) = match_entity_tail(&chars[i..]) else {
            continue;
        };

        if ignored.contains(&entname_orig) {
            out.push_str(&entname_orig);
            out.push(';');
            i += consumed;
            continue;
        }

        let mut entname = entname_orig.clone();
        if fcap && !entities.contains_key(&entname) {
            entname = first_to_lower(&entname);
        }

        if let Some(value) = entities.get(&entname) {
            resolved.push(entname.clone());
            let value = if fcap && entname_orig != entname {
                first_to_upper(value, nalts, althead)
            } else {
                value.clone()
            };
            out.pop();
            out.push_str(&value);
            i += consumed;
        } else {
            unknown.push(entname.clone());
            if let Some(srcname) = srcname {
                let nears = near_matches(&entname, entities);
                let label = if fcap && entname_orig != entname {
                    format!("either '{entname_orig}' or '{entname}'")
                } else {
                    format!("'{entname}'")
                };
                if nears.is_empty() {
                    log::warn!("{srcname}: unknown entity {label}");
                } else {
                    log::warn!(
                        "{srcname}: unknown entity {label} (near matches: {})",
                        nears.join(", ")
                    );
                }
            }
            out.push_str(&entname_orig);
            out.push(';');
            i += consumed;
        }
    }

    if !resolved.is_empty() {
        let (deeper, resolved_extra, unknown_extra) =
            resolve_entities(&out, entities, ignored, fcap, nalts, althead, srcname);
        out = deeper;
        resolved.extend(resolved_extra);
        unknown.extend(unknown_extra);
    }

    (out, resolved, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn resolves_simple_entity() {
        let entities = map(&[("app", "Konqueror")]);
        let (text, resolved, unknown) = resolve_entities(
            "Welcome to &app;!",
            &entities,
            &HashSet::new(),
            false,
            0,
            "~@",
            None,
        );
        assert_eq!(text, "Welcome to Konqueror!");
        assert_eq!(resolved, vec!["app".to_string()]);
        assert!(unknown.is_empty());
    }

    #[test]
    fn resolves_recursively_to_fixed_point() {
        let entities = map(&[("a", "&b;"), ("b", "end")]);
        let (text, _, _) = resolve_entities(
            "x&a;y",
            &entities,
            &HashSet::new(),
            false,
            0,
            "~@",
            None,
        );
        assert_eq!(text, "xendy");
    }

    #[test]
    fn fcap_falls_back_to_lowercase_and_upcases_value() {
        let entities = map(&[("app", "konqueror")]);
        let (text, resolved, _) = resolve_entities(
            "&App; rocks",
            &entities,
            &HashSet::new(),
            true,
            0,
            "~@",
            None,
        );
        assert_eq!(text, "Konqueror rocks");
        assert_eq!(resolved, vec!["app".to_string()]);
    }

    #[test]
    fn ignored_entities_are_left_untouched() {
        let entities = map(&[]);
        let mut ignored = HashSet::new();
        ignored.insert("amp".to_string());
        let (text, resolved, unknown) = resolve_entities(
            "a &amp; b",
            &entities,
            &ignored,
            false,
            0,
            "~@",
            None,
        );
        assert_eq!(text, "a &amp; b");
        assert!(resolved.is_empty());
        assert!(unknown.is_empty());
    }

    #[test]
    fn unknown_entity_is_left_unresolved_but_reported() {
        let entities = map(&[]);
        let (text, _, unknown) = resolve_entities(
            "a &ghost; b",
            &entities,
            &HashSet::new(),
            false,
            0,
            "~@",
            None,
        );
        assert_eq!(text, "a &ghost; b");
        assert_eq!(unknown, vec!["ghost".to_string()]);
    }
}
