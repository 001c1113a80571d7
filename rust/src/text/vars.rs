//! `expand_vars`, SPEC_FULL.md 4.6.
//!
//! Grounded in `misc/resolve.py::expand_vars`: a directive is
//! `<head>NAME` or `<head>{NAME}`, `NAME` alphanumeric/underscore; a
//! doubled head escapes to a literal head.

use std::collections::HashMap;

use crate::errors::NameError;

/// Expands `<head>NAME` / `<head>{NAME}` directives in `text`, looking
/// each name up in `varmap`. A name outside the braced form ends at
/// the first non-alphanumeric, non-underscore character.
pub fn expand_vars(
    text: &str,
    varmap: &HashMap<String, String>,
    head: char,
) -> Result<String, NameError> {
    let chars: Vec<char> = text.chars().collect();
    let tlen = chars.len();
    let mut out = String::new();
    let mut p = 0usize;

    while p < tlen {
        let pp = p;
        while p < tlen && chars[p] != head {
            p += 1;
        }
        out.extend(&chars[pp..p]);
        if p == tlen {
            break;
        }
        p += 1;

        if p < tlen && chars[p] == head {
            out.push(head);
            p += 1;
            continue;
        }
        if p == tlen {
            return Err(NameError::UnterminatedDirective {
                text: text.to_string(),
            });
        }

        let braced = chars[p] == '{';
        if braced {
            p += 1;
        }
        let name_start = p;
        while p < tlen {
            let c = chars[p];
            let stop = if braced {
                c == '}'
            } else {
                !(c.is_alphanumeric() || c == '_')
            };
            if stop {
                break;
            }
            p += 1;
        }
        if braced && p == tlen {
            return Err(NameError::UnterminatedDirective {
                text: text.to_string(),
            });
        }
        let name: String = chars[name_start..p].iter().collect();
        if braced {
            p += 1;
        }

        match varmap.get(&name) {
            Some(value) => out.push_str(value),
            None => return Err(NameError::UnknownVariable { name }),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varmap(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn expands_plain_and_braced() {
        let map = varmap(&[("mammal", "lamb"), ("critic", "burl")]);
        assert_eq!(
            expand_vars("Mary had a little %mammal.", &map, '%'),
            Ok("Mary had a little lamb.".to_string())
        );
        assert_eq!(
            expand_vars("Quite a %{critic}esque play.", &map, '%'),
            Ok("Quite a burlesque play.".to_string())
        );
    }

    #[test]
    fn doubled_head_escapes() {
        let map = varmap(&[]);
        assert_eq!(expand_vars("100%%", &map, '%'), Ok("100%".to_string()));
    }

    #[test]
    fn unknown_variable_errors() {
        let map = varmap(&[]);
        assert_eq!(
            expand_vars("hello %unknown", &map, '%'),
            Err(NameError::UnknownVariable {
                name: "unknown".to_string()
            })
        );
    }

    #[test]
    fn unterminated_directive_errors() {
        let map = varmap(&[]);
        assert!(matches!(
            expand_vars("hello %{unclosed", &map, '%'),
            Err(NameError::UnterminatedDirective { .. })
        ));
    }
}
