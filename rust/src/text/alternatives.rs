//! `resolve_alternatives` and `first_to_case`, SPEC_FULL.md 4.6.
//!
//! Grounded in `misc/resolve.py::resolve_alternatives`/`first_to_case`:
//! alternatives directives are `<head><sep><alt1><sep>...<sep><altN><sep>`;
//! a malformed directive anywhere in the text makes the whole call a
//! no-op that returns the original text with `malformed = true`.

pub const DEFAULT_ALTHEAD: &str = "~@";

/// Replaces alternatives directives in `text` with their `select`-th
/// (1-based) alternative. `condf`, when given, gates substitution of
/// a directive on a predicate over its full alternatives tuple. If
/// any directive is malformed, the original `text` is returned
/// unchanged with `malformed = true` and `resolved = 0`.
pub fn resolve_alternatives(
    text: &str,
    select: usize,
    total: usize,
    fmtstr: Option<&str>,
    condf: Option<&dyn Fn(&[String]) -> bool>,
    althead: &str,
) -> (String, usize, bool) {
    let chars: Vec<char> = text.chars().collect();
    let alt_head: Vec<char> = althead.chars().collect();
    let hlen = alt_head.len();
    let tlen = chars.len();

    let mut out = String::new();
    let mut resolved = 0usize;
    let mut malformed = false;
    let mut p: isize = -1;

    'outer: loop {
        let pp = (p + 1) as usize;
        let found = find_sub(&chars, &alt_head, pp);
        let Some(found_pos) = found else {
            out.extend(&chars[pp.min(tlen)..tlen]);
            break;
        };
        p = found_pos as isize;
        let ps = found_pos;

        out.extend(&chars[pp..found_pos]);

        if tlen < found_pos + hlen + 2 {
            malformed = true;
            break;
        }

        let mut cursor = found_pos + hlen;
        let sep = chars[cursor];

        let mut alts: Vec<String> = Vec::with_capacity(total);
        for _ in 0..total {
            let start = cursor + 1;
            let Some(sep_pos) = find_char(&chars, sep, start) else {
                malformed = true;
                break 'outer;
            };
            alts.push(chars[start..sep_pos].iter().collect());
            cursor = sep_pos;
        }
        p = cursor as isize;

        let isel = select.wrapping_sub(1);
        let admissible = isel < alts.len() && condf.map(|f| f(&alts)).unwrap_or(true);
        if admissible {
            let mut alt = alts[isel].clone();
            if let Some(fmt) = fmtstr {
                alt = fmt.replacen("%s", &alt, 1);
            }
            out.push_str(&alt);
            resolved += 1;
        } else {
            out.extend(&chars[ps..=cursor]);
        }
    }

    if malformed {
        (text.to_string(), 0, true)
    } else {
        (out, resolved, false)
    }
}

fn find_sub(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn find_char(haystack: &[char], needle: char, from: usize) -> Option<usize> {
    haystack[from.min(haystack.len())..]
        .iter()
        .position(|&c| c == needle)
        .map(|p| p + from)
}

/// Changes the case of the first letter in `text`, skipping content
/// inside `<...>` tags. If that letter falls inside an alternatives
/// directive, every alternative of that one directive has its first
/// letter changed instead.
pub fn first_to_case(text: &str, upper: bool, nalts: usize, althead: &str) -> String {
    let alt_head: Vec<char> = althead.chars().collect();
    let hlen = alt_head.len();
    let chars: Vec<char> = text.chars().collect();
    let tlen = chars.len();

    let mut remalts = 0usize;
    let mut checkcase = true;
    let mut intag = false;
    let mut nchanged = 0usize;
    let mut out = String::new();
    let mut altsep = '\0';
    let mut i = 0usize;

    while i < tlen {
        let i0 = i;
        let c = chars[i];
        let mut cchange = false;

        if c == '<' {
            intag = true;
        } else if c == '>' {
            intag = false;
        } else if !intag
            && nalts > 0
            && remalts == 0
            && chars[i..].len() >= hlen
            && chars[i..i + hlen] == alt_head[..]
        {
            i += 2;
            if i >= tlen {
                return text.to_string();
            }
            altsep = chars[i];
            remalts = nalts;
            checkcase = true;
        } else if !intag && remalts > 0 && c == altsep {
            remalts -= 1;
            checkcase = true;
        } else if !intag && checkcase && c.is_alphabetic() {
            cchange = true;
            checkcase = false;
        }

        i += 1;
        let seg: String = chars[i0..i].iter().collect();
        if cchange {
            nchanged += 1;
            if upper {
                out.push_str(&seg.to_uppercase());
            } else {
                out.push_str(&seg.to_lowercase());
            }
        } else {
            out.push_str(&seg);
        }

        if nchanged > 0 && remalts == 0 {
            out.extend(&chars[i..]);
            break;
        }
    }

    out
}

pub fn first_to_upper(text: &str, nalts: usize, althead: &str) -> String {
    first_to_case(text, true, nalts, althead)
}

pub fn first_to_lower(text: &str, nalts: usize, althead: &str) -> String {
    first_to_case(text, false, nalts, althead)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_single_alternative() {
        let (text, resolved, malformed) = resolve_alternatives(
            "I see a ~@/pink/white/ elephant.",
            2,
            2,
            None,
            None,
            DEFAULT_ALTHEAD,
        );
        assert_eq!(text, "I see a white elephant.");
        assert_eq!(resolved, 1);
        assert!(!malformed);
    }

    #[test]
    fn malformed_directive_returns_original_text() {
        let (text, resolved, malformed) = resolve_alternatives(
            "I see a ~@/pink/ elephant.",
            2,
            2,
            None,
            None,
            DEFAULT_ALTHEAD,
        );
        assert_eq!(text, "I see a ~@/pink/ elephant.");
        assert_eq!(resolved, 0);
        assert!(malformed);
    }

    #[test]
    fn identity_when_no_directives_present() {
        let (text, resolved, malformed) =
            resolve_alternatives("plain text", 1, 2, None, None, DEFAULT_ALTHEAD);
        assert_eq!(text, "plain text");
        assert_eq!(resolved, 0);
        assert!(!malformed);
    }

    #[test]
    fn first_to_case_skips_tag_content() {
        assert_eq!(first_to_case("<b>hello</b>", true, 0, "~@"), "<b>Hello</b>");
    }

    #[test]
    fn first_to_case_changes_all_alternatives() {
        let changed = first_to_case("~@/pink/white/ elephant", true, 2, "~@");
        assert_eq!(changed, "~@/Pink/White/ elephant");
    }
}
