//! `remove_accelerator`, SPEC_FULL.md 4.6.
//!
//! Grounded in `misc/resolve.py::remove_accelerator`: removes the
//! first marker preceding an alphanumeric, skipping an `&` that looks
//! like an XML entity introducer, hoisting out a leading/trailing
//! `(<marker><alnum>)` group, and collapsing doubled (escaped)
//! markers.

const USUAL_ACCELS: [char; 4] = ['_', '&', '~', '^'];

fn entity_tail_len(chars: &[char], from: usize) -> Option<usize> {
    if from >= chars.len() {
        return None;
    }
    let first = chars[from];
    if !(first.is_alphanumeric() || first == '_' || first == ':') {
        return None;
    }
    let mut end = from + 1;
    while end < chars.len() {
        let c = chars[end];
        if c.is_alphanumeric() || c == '.' || c == '_' || c == ':' || c == '-' {
            end += 1;
        } else {
            break;
        }
    }
    if end < chars.len() && chars[end] == ';' {
        Some(end + 1 - from)
    } else {
        None
    }
}

/// Removes the first accelerator marker from `text`. When `accels` is
/// empty and `greedy` is `true`, tries `_ & ~ ^`; when empty and not
/// greedy, returns `text` unchanged.
pub fn remove_accelerator(text: &str, accels: &[char], greedy: bool) -> String {
    let accels: Vec<char> = if accels.is_empty() {
        if !greedy {
            return text.to_string();
        }
        USUAL_ACCELS.to_vec()
    } else {
        accels.to_vec()
    };

    let mut chars: Vec<char> = text.chars().collect();

    for &accel in &accels {
        let mut p = 0usize;
        loop {
            let Some(hit) = chars[p..].iter().position(|&c| c == accel) else {
                break;
            };
            let p_hit = p + hit;

            let next_is_alnum = chars
                .get(p_hit + 1)
                .map(|c| c.is_alphanumeric())
                .unwrap_or(false);

            if next_is_alnum {
                if accel == '&' {
                    if let Some(len) = entity_tail_len(&chars, p_hit + 1) {
                        p = p_hit + 1 + len;
                        continue;
                    }
                }

                chars.remove(p_hit);

                let opens_paren = p_hit > 0 && chars.get(p_hit - 1) == Some(&'(');
                let closes_paren = chars.get(p_hit + 1) == Some(&')');
                if opens_paren && closes_paren {
                    let tlen = chars.len();
                    let mut p1 = p_hit as isize - 2;
                    while p1 >= 0 && !chars[p1 as usize].is_alphanumeric() {
                        p1 -= 1;
                    }
                    p1 += 1;
                    let mut p2 = p_hit + 2;
                    while p2 < tlen && !chars[p2].is_alphanumeric() {
                        p2 += 1;
                    }
                    if p2 > 0 {
                        p2 -= 1;
                    }
                    if p1 == 0 {
                        let rest: String = chars[p2 + 1..].iter().collect();
                        let head: String =
                            chars[..p_hit - 1].iter().collect::<String>();
                        let mut new_text = head.trim_start().to_string();
                        new_text.push_str(&rest);
                        chars = new_text.chars().collect();
                    } else if p2 + 1 == tlen {
                        let head: String = chars[..p1].iter().collect();
                        let rest: String =
                            chars[p_hit + 2..].iter().collect::<String>();
                        let mut new_text = head;
                        new_text.push_str(rest.trim_end());
                        chars = new_text.chars().collect();
                    }
                }
                break;
            }

            if chars.get(p_hit + 1) == Some(&accel) {
                chars.remove(p_hit);
            }
            p = p_hit + 1;
        }
    }

    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_marker_before_letter() {
        assert_eq!(remove_accelerator("Foo &Bar", &['&'], false), "Foo Bar");
    }

    #[test]
    fn ignores_ampersand_not_preceding_letter() {
        assert_eq!(remove_accelerator("Foo & Bar", &['&'], false), "Foo & Bar");
    }

    #[test]
    fn ignores_ampersand_that_looks_like_entity() {
        assert_eq!(
            remove_accelerator("Tom &amp; Jerry", &['&'], false),
            "Tom &amp; Jerry"
        );
    }

    #[test]
    fn removes_parenthesized_trailing_group() {
        assert_eq!(
            remove_accelerator("Foo Bar (&B)", &['&'], false),
            "Foo Bar"
        );
    }

    #[test]
    fn greedy_tries_usual_markers_when_none_given() {
        assert_eq!(remove_accelerator("Foo _Bar", &[], true), "Foo Bar");
    }

    #[test]
    fn empty_accels_without_greedy_is_identity() {
        assert_eq!(remove_accelerator("Foo &Bar", &[], false), "Foo &Bar");
    }
}
