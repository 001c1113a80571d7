//! The insertion heuristic and `add_more` bulk-insert semantics from
//! SPEC_FULL.md 4.3.
//!
//! Grounded in `pology/catalog.py`'s `Catalog.add`/`Catalog._insertion_pos`:
//! a single forward walk over the existing non-obsolete messages that
//! tracks the "current primary source file" of the run it is in, so
//! that a new message sharing that file gets slotted next to its
//! neighbors instead of at the end.

use std::collections::HashMap;

use crate::message::Message;

/// Where a caller wants a message placed in an `add_more` call.
#[derive(Debug, Clone, Copy)]
pub enum Position {
    /// Resolved automatically by the insertion heuristic.
    Auto,
    /// An explicit index; negative values count from the end the way
    /// a caller-facing API might expose them (`-1` = last position).
    Explicit(i64),
}

/// One request in a bulk `add_more` call.
pub struct AddRequest {
    pub message: Message,
    pub position: Position,
}

/// Returned by the insertion heuristic: the position to insert at,
/// and a confidence in `[0.0, 1.0]` (`1.0` on an actual source-file
/// match, `0.0` when the candidate was simply appended).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertionHint {
    pub position: usize,
    pub confidence: f64,
}

/// Finds where `candidate` should be inserted among `messages` (the
/// catalog's live non-obsolete sequence), given a `synonyms` map from
/// a source file name to the primary name it should be treated as
/// equivalent to while tracking the walk's "current primary file".
///
/// Obsolete candidates always go to the end with confidence `0.0`.
pub fn insertion_heuristic(
    messages: &[Message],
    candidate: &Message,
    synonyms: &HashMap<String, String>,
) -> InsertionHint {
    if candidate.obsolete() || candidate.source().is_empty() {
        return InsertionHint {
            position: messages.len(),
            confidence: 0.0,
        };
    }

    let candidate_files: Vec<&str> =
        candidate.source().iter().map(|s| s.path.as_str()).collect();
    let normalize = |file: &str| -> String {
        synonyms.get(file).cloned().unwrap_or_else(|| file.to_string())
    };

    let mut current_primary: Option<String> = None;
    let mut in_matching_run = false;

    for (idx, msg) in messages.iter().enumerate() {
        if msg.obsolete() {
            continue;
        }
        let primary = msg.source().first().map(|s| s.path.as_str());
        if let Some(primary) = primary {
            let normalized_primary = normalize(primary);
            let matches_synonym = msg
                .source()
                .iter()
                .any(|s| normalize(&s.path) == current_primary.clone().unwrap_or_default());
            if !matches_synonym {
                current_primary = Some(normalized_primary.clone());
            }
        }

        let Some(primary_file) = current_primary.as_deref() else {
            continue;
        };

        let candidate_matches = candidate_files
            .iter()
            .any(|f| normalize(f) == primary_file);

        if candidate_matches {
            in_matching_run = true;
            let candidate_line = candidate
                .source()
                .iter()
                .find(|s| normalize(&s.path) == primary_file)
                .and_then(|s| s.line)
                .unwrap_or(0);
            let existing_line = msg
                .source()
                .iter()
                .find(|s| normalize(&s.path) == primary_file)
                .and_then(|s| s.line)
                .unwrap_or(0);
            if existing_line > candidate_line {
                return InsertionHint {
                    position: idx,
                    confidence: 1.0,
                };
            }
        } else if in_matching_run {
            return InsertionHint {
                position: idx,
                confidence: 1.0,
            };
        }
    }

    if in_matching_run {
        InsertionHint {
            position: messages.len(),
            confidence: 1.0,
        }
    } else {
        InsertionHint {
            position: messages.len(),
            confidence: 0.0,
        }
    }
}

/// Resolves an explicit (possibly negative) position against the
/// current length of the sequence it will be inserted into.
pub fn resolve_explicit_position(pos: i64, len: usize) -> Result<usize, String> {
    let resolved = if pos < 0 {
        len as i64 + pos + 1
    } else {
        pos
    };
    if resolved < 0 || resolved as usize > len {
        Err(format!("position {pos} out of range for length {len}"))
    } else {
        Ok(resolved as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SourceRef;

    fn msg_with_source(msgid: &str, path: &str, line: u32) -> Message {
        let mut m = Message::new(msgid);
        m.push_source(SourceRef::new(path, Some(line)));
        m
    }

    #[test]
    fn inserts_before_later_line_in_same_file() {
        let messages = vec![
            msg_with_source("a", "foo.c", 10),
            msg_with_source("b", "foo.c", 30),
        ];
        let candidate = msg_with_source("c", "foo.c", 20);
        let hint =
            insertion_heuristic(&messages, &candidate, &HashMap::new());
        assert_eq!(
            hint,
            InsertionHint {
                position: 1,
                confidence: 1.0
            }
        );
    }

    #[test]
    fn appends_with_zero_confidence_when_no_match() {
        let messages = vec![msg_with_source("a", "foo.c", 10)];
        let candidate = msg_with_source("c", "bar.c", 20);
        let hint =
            insertion_heuristic(&messages, &candidate, &HashMap::new());
        assert_eq!(hint.position, 1);
        assert_eq!(hint.confidence, 0.0);
    }

    #[test]
    fn obsolete_candidate_always_goes_to_end() {
        let messages = vec![msg_with_source("a", "foo.c", 10)];
        let mut candidate = msg_with_source("c", "foo.c", 1);
        candidate.set_obsolete(true);
        let hint =
            insertion_heuristic(&messages, &candidate, &HashMap::new());
        assert_eq!(hint.position, messages.len());
        assert_eq!(hint.confidence, 0.0);
    }

    #[test]
    fn resolves_negative_explicit_positions() {
        assert_eq!(resolve_explicit_position(-1, 5), Ok(5));
        assert_eq!(resolve_explicit_position(0, 5), Ok(0));
        assert!(resolve_explicit_position(-10, 5).is_err());
    }
}
