use std::collections::BTreeMap;

use crate::key_pattern::KeyPattern;

/// Key/value pairs of one audit log line, ordered by key
pub type EventRecord = BTreeMap<String, String>;

/// The subset of an [`EventRecord`] that survived an [`EventFilter`]
pub type FilteredFields = BTreeMap<String, String>;

/// Characters trimmed from both ends of keys and values
const STRIP_CHARS: &[char] = &[' ', '"'];

/// Token separators: Unicode whitespace plus the ASCII information
/// separators. auditd's enriched format puts `\x1d` between the raw
/// and the interpreted fields.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

/// Split a log line into key/value pairs.
///
/// Tokens are separated by runs of separator characters and split once on the
/// first `=`. Surrounding blanks and double quotes are removed from
/// both halves. If any token lacks a `=`, the whole line is rejected.
/// Quoted values containing whitespace are not kept together.
pub fn tokenize(line: &str) -> Option<EventRecord> {
    line.split(is_separator)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .split_once('=')
                .map(|(k, v)| {
                    (
                        k.trim_matches(STRIP_CHARS).to_string(),
                        v.trim_matches(STRIP_CHARS).to_string(),
                    )
                })
        })
        .collect()
}

/// Selects records of one event type and projects out fields by name
#[derive(Clone, Debug, PartialEq)]
pub struct EventFilter {
    pub event_type: String,
    pub key_pattern: KeyPattern,
}

impl Default for EventFilter {
    fn default() -> Self {
        EventFilter {
            event_type: "execve".into(),
            key_pattern: KeyPattern::default(),
        }
    }
}

impl EventFilter {
    pub fn new(event_type: &str, key_pattern: KeyPattern) -> Self {
        EventFilter {
            event_type: event_type.into(),
            key_pattern,
        }
    }

    /// Returns the fields whose names match the key pattern if the
    /// record's `type` equals the configured event type, ignoring case.
    pub fn apply(&self, record: &EventRecord) -> Option<FilteredFields> {
        let ty = record.get("type")?;
        if ty.to_lowercase() != self.event_type.to_lowercase() {
            return None;
        }
        Some(
            record
                .iter()
                .filter(|(k, _)| self.key_pattern.is_match(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}
