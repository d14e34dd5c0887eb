use std::fmt;

use regex::Regex;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Regular expression selecting record fields by name.
///
/// Like Python's `re.match`, a key is selected when the expression
/// matches at the start of the key; the remainder of the key is not
/// constrained. `a[0-9]+` therefore selects `a0`, `a12` and also
/// `a1_len`. The empty expression selects every key.
#[derive(Clone, Debug)]
pub struct KeyPattern {
    source: String,
    anchored: Regex,
}

impl KeyPattern {
    pub fn new(expr: &str) -> Result<Self, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{})", expr))?;
        Ok(Self {
            source: expr.to_string(),
            anchored,
        })
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.anchored.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for KeyPattern {
    fn default() -> Self {
        // safety: constant expression
        Self::new("a[0-9]+").unwrap()
    }
}

impl PartialEq for KeyPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for KeyPattern {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for KeyPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(KeyPatternVisitor {})
    }
}

struct KeyPatternVisitor {}

impl<'de> Visitor<'de> for KeyPatternVisitor {
    type Value = KeyPattern;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a regular expression")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        KeyPattern::new(value).map_err(de::Error::custom)
    }
}
