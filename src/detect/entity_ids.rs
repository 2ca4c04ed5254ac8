//! Parser for `[CustomEntity]` id strings.
//!
//! An id is either a plain placement name (`"Example/Spinner"`) or names a
//! static generator method after an `=` (`"Example/Spinner = Load"`).

use std::fmt;

/// One parsed `[CustomEntity]` id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityId {
    Plain(String),
    Generator { id: String, method: String },
}

impl EntityId {
    pub fn is_generator(&self) -> bool {
        matches!(self, EntityId::Generator { .. })
    }

    /// Generator method name, if any.
    pub fn generator(&self) -> Option<&str> {
        match self {
            EntityId::Generator { method, .. } => Some(method),
            EntityId::Plain(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Plain(id) => write!(f, "{}", id),
            EntityId::Generator { id, method } => write!(f, "{} = {}", id, method),
        }
    }
}

/// Parse one raw id. Splits on the first `=`; both halves are trimmed.
pub fn parse_entity_id(raw: &str) -> EntityId {
    let raw = raw.trim();
    match raw.split_once('=') {
        Some((id, method)) => EntityId::Generator {
            id: id.trim().to_string(),
            method: method.trim().to_string(),
        },
        None => EntityId::Plain(raw.to_string()),
    }
}
