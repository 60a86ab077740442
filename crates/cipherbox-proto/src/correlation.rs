//! Correlation between requests and responses.

use serde_json::{Number, Value};

use crate::OperationTag;

/// Caller-chosen identifier echoed unchanged in the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationId {
    /// JSON string id.
    Text(String),
    /// JSON number id.
    Number(Number),
}

impl CorrelationId {
    /// Extract an id from a message element. Only strings and numbers qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Number(number) => Some(Self::Number(number.clone())),
            _ => None,
        }
    }

    /// JSON form, identical to what the caller sent.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(number) => Value::Number(number.clone()),
        }
    }
}

impl From<&str> for CorrelationId {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CorrelationId {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<u64> for CorrelationId {
    fn from(number: u64) -> Self {
        Self::Number(number.into())
    }
}

/// Which correlation scheme the protocol runs.
///
/// `MessageId` is canonical. `OperationTag` serves fire-and-forget callers
/// that match responses by operation only; two in-flight requests of the same
/// operation cannot be told apart in that mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationMode {
    /// `[operationTag, correlationId, payload?, auxiliaryKey?]`
    #[default]
    MessageId,
    /// `[operationTag, payload?, auxiliaryKey?]`
    OperationTag,
}

impl CorrelationMode {
    /// Minimum number of elements a message must have.
    pub fn min_elements(self) -> usize {
        match self {
            Self::MessageId => 2,
            Self::OperationTag => 1,
        }
    }

    /// Index of the payload element. The auxiliary key follows it.
    pub(crate) fn payload_index(self) -> usize {
        match self {
            Self::MessageId => 2,
            Self::OperationTag => 1,
        }
    }
}

/// Correlation recovered from an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    /// Caller supplied an explicit id.
    Id(CorrelationId),
    /// Matched by operation tag only.
    Tag(OperationTag),
    /// Nothing could be recovered (message too malformed).
    Unmatched,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strings_and_numbers_are_ids() {
        assert_eq!(CorrelationId::from_value(&json!("corr-1")), Some("corr-1".into()));
        assert_eq!(CorrelationId::from_value(&json!(7)), Some(7u64.into()));
    }

    #[test]
    fn other_values_are_not_ids() {
        for value in [json!(null), json!(true), json!([1]), json!({"id": 1})] {
            assert_eq!(CorrelationId::from_value(&value), None);
        }
    }

    #[test]
    fn id_echoes_unchanged() {
        let value = json!(-12.5);
        let id = CorrelationId::from_value(&value).unwrap();
        assert_eq!(id.to_value(), value);
    }
}
