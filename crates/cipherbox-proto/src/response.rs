//! Correlation envelope for outbound messages.

use std::fmt;

use serde_json::{Value, json};

use crate::{Correlation, ErrorKind};

/// Result of a successful operation.
#[derive(Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Public key blob from `generate-keys`.
    PublicKey(String),
    /// Ciphertext from `encrypt`.
    Ciphertext(String),
    /// Plaintext from `decrypt`.
    Plaintext(String),
}

impl Outcome {
    /// JSON form of the result element.
    pub fn to_value(&self) -> Value {
        match self {
            Self::PublicKey(blob) => json!({ "publicKey": blob }),
            Self::Ciphertext(text) | Self::Plaintext(text) => Value::String(text.clone()),
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublicKey(blob) => f.debug_tuple("PublicKey").field(blob).finish(),
            Self::Ciphertext(text) => f.debug_tuple("Ciphertext").field(&text.len()).finish(),
            Self::Plaintext(text) => f.debug_tuple("Plaintext").field(&text.len()).finish(),
        }
    }
}

/// Outbound message: a correlation plus exactly one of result or error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// How the caller matches this response to its request.
    pub correlation: Correlation,
    /// Result or error kind.
    pub result: Result<Outcome, ErrorKind>,
}

impl Response {
    /// Successful response.
    pub fn success(correlation: Correlation, outcome: Outcome) -> Self {
        Self { correlation, result: Ok(outcome) }
    }

    /// Failed response.
    pub fn failure(correlation: Correlation, kind: ErrorKind) -> Self {
        Self { correlation, result: Err(kind) }
    }

    /// Returns true if the operation succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Error kind of a failed response.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.result.as_ref().err().copied()
    }

    /// Encode as a JSON array.
    ///
    /// Failures addressed by id carry `{"error": kind}`; all other failures
    /// use the `["error", kind]` form because there is no key to echo.
    pub fn to_value(&self) -> Value {
        match (&self.correlation, &self.result) {
            (Correlation::Id(id), Ok(outcome)) => json!([id.to_value(), outcome.to_value()]),
            (Correlation::Id(id), Err(kind)) => {
                json!([id.to_value(), { "error": kind.as_str() }])
            },
            (Correlation::Tag(tag), Ok(outcome)) => json!([tag.as_str(), outcome.to_value()]),
            (Correlation::Unmatched, Ok(outcome)) => json!([Value::Null, outcome.to_value()]),
            (Correlation::Tag(_) | Correlation::Unmatched, Err(kind)) => {
                json!(["error", kind.as_str()])
            },
        }
    }

    /// Encode as a single line of JSON text.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}
