//! Request parsing and validation.
//!
//! Inbound messages arrive as untyped JSON arrays of variable length. The
//! validator is the only place that looks at them; everything downstream works
//! with [`Request`], which cannot represent a message that failed a check.
//!
//! Checks run in a fixed order so that the reported kind is deterministic:
//!
//! 1. shape and element types → `MalformedRequest`
//! 2. operation tag → `UnsupportedOperation`
//! 3. required payload / key → `MissingParameter`
//! 4. payload length after trimming → `PayloadTooLarge`

use std::fmt;

use serde_json::Value;

use crate::{Correlation, CorrelationId, CorrelationMode, ErrorKind, OperationTag};

/// Default bound on plaintext length, in characters.
pub const DEFAULT_MAX_PLAINTEXT_LEN: usize = 10_000;

/// Default bound on ciphertext length, in characters.
///
/// Ciphertexts are base64 and carry key-wrapping overhead, so this sits well
/// above the plaintext bound.
pub const DEFAULT_MAX_CIPHERTEXT_LEN: usize = 65_536;

/// Length bounds applied to trimmed payloads.
///
/// Lengths count Unicode scalar values, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLimits {
    /// Maximum plaintext length accepted by `encrypt`.
    pub max_plaintext_len: usize,
    /// Maximum ciphertext length accepted by `decrypt`.
    pub max_ciphertext_len: usize,
}

impl Default for PayloadLimits {
    fn default() -> Self {
        Self {
            max_plaintext_len: DEFAULT_MAX_PLAINTEXT_LEN,
            max_ciphertext_len: DEFAULT_MAX_CIPHERTEXT_LEN,
        }
    }
}

/// A validated request.
///
/// Payloads are already trimmed of surrounding whitespace and within bounds.
/// Keys are passed through as sent; the cipher decides how to read them.
#[derive(Clone, PartialEq, Eq)]
pub enum Request {
    /// Generate a fresh resident keypair.
    GenerateKeys,
    /// Encrypt `plaintext` under `key` (public key blob or shared secret).
    Encrypt {
        /// Trimmed plaintext.
        plaintext: String,
        /// Public key blob or shared secret.
        key: String,
    },
    /// Decrypt `ciphertext`, with `key` for ciphers that take a caller secret.
    Decrypt {
        /// Trimmed ciphertext.
        ciphertext: String,
        /// Shared secret, if one was sent. Ignored by resident-key ciphers.
        key: Option<String>,
    },
}

impl Request {
    /// Operation this request performs.
    pub fn operation(&self) -> OperationTag {
        match self {
            Self::GenerateKeys => OperationTag::GenerateKeys,
            Self::Encrypt { .. } => OperationTag::Encrypt,
            Self::Decrypt { .. } => OperationTag::Decrypt,
        }
    }
}

// Payloads and keys are secrets; never let them reach a log line.
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenerateKeys => f.write_str("GenerateKeys"),
            Self::Encrypt { plaintext, key } => f
                .debug_struct("Encrypt")
                .field("plaintext_len", &plaintext.len())
                .field("key_len", &key.len())
                .finish(),
            Self::Decrypt { ciphertext, key } => f
                .debug_struct("Decrypt")
                .field("ciphertext_len", &ciphertext.len())
                .field("has_key", &key.is_some())
                .finish(),
        }
    }
}

/// A request together with its correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// How to address the response.
    pub correlation: Correlation,
    /// The validated request.
    pub request: Request,
}

/// A message that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Whatever correlation could be recovered before the failing check.
    pub correlation: Correlation,
    /// Kind reported to the caller.
    pub kind: ErrorKind,
    /// Local detail for logging. Never sent on the wire.
    pub reason: String,
}

impl Rejection {
    fn new(correlation: &Correlation, kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self { correlation: correlation.clone(), kind, reason: reason.into() }
    }
}

/// Validates inbound messages for one correlation mode and set of limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator {
    mode: CorrelationMode,
    limits: PayloadLimits,
}

impl RequestValidator {
    /// Create a validator.
    pub fn new(mode: CorrelationMode, limits: PayloadLimits) -> Self {
        Self { mode, limits }
    }

    /// Correlation mode this validator expects.
    pub fn mode(&self) -> CorrelationMode {
        self.mode
    }

    /// Length bounds this validator enforces.
    pub fn limits(&self) -> PayloadLimits {
        self.limits
    }

    /// Validate a message.
    ///
    /// Pure: the same input always yields the same result.
    pub fn validate(&self, message: &Value) -> Result<Inbound, Rejection> {
        let Value::Array(elements) = message else {
            return Err(Rejection::new(
                &Correlation::Unmatched,
                ErrorKind::MalformedRequest,
                "message is not an array",
            ));
        };

        if elements.len() < self.mode.min_elements() {
            return Err(Rejection::new(
                &Correlation::Unmatched,
                ErrorKind::MalformedRequest,
                format!(
                    "message has {} elements, need at least {}",
                    elements.len(),
                    self.mode.min_elements()
                ),
            ));
        }

        let mut correlation = match self.mode {
            CorrelationMode::MessageId => {
                let id = CorrelationId::from_value(&elements[1]).ok_or_else(|| {
                    Rejection::new(
                        &Correlation::Unmatched,
                        ErrorKind::MalformedRequest,
                        "correlation id must be a string or a number",
                    )
                })?;
                Correlation::Id(id)
            },
            CorrelationMode::OperationTag => Correlation::Unmatched,
        };

        let Some(name) = elements[0].as_str() else {
            return Err(Rejection::new(
                &correlation,
                ErrorKind::MalformedRequest,
                "operation tag must be a string",
            ));
        };

        let Some(operation) = OperationTag::parse(name) else {
            return Err(Rejection::new(
                &correlation,
                ErrorKind::UnsupportedOperation,
                format!("unknown operation {name:?}"),
            ));
        };

        if self.mode == CorrelationMode::OperationTag {
            correlation = Correlation::Tag(operation);
        }

        let payload_index = self.mode.payload_index();
        let payload = elements.get(payload_index);
        let key = elements.get(payload_index + 1);

        let request = match operation {
            OperationTag::GenerateKeys => Request::GenerateKeys,
            OperationTag::Encrypt => {
                let plaintext = optional_text(payload, "payload", &correlation)?;
                let key = optional_text(key, "key", &correlation)?;
                let (Some(plaintext), Some(key)) = (plaintext, key) else {
                    return Err(Rejection::new(
                        &correlation,
                        ErrorKind::MissingParameter,
                        "encrypt requires a payload and a key",
                    ));
                };

                let plaintext =
                    bounded(plaintext, self.limits.max_plaintext_len, "plaintext", &correlation)?;
                Request::Encrypt { plaintext, key: key.to_string() }
            },
            OperationTag::Decrypt => {
                let ciphertext = optional_text(payload, "payload", &correlation)?;
                let key = optional_text(key, "key", &correlation)?;
                let Some(ciphertext) = ciphertext else {
                    return Err(Rejection::new(
                        &correlation,
                        ErrorKind::MissingParameter,
                        "decrypt requires a payload",
                    ));
                };

                let ciphertext =
                    bounded(ciphertext, self.limits.max_ciphertext_len, "ciphertext", &correlation)?;
                Request::Decrypt { ciphertext, key: key.map(str::to_string) }
            },
        };

        Ok(Inbound { correlation, request })
    }
}

/// Read an optional text element.
///
/// Absent, `null`, empty and whitespace-only all mean "not provided". Any other
/// non-string value is malformed.
fn optional_text<'a>(
    value: Option<&'a Value>,
    field: &str,
    correlation: &Correlation,
) -> Result<Option<&'a str>, Rejection> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(Rejection::new(
            correlation,
            ErrorKind::MalformedRequest,
            format!("{field} must be a string"),
        )),
    }
}

/// Trim and enforce a length bound.
fn bounded(
    text: &str,
    max_len: usize,
    field: &str,
    correlation: &Correlation,
) -> Result<String, Rejection> {
    let trimmed = text.trim();

    // Byte length bounds char count from above
    if trimmed.len() > max_len {
        let len = trimmed.chars().count();
        if len > max_len {
            return Err(Rejection::new(
                correlation,
                ErrorKind::PayloadTooLarge,
                format!("{field} is {len} characters, limit is {max_len}"),
            ));
        }
    }

    Ok(trimmed.to_string())
}
