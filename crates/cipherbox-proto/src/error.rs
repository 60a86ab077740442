//! Error kinds visible on the wire.

use std::fmt;

/// Failure kind reported to the caller.
///
/// This is the whole of what crosses the worker boundary on failure. Richer
/// context (which field, which length, the cipher's own message) stays
/// inside the worker and is only logged locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Message is not an array, is too short, or has mistyped elements.
    MalformedRequest,
    /// Operation tag is not one the worker knows.
    UnsupportedOperation,
    /// A payload or key required by the operation is absent or empty.
    MissingParameter,
    /// Payload exceeds the configured maximum length.
    PayloadTooLarge,
    /// Decryption needs a resident key and none has been generated.
    KeyNotInitialized,
    /// The cipher failed to produce a usable keypair.
    KeyGenerationFailed,
    /// The cipher rejected the input or produced no ciphertext.
    EncryptionFailed,
    /// The cipher rejected the ciphertext or produced no plaintext.
    DecryptionFailed,
}

impl ErrorKind {
    /// Every kind.
    pub const ALL: [Self; 8] = [
        Self::MalformedRequest,
        Self::UnsupportedOperation,
        Self::MissingParameter,
        Self::PayloadTooLarge,
        Self::KeyNotInitialized,
        Self::KeyGenerationFailed,
        Self::EncryptionFailed,
        Self::DecryptionFailed,
    ];

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedRequest => "MalformedRequest",
            Self::UnsupportedOperation => "UnsupportedOperation",
            Self::MissingParameter => "MissingParameter",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::KeyNotInitialized => "KeyNotInitialized",
            Self::KeyGenerationFailed => "KeyGenerationFailed",
            Self::EncryptionFailed => "EncryptionFailed",
            Self::DecryptionFailed => "DecryptionFailed",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Returns true if the caller sent bad input.
    ///
    /// Caller errors are detected before any key state or cipher is touched.
    /// The rest come from key state or the cipher itself.
    pub fn is_caller_error(self) -> bool {
        match self {
            Self::MalformedRequest
            | Self::UnsupportedOperation
            | Self::MissingParameter
            | Self::PayloadTooLarge => true,

            Self::KeyNotInitialized
            | Self::KeyGenerationFailed
            | Self::EncryptionFailed
            | Self::DecryptionFailed => false,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_name(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn validation_kinds_are_caller_errors() {
        assert!(ErrorKind::MalformedRequest.is_caller_error());
        assert!(ErrorKind::PayloadTooLarge.is_caller_error());
        assert!(!ErrorKind::KeyNotInitialized.is_caller_error());
        assert!(!ErrorKind::DecryptionFailed.is_caller_error());
    }
}
