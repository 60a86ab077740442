//! Worker error types.
//!
//! Every failure the worker can report has one variant here, carrying local
//! detail for logs. Only [`WorkerError::kind`] crosses the process boundary.

use cipherbox_crypto::CipherError;
use cipherbox_proto::{ErrorKind, Rejection};
use thiserror::Error;

/// Failure while handling a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// Message failed shape or type checks
    #[error("malformed request: {reason}")]
    MalformedRequest {
        /// What was wrong
        reason: String,
    },

    /// Operation is unknown or not offered by the active cipher
    #[error("unsupported operation: {reason}")]
    UnsupportedOperation {
        /// What was refused
        reason: String,
    },

    /// A required payload or key was absent
    #[error("missing parameter: {reason}")]
    MissingParameter {
        /// Which parameter
        reason: String,
    },

    /// Payload exceeded its length bound
    #[error("payload too large: {reason}")]
    PayloadTooLarge {
        /// Length and limit
        reason: String,
    },

    /// Decrypt needs a resident key and none has been generated
    #[error("no resident key; generate keys first")]
    KeyNotInitialized,

    /// Keypair generation failed; any previous key is still resident
    #[error("key generation failed: {reason}")]
    KeyGenerationFailed {
        /// Underlying failure
        reason: String,
    },

    /// Encryption failed
    #[error("encryption failed: {reason}")]
    EncryptionFailed {
        /// Underlying failure
        reason: String,
    },

    /// Decryption failed
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// Underlying failure
        reason: String,
    },
}

impl WorkerError {
    /// Wire kind reported to the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedRequest { .. } => ErrorKind::MalformedRequest,
            Self::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Self::KeyNotInitialized => ErrorKind::KeyNotInitialized,
            Self::KeyGenerationFailed { .. } => ErrorKind::KeyGenerationFailed,
            Self::EncryptionFailed { .. } => ErrorKind::EncryptionFailed,
            Self::DecryptionFailed { .. } => ErrorKind::DecryptionFailed,
        }
    }

    /// Map a key generation failure.
    pub(crate) fn generation(err: CipherError) -> Self {
        match err {
            CipherError::NotSupported { .. } => {
                Self::UnsupportedOperation { reason: err.to_string() }
            },
            _ => Self::KeyGenerationFailed { reason: err.to_string() },
        }
    }

    /// Map an encryption failure.
    pub(crate) fn encryption(err: CipherError) -> Self {
        match err {
            CipherError::NotSupported { .. } => {
                Self::UnsupportedOperation { reason: err.to_string() }
            },
            _ => Self::EncryptionFailed { reason: err.to_string() },
        }
    }

    /// Map a decryption failure.
    pub(crate) fn decryption(err: CipherError) -> Self {
        match err {
            CipherError::NotSupported { .. } => {
                Self::UnsupportedOperation { reason: err.to_string() }
            },
            _ => Self::DecryptionFailed { reason: err.to_string() },
        }
    }
}

impl From<Rejection> for WorkerError {
    fn from(rejection: Rejection) -> Self {
        let reason = rejection.reason;
        match rejection.kind {
            ErrorKind::MalformedRequest => Self::MalformedRequest { reason },
            ErrorKind::UnsupportedOperation => Self::UnsupportedOperation { reason },
            ErrorKind::MissingParameter => Self::MissingParameter { reason },
            ErrorKind::PayloadTooLarge => Self::PayloadTooLarge { reason },
            ErrorKind::KeyNotInitialized => Self::KeyNotInitialized,
            ErrorKind::KeyGenerationFailed => Self::KeyGenerationFailed { reason },
            ErrorKind::EncryptionFailed => Self::EncryptionFailed { reason },
            ErrorKind::DecryptionFailed => Self::DecryptionFailed { reason },
        }
    }
}

/// Invalid worker configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Plaintext bound must admit at least one character
    #[error("max plaintext length must be at least 1")]
    ZeroPlaintextBound,

    /// Ciphertext bound must admit at least one character
    #[error("max ciphertext length must be at least 1")]
    ZeroCiphertextBound,
}

#[cfg(test)]
mod tests {
    use cipherbox_crypto::CipherSuite;

    use super::*;

    #[test]
    fn not_supported_maps_to_unsupported_operation() {
        let err = CipherError::NotSupported { suite: CipherSuite::Passphrase, operation: "x" };
        assert_eq!(WorkerError::generation(err.clone()).kind(), ErrorKind::UnsupportedOperation);
        assert_eq!(WorkerError::decryption(err).kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn input_errors_stay_in_operation_kind() {
        let err = CipherError::InvalidPublicKey { reason: "bad".to_string() };
        assert_eq!(WorkerError::encryption(err).kind(), ErrorKind::EncryptionFailed);

        let err = CipherError::InvalidEncoding { reason: "bad".to_string() };
        assert_eq!(WorkerError::decryption(err).kind(), ErrorKind::DecryptionFailed);
    }

    #[test]
    fn every_kind_round_trips_through_rejection_mapping() {
        for kind in ErrorKind::ALL {
            let rejection = Rejection {
                correlation: cipherbox_proto::Correlation::Unmatched,
                kind,
                reason: "detail".to_string(),
            };
            assert_eq!(WorkerError::from(rejection).kind(), kind);
        }
    }
}
