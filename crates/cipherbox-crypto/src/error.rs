//! Cipher errors

use thiserror::Error;

use crate::CipherSuite;

/// Errors from cipher operations.
///
/// Reasons are for local logging only. The worker maps every variant to a
/// coarse wire kind before anything leaves the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Public key blob could not be parsed or is unacceptable
    #[error("invalid public key: {reason}")]
    InvalidPublicKey {
        /// Why the key was rejected
        reason: String,
    },

    /// Text is not valid base64 or PEM
    #[error("invalid encoding: {reason}")]
    InvalidEncoding {
        /// Decoder error
        reason: String,
    },

    /// Ciphertext is structurally invalid (truncated, bad lengths)
    #[error("invalid ciphertext: {reason}")]
    InvalidCiphertext {
        /// What was wrong with the layout
        reason: String,
    },

    /// Ciphertext was produced by an unknown format version
    #[error("unsupported ciphertext version {version}")]
    UnsupportedVersion {
        /// Version byte found in the ciphertext
        version: u8,
    },

    /// Keypair generation failed
    #[error("key generation failed: {reason}")]
    KeyGeneration {
        /// Underlying failure
        reason: String,
    },

    /// Encryption failed
    #[error("encryption failed: {reason}")]
    Encryption {
        /// Underlying failure
        reason: String,
    },

    /// Decryption failed (wrong key or tampered ciphertext)
    #[error("decryption failed: {reason}")]
    Decryption {
        /// Underlying failure
        reason: String,
    },

    /// The backend does not offer this operation
    #[error("{operation} is not supported by the {suite} cipher")]
    NotSupported {
        /// Backend that refused
        suite: CipherSuite,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Decrypted bytes are not UTF-8
    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,

    /// Cipher configuration is out of range
    #[error("invalid cipher configuration: {reason}")]
    InvalidConfig {
        /// Which setting was rejected
        reason: String,
    },
}

impl CipherError {
    /// Returns true if the error was caused by caller input rather than the
    /// primitive itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPublicKey { .. }
                | Self::InvalidEncoding { .. }
                | Self::InvalidCiphertext { .. }
                | Self::UnsupportedVersion { .. }
        )
    }
}
