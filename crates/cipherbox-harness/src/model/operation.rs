//! Operations for model-based testing.
//!
//! Operations represent everything a caller can do to a worker. They are
//! generated randomly by proptest and applied to both the model and the real
//! worker.

use arbitrary::Arbitrary;
use cipherbox_proto::ErrorKind;

/// Operations that can be applied to a worker.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Ask for a fresh resident keypair.
    GenerateKeys,

    /// Encrypt under the current public key (or the shared secret).
    ///
    /// With no resident key an asymmetric suite has nothing to encrypt to, so
    /// the real side sends a key that does not parse.
    Encrypt {
        /// Plaintext to seal.
        plaintext: SmallText,
    },

    /// Decrypt one of the ciphertexts produced earlier in the session.
    ///
    /// Picks `index` modulo the number of stored ciphertexts. With none
    /// stored this degrades to [`Operation::DecryptGarbage`].
    DecryptStored {
        /// Which stored ciphertext.
        index: u8,
    },

    /// Decrypt something that was never produced by a cipher.
    DecryptGarbage {
        /// Varies the garbage.
        seed: u8,
    },

    /// Send a message that fails envelope validation.
    Malformed {
        /// Which malformation.
        shape: MalformedShape,
    },

    /// Send an operation tag the worker does not know.
    UnknownOperation,

    /// Encrypt a plaintext one character over the bound.
    Oversized,

    /// Drop the resident key out of band.
    ClearKeys,
}

/// Ways to break the envelope.
#[derive(Debug, Clone, Copy, Arbitrary)]
pub enum MalformedShape {
    /// Not an array at all.
    NotAnArray,
    /// An empty array.
    Empty,
    /// Operation tag is not a string.
    NumericTag,
    /// Payload is an object instead of a string.
    ObjectPayload,
}

/// Small plaintext for testing.
///
/// Content is deterministic from the seed and never empty.
#[derive(Debug, Clone, Arbitrary)]
pub struct SmallText {
    /// Content seed.
    pub seed: u8,
    /// Length hint (0-3 maps to tiny/small/medium/large).
    pub size_class: u8,
}

impl SmallText {
    /// Expand to the actual plaintext.
    pub fn to_text(&self) -> String {
        let len = match self.size_class % 4 {
            0 => 1,
            1 => 8,
            2 => 64,
            _ => 200,
        };

        (0..len).map(|i| char::from(b'a' + self.seed.wrapping_add(i as u8) % 26)).collect()
    }
}

/// What the caller observed after an operation.
///
/// Key material and ciphertexts are random, so only their presence is
/// compared. Plaintexts are compared exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// A public key came back.
    PublicKey,
    /// A ciphertext came back.
    Ciphertext,
    /// A plaintext came back.
    Plaintext(String),
    /// An error came back.
    Error(ErrorKind),
    /// Nothing was sent to the worker.
    Silent,
}

impl OperationResult {
    /// Check if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Error(_))
    }

    /// Error kind, if the operation failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error(kind) => Some(*kind),
            _ => None,
        }
    }
}
