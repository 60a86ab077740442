//! Operation tags.

use std::fmt;

/// Operation named by the first element of every inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationTag {
    /// Generate a fresh resident keypair and return its public half.
    GenerateKeys,
    /// Encrypt a payload under a caller-supplied key.
    Encrypt,
    /// Decrypt a payload with the resident key (or a caller-supplied secret).
    Decrypt,
}

impl OperationTag {
    /// Every operation, in wire order.
    pub const ALL: [Self; 3] = [Self::GenerateKeys, Self::Encrypt, Self::Decrypt];

    /// Wire name of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenerateKeys => "generate-keys",
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
        }
    }

    /// Parse a wire name. Matching is exact and case-sensitive.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
