//! The cipher capability boundary.
//!
//! The worker never touches a primitive directly. It asks a [`Cipher`] for
//! keypairs and for encrypt/decrypt over strings, and gets back either a
//! string or a [`CipherError`]. Randomness always comes from the caller so
//! tests can run every backend from a seed.

use std::fmt;

use rand_core::CryptoRngCore;
use zeroize::ZeroizeOnDrop;

use crate::CipherError;

/// Which family of cryptography a backend implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    /// Symmetric, keyed by a caller-supplied passphrase
    Passphrase,
    /// RSA-OAEP key wrapping
    Rsa,
    /// Elliptic-curve ElGamal-style (ECDH over secp256k1)
    ElGamal,
}

impl CipherSuite {
    /// Every suite, in a stable order.
    pub const ALL: [Self; 3] = [Self::Passphrase, Self::Rsa, Self::ElGamal];

    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passphrase => "passphrase",
            Self::Rsa => "rsa",
            Self::ElGamal => "elgamal",
        }
    }

    /// Associated data bound into every AEAD operation of this suite.
    ///
    /// A ciphertext produced by one suite never opens under another.
    pub fn label(self) -> &'static [u8] {
        match self {
            Self::Passphrase => b"cipherbox/passphrase/v1",
            Self::Rsa => b"cipherbox/rsa/v1",
            Self::ElGamal => b"cipherbox/elgamal/v1",
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the decryption secret lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyModel {
    /// The worker holds a private key generated in-process.
    Resident,
    /// The caller sends the secret with each request.
    CallerSupplied,
}

/// Transportable public half of a keypair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicKeyBlob(String);

impl PublicKeyBlob {
    /// Wrap an encoded public key.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the encoding is empty or whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Unwrap into the encoded string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PublicKeyBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secret handed to [`Cipher::decrypt`].
pub enum DecryptionKey<'a, K> {
    /// Private key held by the worker.
    Resident(&'a K),
    /// Secret sent by the caller alongside the ciphertext.
    Supplied(&'a str),
}

// Never print the secret, only which kind it is
impl<K> fmt::Debug for DecryptionKey<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resident(_) => f.write_str("Resident(..)"),
            Self::Supplied(_) => f.write_str("Supplied(..)"),
        }
    }
}

/// A cryptographic backend.
///
/// Implementations are stateless apart from configuration; private keys are
/// owned by the caller (the key store) and lent back for decryption.
pub trait Cipher {
    /// Private key type. Dropping it wipes the secret.
    type PrivateKey: ZeroizeOnDrop;

    /// Which suite this backend implements.
    fn suite(&self) -> CipherSuite;

    /// Whether decryption uses a resident key or a caller secret.
    fn key_model(&self) -> KeyModel;

    /// Generate a fresh keypair.
    fn generate_keypair<R: CryptoRngCore>(
        &self,
        rng: &mut R,
    ) -> Result<Self::PrivateKey, CipherError>;

    /// Encode the public half of `key`.
    fn public_key(&self, key: &Self::PrivateKey) -> Result<PublicKeyBlob, CipherError>;

    /// Encrypt `plaintext` under `key` (a public key blob or a passphrase).
    fn encrypt<R: CryptoRngCore>(
        &self,
        plaintext: &str,
        key: &str,
        rng: &mut R,
    ) -> Result<String, CipherError>;

    /// Decrypt `ciphertext`.
    fn decrypt(
        &self,
        ciphertext: &str,
        key: DecryptionKey<'_, Self::PrivateKey>,
    ) -> Result<String, CipherError>;

    /// Every textual encoding of the private material a careless
    /// implementation might emit. Used to check that responses never carry
    /// any of them.
    #[cfg(feature = "test-utils")]
    fn private_encodings(&self, key: &Self::PrivateKey) -> Vec<String>;
}
