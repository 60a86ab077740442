//! Cipherbox Cryptographic Capability
//!
//! The worker's only route to cryptography. Each backend implements
//! [`Cipher`]: keypair generation, public key export, and string-in
//! string-out encryption and decryption. Backends hold configuration only;
//! private keys belong to the caller and are lent back for decryption.
//!
//! # Backends
//!
//! ```text
//! PassphraseCipher   PBKDF2-HMAC-SHA256 ──► XChaCha20-Poly1305
//! RsaCipher          RSA-OAEP(SHA-256) wraps content key ──► XChaCha20-Poly1305
//! ElGamalCipher      secp256k1 ECDH ──► HKDF-SHA256 ──► XChaCha20-Poly1305
//! ```
//!
//! Every ciphertext is `base64(version || backend fields || nonce || sealed)`
//! and every AEAD call binds the backend's suite label as associated data.
//!
//! # Security
//!
//! - All randomness is supplied by the caller; nothing here reads the OS RNG
//! - Derived and unwrapped content keys are zeroized after use
//! - Private key types wipe themselves on drop
//! - Public key blobs are parsed and validated before any primitive runs

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod aead;
mod cipher;
mod elgamal;
mod error;
mod passphrase;
mod rsa_oaep;
mod wire;

pub use cipher::{Cipher, CipherSuite, DecryptionKey, KeyModel, PublicKeyBlob};
pub use elgamal::ElGamalCipher;
pub use error::CipherError;
pub use passphrase::{
    DEFAULT_PBKDF2_ROUNDS, MAX_PBKDF2_ROUNDS, NoResidentKey, PassphraseCipher, PassphraseConfig,
};
pub use rsa_oaep::{DEFAULT_RSA_BITS, MAX_RSA_BITS, MIN_RSA_BITS, RsaCipher, RsaConfig};
