//! Symmetric backend keyed by a caller passphrase.
//!
//! The passphrase is stretched with PBKDF2-HMAC-SHA256 into a 256-bit key.
//! Salt and round count travel inside the ciphertext, so decryption needs only
//! the passphrase:
//!
//! ```text
//! base64( 0x01 || rounds: u32 BE || salt: 16 || nonce: 24 || sealed )
//! ```
//!
//! Nothing is resident: [`KeyModel::CallerSupplied`] tells the worker to pass
//! the request's key on every decrypt, and keypair generation is refused.

use rand_core::CryptoRngCore;
use sha2::Sha256;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::{
    Cipher, CipherError, CipherSuite, DecryptionKey, KeyModel, PublicKeyBlob,
    aead::{self, KEY_SIZE, NONCE_SIZE},
    wire::{self, FORMAT_VERSION, Reader},
};

/// Default PBKDF2 iteration count
pub const DEFAULT_PBKDF2_ROUNDS: u32 = 600_000;

/// Largest iteration count accepted from a ciphertext.
///
/// The count is attacker-controlled on decrypt; without a cap one message
/// could stall the worker indefinitely.
pub const MAX_PBKDF2_ROUNDS: u32 = 10_000_000;

/// Salt size (16 bytes)
const SALT_SIZE: usize = 16;

/// Passphrase backend configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassphraseConfig {
    /// PBKDF2 iterations used for new ciphertexts
    pub pbkdf2_rounds: u32,
}

impl Default for PassphraseConfig {
    fn default() -> Self {
        Self { pbkdf2_rounds: DEFAULT_PBKDF2_ROUNDS }
    }
}

/// Private key of the passphrase backend. It has no values: there is never
/// a resident key.
#[derive(Debug)]
pub enum NoResidentKey {}

impl ZeroizeOnDrop for NoResidentKey {}

/// Symmetric cipher keyed per request by a shared secret.
#[derive(Debug, Clone, Default)]
pub struct PassphraseCipher {
    config: PassphraseConfig,
}

impl PassphraseCipher {
    /// Create the backend.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig`: rounds are zero or above [`MAX_PBKDF2_ROUNDS`]
    pub fn new(config: PassphraseConfig) -> Result<Self, CipherError> {
        if config.pbkdf2_rounds == 0 || config.pbkdf2_rounds > MAX_PBKDF2_ROUNDS {
            return Err(CipherError::InvalidConfig {
                reason: format!(
                    "pbkdf2 rounds must be between 1 and {MAX_PBKDF2_ROUNDS}, got {}",
                    config.pbkdf2_rounds
                ),
            });
        }
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> PassphraseConfig {
        self.config
    }
}

/// Stretch a passphrase into an AEAD key.
fn derive_key(passphrase: &str, salt: &[u8], rounds: u32) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, rounds, &mut key[..]);
    key
}

impl Cipher for PassphraseCipher {
    type PrivateKey = NoResidentKey;

    fn suite(&self) -> CipherSuite {
        CipherSuite::Passphrase
    }

    fn key_model(&self) -> KeyModel {
        KeyModel::CallerSupplied
    }

    fn generate_keypair<R: CryptoRngCore>(
        &self,
        _rng: &mut R,
    ) -> Result<Self::PrivateKey, CipherError> {
        Err(CipherError::NotSupported { suite: self.suite(), operation: "generate-keys" })
    }

    fn public_key(&self, key: &Self::PrivateKey) -> Result<PublicKeyBlob, CipherError> {
        match *key {}
    }

    fn encrypt<R: CryptoRngCore>(
        &self,
        plaintext: &str,
        key: &str,
        rng: &mut R,
    ) -> Result<String, CipherError> {
        if key.is_empty() {
            return Err(CipherError::Encryption { reason: "empty passphrase".to_string() });
        }

        let mut salt = [0u8; SALT_SIZE];
        rng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut nonce);

        let rounds = self.config.pbkdf2_rounds;
        let content_key = derive_key(key, &salt, rounds);
        let sealed = aead::seal(&content_key, &nonce, self.suite().label(), plaintext.as_bytes())?;

        let mut out = Vec::with_capacity(1 + 4 + SALT_SIZE + NONCE_SIZE + sealed.len());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&rounds.to_be_bytes());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);

        Ok(wire::encode(&out))
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        key: DecryptionKey<'_, Self::PrivateKey>,
    ) -> Result<String, CipherError> {
        let passphrase = match key {
            DecryptionKey::Supplied(passphrase) => passphrase,
            DecryptionKey::Resident(never) => match *never {},
        };
        if passphrase.is_empty() {
            return Err(CipherError::Decryption { reason: "empty passphrase".to_string() });
        }

        let bytes = wire::decode(ciphertext)?;
        let mut reader = Reader::open(&bytes)?;
        let rounds = reader.u32("rounds")?;
        let salt = reader.array::<SALT_SIZE>("salt")?;
        let nonce = reader.array::<NONCE_SIZE>("nonce")?;
        let sealed = reader.rest();

        if rounds == 0 || rounds > MAX_PBKDF2_ROUNDS {
            return Err(CipherError::InvalidCiphertext {
                reason: format!("pbkdf2 rounds {rounds} out of range"),
            });
        }

        let content_key = derive_key(passphrase, &salt, rounds);
        let plaintext = aead::open(&content_key, &nonce, self.suite().label(), sealed)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }

    #[cfg(feature = "test-utils")]
    fn private_encodings(&self, key: &Self::PrivateKey) -> Vec<String> {
        match *key {}
    }
}
