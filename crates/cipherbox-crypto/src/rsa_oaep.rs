//! RSA backend.
//!
//! Plaintexts up to the payload bound do not fit in a single OAEP block, so
//! the backend is hybrid: a random content key is wrapped with RSA-OAEP
//! (SHA-256) and the message is sealed with `XChaCha20-Poly1305`.
//!
//! ```text
//! base64( 0x01 || wrapped_len: u16 BE || wrapped || nonce: 24 || sealed )
//! ```
//!
//! Public keys travel as PEM SubjectPublicKeyInfo. On input a bare base64 DER
//! body or a PKCS#1 PEM is accepted as well.

use rand_core::CryptoRngCore;
use rsa::{
    Oaep, RsaPrivateKey, RsaPublicKey,
    pkcs1::DecodeRsaPublicKey,
    pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding},
    traits::PublicKeyParts,
};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    Cipher, CipherError, CipherSuite, DecryptionKey, KeyModel, PublicKeyBlob,
    aead::{self, KEY_SIZE, NONCE_SIZE},
    wire::{self, FORMAT_VERSION, Reader},
};

/// Default modulus size for generated keys
pub const DEFAULT_RSA_BITS: usize = 4096;

/// Smallest modulus accepted for generation or encryption
pub const MIN_RSA_BITS: usize = 1024;

/// Largest modulus accepted for generation.
///
/// The `rsa` key parsers refuse anything larger, so a bigger key could be
/// generated but its public blob could never be used to encrypt.
pub const MAX_RSA_BITS: usize = 4096;

/// RSA backend configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsaConfig {
    /// Modulus size of generated keys, in bits
    pub key_bits: usize,
}

impl Default for RsaConfig {
    fn default() -> Self {
        Self { key_bits: DEFAULT_RSA_BITS }
    }
}

/// RSA-OAEP hybrid cipher with a resident private key.
#[derive(Debug, Clone, Default)]
pub struct RsaCipher {
    config: RsaConfig,
}

impl RsaCipher {
    /// Create the backend.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig`: key size outside `MIN_RSA_BITS..=MAX_RSA_BITS`
    pub fn new(config: RsaConfig) -> Result<Self, CipherError> {
        if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&config.key_bits) {
            return Err(CipherError::InvalidConfig {
                reason: format!(
                    "rsa key size must be between {MIN_RSA_BITS} and {MAX_RSA_BITS} bits, got {}",
                    config.key_bits
                ),
            });
        }
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> RsaConfig {
        self.config
    }
}

/// Parse a public key blob in any accepted form.
fn parse_public_key(blob: &str) -> Result<RsaPublicKey, CipherError> {
    let blob = blob.trim();

    let key = if blob.starts_with("-----BEGIN RSA PUBLIC KEY-----") {
        RsaPublicKey::from_pkcs1_pem(blob)
            .map_err(|e| CipherError::InvalidPublicKey { reason: e.to_string() })?
    } else if blob.starts_with("-----BEGIN") {
        RsaPublicKey::from_public_key_pem(blob)
            .map_err(|e| CipherError::InvalidPublicKey { reason: e.to_string() })?
    } else {
        let der = wire::decode(blob)?;
        RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| CipherError::InvalidPublicKey { reason: e.to_string() })?
    };

    let bits = key.size() * 8;
    if bits < MIN_RSA_BITS {
        return Err(CipherError::InvalidPublicKey {
            reason: format!("{bits}-bit modulus is below the {MIN_RSA_BITS}-bit minimum"),
        });
    }

    Ok(key)
}

impl Cipher for RsaCipher {
    type PrivateKey = RsaPrivateKey;

    fn suite(&self) -> CipherSuite {
        CipherSuite::Rsa
    }

    fn key_model(&self) -> KeyModel {
        KeyModel::Resident
    }

    fn generate_keypair<R: CryptoRngCore>(
        &self,
        rng: &mut R,
    ) -> Result<Self::PrivateKey, CipherError> {
        RsaPrivateKey::new(rng, self.config.key_bits)
            .map_err(|e| CipherError::KeyGeneration { reason: e.to_string() })
    }

    fn public_key(&self, key: &Self::PrivateKey) -> Result<PublicKeyBlob, CipherError> {
        let pem = key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CipherError::KeyGeneration { reason: e.to_string() })?;
        Ok(PublicKeyBlob::new(pem))
    }

    fn encrypt<R: CryptoRngCore>(
        &self,
        plaintext: &str,
        key: &str,
        rng: &mut R,
    ) -> Result<String, CipherError> {
        let recipient = parse_public_key(key)?;

        let mut content_key = Zeroizing::new([0u8; KEY_SIZE]);
        rng.fill_bytes(&mut content_key[..]);
        let mut nonce = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut nonce);

        let wrapped = recipient
            .encrypt(rng, Oaep::new::<Sha256>(), &content_key[..])
            .map_err(|e| CipherError::Encryption { reason: e.to_string() })?;
        let wrapped_len = u16::try_from(wrapped.len()).map_err(|_| CipherError::Encryption {
            reason: format!("wrapped key is {} bytes", wrapped.len()),
        })?;

        let sealed = aead::seal(&content_key, &nonce, self.suite().label(), plaintext.as_bytes())?;

        let mut out = Vec::with_capacity(1 + 2 + wrapped.len() + NONCE_SIZE + sealed.len());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&wrapped_len.to_be_bytes());
        out.extend_from_slice(&wrapped);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);

        Ok(wire::encode(&out))
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        key: DecryptionKey<'_, Self::PrivateKey>,
    ) -> Result<String, CipherError> {
        let DecryptionKey::Resident(private) = key else {
            return Err(CipherError::NotSupported {
                suite: self.suite(),
                operation: "decrypt with a supplied key",
            });
        };

        let bytes = wire::decode(ciphertext)?;
        let mut reader = Reader::open(&bytes)?;
        let wrapped_len = usize::from(reader.u16("wrapped key length")?);
        let wrapped = reader.take(wrapped_len, "wrapped key")?;
        let nonce = reader.array::<NONCE_SIZE>("nonce")?;
        let sealed = reader.rest();

        let unwrapped = Zeroizing::new(
            private
                .decrypt(Oaep::new::<Sha256>(), wrapped)
                .map_err(|e| CipherError::Decryption { reason: e.to_string() })?,
        );
        let content_key: Zeroizing<[u8; KEY_SIZE]> =
            Zeroizing::new(unwrapped.as_slice().try_into().map_err(|_| {
                CipherError::Decryption {
                    reason: format!("content key is {} bytes", unwrapped.len()),
                }
            })?);

        let plaintext = aead::open(&content_key, &nonce, self.suite().label(), sealed)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }

    #[cfg(feature = "test-utils")]
    fn private_encodings(&self, key: &Self::PrivateKey) -> Vec<String> {
        use rsa::{
            pkcs1::EncodeRsaPrivateKey,
            pkcs8::EncodePrivateKey,
            traits::PrivateKeyParts,
        };

        let mut encodings = Vec::new();
        if let Ok(pem) = key.to_pkcs8_pem(LineEnding::LF) {
            encodings.push(pem.to_string());
        }
        if let Ok(pem) = key.to_pkcs1_pem(LineEnding::LF) {
            encodings.push(pem.to_string());
        }
        if let Ok(der) = key.to_pkcs8_der() {
            encodings.push(wire::encode(der.as_bytes()));
        }
        encodings.push(wire::encode(&key.d().to_bytes_be()));
        encodings.push(key.d().to_str_radix(16));
        encodings
    }
}
