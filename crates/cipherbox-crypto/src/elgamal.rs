//! Elliptic-curve ElGamal-style backend over secp256k1.
//!
//! Each message gets a fresh ephemeral key. ECDH between the ephemeral secret
//! and the recipient's public point feeds HKDF-SHA256, whose output seals the
//! message with `XChaCha20-Poly1305`. Only the recipient's resident secret can
//! recompute the shared point from the ephemeral public key.
//!
//! ```text
//! base64( 0x01 || ephemeral: 33 (compressed SEC1) || nonce: 24 || sealed )
//! ```
//!
//! Public keys travel as base64 of the 64-byte affine `x || y` coordinates.
//! Full SEC1 encodings (compressed or uncompressed) are accepted on input.

use hkdf::Hkdf;
use k256::{
    PublicKey, SecretKey,
    ecdh::diffie_hellman,
    elliptic_curve::sec1::ToEncodedPoint,
};
use rand_core::CryptoRngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    Cipher, CipherError, CipherSuite, DecryptionKey, KeyModel, PublicKeyBlob,
    aead::{self, KEY_SIZE, NONCE_SIZE},
    wire::{self, FORMAT_VERSION, Reader},
};

/// Length of the `x || y` public key body (64 bytes)
const RAW_POINT_SIZE: usize = 64;

/// Length of a compressed SEC1 point (33 bytes)
const COMPRESSED_POINT_SIZE: usize = 33;

/// HKDF info string for content keys
const CONTENT_KEY_INFO: &[u8] = b"cipherbox elgamal content key";

/// ECDH-based cipher with a resident secp256k1 secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElGamalCipher;

impl ElGamalCipher {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

/// Parse a public key blob.
fn parse_public_key(blob: &str) -> Result<PublicKey, CipherError> {
    let bytes = wire::decode(blob)?;

    let sec1 = if bytes.len() == RAW_POINT_SIZE {
        let mut uncompressed = Vec::with_capacity(1 + RAW_POINT_SIZE);
        uncompressed.push(0x04);
        uncompressed.extend_from_slice(&bytes);
        uncompressed
    } else {
        bytes
    };

    PublicKey::from_sec1_bytes(&sec1).map_err(|_| CipherError::InvalidPublicKey {
        reason: format!("{} bytes do not encode a secp256k1 point", sec1.len()),
    })
}

/// Derive the AEAD key from a shared point.
///
/// The ephemeral public key is the HKDF salt, binding the content key to this
/// exchange.
fn derive_content_key(
    shared: &k256::ecdh::SharedSecret,
    ephemeral: &[u8],
) -> Result<Zeroizing<[u8; KEY_SIZE]>, CipherError> {
    let hkdf = Hkdf::<Sha256>::new(Some(ephemeral), shared.raw_secret_bytes().as_slice());
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    hkdf.expand(CONTENT_KEY_INFO, &mut key[..])
        .map_err(|e| CipherError::Encryption { reason: e.to_string() })?;
    Ok(key)
}

impl Cipher for ElGamalCipher {
    type PrivateKey = SecretKey;

    fn suite(&self) -> CipherSuite {
        CipherSuite::ElGamal
    }

    fn key_model(&self) -> KeyModel {
        KeyModel::Resident
    }

    fn generate_keypair<R: CryptoRngCore>(
        &self,
        rng: &mut R,
    ) -> Result<Self::PrivateKey, CipherError> {
        Ok(SecretKey::random(rng))
    }

    fn public_key(&self, key: &Self::PrivateKey) -> Result<PublicKeyBlob, CipherError> {
        let point = key.public_key().to_encoded_point(false);

        // Uncompressed SEC1 is 0x04 || x || y
        let Some(body) = point.as_bytes().get(1..) else {
            return Err(CipherError::KeyGeneration { reason: "empty point encoding".to_string() });
        };
        if body.len() != RAW_POINT_SIZE {
            return Err(CipherError::KeyGeneration {
                reason: format!("point encoding is {} bytes", body.len()),
            });
        }

        Ok(PublicKeyBlob::new(wire::encode(body)))
    }

    fn encrypt<R: CryptoRngCore>(
        &self,
        plaintext: &str,
        key: &str,
        rng: &mut R,
    ) -> Result<String, CipherError> {
        let recipient = parse_public_key(key)?;

        let ephemeral = SecretKey::random(rng);
        let ephemeral_point = ephemeral.public_key().to_encoded_point(true);
        let shared = diffie_hellman(ephemeral.to_nonzero_scalar(), recipient.as_affine());
        let content_key = derive_content_key(&shared, ephemeral_point.as_bytes())?;

        let mut nonce = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut nonce);
        let sealed = aead::seal(&content_key, &nonce, self.suite().label(), plaintext.as_bytes())?;

        let mut out = Vec::with_capacity(1 + COMPRESSED_POINT_SIZE + NONCE_SIZE + sealed.len());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(ephemeral_point.as_bytes());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);

        Ok(wire::encode(&out))
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        key: DecryptionKey<'_, Self::PrivateKey>,
    ) -> Result<String, CipherError> {
        let DecryptionKey::Resident(secret) = key else {
            return Err(CipherError::NotSupported {
                suite: self.suite(),
                operation: "decrypt with a supplied key",
            });
        };

        let bytes = wire::decode(ciphertext)?;
        let mut reader = Reader::open(&bytes)?;
        let ephemeral_bytes = reader.take(COMPRESSED_POINT_SIZE, "ephemeral key")?;
        let nonce = reader.array::<NONCE_SIZE>("nonce")?;
        let sealed = reader.rest();

        let ephemeral = PublicKey::from_sec1_bytes(ephemeral_bytes).map_err(|_| {
            CipherError::InvalidCiphertext { reason: "ephemeral key is not a curve point".to_string() }
        })?;
        let shared = diffie_hellman(secret.to_nonzero_scalar(), ephemeral.as_affine());
        let content_key = derive_content_key(&shared, ephemeral_bytes)
            .map_err(|e| CipherError::Decryption { reason: e.to_string() })?;

        let plaintext = aead::open(&content_key, &nonce, self.suite().label(), sealed)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }

    #[cfg(feature = "test-utils")]
    fn private_encodings(&self, key: &Self::PrivateKey) -> Vec<String> {
        let scalar = key.to_bytes();
        let hex: String = scalar.iter().map(|byte| format!("{byte:02x}")).collect();
        vec![wire::encode(scalar.as_slice()), hex.to_uppercase(), hex]
    }
}
