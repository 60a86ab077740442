//! Content encryption shared by every backend.
//!
//! All functions are pure. Keys and nonces come from the caller, which draws
//! them from its injected randomness.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::CipherError;

/// Size of an AEAD key (32 bytes)
pub(crate) const KEY_SIZE: usize = 32;

/// Size of an `XChaCha20` nonce (24 bytes)
pub(crate) const NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes)
pub(crate) const TAG_SIZE: usize = 16;

/// Seal `plaintext` with `XChaCha20-Poly1305`, binding `aad`.
///
/// The 24-byte nonce is wide enough that random nonces never collide in
/// practice, so callers draw it fresh for every message.
pub(crate) fn seal(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let cipher = XChaCha20Poly1305::new(key.into());

    cipher
        .encrypt(XNonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|_| CipherError::Encryption { reason: "AEAD seal failed".to_string() })
}

/// Open a sealed body.
///
/// # Errors
///
/// - `Decryption`: wrong key, wrong suite, or tampered bytes
pub(crate) fn open(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    sealed: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if sealed.len() < TAG_SIZE {
        return Err(CipherError::InvalidCiphertext {
            reason: format!("sealed body is {} bytes, shorter than the tag", sealed.len()),
        });
    }

    let cipher = XChaCha20Poly1305::new(key.into());

    cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: sealed, aad })
        .map_err(|_| CipherError::Decryption { reason: "authentication failed".to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_SIZE] = [7; KEY_SIZE];
    const NONCE: [u8; NONCE_SIZE] = [9; NONCE_SIZE];

    #[test]
    fn seal_open_round_trip() {
        let sealed = seal(&KEY, &NONCE, b"aad", b"hello").unwrap();
        assert_eq!(sealed.len(), 5 + TAG_SIZE);

        let opened = open(&KEY, &NONCE, b"aad", &sealed).unwrap();
        assert_eq!(opened, b"hello");
    }

    #[test]
    fn wrong_aad_fails() {
        let sealed = seal(&KEY, &NONCE, b"cipherbox/rsa/v1", b"hello").unwrap();
        let result = open(&KEY, &NONCE, b"cipherbox/elgamal/v1", &sealed);
        assert!(matches!(result, Err(CipherError::Decryption { .. })));
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = seal(&KEY, &NONCE, b"aad", b"hello").unwrap();
        let result = open(&[8; KEY_SIZE], &NONCE, b"aad", &sealed);
        assert!(matches!(result, Err(CipherError::Decryption { .. })));
    }

    #[test]
    fn tampered_body_fails() {
        let mut sealed = seal(&KEY, &NONCE, b"aad", b"hello").unwrap();
        sealed[0] ^= 0xFF;
        assert!(open(&KEY, &NONCE, b"aad", &sealed).is_err());
    }

    #[test]
    fn short_body_is_invalid() {
        let result = open(&KEY, &NONCE, b"aad", &[0; TAG_SIZE - 1]);
        assert!(matches!(result, Err(CipherError::InvalidCiphertext { .. })));
    }
}
