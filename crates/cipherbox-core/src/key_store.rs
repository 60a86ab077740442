//! Resident keypair storage.
//!
//! Holds at most one keypair. Generation builds the replacement completely
//! (private key and encoded public blob) before touching the slot, so a
//! failure leaves the previous key in place and a success swaps atomically.
//! Private key types wipe themselves on drop; replacing or clearing the slot
//! drops the old key.

use cipherbox_crypto::{Cipher, PublicKeyBlob};
use rand_core::CryptoRngCore;

use crate::WorkerError;

struct Resident<K> {
    private: K,
    public: PublicKeyBlob,
}

/// The worker's single keypair slot.
pub struct KeyStore<K> {
    resident: Option<Resident<K>>,
    generation: u64,
}

impl<K> KeyStore<K> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { resident: None, generation: 0 }
    }

    /// Generate a keypair with `cipher` and make it resident.
    ///
    /// Returns only the public blob.
    ///
    /// # Errors
    ///
    /// - `KeyGenerationFailed`: the cipher failed or produced an empty blob;
    ///   the previous key (if any) stays resident
    /// - `UnsupportedOperation`: the cipher has no keypairs
    pub fn generate<C, R>(&mut self, cipher: &C, rng: &mut R) -> Result<PublicKeyBlob, WorkerError>
    where
        C: Cipher<PrivateKey = K>,
        R: CryptoRngCore,
    {
        let private = cipher.generate_keypair(rng).map_err(WorkerError::generation)?;
        let public = cipher.public_key(&private).map_err(WorkerError::generation)?;

        if public.is_empty() {
            return Err(WorkerError::KeyGenerationFailed {
                reason: "cipher produced an empty public key".to_string(),
            });
        }

        self.resident = Some(Resident { private, public: public.clone() });
        self.generation += 1;

        Ok(public)
    }

    /// Returns true if a keypair is resident.
    pub fn has_private_material(&self) -> bool {
        self.resident.is_some()
    }

    /// Borrow the resident private key.
    ///
    /// # Errors
    ///
    /// - `KeyNotInitialized`: no key has been generated (or it was cleared)
    pub fn private_material(&self) -> Result<&K, WorkerError> {
        self.resident
            .as_ref()
            .map(|resident| &resident.private)
            .ok_or(WorkerError::KeyNotInitialized)
    }

    /// Public blob of the resident key.
    pub fn public_key(&self) -> Option<&PublicKeyBlob> {
        self.resident.as_ref().map(|resident| &resident.public)
    }

    /// Drop the resident key. Returns whether one was resident.
    pub fn clear(&mut self) -> bool {
        self.resident.take().is_some()
    }

    /// Number of successful generations so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<K> Default for KeyStore<K> {
    fn default() -> Self {
        Self::new()
    }
}
