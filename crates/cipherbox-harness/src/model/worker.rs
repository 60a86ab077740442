//! Reference model of the worker.
//!
//! Tracks only what decides an outcome: whether a key is resident, which key
//! generation it belongs to, and which generation sealed each stored
//! ciphertext. The real worker must agree with it on every operation.

use cipherbox_crypto::KeyModel;
use cipherbox_proto::ErrorKind;

use super::operation::{Operation, OperationResult};

/// A ciphertext the model knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCiphertext {
    /// What was sealed.
    pub plaintext: String,
    /// Key generation it was sealed to. Zero for shared-secret suites.
    pub generation: u64,
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Whether a key is resident.
    pub has_resident_key: bool,
    /// Number of successful key generations.
    pub key_generation: u64,
    /// Number of ciphertexts produced.
    pub ciphertexts: usize,
}

/// The reference worker.
#[derive(Debug, Clone)]
pub struct ModelWorker {
    key_model: KeyModel,
    resident: Option<u64>,
    generation: u64,
    ciphertexts: Vec<ModelCiphertext>,
}

impl ModelWorker {
    /// Create a model of a worker using a cipher with the given key model.
    pub fn new(key_model: KeyModel) -> Self {
        Self { key_model, resident: None, generation: 0, ciphertexts: Vec::new() }
    }

    /// Ciphertexts produced so far, in order.
    pub fn ciphertexts(&self) -> &[ModelCiphertext] {
        &self.ciphertexts
    }

    /// Index into the stored ciphertexts that `DecryptStored { index }` uses.
    pub fn stored_index(&self, index: u8) -> Option<usize> {
        if self.ciphertexts.is_empty() {
            None
        } else {
            Some(usize::from(index) % self.ciphertexts.len())
        }
    }

    /// Observable state.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            has_resident_key: self.resident.is_some(),
            key_generation: self.generation,
            ciphertexts: self.ciphertexts.len(),
        }
    }

    /// Apply an operation and return what the caller should observe.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::GenerateKeys => self.apply_generate(),
            Operation::Encrypt { plaintext } => self.apply_encrypt(plaintext.to_text()),
            Operation::DecryptStored { index } => match self.stored_index(*index) {
                Some(position) => self.apply_decrypt_stored(position),
                None => self.apply_decrypt_garbage(),
            },
            Operation::DecryptGarbage { .. } => self.apply_decrypt_garbage(),
            Operation::Malformed { .. } => OperationResult::Error(ErrorKind::MalformedRequest),
            Operation::UnknownOperation => OperationResult::Error(ErrorKind::UnsupportedOperation),
            Operation::Oversized => OperationResult::Error(ErrorKind::PayloadTooLarge),
            Operation::ClearKeys => {
                self.resident = None;
                OperationResult::Silent
            },
        }
    }

    fn apply_generate(&mut self) -> OperationResult {
        match self.key_model {
            KeyModel::Resident => {
                self.generation += 1;
                self.resident = Some(self.generation);
                OperationResult::PublicKey
            },
            KeyModel::CallerSupplied => OperationResult::Error(ErrorKind::UnsupportedOperation),
        }
    }

    fn apply_encrypt(&mut self, plaintext: String) -> OperationResult {
        let generation = match (self.key_model, self.resident) {
            (KeyModel::Resident, Some(generation)) => generation,
            (KeyModel::Resident, None) => {
                return OperationResult::Error(ErrorKind::EncryptionFailed);
            },
            (KeyModel::CallerSupplied, _) => 0,
        };

        self.ciphertexts.push(ModelCiphertext { plaintext, generation });
        OperationResult::Ciphertext
    }

    fn apply_decrypt_stored(&self, position: usize) -> OperationResult {
        let stored = &self.ciphertexts[position];
        match (self.key_model, self.resident) {
            (KeyModel::Resident, None) => OperationResult::Error(ErrorKind::KeyNotInitialized),
            (KeyModel::Resident, Some(current)) if current != stored.generation => {
                OperationResult::Error(ErrorKind::DecryptionFailed)
            },
            _ => OperationResult::Plaintext(stored.plaintext.clone()),
        }
    }

    fn apply_decrypt_garbage(&self) -> OperationResult {
        match (self.key_model, self.resident) {
            (KeyModel::Resident, None) => OperationResult::Error(ErrorKind::KeyNotInitialized),
            _ => OperationResult::Error(ErrorKind::DecryptionFailed),
        }
    }
}
