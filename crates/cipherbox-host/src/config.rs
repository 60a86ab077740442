//! Host configuration.

use cipherbox_core::WorkerConfig;
use cipherbox_crypto::{CipherSuite, PassphraseConfig, RsaConfig};
use cipherbox_proto::CorrelationMode;
use clap::ValueEnum;

/// Cipher backend names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CipherChoice {
    /// Symmetric, keyed by a passphrase sent with each request
    Passphrase,
    /// RSA-OAEP with a resident keypair
    Rsa,
    /// secp256k1 ECDH with a resident keypair
    Elgamal,
}

impl From<CipherChoice> for CipherSuite {
    fn from(choice: CipherChoice) -> Self {
        match choice {
            CipherChoice::Passphrase => Self::Passphrase,
            CipherChoice::Rsa => Self::Rsa,
            CipherChoice::Elgamal => Self::ElGamal,
        }
    }
}

/// Correlation modes accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CorrelationChoice {
    /// `[op, id, payload?, key?]`, responses keyed by id
    MessageId,
    /// `[op, payload?, key?]`, responses keyed by operation
    OperationTag,
}

impl From<CorrelationChoice> for CorrelationMode {
    fn from(choice: CorrelationChoice) -> Self {
        match choice {
            CorrelationChoice::MessageId => Self::MessageId,
            CorrelationChoice::OperationTag => Self::OperationTag,
        }
    }
}

/// Everything the host needs to build a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostConfig {
    /// Backend to run.
    pub cipher: CipherSuite,
    /// Protocol settings passed to the worker.
    pub worker: WorkerConfig,
    /// RSA backend settings. Ignored by other suites.
    pub rsa: RsaConfig,
    /// Passphrase backend settings. Ignored by other suites.
    pub passphrase: PassphraseConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cipher: CipherSuite::ElGamal,
            worker: WorkerConfig::default(),
            rsa: RsaConfig::default(),
            passphrase: PassphraseConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use cipherbox_crypto::{DEFAULT_PBKDF2_ROUNDS, DEFAULT_RSA_BITS};

    use super::*;

    #[test]
    fn default_config_uses_hardened_settings() {
        let config = HostConfig::default();
        assert_eq!(config.worker.correlation, CorrelationMode::MessageId);
        assert_eq!(config.rsa.key_bits, DEFAULT_RSA_BITS);
        assert_eq!(config.passphrase.pbkdf2_rounds, DEFAULT_PBKDF2_ROUNDS);
    }

    #[test]
    fn choices_map_to_suites() {
        assert_eq!(CipherSuite::from(CipherChoice::Elgamal), CipherSuite::ElGamal);
        assert_eq!(CorrelationMode::from(CorrelationChoice::OperationTag), CorrelationMode::OperationTag);
    }
}
