//! Worker configuration.

use cipherbox_proto::{CorrelationMode, PayloadLimits, RequestValidator};

use crate::ConfigError;

/// Protocol settings for a [`Worker`](crate::Worker).
///
/// The cipher backend is not part of this: it is the worker's type
/// parameter, chosen by whoever builds the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Envelope and request shape
    pub correlation: CorrelationMode,
    /// Payload length bounds
    pub limits: PayloadLimits,
}

impl WorkerConfig {
    /// Check that the configuration can serve requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_plaintext_len == 0 {
            return Err(ConfigError::ZeroPlaintextBound);
        }
        if self.limits.max_ciphertext_len == 0 {
            return Err(ConfigError::ZeroCiphertextBound);
        }
        Ok(())
    }

    /// Validator enforcing this configuration.
    pub fn validator(&self) -> RequestValidator {
        RequestValidator::new(self.correlation, self.limits)
    }
}

#[cfg(test)]
mod tests {
    use cipherbox_proto::{DEFAULT_MAX_CIPHERTEXT_LEN, DEFAULT_MAX_PLAINTEXT_LEN};

    use super::*;

    #[test]
    fn default_is_message_id_with_standard_bounds() {
        let config = WorkerConfig::default();
        assert_eq!(config.correlation, CorrelationMode::MessageId);
        assert_eq!(config.limits.max_plaintext_len, DEFAULT_MAX_PLAINTEXT_LEN);
        assert_eq!(config.limits.max_ciphertext_len, DEFAULT_MAX_CIPHERTEXT_LEN);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_bounds_rejected() {
        let mut config = WorkerConfig::default();
        config.limits.max_plaintext_len = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPlaintextBound));

        let mut config = WorkerConfig::default();
        config.limits.max_ciphertext_len = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroCiphertextBound));
    }
}
