//! Host error types.

use cipherbox_core::ConfigError;
use cipherbox_crypto::CipherError;
use thiserror::Error;

/// Errors that stop the host.
///
/// Request failures are not here: the worker answers those on the wire and
/// the host keeps serving.
#[derive(Error, Debug)]
pub enum HostError {
    /// Reading requests or writing responses failed.
    ///
    /// Usually the caller closed its end of the pipe. Fatal for the session.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Worker configuration rejected at startup.
    #[error("invalid worker configuration: {0}")]
    Config(#[from] ConfigError),

    /// Cipher backend could not be built from the given options.
    #[error("invalid cipher configuration: {0}")]
    Cipher(#[from] CipherError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_display() {
        let err = HostError::from(ConfigError::ZeroPlaintextBound);
        assert!(err.to_string().starts_with("invalid worker configuration: "));

        let err = HostError::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(err.to_string().starts_with("i/o error: "));
    }
}
