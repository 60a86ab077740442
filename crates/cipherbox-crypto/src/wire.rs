//! Ciphertext framing.
//!
//! Every backend emits `base64(version || fields...)`. The reader walks the
//! decoded bytes front to back and reports truncation as
//! [`CipherError::InvalidCiphertext`] rather than panicking.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::CipherError;

/// Current ciphertext format version
pub(crate) const FORMAT_VERSION: u8 = 0x01;

/// Encode bytes for transport.
pub(crate) fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode transported text. Surrounding whitespace is ignored.
pub(crate) fn decode(text: &str) -> Result<Vec<u8>, CipherError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| CipherError::InvalidEncoding { reason: e.to_string() })
}

/// Cursor over a decoded ciphertext.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Start reading `bytes`, consuming and checking the version byte.
    pub(crate) fn open(bytes: &'a [u8]) -> Result<Self, CipherError> {
        let mut reader = Self { bytes };
        let [version] = reader.array::<1>("version")?;
        if version != FORMAT_VERSION {
            return Err(CipherError::UnsupportedVersion { version });
        }
        Ok(reader)
    }

    /// Take exactly `len` bytes.
    pub(crate) fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8], CipherError> {
        if self.bytes.len() < len {
            return Err(CipherError::InvalidCiphertext {
                reason: format!("truncated {field}: need {len} bytes, have {}", self.bytes.len()),
            });
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    /// Take a fixed-size field.
    pub(crate) fn array<const N: usize>(&mut self, field: &str) -> Result<[u8; N], CipherError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    /// Take a big-endian `u16`.
    pub(crate) fn u16(&mut self, field: &str) -> Result<u16, CipherError> {
        Ok(u16::from_be_bytes(self.array(field)?))
    }

    /// Take a big-endian `u32`.
    pub(crate) fn u32(&mut self, field: &str) -> Result<u32, CipherError> {
        Ok(u32::from_be_bytes(self.array(field)?))
    }

    /// Everything that is left.
    pub(crate) fn rest(self) -> &'a [u8] {
        self.bytes
    }
}
