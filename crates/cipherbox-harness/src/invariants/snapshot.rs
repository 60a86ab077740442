//! Observable state snapshots for invariant checking.
//!
//! Snapshots record everything that crossed the worker boundary for one
//! message, plus the key state around it. Invariants operate on snapshots
//! rather than the live worker so checks see a consistent history.

use cipherbox_core::LogLevel;
use cipherbox_proto::{CorrelationMode, Response};
use serde_json::Value;

/// One message and everything the worker did with it.
#[derive(Debug, Clone)]
pub struct ExchangeSnapshot {
    /// Inbound message. Raw text that failed to parse is kept as a string.
    pub request: Value,
    /// Responses emitted.
    pub responses: Vec<Response>,
    /// Log actions emitted.
    pub logs: Vec<(LogLevel, String)>,
    /// Whether a key was resident before the message.
    pub resident_before: bool,
    /// Whether a key was resident after the message.
    pub resident_after: bool,
    /// Key generation count before the message.
    pub generation_before: u64,
    /// Key generation count after the message.
    pub generation_after: u64,
    /// Encodings of every private key resident before or after the message.
    pub private_encodings: Vec<String>,
}

impl ExchangeSnapshot {
    /// Response lines as they would appear on the wire.
    pub fn wire_lines(&self) -> Vec<String> {
        self.responses.iter().map(Response::to_json).collect()
    }

    /// Returns true if the key store looks untouched by this message.
    pub fn key_state_unchanged(&self) -> bool {
        self.resident_before == self.resident_after
            && self.generation_before == self.generation_after
    }
}

/// History of a whole session.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Correlation mode the worker ran in.
    pub mode: CorrelationMode,
    /// Exchanges in arrival order.
    pub exchanges: Vec<ExchangeSnapshot>,
}

impl SessionSnapshot {
    /// Create an empty snapshot (no messages).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of messages recorded.
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Returns true if no messages were recorded.
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}
