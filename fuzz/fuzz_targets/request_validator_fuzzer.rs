//! Fuzz target for the request validator
//!
//! Untrusted bytes are parsed as JSON and validated in both correlation modes.
//!
//! # Strategy
//!
//! - Raw bytes: whatever parses as JSON is validated
//! - Tight limits: small bounds so the length checks are reachable
//!
//! # Invariants
//!
//! - Never panics
//! - Validation is idempotent
//! - Accepted payloads are trimmed and within bounds
//! - An id recovered in message-id mode is echoed on rejection

#![no_main]

use cipherbox_proto::{
    Correlation, CorrelationId, CorrelationMode, PayloadLimits, Request, RequestValidator,
};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

const LIMITS: PayloadLimits = PayloadLimits { max_plaintext_len: 32, max_ciphertext_len: 64 };

fuzz_target!(|data: &[u8]| {
    let Ok(message) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    for mode in [CorrelationMode::MessageId, CorrelationMode::OperationTag] {
        let validator = RequestValidator::new(mode, LIMITS);
        let first = validator.validate(&message);
        let second = validator.validate(&message);
        assert_eq!(first, second, "validation is not deterministic");

        match first {
            Ok(inbound) => match inbound.request {
                Request::GenerateKeys => {},
                Request::Encrypt { plaintext, key } => {
                    assert_eq!(plaintext, plaintext.trim());
                    assert!(!plaintext.is_empty());
                    assert!(plaintext.chars().count() <= LIMITS.max_plaintext_len);
                    assert!(!key.trim().is_empty());
                },
                Request::Decrypt { ciphertext, .. } => {
                    assert_eq!(ciphertext, ciphertext.trim());
                    assert!(!ciphertext.is_empty());
                    assert!(ciphertext.chars().count() <= LIMITS.max_ciphertext_len);
                },
            },
            Err(rejection) => {
                if mode != CorrelationMode::MessageId {
                    continue;
                }
                let id = message
                    .as_array()
                    .filter(|elements| elements.len() >= 2)
                    .and_then(|elements| CorrelationId::from_value(&elements[1]));
                if let Some(id) = id {
                    assert_eq!(rejection.correlation, Correlation::Id(id));
                }
            },
        }
    }
});
