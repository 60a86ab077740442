//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use cipherbox_proto::{Correlation, CorrelationId, CorrelationMode};
use serde_json::Value;

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// Shortest payload checked for in logs; shorter strings match by accident.
const MIN_TRACKED_PAYLOAD_LEN: usize = 8;

/// Private key material never crosses the boundary.
///
/// No response line and no log message may contain any encoding of a private
/// key that was resident while the message was handled.
pub struct NoPrivateKeyLeak;

impl Invariant for NoPrivateKeyLeak {
    fn name(&self) -> &'static str {
        "NoPrivateKeyLeak"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for (index, exchange) in state.exchanges.iter().enumerate() {
            let lines = exchange.wire_lines();
            let logs = exchange.logs.iter().map(|(_, message)| message);

            for text in lines.iter().chain(logs) {
                if let Some(secret) =
                    exchange.private_encodings.iter().find(|secret| text.contains(secret.as_str()))
                {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "message {index}: output contains a {}-character private encoding",
                            secret.len()
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Every message gets exactly one response.
pub struct OneResponsePerMessage;

impl Invariant for OneResponsePerMessage {
    fn name(&self) -> &'static str {
        "OneResponsePerMessage"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for (index, exchange) in state.exchanges.iter().enumerate() {
            if exchange.responses.len() != 1 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "message {index}: {} responses for {}",
                        exchange.responses.len(),
                        exchange.request
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A well-formed correlation id is always echoed.
///
/// In message-id mode, if element 1 of an array is a string or a number, the
/// response must be addressed to exactly that id, success or failure.
pub struct CorrelationEchoed;

impl Invariant for CorrelationEchoed {
    fn name(&self) -> &'static str {
        "CorrelationEchoed"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.mode != CorrelationMode::MessageId {
            return Ok(());
        }

        for (index, exchange) in state.exchanges.iter().enumerate() {
            let Some(id) = exchange
                .request
                .as_array()
                .and_then(|elements| elements.get(1))
                .and_then(CorrelationId::from_value)
            else {
                continue;
            };

            let expected = Correlation::Id(id);
            for response in &exchange.responses {
                if response.correlation != expected {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "message {index}: expected {expected:?}, got {:?}",
                            response.correlation
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Requests rejected for caller error never touch the key store.
pub struct RejectionPreservesKeys;

impl Invariant for RejectionPreservesKeys {
    fn name(&self) -> &'static str {
        "RejectionPreservesKeys"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for (index, exchange) in state.exchanges.iter().enumerate() {
            let rejected = exchange
                .responses
                .iter()
                .filter_map(cipherbox_proto::Response::error_kind)
                .any(|kind| kind.is_caller_error());

            if rejected && !exchange.key_state_unchanged() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "message {index}: rejected request changed key state \
                         (resident {} -> {}, generation {} -> {})",
                        exchange.resident_before,
                        exchange.resident_after,
                        exchange.generation_before,
                        exchange.generation_after
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Log messages never repeat payloads or keys.
///
/// Every string element after the correlation position is treated as
/// sensitive; none may appear verbatim in a log line.
pub struct LogsCarryNoPayload;

impl Invariant for LogsCarryNoPayload {
    fn name(&self) -> &'static str {
        "LogsCarryNoPayload"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let first_sensitive = match state.mode {
            CorrelationMode::MessageId => 2,
            CorrelationMode::OperationTag => 1,
        };

        for (index, exchange) in state.exchanges.iter().enumerate() {
            let Some(elements) = exchange.request.as_array() else {
                continue;
            };

            let sensitive = elements
                .iter()
                .skip(first_sensitive)
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|text| text.len() >= MIN_TRACKED_PAYLOAD_LEN);

            for secret in sensitive {
                if exchange.logs.iter().any(|(_, message)| message.contains(secret)) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("message {index}: log repeats a request payload"),
                    });
                }
            }
        }
        Ok(())
    }
}
