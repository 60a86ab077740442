//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! The [`SimDriver`](crate::SimDriver) records every exchange with the worker
//! into a [`SessionSnapshot`], then registered [`Invariant`] checks run
//! against it. Violations trigger panics with detailed context for debugging.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.assert_all(&driver.snapshot(), "after scenario");
//! ```

mod checks;
mod snapshot;

pub use checks::{
    CorrelationEchoed, LogsCarryNoPayload, NoPrivateKeyLeak, OneResponsePerMessage,
    RejectionPreservesKeys,
};
pub use snapshot::{ExchangeSnapshot, SessionSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against a session history.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the recorded session.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard worker invariants.
    ///
    /// Includes:
    /// - [`NoPrivateKeyLeak`]: private encodings never appear in output
    /// - [`OneResponsePerMessage`]: every message is answered once
    /// - [`CorrelationEchoed`]: valid ids come back unchanged
    /// - [`RejectionPreservesKeys`]: caller errors leave keys alone
    /// - [`LogsCarryNoPayload`]: payloads never reach logs
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(NoPrivateKeyLeak);
        registry.add(OneResponsePerMessage);
        registry.add(CorrelationEchoed);
        registry.add(RejectionPreservesKeys);
        registry.add(LogsCarryNoPayload);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on any violation.
    ///
    /// Use this in tests where you want immediate failure with context.
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            #[allow(clippy::panic)]
            {
                panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
            }
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use cipherbox_core::LogLevel;
    use cipherbox_proto::{Correlation, CorrelationId, ErrorKind, Outcome, Response};
    use serde_json::json;

    use super::*;

    fn exchange(request: serde_json::Value, response: Response) -> ExchangeSnapshot {
        ExchangeSnapshot {
            request,
            responses: vec![response],
            logs: Vec::new(),
            resident_before: false,
            resident_after: false,
            generation_before: 0,
            generation_after: 0,
            private_encodings: Vec::new(),
        }
    }

    fn session(exchanges: Vec<ExchangeSnapshot>) -> SessionSnapshot {
        SessionSnapshot { mode: cipherbox_proto::CorrelationMode::MessageId, exchanges }
    }

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&SessionSnapshot::empty()).is_ok());
    }

    #[test]
    fn leaked_secret_is_caught() {
        let mut leaky = exchange(
            json!(["generate-keys", 1]),
            Response::success(
                Correlation::Id(CorrelationId::from(1u64)),
                Outcome::PublicKey("pub||SECRET-BYTES".to_string()),
            ),
        );
        leaky.private_encodings = vec!["SECRET-BYTES".to_string()];

        let result = NoPrivateKeyLeak.check(&session(vec![leaky]));
        assert!(result.is_err());
    }

    #[test]
    fn wrong_correlation_is_caught() {
        let misaddressed = exchange(
            json!(["decrypt", "corr-1", "x"]),
            Response::failure(Correlation::Unmatched, ErrorKind::KeyNotInitialized),
        );
        assert!(CorrelationEchoed.check(&session(vec![misaddressed])).is_err());
    }

    #[test]
    fn rejection_changing_keys_is_caught() {
        let mut bad = exchange(
            json!([]),
            Response::failure(Correlation::Unmatched, ErrorKind::MalformedRequest),
        );
        bad.resident_after = true;
        assert!(RejectionPreservesKeys.check(&session(vec![bad])).is_err());
    }

    #[test]
    fn logged_payload_is_caught() {
        let mut chatty = exchange(
            json!(["encrypt", 1, "attack at dawn", "pk"]),
            Response::failure(
                Correlation::Id(CorrelationId::from(1u64)),
                ErrorKind::EncryptionFailed,
            ),
        );
        chatty.logs = vec![(LogLevel::Warn, "could not encrypt attack at dawn".to_string())];
        assert!(LogsCarryNoPayload.check(&session(vec![chatty])).is_err());
    }
}
