//! Simulation driver.
//!
//! `SimDriver` plays the host's part for deterministic tests: it feeds
//! messages into a [`Worker`] running on a [`SimEnv`], forwards log actions to
//! `tracing` the way the real host does, and records every exchange into a
//! [`SessionSnapshot`] for invariant checking.

use std::time::Duration;

use cipherbox_core::{ConfigError, LogLevel, Worker, WorkerAction, WorkerConfig, WorkerEvent};
use cipherbox_crypto::Cipher;
use cipherbox_proto::Response;
use serde_json::Value;

use crate::{
    SimEnv,
    invariants::{ExchangeSnapshot, InvariantRegistry, SessionSnapshot},
};

/// Virtual time that passes between two messages.
pub const MESSAGE_INTERVAL: Duration = Duration::from_millis(1);

/// Deterministic host for one worker.
pub struct SimDriver<C: Cipher> {
    env: SimEnv,
    worker: Worker<SimEnv, C>,
    history: SessionSnapshot,
    invariants: Option<InvariantRegistry>,
}

impl<C: Cipher> SimDriver<C> {
    /// Create a driver around a fresh worker seeded with `seed`.
    pub fn new(seed: u64, cipher: C, config: WorkerConfig) -> Result<Self, ConfigError> {
        let env = SimEnv::with_seed(seed);
        let worker = Worker::new(env.clone(), cipher, config)?;
        let history = SessionSnapshot { mode: config.correlation, exchanges: Vec::new() };

        Ok(Self { env, worker, history, invariants: None })
    }

    /// Check invariants after every message.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Send an already-parsed message and return the worker's response.
    pub fn send(&mut self, message: Value) -> Option<Response> {
        let request = message.clone();
        self.exchange(request, WorkerEvent::Message(message))
    }

    /// Send raw text, as the host would after reading a line.
    pub fn send_text(&mut self, text: &str) -> Option<Response> {
        let request = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.into()));
        self.exchange(request, WorkerEvent::Text(text.to_string()))
    }

    /// Shut the worker down, wiping its key.
    pub fn shutdown(&mut self) {
        for action in self.worker.shutdown() {
            forward(action);
        }
    }

    /// The worker under test.
    pub fn worker(&self) -> &Worker<SimEnv, C> {
        &self.worker
    }

    /// Mutable access to the worker under test.
    pub fn worker_mut(&mut self) -> &mut Worker<SimEnv, C> {
        &mut self.worker
    }

    /// Environment shared with the worker.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Everything recorded so far.
    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.history
    }

    /// Most recent exchange.
    pub fn last_exchange(&self) -> Option<&ExchangeSnapshot> {
        self.history.exchanges.last()
    }

    fn exchange(&mut self, request: Value, event: WorkerEvent) -> Option<Response> {
        self.env.advance(MESSAGE_INTERVAL);

        let resident_before = self.worker.has_resident_key();
        let generation_before = self.worker.key_generation();
        let mut private_encodings = self.worker.resident_private_encodings();

        let actions = self.worker.handle(event);

        for encoding in self.worker.resident_private_encodings() {
            if !private_encodings.contains(&encoding) {
                private_encodings.push(encoding);
            }
        }

        let mut responses = Vec::new();
        let mut logs = Vec::new();
        for action in actions {
            match &action {
                WorkerAction::Respond(response) => responses.push(response.clone()),
                WorkerAction::Log { level, message } => logs.push((*level, message.clone())),
            }
            forward(action);
        }

        let response = responses.first().cloned();
        self.history.exchanges.push(ExchangeSnapshot {
            request,
            responses,
            logs,
            resident_before,
            resident_after: self.worker.has_resident_key(),
            generation_before,
            generation_after: self.worker.key_generation(),
            private_encodings,
        });

        if let Some(registry) = &self.invariants {
            let context = format!("after message {}", self.history.len());
            registry.assert_all(&self.history, &context);
        }

        response
    }
}

fn forward(action: WorkerAction) {
    let WorkerAction::Log { level, message } = action else {
        return;
    };
    match level {
        LogLevel::Debug => tracing::debug!(target: "cipherbox::worker", "{message}"),
        LogLevel::Info => tracing::info!(target: "cipherbox::worker", "{message}"),
        LogLevel::Warn => tracing::warn!(target: "cipherbox::worker", "{message}"),
        LogLevel::Error => tracing::error!(target: "cipherbox::worker", "{message}"),
    }
}

#[cfg(test)]
mod tests {
    use cipherbox_core::Environment;
    use cipherbox_crypto::{ElGamalCipher, PassphraseCipher, PassphraseConfig};
    use cipherbox_proto::{Correlation, CorrelationId, ErrorKind, Outcome};
    use serde_json::json;

    use super::*;

    fn fast_passphrase() -> PassphraseCipher {
        PassphraseCipher::new(PassphraseConfig { pbkdf2_rounds: 1_000 }).unwrap()
    }

    #[test]
    fn records_each_exchange() {
        let mut driver =
            SimDriver::new(1, ElGamalCipher::new(), WorkerConfig::default()).unwrap();

        driver.send(json!(["generate-keys", 1])).unwrap();
        driver.send_text("not json").unwrap();

        let history = driver.snapshot();
        assert_eq!(history.len(), 2);
        assert!(!history.exchanges[0].resident_before);
        assert!(history.exchanges[0].resident_after);
        assert!(!history.exchanges[0].private_encodings.is_empty());
        assert_eq!(history.exchanges[1].request, json!("not json"));
    }

    #[test]
    fn invariants_hold_for_a_round_trip() {
        let mut driver = SimDriver::new(2, fast_passphrase(), WorkerConfig::default())
            .unwrap()
            .with_invariants(InvariantRegistry::standard());

        let sealed = driver.send(json!(["encrypt", "a", "meet at noon", "hunter2"])).unwrap();
        let Ok(Outcome::Ciphertext(ciphertext)) = sealed.result else {
            panic!("expected ciphertext");
        };

        let opened = driver.send(json!(["decrypt", "b", ciphertext, "hunter2"])).unwrap();
        assert_eq!(
            opened,
            Response::success(
                Correlation::Id(CorrelationId::from("b")),
                Outcome::Plaintext("meet at noon".to_string())
            )
        );
    }

    #[test]
    fn clock_advances_per_message() {
        let mut driver =
            SimDriver::new(3, ElGamalCipher::new(), WorkerConfig::default()).unwrap();
        driver.send(json!(["decrypt", 1, "x"])).unwrap();
        driver.send(json!(["decrypt", 2, "x"])).unwrap();

        assert_eq!(driver.env().now().elapsed_since_start(), MESSAGE_INTERVAL * 2);
        assert_eq!(
            driver.last_exchange().and_then(|e| e.responses[0].error_kind()),
            Some(ErrorKind::KeyNotInitialized)
        );
    }

    #[test]
    fn shutdown_wipes_key() {
        let mut driver =
            SimDriver::new(4, ElGamalCipher::new(), WorkerConfig::default()).unwrap();
        driver.send(json!(["generate-keys", 1])).unwrap();
        driver.shutdown();
        assert!(!driver.worker().has_resident_key());
    }
}
