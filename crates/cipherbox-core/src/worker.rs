//! Worker state machine.
//!
//! The [`Worker`] owns the key store and the cipher backend. It consumes
//! [`WorkerEvent`]s and produces [`WorkerAction`]s, and performs no I/O: the
//! host feeds it decoded lines and writes out whatever it returns.
//!
//! # Flow
//!
//! ```text
//! WorkerEvent ──► RequestValidator ──► Request ──► KeyStore / Cipher
//!                        │                              │
//!                        ▼                              ▼
//!                    Rejection                Outcome | WorkerError
//!                        └──────────► Response ◄────────┘
//! ```
//!
//! Every message yields exactly one [`WorkerAction::Respond`]. Log actions
//! name the operation, the outcome kind and the elapsed time; they never carry
//! payloads, secrets or key material.

use std::time::Duration;

use cipherbox_crypto::{Cipher, DecryptionKey, KeyModel, PublicKeyBlob};
use cipherbox_proto::{
    Correlation, Inbound, OperationTag, Outcome, Request, RequestValidator, Response,
};
use serde_json::Value;

use crate::{ConfigError, EnvRng, Environment, KeyStore, WorkerConfig, WorkerError};

/// Events the host feeds into the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// An already-parsed JSON message.
    Message(Value),
    /// Raw JSON text. Unparseable text is a malformed request.
    Text(String),
    /// One line exactly as read off the channel. Bytes that are not UTF-8
    /// are a malformed request.
    Bytes(Vec<u8>),
    /// A line longer than the host's read limit. The host has already
    /// discarded it.
    Oversized {
        /// Read limit the line exceeded, in bytes
        limit: usize,
    },
}

/// Severity of a [`WorkerAction::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-request detail
    Debug,
    /// Lifecycle events (key generation, shutdown)
    Info,
    /// Request failed
    Warn,
    /// The worker could not do something it should be able to do
    Error,
}

/// Actions the worker produces for the host to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerAction {
    /// Send a response to the caller.
    Respond(Response),

    /// Log message for the host's logger.
    Log {
        /// Severity.
        level: LogLevel,
        /// Log message.
        message: String,
    },
}

/// Where the worker is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a message.
    Idle,
    /// Running an operation.
    Processing(OperationTag),
}

/// Cryptographic worker over cipher `C`.
pub struct Worker<E: Environment, C: Cipher> {
    /// Environment for randomness and timing.
    env: E,

    /// Cipher backend.
    cipher: C,

    /// Protocol configuration.
    config: WorkerConfig,

    /// Validator derived from `config`.
    validator: RequestValidator,

    /// Resident keypair, if any.
    keys: KeyStore<C::PrivateKey>,

    /// Current state.
    state: WorkerState,
}

impl<E: Environment, C: Cipher> Worker<E, C> {
    /// Create a worker with an empty key store.
    pub fn new(env: E, cipher: C, config: WorkerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            env,
            cipher,
            config,
            validator: config.validator(),
            keys: KeyStore::new(),
            state: WorkerState::Idle,
        })
    }

    /// Current state. Always `Idle` between calls to [`Self::handle`].
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Active configuration.
    pub fn config(&self) -> WorkerConfig {
        self.config
    }

    /// Cipher backend.
    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Returns true if a keypair is resident.
    pub fn has_resident_key(&self) -> bool {
        self.keys.has_private_material()
    }

    /// Public blob of the resident keypair.
    pub fn public_key(&self) -> Option<&PublicKeyBlob> {
        self.keys.public_key()
    }

    /// Number of successful key generations.
    pub fn key_generation(&self) -> u64 {
        self.keys.generation()
    }

    /// Handle one inbound event.
    pub fn handle(&mut self, event: WorkerEvent) -> Vec<WorkerAction> {
        let message = match event {
            WorkerEvent::Message(value) => value,
            WorkerEvent::Text(text) => match parse(text.as_bytes()) {
                Ok(value) => value,
                Err(err) => return unmatched(&err),
            },
            WorkerEvent::Bytes(bytes) => match parse(&bytes) {
                Ok(value) => value,
                Err(err) => return unmatched(&err),
            },
            WorkerEvent::Oversized { limit } => {
                return unmatched(&WorkerError::PayloadTooLarge {
                    reason: format!("line exceeds the {limit}-byte read limit"),
                });
            },
        };

        match self.validator.validate(&message) {
            Ok(inbound) => self.process(inbound),
            Err(rejection) => {
                let correlation = rejection.correlation.clone();
                let err = WorkerError::from(rejection);
                vec![
                    log(LogLevel::Warn, format!("rejected message: {err}")),
                    WorkerAction::Respond(Response::failure(correlation, err.kind())),
                ]
            },
        }
    }

    fn process(&mut self, inbound: Inbound) -> Vec<WorkerAction> {
        let Inbound { correlation, request } = inbound;
        let operation = request.operation();

        self.state = WorkerState::Processing(operation);
        let started = self.env.now();
        let result = self.execute(request);
        let elapsed = self.env.now() - started;
        self.state = WorkerState::Idle;

        match result {
            Ok(outcome) => {
                let level = match operation {
                    OperationTag::GenerateKeys => LogLevel::Info,
                    OperationTag::Encrypt | OperationTag::Decrypt => LogLevel::Debug,
                };
                vec![
                    log(level, format!("{operation} succeeded in {}", millis(elapsed))),
                    WorkerAction::Respond(Response::success(correlation, outcome)),
                ]
            },
            Err(err) => {
                let level = match err {
                    WorkerError::KeyGenerationFailed { .. } => LogLevel::Error,
                    _ => LogLevel::Warn,
                };
                vec![
                    log(level, format!("{operation} failed in {}: {err}", millis(elapsed))),
                    WorkerAction::Respond(Response::failure(correlation, err.kind())),
                ]
            },
        }
    }

    /// Drop the resident key.
    ///
    /// Returns whether a key was resident.
    pub fn clear_keys(&mut self) -> bool {
        self.keys.clear()
    }

    /// Wipe all key material before the host exits.
    pub fn shutdown(&mut self) -> Vec<WorkerAction> {
        let cleared = self.clear_keys();
        vec![log(
            LogLevel::Info,
            if cleared {
                "shutdown: resident key wiped".to_string()
            } else {
                "shutdown: no resident key".to_string()
            },
        )]
    }

    fn execute(&mut self, request: Request) -> Result<Outcome, WorkerError> {
        match request {
            Request::GenerateKeys => {
                if self.cipher.key_model() == KeyModel::CallerSupplied {
                    return Err(WorkerError::UnsupportedOperation {
                        reason: format!("the {} cipher has no resident keys", self.cipher.suite()),
                    });
                }

                let mut rng = EnvRng::new(&self.env);
                let public = self.keys.generate(&self.cipher, &mut rng)?;
                Ok(Outcome::PublicKey(public.into_string()))
            },
            Request::Encrypt { plaintext, key } => {
                let mut rng = EnvRng::new(&self.env);
                let ciphertext = self
                    .cipher
                    .encrypt(&plaintext, &key, &mut rng)
                    .map_err(WorkerError::encryption)?;

                if ciphertext.is_empty() {
                    return Err(WorkerError::EncryptionFailed {
                        reason: "cipher produced an empty ciphertext".to_string(),
                    });
                }
                Ok(Outcome::Ciphertext(ciphertext))
            },
            Request::Decrypt { ciphertext, key } => {
                let key = match self.cipher.key_model() {
                    KeyModel::Resident => DecryptionKey::Resident(self.keys.private_material()?),
                    KeyModel::CallerSupplied => {
                        let Some(secret) = key.as_deref() else {
                            return Err(WorkerError::MissingParameter {
                                reason: format!(
                                    "the {} cipher needs the shared secret to decrypt",
                                    self.cipher.suite()
                                ),
                            });
                        };
                        DecryptionKey::Supplied(secret)
                    },
                };

                let plaintext =
                    self.cipher.decrypt(&ciphertext, key).map_err(WorkerError::decryption)?;

                if plaintext.is_empty() {
                    return Err(WorkerError::DecryptionFailed {
                        reason: "cipher produced an empty plaintext".to_string(),
                    });
                }
                Ok(Outcome::Plaintext(plaintext))
            },
        }
    }

    /// Every textual encoding of the resident private key.
    #[cfg(feature = "test-utils")]
    pub fn resident_private_encodings(&self) -> Vec<String> {
        self.keys
            .private_material()
            .map(|key| self.cipher.private_encodings(key))
            .unwrap_or_default()
    }
}

/// Decode one message. Invalid UTF-8 and invalid JSON are both malformed.
fn parse(bytes: &[u8]) -> Result<Value, WorkerError> {
    let text = std::str::from_utf8(bytes).map_err(|e| WorkerError::MalformedRequest {
        reason: format!("invalid UTF-8 at byte {}", e.valid_up_to()),
    })?;
    serde_json::from_str(text)
        .map_err(|e| WorkerError::MalformedRequest { reason: format!("invalid JSON: {e}") })
}

/// Reject a message whose correlation could not be recovered.
fn unmatched(err: &WorkerError) -> Vec<WorkerAction> {
    vec![
        log(LogLevel::Warn, format!("rejected message: {err}")),
        WorkerAction::Respond(Response::failure(Correlation::Unmatched, err.kind())),
    ]
}

fn log(level: LogLevel, message: String) -> WorkerAction {
    WorkerAction::Log { level, message }
}

fn millis(elapsed: Duration) -> String {
    format!("{:.3}ms", elapsed.as_secs_f64() * 1_000.0)
}
