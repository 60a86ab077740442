//! Deterministic simulation harness for cipherbox worker testing.
//!
//! [`SimEnv`] supplies seeded randomness and a virtual clock, so every key,
//! salt and nonce a test sees is reproducible from its seed. [`SimDriver`]
//! plays the host around a real worker and records each exchange.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation. Operations are
//! applied to both the model and the real worker, and their observable results
//! are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold across every
//! session, whatever the messages. Use [`InvariantRegistry::standard()`] for
//! the worker's confidentiality and correlation invariants.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod model;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    CorrelationEchoed, ExchangeSnapshot, Invariant, InvariantRegistry, InvariantResult,
    LogsCarryNoPayload, NoPrivateKeyLeak, OneResponsePerMessage, RejectionPreservesKeys,
    SessionSnapshot, Violation,
};
pub use model::{
    MalformedShape, ModelCiphertext, ModelWorker, ObservableState, Operation, OperationResult,
    SmallText,
};
pub use sim_driver::{MESSAGE_INTERVAL, SimDriver};
pub use sim_env::{SimEnv, SimInstant};
