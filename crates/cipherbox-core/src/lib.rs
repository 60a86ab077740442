//! Cipherbox Core
//!
//! Sans-IO cryptographic worker. The [`Worker`] validates inbound messages,
//! dispatches them to a [`Cipher`](cipherbox_crypto::Cipher) backend and a
//! [`KeyStore`], and returns responses as actions. It never reads a socket,
//! a clock or the OS RNG directly; all of that arrives through
//! [`Environment`].
//!
//! # Key Lifecycle
//!
//! ```text
//! empty ──generate-keys──► resident ──generate-keys──► resident (replaced)
//!   ▲                         │
//!   └──────clear / shutdown───┘
//! ```
//!
//! Only `generate-keys` populates the store. Replacement is atomic: the new
//! keypair and its public blob are fully built before the old key is dropped.
//!
//! # Invariants
//!
//! - At most one keypair is resident
//! - The private half never appears in a response or a log action
//! - Asymmetric decrypt requires a resident key (`KeyNotInitialized`)
//! - Asymmetric encrypt uses only the caller-supplied public key
//! - A rejected message never touches the key store

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod env;
mod error;
mod key_store;
mod worker;

pub use config::WorkerConfig;
pub use env::{EnvRng, Environment};
pub use error::{ConfigError, WorkerError};
pub use key_store::KeyStore;
pub use worker::{LogLevel, Worker, WorkerAction, WorkerEvent, WorkerState};
