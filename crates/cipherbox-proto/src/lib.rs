//! Cipherbox wire protocol.
//!
//! Messages are JSON arrays. An inbound message names an operation, carries
//! correlation information, and optionally a payload and an auxiliary key:
//!
//! ```text
//! message-id mode:     [operationTag, correlationId, payload?, auxiliaryKey?]
//! operation-tag mode:  [operationTag, payload?, auxiliaryKey?]
//! ```
//!
//! Outbound messages are two-element arrays keyed by whatever correlation the
//! active [`CorrelationMode`] carries:
//!
//! ```text
//! success:  [correlationId | operationTag, result]
//! failure:  [correlationId, {"error": "<Kind>"}]   (message-id mode)
//!           ["error", "<Kind>"]                    (operation-tag mode, or
//!                                                   no recoverable id)
//! ```
//!
//! # Components
//!
//! - [`RequestValidator`]: turns an untrusted JSON value into a typed
//!   [`Request`] or a [`Rejection`]. Pure, no side effects.
//! - [`Response`]: the correlation envelope around an [`Outcome`] or an
//!   [`ErrorKind`].
//!
//! # Invariants
//!
//! - A rejected message never produces a [`Request`], so nothing downstream
//!   sees input that failed validation.
//! - Responses carry an [`ErrorKind`] name only; internal failure detail stays
//!   in [`Rejection::reason`] for local logging.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod correlation;
mod error;
mod operation;
mod request;
mod response;

pub use correlation::{Correlation, CorrelationId, CorrelationMode};
pub use error::ErrorKind;
pub use operation::OperationTag;
pub use request::{
    DEFAULT_MAX_CIPHERTEXT_LEN, DEFAULT_MAX_PLAINTEXT_LEN, Inbound, PayloadLimits, Rejection,
    Request, RequestValidator,
};
pub use response::{Outcome, Response};
