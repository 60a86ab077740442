//! Reference model for model-based testing.
//!
//! A [`ModelWorker`] predicts what a caller should observe for every
//! [`Operation`]. Tests apply the same operations to the model and to a real
//! worker and compare results and [`ObservableState`].

mod operation;
mod worker;

pub use operation::{MalformedShape, Operation, OperationResult, SmallText};
pub use worker::{ModelCiphertext, ModelWorker, ObservableState};
