//! Interprets monomorphized specs. A data value is a flat array of presence cells; a function
//! value is a closure over the prefix of the argument bag it was created in.
#![warn(clippy::dbg_macro)]

pub mod bag;
pub mod error;
pub mod evaluator;
pub mod trainable;

pub use bag::{Closure, DataBag, EvalResult};
pub use error::RuntimeError;
pub use evaluator::Evaluator;
pub use trainable::{TrainableBackend, ZeroTrainable};
