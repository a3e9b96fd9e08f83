//! The middle of the pipeline: lays algebraic types out as flat presence cells, lowers typed
//! definitions into parametrised specs, and instantiates those at concrete types into the
//! monomorphic [Spec][ir::Spec] IR that the evaluator runs.
#![warn(clippy::dbg_macro)]
#![allow(clippy::large_enum_variant)]

pub mod debug;
pub mod instances;
pub mod ir;
pub mod layout;
pub mod monomorphize;
pub mod parametrised;
pub mod problem;

pub use instances::Instances;
pub use monomorphize::Monomorphizer;
pub use problem::MonoProblem;
