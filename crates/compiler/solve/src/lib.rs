//! The entry point of type inference: builds the algebraic types of a program and infers a
//! generalized type for every definition and every sub-expression.
#![warn(clippy::dbg_macro)]
#![allow(clippy::large_enum_variant)]

pub mod algebraic;
pub mod module;
pub mod problem;
pub mod term;
pub mod typed;

mod infer;
mod rename;

pub use module::{infer_program, InferredProgram};
pub use problem::TypeProblem;
pub use typed::{Reference, TypedBinding, TypedCase, TypedDefinition, TypedLambda, TypedPattern};
