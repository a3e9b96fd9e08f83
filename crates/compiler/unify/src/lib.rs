//! Implements the unification algorithm used by
//! [type inference](https://en.wikipedia.org/wiki/Type_inference).
//!
//! Both algebraic type structures and the types of lambda terms are encoded as
//! [AlgebraicTerm]s: a variable, or a named function symbol applied to arguments.
#![warn(clippy::dbg_macro)]

pub mod term;
pub mod unify;


pub use term::{AlgebraicEquation, AlgebraicTerm};
pub use unify::{solve_system, Mismatch, Substitution, UnificationError, Unifier};
