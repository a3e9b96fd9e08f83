//! Domain-specific collections created for the needs of the compiler.
#![warn(clippy::dbg_macro)]

pub mod all;

mod vec_map;
mod vec_set;

pub use all::{BuildHasher, ImMap, MutMap, MutSet};
pub use vec_map::VecMap;
pub use vec_set::VecSet;
