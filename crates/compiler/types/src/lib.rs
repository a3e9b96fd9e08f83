#![warn(clippy::dbg_macro)]
#![allow(clippy::large_enum_variant)]
pub mod name_generator;
pub mod signature;
pub mod types;

pub use name_generator::NameGenerator;
pub use signature::{InstanceName, InstanceSignature, TypeSig, TypeSignature};
pub use types::{AlgebraicType, AlgebraicTypeId, AlgebraicTypes, Parametrised, SumOperand, Type};
