use lnn_ast::{TypeName, TypeVariableName};
use lnn_types::{InstanceName, InstanceSignature};
use std::fmt;

use crate::layout::LayoutProblem;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonoProblem {
    Layout(LayoutProblem),
    /// No definition or let binding is known under this path.
    UnknownExpression(InstanceSignature),
    /// A constructor that belongs to no algebraic type.
    UnknownType(TypeName),
    /// Trainables only map cells to cells.
    UnsupportedTrainableType {
        definition: InstanceSignature,
        ty: String,
    },
    /// A type variable was never fixed by any use, so the instance has no concrete shape.
    UnresolvedTypeVariable {
        instance: InstanceName,
        variable: TypeVariableName,
    },
}

impl From<LayoutProblem> for MonoProblem {
    fn from(problem: LayoutProblem) -> Self {
        MonoProblem::Layout(problem)
    }
}

impl fmt::Display for MonoProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonoProblem::Layout(problem) => write!(f, "{problem}"),
            MonoProblem::UnknownExpression(signature) => {
                write!(f, "unknown definition `{}`", signature.join("."))
            }
            MonoProblem::UnknownType(constructor) => {
                write!(f, "constructor {constructor} belongs to no type")
            }
            MonoProblem::UnsupportedTrainableType { definition, ty } => write!(
                f,
                "in `{}`: a trainable cannot have type {ty}, it must map data to data",
                definition.join(".")
            ),
            MonoProblem::UnresolvedTypeVariable { instance, variable } => write!(
                f,
                "in `{instance}`: type variable {variable} is never made concrete"
            ),
        }
    }
}
