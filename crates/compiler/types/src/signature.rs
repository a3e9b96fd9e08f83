//! Names of polymorphic definitions and of their concrete instances.
use crate::types::{AlgebraicTypes, Type};
use lnn_ast::{LambdaName, TypeVariableName};
use std::fmt;

/// Path of a definition: a top-level name, followed by the names of the let bindings it is
/// nested in. Algebraic types and constructors use a single-element path.
pub type InstanceSignature = Vec<LambdaName>;

/// The type arguments a definition is instantiated with.
pub type TypeSignature = Vec<TypeSig>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstanceName {
    pub signature: InstanceSignature,
    pub type_signature: TypeSignature,
}

impl InstanceName {
    pub fn new(signature: InstanceSignature, type_signature: TypeSignature) -> Self {
        Self {
            signature,
            type_signature,
        }
    }

    pub fn is_concrete(&self) -> bool {
        self.type_signature.iter().all(TypeSig::is_concrete)
    }
}

/// A hashable, arena-free rendering of a [Type].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeSig {
    Variable(TypeVariableName),
    Function(Box<TypeSig>, Box<TypeSig>),
    Application(InstanceName),
}

impl TypeSig {
    pub fn from_type(ty: &Type, types: &AlgebraicTypes) -> TypeSig {
        match ty {
            Type::Variable(name) => TypeSig::Variable(name.clone()),
            Type::Function(from, to) => TypeSig::Function(
                Box::new(TypeSig::from_type(from, types)),
                Box::new(TypeSig::from_type(to, types)),
            ),
            Type::Application(id, arguments) => TypeSig::Application(InstanceName {
                signature: vec![types.get(*id).name.clone()],
                type_signature: type_signature(arguments, types),
            }),
        }
    }

    pub fn is_concrete(&self) -> bool {
        match self {
            TypeSig::Variable(_) => false,
            TypeSig::Function(from, to) => from.is_concrete() && to.is_concrete(),
            TypeSig::Application(name) => name.is_concrete(),
        }
    }
}

pub fn type_signature(types: &[Type], algebraic: &AlgebraicTypes) -> TypeSignature {
    types
        .iter()
        .map(|ty| TypeSig::from_type(ty, algebraic))
        .collect()
}

impl fmt::Display for InstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.signature.join(".");

        if self.type_signature.is_empty() {
            write!(f, "{path}")
        } else {
            write!(f, "({path}")?;
            for sig in &self.type_signature {
                write!(f, " {sig}")?;
            }
            write!(f, ")")
        }
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Variable(name) => write!(f, "{name}"),
            TypeSig::Function(from, to) => write!(f, "({from} -> {to})"),
            TypeSig::Application(name) => write!(f, "{name}"),
        }
    }
}
