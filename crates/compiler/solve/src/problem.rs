//! Provides types to describe problems that can occur during solving.
use lnn_ast::{LambdaName, TypeName, TypeVariableName};
use lnn_unify::{AlgebraicTerm, Mismatch, UnificationError};
use std::fmt;

use crate::term::ARROW;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeProblem {
    /// A type name that no earlier type definition introduces.
    UnknownType(TypeName),
    /// A term name that is neither in scope, an earlier definition nor a constructor.
    UnknownExpression(LambdaName),
    Unification {
        definition: LambdaName,
        error: UnificationError,
    },
    /// Two distinct declared type variables ended up equal.
    DeclaredNamesCollapsed {
        definition: LambdaName,
        names: Vec<TypeVariableName>,
    },
    /// A declared type variable was bound to a concrete type.
    DeclaredVariableSpecialized {
        definition: LambdaName,
        name: TypeVariableName,
        ty: AlgebraicTerm,
    },
    TypeArity {
        name: TypeName,
        expected: usize,
        found: usize,
    },
    /// A name bound twice in one scope: a type, a constructor, a definition or a pattern
    /// variable.
    DuplicateName(String),
    DuplicateDeclaration(LambdaName),
    PatternArity {
        constructor: TypeName,
        expected: usize,
        found: usize,
    },
    FunctionInConstructor(TypeName),
    CaseArity {
        definition: LambdaName,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for TypeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TypeProblem::*;

        match self {
            UnknownType(name) => write!(f, "unknown type `{name}`"),
            UnknownExpression(name) => write!(f, "unknown expression `{name}`"),
            Unification { definition, error } => {
                write!(f, "in `{definition}`: ")?;
                match error.kind {
                    Mismatch::Shape => write!(
                        f,
                        "cannot unify {} with {}",
                        TermDisplay(&error.left),
                        TermDisplay(&error.right)
                    ),
                    Mismatch::Occurs => write!(
                        f,
                        "{} occurs in {}, which would make an infinite type",
                        TermDisplay(&error.left),
                        TermDisplay(&error.right)
                    ),
                }
            }
            DeclaredNamesCollapsed { definition, names } => write!(
                f,
                "in `{definition}`: declared type variables {} must stay distinct",
                names.join(", ")
            ),
            DeclaredVariableSpecialized {
                definition,
                name,
                ty,
            } => write!(
                f,
                "in `{definition}`: declared type variable {name} is too general, it is always {}",
                TermDisplay(ty)
            ),
            TypeArity {
                name,
                expected,
                found,
            } => write!(
                f,
                "type `{name}` expects {expected} argument(s), but was given {found}"
            ),
            DuplicateName(name) => write!(f, "`{name}` is defined more than once"),
            DuplicateDeclaration(name) => {
                write!(f, "`{name}` has more than one type declaration")
            }
            PatternArity {
                constructor,
                expected,
                found,
            } => write!(
                f,
                "constructor `{constructor}` takes {expected} argument(s), but the pattern has {found}"
            ),
            FunctionInConstructor(name) => write!(
                f,
                "constructor `{name}` has a function argument, which has no layout"
            ),
            CaseArity {
                definition,
                expected,
                found,
            } => write!(
                f,
                "cases of `{definition}` take {expected} pattern(s), but one has {found}"
            ),
        }
    }
}

impl std::error::Error for TypeProblem {}

/// Renders a type-shaped term the way types are written: `Maybe a -> Bool`.
struct TermDisplay<'a>(&'a AlgebraicTerm);

impl TermDisplay<'_> {
    fn write(f: &mut fmt::Formatter<'_>, term: &AlgebraicTerm, parens: bool) -> fmt::Result {
        match term {
            AlgebraicTerm::Variable(name) => write!(f, "{name}"),
            AlgebraicTerm::Function(name, arguments) if name == ARROW && arguments.len() == 2 => {
                if parens {
                    write!(f, "(")?;
                }
                Self::write(f, &arguments[0], true)?;
                write!(f, " -> ")?;
                Self::write(f, &arguments[1], false)?;
                if parens {
                    write!(f, ")")?;
                }
                Ok(())
            }
            AlgebraicTerm::Function(name, arguments) if arguments.is_empty() => {
                write!(f, "{name}")
            }
            AlgebraicTerm::Function(name, arguments) => {
                if parens {
                    write!(f, "(")?;
                }
                write!(f, "{name}")?;
                for arg in arguments {
                    write!(f, " ")?;
                    Self::write(f, arg, true)?;
                }
                if parens {
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write(f, self.0, false)
    }
}
