//! The program representation produced by the parser.
//!
//! The compiler consumes this tree and nothing about concrete syntax. The [build] module has
//! terse constructors for assembling programs by hand.
#![warn(clippy::dbg_macro)]

pub mod build;

use std::fmt;

/// Name of a term-level binding: a definition, a pattern variable or a lambda argument.
pub type LambdaName = String;

/// Name of an algebraic type or of one of its constructors.
pub type TypeName = String;

/// Name of a type variable, as written in a type definition or declaration.
pub type TypeVariableName = String;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LambdaProgram {
    pub expressions: Vec<Expression>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Type(TypeDefinition),
    Lambda(LambdaDefinition),
    Declaration(LambdaTypeDeclaration),
}

/// `Name params = Ctor1 | Ctor2 T1 T2 | ...`
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDefinition {
    pub name: TypeName,
    pub parameters: Vec<TypeVariableName>,
    pub operands: Vec<RawSumOperand>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RawSumOperand {
    /// Nullary constructor
    Object(TypeName),
    /// Constructor with at least one argument
    Product(TypeName, Vec<RawType>),
}

impl RawSumOperand {
    pub fn name(&self) -> &str {
        match self {
            RawSumOperand::Object(name) | RawSumOperand::Product(name, _) => name,
        }
    }
}

/// Type syntax. The parser decides whether a bare name is a variable or a nullary application.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RawType {
    Variable(TypeVariableName),
    Application(TypeName, Vec<RawType>),
    Function(Box<RawType>, Box<RawType>),
}

/// One case of a definition: `name p1 p2 = body`.
/// Consecutive definitions sharing a name are the cases of a single function.
#[derive(Clone, Debug, PartialEq)]
pub struct LambdaDefinition {
    pub name: LambdaName,
    pub patterns: Vec<Pattern>,
    pub body: Lambda,
}

/// `name :: type`
#[derive(Clone, Debug, PartialEq)]
pub struct LambdaTypeDeclaration {
    pub name: LambdaName,
    pub ty: RawType,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    Variable(LambdaName),
    /// A nullary constructor
    Object(TypeName),
    Constructor(TypeName, Vec<Pattern>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Lambda {
    Literal(LambdaName),
    /// `@learn`, an opaque function whose shape comes from its uses
    Trainable,
    Abstraction {
        arguments: Vec<LambdaName>,
        body: Box<Lambda>,
    },
    Application {
        function: Box<Lambda>,
        arguments: Vec<Lambda>,
    },
    Let {
        bindings: Vec<Binding>,
        body: Box<Lambda>,
    },
    Typed {
        expression: Box<Lambda>,
        ty: RawType,
    },
    Case {
        scrutinee: Box<Lambda>,
        branches: Vec<CaseBranch>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub name: LambdaName,
    pub expression: Lambda,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaseBranch {
    pub pattern: Pattern,
    pub body: Lambda,
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawType::Variable(name) => write!(f, "{name}"),
            RawType::Application(name, args) if args.is_empty() => write!(f, "{name}"),
            RawType::Application(name, args) => {
                write!(f, "({name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            RawType::Function(from, to) => write!(f, "({from} -> {to})"),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Variable(name) | Pattern::Object(name) => write!(f, "{name}"),
            Pattern::Constructor(name, args) => {
                write!(f, "({name}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
