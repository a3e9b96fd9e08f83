use lnn_ast::{LambdaName, TypeVariableName};
use lnn_mono::layout::LayoutProblem;
use lnn_mono::MonoProblem;
use lnn_solve::TypeProblem;
use std::fmt;

/// Why a program could not be loaded. Loading stops at the first problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Problem {
    Type(TypeProblem),
    Mono(MonoProblem),
    /// A root must be instantiable without type arguments.
    PolymorphicRoot {
        name: LambdaName,
        parameters: Vec<TypeVariableName>,
    },
    TypeArguments {
        name: LambdaName,
        expected: usize,
        found: usize,
    },
    /// The lowered specs are inconsistent; one line per finding.
    SpecCheck(String),
}

impl From<TypeProblem> for Problem {
    fn from(problem: TypeProblem) -> Self {
        Problem::Type(problem)
    }
}

impl From<MonoProblem> for Problem {
    fn from(problem: MonoProblem) -> Self {
        Problem::Mono(problem)
    }
}

impl From<LayoutProblem> for Problem {
    fn from(problem: LayoutProblem) -> Self {
        Problem::Mono(MonoProblem::Layout(problem))
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Type(problem) => write!(f, "{problem}"),
            Problem::Mono(problem) => write!(f, "{problem}"),
            Problem::PolymorphicRoot { name, parameters } => write!(
                f,
                "`{name}` cannot be a root, it is polymorphic over {}",
                parameters.join(", ")
            ),
            Problem::TypeArguments {
                name,
                expected,
                found,
            } => write!(
                f,
                "`{name}` takes {expected} type arguments, but {found} were given"
            ),
            Problem::SpecCheck(findings) => write!(f, "inconsistent specs:\n{findings}"),
        }
    }
}
