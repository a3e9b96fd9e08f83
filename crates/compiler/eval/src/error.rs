use lnn_types::InstanceName;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeError {
    /// Every case of a guarded function had zero presence. `None` for case expressions.
    NoMatchingCase { function: Option<InstanceName> },
    /// Cells were applied to arguments.
    NotAFunction,
    /// A function was passed where cells are expected.
    NotData,
    /// A trainable backend answered with the wrong number of cells.
    TrainableShape {
        name: InstanceName,
        index: usize,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::NoMatchingCase {
                function: Some(name),
            } => write!(f, "no case of {name} matches its arguments"),
            RuntimeError::NoMatchingCase { function: None } => {
                write!(f, "no branch of a case expression matches")
            }
            RuntimeError::NotAFunction => write!(f, "data cannot be applied to arguments"),
            RuntimeError::NotData => write!(f, "a function was used where data is expected"),
            RuntimeError::TrainableShape {
                name,
                index,
                expected,
                found,
            } => write!(
                f,
                "trainable {index} of {name} produced {found} cells instead of {expected}"
            ),
        }
    }
}
