mod checker;

pub use checker::{check_specs, Problem, ProblemKind, Problems};
