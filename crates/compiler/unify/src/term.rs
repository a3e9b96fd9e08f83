use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AlgebraicTerm {
    Variable(String),
    Function(String, Vec<AlgebraicTerm>),
}

impl AlgebraicTerm {
    pub fn variable(name: impl Into<String>) -> Self {
        AlgebraicTerm::Variable(name.into())
    }

    pub fn function(name: impl Into<String>, arguments: Vec<AlgebraicTerm>) -> Self {
        AlgebraicTerm::Function(name.into(), arguments)
    }

    /// A function symbol without arguments.
    pub fn constant(name: impl Into<String>) -> Self {
        AlgebraicTerm::Function(name.into(), Vec::new())
    }

    pub fn contains_variable(&self, variable: &str) -> bool {
        match self {
            AlgebraicTerm::Variable(name) => name == variable,
            AlgebraicTerm::Function(_, arguments) => {
                arguments.iter().any(|arg| arg.contains_variable(variable))
            }
        }
    }

    /// Variables of the term in order of first occurrence, without duplicates.
    pub fn variables(&self) -> Vec<&str> {
        let mut buffer = Vec::new();
        self.collect_variables(&mut buffer);
        buffer
    }

    fn collect_variables<'a>(&'a self, buffer: &mut Vec<&'a str>) {
        match self {
            AlgebraicTerm::Variable(name) => {
                if !buffer.contains(&name.as_str()) {
                    buffer.push(name);
                }
            }
            AlgebraicTerm::Function(_, arguments) => {
                for arg in arguments {
                    arg.collect_variables(buffer);
                }
            }
        }
    }

    /// Replaces every variable for which `lookup` answers, leaving the others untouched.
    pub fn substitute<'a, F>(&self, lookup: &F) -> AlgebraicTerm
    where
        F: Fn(&str) -> Option<&'a AlgebraicTerm>,
    {
        match self {
            AlgebraicTerm::Variable(name) => match lookup(name) {
                Some(term) => term.clone(),
                None => self.clone(),
            },
            AlgebraicTerm::Function(name, arguments) => AlgebraicTerm::Function(
                name.clone(),
                arguments.iter().map(|arg| arg.substitute(lookup)).collect(),
            ),
        }
    }

    /// Number of nodes in the term.
    pub fn size(&self) -> usize {
        match self {
            AlgebraicTerm::Variable(_) => 1,
            AlgebraicTerm::Function(_, arguments) => {
                1 + arguments.iter().map(AlgebraicTerm::size).sum::<usize>()
            }
        }
    }
}

impl fmt::Display for AlgebraicTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgebraicTerm::Variable(name) => write!(f, "{name}"),
            AlgebraicTerm::Function(name, arguments) if arguments.is_empty() => {
                write!(f, "{name}")
            }
            AlgebraicTerm::Function(name, arguments) => {
                write!(f, "{name}(")?;
                for (index, arg) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlgebraicEquation {
    pub left: AlgebraicTerm,
    pub right: AlgebraicTerm,
}

impl AlgebraicEquation {
    pub fn new(left: AlgebraicTerm, right: AlgebraicTerm) -> Self {
        Self { left, right }
    }
}

impl fmt::Display for AlgebraicEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}
