//! Human-readable names for solved type variables.
//!
//! Variables equated with each other by the unifier form the components of an undirected graph.
//! A component holding a declared name takes that name; every other component gets the next free
//! name from `a`, `b`, ... A component holding two declared names means inference merged types
//! the program declared distinct, and a declared name bound to a concrete type means inference
//! specialized a type the program declared polymorphic. Both are errors.
use lnn_ast::TypeVariableName;
use lnn_collections::{MutMap, MutSet, VecSet};
use lnn_types::Type;
use lnn_unify::{AlgebraicTerm, Substitution};

use crate::problem::TypeProblem;

#[derive(Debug, Default)]
pub(crate) struct Renamer {
    parent: MutMap<String, String>,
    /// Root of a component to the declared name it contains.
    declared: MutMap<String, TypeVariableName>,
    labels: MutMap<String, TypeVariableName>,
    used: MutSet<TypeVariableName>,
    next: usize,
}

impl Renamer {
    pub fn new(
        definition: &str,
        substitution: &Substitution,
        known: &VecSet<TypeVariableName>,
    ) -> Result<Self, TypeProblem> {
        let mut renamer = Renamer::default();

        for (variable, term) in substitution.iter() {
            match term {
                AlgebraicTerm::Variable(other) => renamer.union(variable, other),
                _ if known.contains(&variable.to_string()) => {
                    return Err(TypeProblem::DeclaredVariableSpecialized {
                        definition: definition.to_string(),
                        name: variable.to_string(),
                        ty: term.clone(),
                    });
                }
                _ => {}
            }
        }

        for name in known.iter() {
            let root = renamer.find(name);

            if let Some(other) = renamer.declared.get(&root) {
                return Err(TypeProblem::DeclaredNamesCollapsed {
                    definition: definition.to_string(),
                    names: vec![other.clone(), name.clone()],
                });
            }

            renamer.declared.insert(root, name.clone());
            renamer.used.insert(name.clone());
        }

        Ok(renamer)
    }

    fn find(&self, variable: &str) -> String {
        let mut current = variable;

        while let Some(parent) = self.parent.get(current) {
            current = parent;
        }

        current.to_string()
    }

    fn union(&mut self, left: &str, right: &str) {
        let left = self.find(left);
        let right = self.find(right);

        if left != right {
            self.parent.insert(left, right);
        }
    }

    fn label(&mut self, variable: &str) -> TypeVariableName {
        let root = self.find(variable);

        if let Some(label) = self.labels.get(&root) {
            return label.clone();
        }

        let label = match self.declared.get(&root) {
            Some(name) => name.clone(),
            None => loop {
                let candidate = letter_name(self.next);
                self.next += 1;

                if self.used.insert(candidate.clone()) {
                    break candidate;
                }
            },
        };

        self.labels.insert(root, label.clone());
        label
    }

    /// Renames every variable of an already resolved type.
    pub fn rename(&mut self, ty: &Type) -> Type {
        let renamed: MutMap<&str, TypeVariableName> = ty
            .free_variables()
            .into_iter()
            .map(|variable| (variable, self.label(variable)))
            .collect();

        ty.map_variables(&|name| renamed.get(name).map(|label| Type::Variable(label.clone())))
    }

    pub fn rename_variable(&mut self, variable: &str) -> TypeVariableName {
        self.label(variable)
    }
}

/// `a`..`z`, then `a1`..`z1`, and so on.
fn letter_name(index: usize) -> String {
    let letter = (b'a' + (index % 26) as u8) as char;

    match index / 26 {
        0 => letter.to_string(),
        round => format!("{letter}{round}"),
    }
}
