use crate::term::{AlgebraicEquation, AlgebraicTerm};
use lnn_collections::MutMap;
use lnn_debug_flags::dbg_do;
#[cfg(debug_assertions)]
use lnn_debug_flags::LNN_PRINT_UNIFICATIONS;
use std::collections::VecDeque;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mismatch {
    /// Two function symbols with different names or arities.
    Shape,
    /// A variable equated with a term that contains it.
    Occurs,
}

/// Why a system has no solution. Both terms have the substitution found so far applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnificationError {
    pub left: AlgebraicTerm,
    pub right: AlgebraicTerm,
    pub kind: Mismatch,
}

impl fmt::Display for UnificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Mismatch::Shape => write!(f, "cannot unify {} with {}", self.left, self.right),
            Mismatch::Occurs => write!(
                f,
                "cannot construct the infinite term {} = {}",
                self.left, self.right
            ),
        }
    }
}

impl std::error::Error for UnificationError {}

/// A solved system: every bound variable maps to a term that mentions no bound variable,
/// so applying it once is enough.
#[derive(Clone, Debug, Default)]
pub struct Substitution {
    bindings: MutMap<String, AlgebraicTerm>,
    order: Vec<String>,
}

impl Substitution {
    pub fn get(&self, variable: &str) -> Option<&AlgebraicTerm> {
        self.bindings.get(variable)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bindings in the order they were made.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AlgebraicTerm)> {
        self.order
            .iter()
            .map(move |name| (name.as_str(), &self.bindings[name]))
    }

    pub fn apply(&self, term: &AlgebraicTerm) -> AlgebraicTerm {
        if self.is_empty() {
            return term.clone();
        }

        term.substitute(&|name| self.bindings.get(name))
    }

    fn bind(&mut self, variable: String, term: AlgebraicTerm) {
        debug_assert!(!self.bindings.contains_key(&variable));

        let single = |name: &str| (name == variable).then_some(&term);
        for value in self.bindings.values_mut() {
            if value.contains_variable(&variable) {
                *value = value.substitute(&single);
            }
        }

        self.order.push(variable.clone());
        self.bindings.insert(variable, term);
    }
}

/// Incremental most-general unifier.
///
/// Each equation is rewritten with the substitution found so far and then reduced by the usual
/// rules: orient `term = variable`, drop `x = x`, decompose equal function symbols pairwise, and
/// bind `x = term` after the occurs check. Binding substitutes the variable away everywhere, so
/// once the queue drains no rule applies to the system.
#[derive(Debug, Default)]
pub struct Unifier {
    substitution: Substitution,
}

impl Unifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unify(
        &mut self,
        left: &AlgebraicTerm,
        right: &AlgebraicTerm,
    ) -> Result<(), UnificationError> {
        let mut pending = VecDeque::new();
        pending.push_back((left.clone(), right.clone()));

        while let Some((left, right)) = pending.pop_front() {
            let left = self.substitution.apply(&left);
            let right = self.substitution.apply(&right);

            dbg_do!(LNN_PRINT_UNIFICATIONS, {
                eprintln!("unify {left} = {right}");
            });

            match (left, right) {
                (AlgebraicTerm::Variable(a), AlgebraicTerm::Variable(b)) if a == b => {}
                (AlgebraicTerm::Variable(variable), term)
                | (term, AlgebraicTerm::Variable(variable)) => {
                    self.bind(variable, term)?;
                }
                (
                    AlgebraicTerm::Function(f, left_arguments),
                    AlgebraicTerm::Function(g, right_arguments),
                ) => {
                    if f != g || left_arguments.len() != right_arguments.len() {
                        return Err(UnificationError {
                            left: AlgebraicTerm::Function(f, left_arguments),
                            right: AlgebraicTerm::Function(g, right_arguments),
                            kind: Mismatch::Shape,
                        });
                    }

                    pending.extend(left_arguments.into_iter().zip(right_arguments));
                }
            }
        }

        Ok(())
    }

    pub fn unify_equation(&mut self, equation: &AlgebraicEquation) -> Result<(), UnificationError> {
        self.unify(&equation.left, &equation.right)
    }

    fn bind(&mut self, variable: String, term: AlgebraicTerm) -> Result<(), UnificationError> {
        if term.contains_variable(&variable) {
            return Err(UnificationError {
                left: AlgebraicTerm::Variable(variable),
                right: term,
                kind: Mismatch::Occurs,
            });
        }

        self.substitution.bind(variable, term);

        Ok(())
    }

    /// Applies everything solved so far.
    pub fn resolve(&self, term: &AlgebraicTerm) -> AlgebraicTerm {
        self.substitution.apply(term)
    }

    pub fn substitution(&self) -> &Substitution {
        &self.substitution
    }

    pub fn into_substitution(self) -> Substitution {
        self.substitution
    }
}

/// Solves a whole system at once, producing its most general unifier.
/// No partial solution is returned on failure.
pub fn solve_system(equations: &[AlgebraicEquation]) -> Result<Substitution, UnificationError> {
    let mut unifier = Unifier::new();

    for equation in equations {
        unifier.unify_equation(equation)?;
    }

    Ok(unifier.into_substitution())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> AlgebraicTerm {
        AlgebraicTerm::variable(name)
    }

    fn fun(name: &str, arguments: Vec<AlgebraicTerm>) -> AlgebraicTerm {
        AlgebraicTerm::function(name, arguments)
    }

    fn eq(left: AlgebraicTerm, right: AlgebraicTerm) -> AlgebraicEquation {
        AlgebraicEquation::new(left, right)
    }

    #[test]
    fn orient_and_bind() {
        let solution = solve_system(&[eq(fun("Bool", vec![]), var("x"))]).unwrap();

        assert_eq!(solution.get("x"), Some(&fun("Bool", vec![])));
        assert_eq!(solution.len(), 1);
    }

    #[test]
    fn trivial_equations_are_dropped() {
        let solution = solve_system(&[eq(var("x"), var("x"))]).unwrap();

        assert!(solution.is_empty());
    }

    #[test]
    fn decompose_binds_arguments() {
        let solution = solve_system(&[eq(
            fun("->", vec![var("a"), fun("Bool", vec![])]),
            fun("->", vec![fun("Pair", vec![]), var("b")]),
        )])
        .unwrap();

        assert_eq!(solution.apply(&var("a")), fun("Pair", vec![]));
        assert_eq!(solution.apply(&var("b")), fun("Bool", vec![]));
    }

    #[test]
    fn solution_is_idempotent_across_chains() {
        let solution = solve_system(&[
            eq(var("x"), fun("f", vec![var("y")])),
            eq(var("y"), var("z")),
            eq(var("z"), fun("c", vec![])),
        ])
        .unwrap();

        assert_eq!(
            solution.get("x"),
            Some(&fun("f", vec![fun("c", vec![])]))
        );
        for (_, term) in solution.iter() {
            assert_eq!(solution.apply(term), term.clone());
        }
    }

    #[test]
    fn name_mismatch_reports_both_terms() {
        let error = solve_system(&[eq(
            fun("->", vec![var("a"), fun("Bool", vec![])]),
            fun("->", vec![var("a"), fun("Pair", vec![])]),
        )])
        .unwrap_err();

        assert_eq!(
            error,
            UnificationError {
                left: fun("Bool", vec![]),
                right: fun("Pair", vec![]),
                kind: Mismatch::Shape,
            }
        );
    }

    #[test]
    fn arity_mismatch() {
        let error = solve_system(&[eq(
            fun("Maybe", vec![var("a")]),
            fun("Maybe", vec![var("a"), var("b")]),
        )])
        .unwrap_err();

        assert_eq!(error.kind, Mismatch::Shape);
    }

    #[test]
    fn occurs_check_direct() {
        let error = solve_system(&[eq(var("x"), fun("f", vec![var("x")]))]).unwrap_err();

        assert_eq!(error.kind, Mismatch::Occurs);
        assert_eq!(error.left, var("x"));
    }

    #[test]
    fn occurs_check_through_chain() {
        let error = solve_system(&[
            eq(var("x"), fun("f", vec![var("y")])),
            eq(var("y"), var("x")),
        ])
        .unwrap_err();

        assert_eq!(error.kind, Mismatch::Occurs);
    }

    #[test]
    fn error_display() {
        let error = solve_system(&[eq(var("x"), fun("f", vec![var("x")]))]).unwrap_err();

        assert_eq!(
            error.to_string(),
            "cannot construct the infinite term x = f(x)"
        );
    }
}
