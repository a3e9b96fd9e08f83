//! Consistency checks of the monomorphized [Specs][crate::ir::Specs].

use bumpalo::collections::Vec;
use bumpalo::Bump;
use lnn_collections::MutSet;
use std::fmt;

use crate::{
    ir::{DataPattern, FunctionSpec, Spec, SpecId, Specs, VariableSpec},
    layout::{LayoutId, Layouts},
};

#[derive(Debug, PartialEq, Eq)]
pub enum ProblemKind {
    /// A type variable survived monomorphization.
    NotInstantiated,
    /// A region does not have the size of its layout.
    SizeMismatch {
        layout: LayoutId,
        expected: usize,
        found: usize,
    },
    /// An operand is in none or several of the evaluation classes.
    OperandClass { index: usize, classes: usize },
    /// An argument is in none or several of `data` and `functions`, or in the wrong one.
    ArgumentClass { index: usize },
    /// A trainable whose output is not a cell region.
    TrainableArity,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Problem {
    pub spec: SpecId,
    pub kind: ProblemKind,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.spec.index();

        match &self.kind {
            ProblemKind::NotInstantiated => write!(f, "spec {id} still has a type variable"),
            ProblemKind::SizeMismatch {
                layout,
                expected,
                found,
            } => write!(
                f,
                "spec {id} covers {found} cells but layout {} has {expected}",
                layout.index()
            ),
            ProblemKind::OperandClass { index, classes } => write!(
                f,
                "operand {index} of spec {id} is in {classes} evaluation classes"
            ),
            ProblemKind::ArgumentClass { index } => {
                write!(f, "argument {index} of spec {id} is misclassified")
            }
            ProblemKind::TrainableArity => {
                write!(f, "trainable spec {id} does not take all of its arguments")
            }
        }
    }
}

pub struct Problems<'a>(pub(crate) Vec<'a, Problem>);

impl<'a> Problems<'a> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.0.iter()
    }
}

impl fmt::Display for Problems<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for problem in self.0.iter() {
            writeln!(f, "{problem}")?;
        }

        Ok(())
    }
}

/// Walks every node reachable from `roots`.
pub fn check_specs<'a>(
    arena: &'a Bump,
    specs: &Specs,
    layouts: &Layouts,
    roots: impl IntoIterator<Item = SpecId>,
) -> Problems<'a> {
    let mut ctx = Ctx {
        specs,
        layouts,
        problems: Vec::new_in(arena),
        visited: MutSet::default(),
        stack: Vec::new_in(arena),
    };

    ctx.stack.extend(roots);
    while let Some(id) = ctx.stack.pop() {
        if ctx.visited.insert(id) {
            ctx.check_spec(id);
        }
    }

    Problems(ctx.problems)
}

struct Ctx<'a, 'r> {
    specs: &'r Specs,
    layouts: &'r Layouts,
    problems: Vec<'a, Problem>,
    visited: MutSet<SpecId>,
    stack: Vec<'a, SpecId>,
}

impl Ctx<'_, '_> {
    fn problem(&mut self, spec: SpecId, kind: ProblemKind) {
        self.problems.push(Problem { spec, kind })
    }

    fn check_region(&mut self, spec: SpecId, layout: LayoutId, found: usize) {
        let expected = self.layouts.size(layout);

        if expected != found {
            self.problem(
                spec,
                ProblemKind::SizeMismatch {
                    layout,
                    expected,
                    found,
                },
            );
        }
    }

    fn check_spec(&mut self, id: SpecId) {
        let specs = self.specs;

        if !specs.ty(id).is_instantiated() {
            self.problem(id, ProblemKind::NotInstantiated);
        }

        match specs.get(id) {
            Spec::Variable(VariableSpec::Object {
                layout, start, end, ..
            }) => self.check_region(id, *layout, end - start),
            Spec::Variable(VariableSpec::Function { .. }) => {}
            Spec::Variable(VariableSpec::Bound { id: bound, .. })
            | Spec::External { id: bound, .. } => self.stack.push(*bound),
            Spec::Object { layout, data } => self.check_region(id, *layout, data.len()),
            Spec::Function(function) => self.check_function(id, function),
            Spec::Application {
                operands,
                call,
                constants,
                closures,
                data,
                functions,
            } => {
                for (index, operand) in operands.iter().enumerate() {
                    let classes = [call, constants, closures]
                        .iter()
                        .filter(|class| class.contains(&index))
                        .count();
                    if classes != 1 {
                        self.problem(id, ProblemKind::OperandClass { index, classes });
                    }

                    if index > 0 {
                        let is_function = specs.ty(*operand).is_function();
                        let as_data = data.contains(&index);
                        let as_function = functions.contains(&index);

                        if as_data == as_function || as_function != is_function {
                            self.problem(id, ProblemKind::ArgumentClass { index });
                        }
                    }

                    self.stack.push(*operand);
                }
            }
        }
    }

    fn check_function(&mut self, id: SpecId, function: &FunctionSpec) {
        match function {
            FunctionSpec::Constructor { .. } => {}
            FunctionSpec::Trainable { arity, .. } => {
                if self.specs.ty(id).arguments().len() != *arity {
                    self.problem(id, ProblemKind::TrainableArity);
                }
            }
            FunctionSpec::Guarded { cases, .. } => {
                for case in cases {
                    for pattern in &case.patterns {
                        if let DataPattern::Variable {
                            layout, start, end, ..
                        } = pattern
                        {
                            self.check_region(id, *layout, end - start);
                        }
                    }
                    self.stack.push(case.body);
                }
            }
            FunctionSpec::Anonymous { body, .. } | FunctionSpec::Recursive { body, .. } => {
                self.stack.push(*body)
            }
        }
    }
}
