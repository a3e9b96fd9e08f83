//! Coordinates the compiler pipeline: infers the types of a [LambdaProgram], lowers every
//! definition into a parametrised spec, and instantiates the roots into monomorphic specs that
//! the evaluator can run.
#![warn(clippy::dbg_macro)]

use bumpalo::Bump;
use lnn_ast::{LambdaName, LambdaProgram};
use lnn_collections::VecMap;
use lnn_debug_flags::dbg_set;
#[cfg(debug_assertions)]
use lnn_debug_flags::LNN_CHECK_SPECS;
use lnn_eval::Evaluator;
use lnn_mono::debug::check_specs;
use lnn_mono::ir::{SpecId, Specs};
use lnn_mono::layout::{LayoutId, Layouts};
use lnn_mono::parametrised::{compile_definitions, ParametrisedDefinition};
use lnn_mono::{Instances, Monomorphizer};
use lnn_solve::{infer_program, InferredProgram};
use lnn_types::{signature::type_signature, AlgebraicTypes, InstanceName, Type};

mod config;
mod problem;

pub use config::{LoadConfig, Roots};
pub use problem::Problem;

/// A program after the whole pipeline. More instances can be added later through
/// [Compiled::instantiate].
#[derive(Debug)]
pub struct Compiled {
    pub program: InferredProgram,
    pub definitions: Instances<ParametrisedDefinition>,
    pub mono: Monomorphizer,
    pub roots: VecMap<LambdaName, SpecId>,
    check_specs: bool,
}

pub fn compile(program: &LambdaProgram, config: LoadConfig) -> Result<Compiled, Problem> {
    let inferred = infer_program(program)?;

    let mut layouts = Layouts::new();
    let definitions = compile_definitions(&inferred, &mut layouts)?;

    let root_names: Vec<LambdaName> = match config.roots {
        Roots::Monomorphic => inferred
            .definitions
            .iter()
            .filter(|definition| !definition.scheme.is_polymorphic())
            .map(|definition| definition.name.clone())
            .collect(),
        Roots::Named(names) => {
            for name in &names {
                let definition = inferred
                    .definition(name)
                    .ok_or_else(|| lnn_mono::MonoProblem::UnknownExpression(vec![name.clone()]))?;

                if definition.scheme.is_polymorphic() {
                    return Err(Problem::PolymorphicRoot {
                        name: name.clone(),
                        parameters: definition.scheme.parameters.clone(),
                    });
                }
            }

            names
        }
    };

    let mut compiled = Compiled {
        program: inferred,
        definitions,
        mono: Monomorphizer::new(layouts),
        roots: VecMap::with_capacity(root_names.len()),
        check_specs: config.check_specs || dbg_set!(LNN_CHECK_SPECS),
    };

    for name in root_names {
        let id = compiled.mono.instantiate_definition(
            &compiled.program.types,
            &compiled.definitions,
            &name,
            &[],
        )?;
        compiled.roots.insert(name, id);
    }

    compiled.check()?;

    lnn_tracing::info!(
        roots = compiled.roots.len(),
        instances = compiled.mono.instances.len(),
        layouts = compiled.mono.layouts.len(),
        "loaded"
    );

    Ok(compiled)
}

impl Compiled {
    pub fn types(&self) -> &AlgebraicTypes {
        &self.program.types
    }

    pub fn layouts(&self) -> &Layouts {
        &self.mono.layouts
    }

    pub fn specs(&self) -> &Specs {
        &self.mono.specs
    }

    pub fn root(&self, name: &str) -> Option<SpecId> {
        self.roots
            .iter()
            .find(|(root, _)| root.as_str() == name)
            .map(|(_, id)| *id)
    }

    /// The instance of `name` at `type_arguments`, lowering it first if this is its first use.
    pub fn instantiate(&mut self, name: &str, type_arguments: &[Type]) -> Result<SpecId, Problem> {
        let definition = self
            .program
            .definition(name)
            .ok_or_else(|| lnn_mono::MonoProblem::UnknownExpression(vec![name.to_string()]))?;

        let expected = definition.scheme.parameters.len();
        if expected != type_arguments.len() {
            return Err(Problem::TypeArguments {
                name: name.to_string(),
                expected,
                found: type_arguments.len(),
            });
        }

        let id = self.mono.instantiate_definition(
            &self.program.types,
            &self.definitions,
            name,
            type_arguments,
        )?;
        self.check()?;

        Ok(id)
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.mono.specs, &self.mono.layouts)
    }

    /// The layout of what `id` produces once all of its arguments are supplied.
    pub fn result_layout(&self, id: SpecId) -> Option<LayoutId> {
        match self.mono.specs.ty(id).result() {
            Type::Application(algebraic, arguments) => {
                let name = InstanceName::new(
                    vec![self.program.types.get(*algebraic).name.clone()],
                    type_signature(arguments, &self.program.types),
                );
                self.mono.layouts.lookup(&name)
            }
            _ => None,
        }
    }

    pub fn render(&self, id: SpecId) -> String {
        self.mono
            .specs
            .render(id, &self.program.types, &self.mono.layouts)
    }

    fn check(&self) -> Result<(), Problem> {
        if !self.check_specs {
            return Ok(());
        }

        let arena = Bump::new();
        let problems = check_specs(
            &arena,
            &self.mono.specs,
            &self.mono.layouts,
            self.mono
                .instances
                .iter()
                .map(|(_, id)| *id)
                .filter(|id| self.mono.specs.is_filled(*id)),
        );

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Problem::SpecCheck(problems.to_string()))
        }
    }
}
