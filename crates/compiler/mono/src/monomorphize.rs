//! Instantiation of parametrised definitions at concrete type arguments.
//!
//! Every (signature, type signature) pair is lowered at most once; later uses get the cached
//! [SpecId]. Let bindings are instantiated lazily from their use sites, under a key made of their
//! own type arguments followed by the type signature of the instance that encloses them.
use std::rc::Rc;

use lnn_ast::{LambdaName, TypeVariableName};
use lnn_collections::{ImMap, VecMap};
use lnn_debug_flags::dbg_do;
#[cfg(debug_assertions)]
use lnn_debug_flags::LNN_PRINT_SPECS_AFTER_MONOMORPHIZATION;
use lnn_error_macros::internal_error;
use lnn_types::{signature::type_signature, AlgebraicTypes, InstanceName, InstanceSignature, Type};

use crate::instances::Instances;
use crate::ir::pattern::{compile_patterns, Slot};
use crate::ir::{DataPointer, FunctionSpec, GuardedCase, Spec, SpecId, Specs, VariableSpec};
use crate::layout::Layouts;
use crate::parametrised::{
    ParametrisedBinding, ParametrisedDefinition, ParametrisedFunction, ParametrisedSpec,
};
use crate::problem::MonoProblem;

type Substitution = VecMap<TypeVariableName, Type>;

/// Everything lowered so far. Grows monotonically across instantiations.
#[derive(Debug, Default)]
pub struct Monomorphizer {
    pub layouts: Layouts,
    pub specs: Specs,
    /// Definitions, let bindings and constructors by instance name.
    pub instances: Instances<SpecId>,
}

impl Monomorphizer {
    pub fn new(layouts: Layouts) -> Self {
        Self {
            layouts,
            ..Default::default()
        }
    }

    /// The instance of the top-level definition `name` at `type_arguments`, one per scheme
    /// parameter.
    pub fn instantiate_definition(
        &mut self,
        types: &AlgebraicTypes,
        definitions: &Instances<ParametrisedDefinition>,
        name: &str,
        type_arguments: &[Type],
    ) -> Result<SpecId, MonoProblem> {
        let mut env = Env {
            types,
            definitions,
            state: self,
        };

        env.definition_instance(name, type_arguments)
            .map(|(_, id)| id)
    }

    pub fn instance(&self, name: &InstanceName) -> Option<SpecId> {
        self.instances
            .get_by_name(name)
            .copied()
            .filter(|id| self.specs.is_filled(*id))
    }
}

/// What a let binding closes over at the point it is written.
struct LetEntry<'a> {
    binding: &'a ParametrisedBinding,
    context: Context<'a>,
}

#[derive(Clone)]
struct Context<'a> {
    /// The definition or let binding instance being lowered.
    instance: InstanceName,
    substitution: Substitution,
    variables: ImMap<LambdaName, Slot>,
    pointer: DataPointer,
    lets: ImMap<InstanceSignature, Rc<LetEntry<'a>>>,
}

impl<'a> Context<'a> {
    fn top_level(instance: InstanceName, substitution: Substitution) -> Self {
        Self {
            instance,
            substitution,
            variables: ImMap::default(),
            pointer: DataPointer::START,
            lets: ImMap::default(),
        }
    }
}

struct Env<'a, 'r> {
    types: &'a AlgebraicTypes,
    definitions: &'a Instances<ParametrisedDefinition>,
    state: &'r mut Monomorphizer,
}

impl<'a> Env<'a, '_> {
    fn definition_instance(
        &mut self,
        name: &str,
        type_arguments: &[Type],
    ) -> Result<(InstanceName, SpecId), MonoProblem> {
        let signature = vec![name.to_string()];
        let definition = self
            .definitions
            .get_instances(&signature)
            .next()
            .map(|(_, definition)| definition)
            .ok_or_else(|| MonoProblem::UnknownExpression(signature.clone()))?;

        debug_assert_eq!(definition.scheme.parameters.len(), type_arguments.len());

        let instance = InstanceName::new(signature, type_signature(type_arguments, self.types));
        if let Some(id) = self.state.instance(&instance) {
            return Ok((instance, id));
        }

        let substitution = definition.scheme.bindings(type_arguments);
        let ty = concrete(&definition.scheme.ty, &substitution, &instance)?;
        let id = self.reserve(&instance);

        let context = Context::top_level(instance.clone(), substitution);
        let spec = self.compile_function(&definition.function, &ty, &context, Some(&instance))?;
        self.state.specs.insert(id, spec, ty);

        lnn_tracing::debug!(instance = %instance, "instantiated definition");
        dbg_do!(LNN_PRINT_SPECS_AFTER_MONOMORPHIZATION, {
            eprintln!(
                "{}",
                self.state
                    .specs
                    .render(id, self.types, &self.state.layouts)
            );
        });

        Ok((instance, id))
    }

    fn let_instance(
        &mut self,
        entry: &LetEntry<'a>,
        type_arguments: &[Type],
    ) -> Result<(InstanceName, SpecId), MonoProblem> {
        let binding = entry.binding;

        let mut key = type_signature(type_arguments, self.types);
        key.extend(entry.context.instance.type_signature.iter().cloned());
        let instance = InstanceName::new(binding.signature.clone(), key);

        if let Some(id) = self.state.instance(&instance) {
            return Ok((instance, id));
        }

        let mut context = entry.context.clone();
        context.instance = instance.clone();
        for (parameter, argument) in binding.scheme.parameters.iter().zip(type_arguments) {
            context
                .substitution
                .insert(parameter.clone(), argument.clone());
        }

        let id = self.compile(&binding.expression, &context)?;
        self.state.instances.put_if_absent(
            instance.signature.clone(),
            instance.type_signature.clone(),
            id,
        );

        lnn_tracing::debug!(instance = %instance, "instantiated let binding");

        Ok((instance, id))
    }

    fn constructor_instance(
        &mut self,
        name: &str,
        ty: &Type,
    ) -> Result<(InstanceName, SpecId), MonoProblem> {
        let result = ty.result();
        let arguments = match result {
            Type::Application(_, arguments) => arguments,
            _ => internal_error!("constructor {name} does not build an algebraic type"),
        };

        let instance = InstanceName::new(
            vec![name.to_string()],
            type_signature(arguments, self.types),
        );
        if let Some(id) = self.state.instance(&instance) {
            return Ok((instance, id));
        }

        let layouts = &mut self.state.layouts;
        let layout = layouts.layout(result, self.types)?;
        let info = layouts
            .get(layout)
            .constructor(name)
            .ok_or_else(|| MonoProblem::UnknownType(name.to_string()))?;

        let spec = if ty.is_function() {
            Spec::Function(FunctionSpec::Constructor {
                name: name.to_string(),
                layout,
                offset: info.start,
                arity: info.arguments.len(),
            })
        } else {
            let data = layouts
                .encode(layout, name, &[])
                .ok_or_else(|| MonoProblem::UnknownType(name.to_string()))?;
            Spec::Object { layout, data }
        };

        let id = self.reserve(&instance);
        self.state.specs.insert(id, spec, ty.clone());

        Ok((instance, id))
    }

    /// A fresh id for `instance`, or the one a failed earlier attempt left unfilled.
    fn reserve(&mut self, instance: &InstanceName) -> SpecId {
        if let Some(id) = self.state.instances.get_by_name(instance) {
            return *id;
        }

        let id = self.state.specs.reserve_id();
        *self.state.instances.put_if_absent(
            instance.signature.clone(),
            instance.type_signature.clone(),
            id,
        )
    }

    fn compile(
        &mut self,
        spec: &'a ParametrisedSpec,
        context: &Context<'a>,
    ) -> Result<SpecId, MonoProblem> {
        let ty = concrete(spec.ty(), &context.substitution, &context.instance)?;

        let lowered = match spec {
            ParametrisedSpec::Variable { name, .. } => {
                let variable = match context.variables.get(name) {
                    Some(Slot::Data { layout, start, end }) => VariableSpec::Object {
                        name: name.clone(),
                        layout: *layout,
                        start: *start,
                        end: *end,
                    },
                    Some(Slot::Function(position)) => VariableSpec::Function {
                        name: name.clone(),
                        position: *position,
                    },
                    None => internal_error!("variable {name} is not in scope"),
                };

                Spec::Variable(variable)
            }
            ParametrisedSpec::Object { name, .. } => {
                let (name, id) = self.constructor_instance(name, &ty)?;
                Spec::External { name, id }
            }
            ParametrisedSpec::Function(function) => {
                self.compile_function(function, &ty, context, None)?
            }
            ParametrisedSpec::Application { operands, .. } => {
                let ids = operands
                    .iter()
                    .map(|operand| self.compile(operand, context))
                    .collect::<Result<Vec<_>, _>>()?;

                self.classify_application(ids)
            }
            ParametrisedSpec::LetAbstraction {
                bindings,
                expression,
                ..
            } => {
                let mut inner = context.clone();
                for binding in bindings {
                    let entry = LetEntry {
                        binding,
                        context: inner.clone(),
                    };
                    inner.lets.insert(binding.signature.clone(), Rc::new(entry));
                }

                return self.compile(expression, &inner);
            }
        };

        Ok(self.state.specs.add(lowered, ty))
    }

    fn compile_function(
        &mut self,
        function: &'a ParametrisedFunction,
        ty: &Type,
        context: &Context<'a>,
        name: Option<&InstanceName>,
    ) -> Result<Spec, MonoProblem> {
        let spec = match function {
            ParametrisedFunction::Constructor { name, .. } => {
                let (name, id) = self.constructor_instance(name, ty)?;
                Spec::External { name, id }
            }
            ParametrisedFunction::Trainable { index, spec, .. } => {
                let shape = spec.instantiate(
                    &context.instance,
                    &context.substitution,
                    self.types,
                    &mut self.state.layouts,
                )?;

                Spec::Function(FunctionSpec::Trainable {
                    name: context.instance.clone(),
                    index: *index,
                    arity: spec.arity,
                    input_size: shape.input_size,
                    output: shape.output,
                })
            }
            ParametrisedFunction::Guarded { cases, .. } => {
                let arity = cases.first().map_or(0, |case| case.patterns.len());
                let argument_types: Vec<&Type> = ty.arguments().into_iter().take(arity).collect();
                let mut guarded = Vec::with_capacity(cases.len());

                for case in cases {
                    let compiled = compile_patterns(
                        &case.patterns,
                        &argument_types,
                        context.pointer,
                        self.types,
                        &mut self.state.layouts,
                    )?;

                    let mut inner = context.clone();
                    for (variable, slot) in compiled.bindings {
                        inner.variables.insert(variable, slot);
                    }
                    inner.pointer = compiled.pointer;

                    guarded.push(GuardedCase {
                        patterns: compiled.patterns,
                        body: self.compile(&case.body, &inner)?,
                    });
                }

                Spec::Function(FunctionSpec::Guarded {
                    name: name.cloned(),
                    cases: guarded,
                    closure_pointer: context.pointer,
                    arity,
                })
            }
            ParametrisedFunction::Anonymous {
                arguments, body, ..
            } => {
                let mut inner = context.clone();

                for (variable, argument) in arguments {
                    let argument = concrete(argument, &context.substitution, &context.instance)?;

                    let slot = if argument.is_function() {
                        let slot = Slot::Function(inner.pointer.functions_count);
                        inner.pointer = inner.pointer.with_function();
                        slot
                    } else {
                        let layouts = &mut self.state.layouts;
                        let layout = layouts.layout(&argument, self.types)?;
                        let start = inner.pointer.data_offset;
                        inner.pointer = inner.pointer.with_data(layouts.size(layout));

                        Slot::Data {
                            layout,
                            start,
                            end: inner.pointer.data_offset,
                        }
                    };

                    inner.variables.insert(variable.clone(), slot);
                }

                Spec::Function(FunctionSpec::Anonymous {
                    arity: arguments.len(),
                    body: self.compile(body, &inner)?,
                    closure_pointer: context.pointer,
                })
            }
            ParametrisedFunction::Recursive {
                name: variable,
                body,
                ..
            } => {
                let instance = match name {
                    Some(instance) => instance,
                    None => internal_error!("only top-level definitions can be recursive"),
                };

                let mut inner = context.clone();
                inner.variables.insert(
                    variable.clone(),
                    Slot::Function(context.pointer.functions_count),
                );
                inner.pointer = context.pointer.with_function();

                let guarded = self.compile_function(body, ty, &inner, Some(instance))?;
                let arity = match &guarded {
                    Spec::Function(function) => function.arity(),
                    _ => internal_error!("the body of {instance} is not a function"),
                };

                Spec::Function(FunctionSpec::Recursive {
                    name: instance.clone(),
                    arity,
                    body: self.state.specs.add(guarded, ty.clone()),
                    closure_pointer: context.pointer,
                })
            }
            ParametrisedFunction::Polymorphic {
                signature,
                type_arguments,
                ..
            } => {
                let type_arguments = type_arguments
                    .iter()
                    .map(|argument| concrete(argument, &context.substitution, &context.instance))
                    .collect::<Result<Vec<_>, _>>()?;

                match signature.as_slice() {
                    [definition] => {
                        let (name, id) = self.definition_instance(definition, &type_arguments)?;
                        Spec::External { name, id }
                    }
                    _ => {
                        let entry = match context.lets.get(signature) {
                            Some(entry) => Rc::clone(entry),
                            None => internal_error!(
                                "let binding {} is not in scope",
                                signature.join(".")
                            ),
                        };

                        let (name, id) = self.let_instance(&entry, &type_arguments)?;
                        Spec::Variable(VariableSpec::Bound { name, id })
                    }
                }
            }
        };

        Ok(spec)
    }

    /// Sorts operands by how the evaluator must produce them, and arguments by whether they
    /// supply cells or function slots.
    fn classify_application(&self, operands: Vec<SpecId>) -> Spec {
        let specs = &self.state.specs;

        let mut call = Vec::new();
        let mut constants = Vec::new();
        let mut closures = Vec::new();
        let mut data = Vec::new();
        let mut functions = Vec::new();

        for (index, id) in operands.iter().enumerate() {
            match specs.get(*id) {
                Spec::Variable(_) | Spec::Application { .. } => call.push(index),
                Spec::External { .. } | Spec::Object { .. } => constants.push(index),
                Spec::Function(_) => closures.push(index),
            }

            if index > 0 {
                if specs.ty(*id).is_function() {
                    functions.push(index);
                } else {
                    data.push(index);
                }
            }
        }

        Spec::Application {
            operands,
            call,
            constants,
            closures,
            data,
            functions,
        }
    }
}

fn concrete(
    ty: &Type,
    substitution: &Substitution,
    instance: &InstanceName,
) -> Result<Type, MonoProblem> {
    let ty = ty.substitute(substitution);

    if let Some(variable) = ty.free_variables().first() {
        return Err(MonoProblem::UnresolvedTypeVariable {
            instance: instance.clone(),
            variable: variable.to_string(),
        });
    }

    Ok(ty)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parametrised::compile_definitions;
    use indoc::indoc;
    use lnn_ast::build::*;
    use lnn_ast::LambdaProgram;
    use lnn_solve::{infer_program, InferredProgram};
    use pretty_assertions::assert_eq;

    struct Fixture {
        inferred: InferredProgram,
        definitions: Instances<ParametrisedDefinition>,
        mono: Monomorphizer,
    }

    impl Fixture {
        fn new(program: LambdaProgram) -> Self {
            let inferred = infer_program(&program).unwrap();
            let mut layouts = Layouts::new();
            let definitions = compile_definitions(&inferred, &mut layouts).unwrap();

            Fixture {
                inferred,
                definitions,
                mono: Monomorphizer::new(layouts),
            }
        }

        fn instantiate(&mut self, name: &str, arguments: &[Type]) -> Result<SpecId, MonoProblem> {
            self.mono.instantiate_definition(
                &self.inferred.types,
                &self.definitions,
                name,
                arguments,
            )
        }

        fn named(&self, name: &str) -> Type {
            self.inferred.types.named(name).unwrap()
        }
    }

    fn bool_and_pair() -> Vec<lnn_ast::Expression> {
        vec![
            data("Bool", &[], vec![object("True"), object("False")]),
            data("Pair", &[], vec![product("MkPair", vec![ty("Bool"), ty("Bool")])]),
        ]
    }

    #[test]
    fn instances_are_cached_per_type_signature() {
        let mut expressions = bool_and_pair();
        expressions.push(def("id", vec![p_var("x")], lit("x")));
        let mut fixture = Fixture::new(program(expressions));

        let boolean = fixture.named("Bool");
        let pair = fixture.named("Pair");

        let first = fixture.instantiate("id", &[boolean.clone()]).unwrap();
        let again = fixture.instantiate("id", &[boolean]).unwrap();
        let other = fixture.instantiate("id", &[pair]).unwrap();

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(
            fixture
                .mono
                .instances
                .get_instances(&["id".to_string()])
                .count(),
            2
        );

        let closure_size = |id: SpecId| match fixture.mono.specs.get(id) {
            Spec::Function(FunctionSpec::Guarded { cases, .. }) => {
                match fixture.mono.specs.get(cases[0].body) {
                    Spec::Variable(VariableSpec::Object { start, end, .. }) => end - start,
                    other => panic!("unexpected {other:?}"),
                }
            }
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(closure_size(first), 2);
        assert_eq!(closure_size(other), 4);
    }

    #[test]
    fn renders_an_instance() {
        let mut expressions = bool_and_pair();
        expressions.push(def("id", vec![p_var("x")], lit("x")));
        let mut fixture = Fixture::new(program(expressions));

        let boolean = fixture.named("Bool");
        let id = fixture.instantiate("id", &[boolean]).unwrap();

        assert_eq!(
            fixture
                .mono
                .specs
                .render(id, &fixture.inferred.types, &fixture.mono.layouts),
            indoc!(
                "
                (id Bool) <0, 0> : Bool -> Bool
                  | x[0..2] ->
                    x[0..2] : Bool
                "
            )
        );
    }

    #[test]
    fn unused_type_variables_are_rejected() {
        let mut expressions = bool_and_pair();
        expressions.push(def("id", vec![p_var("x")], lit("x")));
        let mut fixture = Fixture::new(program(expressions));

        let problem = fixture
            .instantiate("id", &[Type::variable("a")])
            .unwrap_err();

        assert_eq!(
            problem.to_string(),
            "in `(id a)`: type variable a is never made concrete"
        );
    }

    #[test]
    fn failed_instances_leave_their_id_unfilled() {
        let mut expressions = bool_and_pair();
        expressions.push(def(
            "g",
            vec![],
            apply(lambda(&["f"], lit("True")), vec![lambda(&["y"], lit("y"))]),
        ));
        let mut fixture = Fixture::new(program(expressions));

        let ids = |fixture: &Fixture| -> Vec<SpecId> {
            fixture
                .mono
                .instances
                .get_instances(&["g".to_string()])
                .map(|(_, id)| *id)
                .collect()
        };

        assert!(fixture.instantiate("g", &[]).is_err());
        let first = ids(&fixture);
        assert_eq!(first.len(), 1);
        assert!(!fixture.mono.specs.is_filled(first[0]));

        // a second attempt reuses the id instead of reserving another one
        assert!(fixture.instantiate("g", &[]).is_err());
        assert_eq!(ids(&fixture), first);
    }

    #[test]
    fn recursive_definitions_take_the_first_function_slot() {
        let mut expressions = bool_and_pair();
        expressions.push(def(
            "loop",
            vec![p_obj("True")],
            apply(lit("loop"), vec![lit("False")]),
        ));
        expressions.push(def("loop", vec![p_obj("False")], lit("True")));
        let mut fixture = Fixture::new(program(expressions));

        let id = fixture.instantiate("loop", &[]).unwrap();
        let specs = &fixture.mono.specs;

        let Spec::Function(FunctionSpec::Recursive {
            body,
            closure_pointer,
            arity,
            ..
        }) = specs.get(id)
        else {
            panic!("not recursive");
        };
        assert_eq!(*closure_pointer, DataPointer::START);
        assert_eq!(*arity, 1);

        let Spec::Function(FunctionSpec::Guarded {
            cases,
            closure_pointer,
            ..
        }) = specs.get(*body)
        else {
            panic!("not guarded");
        };
        assert_eq!(*closure_pointer, DataPointer::START.with_function());

        let Spec::Application { operands, call, .. } = specs.get(cases[0].body) else {
            panic!("not an application");
        };
        assert_eq!(call, &vec![0]);
        assert_eq!(
            specs.get(operands[0]),
            &Spec::Variable(VariableSpec::Function {
                name: "loop".into(),
                position: 0
            })
        );
    }

    #[test]
    fn let_instances_include_the_enclosing_signature() {
        let mut expressions = bool_and_pair();
        expressions.push(def(
            "twice",
            vec![p_var("x")],
            let_in(
                vec![("same", lambda(&["y"], lit("y")))],
                apply(
                    lit("MkPair"),
                    vec![
                        apply(lit("same"), vec![lit("True")]),
                        apply(lit("same"), vec![lit("False")]),
                    ],
                ),
            ),
        ));
        let mut fixture = Fixture::new(program(expressions));

        let boolean = fixture.named("Bool");
        fixture.instantiate("twice", &[boolean]).unwrap();

        let names: Vec<_> = fixture
            .mono
            .instances
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        assert!(names.contains(&"(twice.same Bool Bool)".to_string()), "{names:?}");
        assert_eq!(
            fixture
                .mono
                .instances
                .get_instances(&["twice".to_string(), "same".to_string()])
                .count(),
            1
        );
    }
}
