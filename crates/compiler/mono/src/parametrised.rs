//! Typed definitions lowered into the shape of the final IR, still over type variables.
//!
//! Every definition is stored once, under its name and its own type parameters. The
//! monomorphizer substitutes concrete types into these trees, one instance per type signature.
use lnn_ast::{LambdaName, TypeName, TypeVariableName};
use lnn_collections::VecMap;
use lnn_solve::{InferredProgram, Reference, TypedCase, TypedDefinition, TypedLambda, TypedPattern};
use lnn_types::{
    signature::type_signature, AlgebraicTypeId, AlgebraicTypes, InstanceName, InstanceSignature,
    Parametrised, SumOperand, Type, TypeSig,
};

use crate::instances::Instances;
use crate::layout::{LayoutId, LayoutProblem, Layouts};
use crate::problem::MonoProblem;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParametrisedSpec {
    /// A lambda argument, a pattern variable or the recursive self reference.
    Variable { name: LambdaName, ty: Type },
    /// A nullary constructor.
    Object { name: TypeName, ty: Type },
    Function(ParametrisedFunction),
    Application {
        operands: Vec<ParametrisedSpec>,
        ty: Type,
    },
    LetAbstraction {
        bindings: Vec<ParametrisedBinding>,
        expression: Box<ParametrisedSpec>,
        ty: Type,
    },
}

impl ParametrisedSpec {
    pub fn ty(&self) -> &Type {
        match self {
            ParametrisedSpec::Variable { ty, .. }
            | ParametrisedSpec::Object { ty, .. }
            | ParametrisedSpec::Application { ty, .. }
            | ParametrisedSpec::LetAbstraction { ty, .. } => ty,
            ParametrisedSpec::Function(function) => function.ty(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParametrisedFunction {
    Constructor {
        name: TypeName,
        ty: Type,
    },
    Trainable {
        /// Path of the definition or let binding the trainable is written in.
        signature: InstanceSignature,
        /// Position among the trainables of that definition.
        index: usize,
        spec: ParametrisedTrainableSpec,
        ty: Type,
    },
    Guarded {
        cases: Vec<ParametrisedCase>,
        ty: Type,
    },
    Anonymous {
        arguments: Vec<(LambdaName, Type)>,
        body: Box<ParametrisedSpec>,
        ty: Type,
    },
    /// Wraps the guarded body of a definition that calls itself.
    Recursive {
        name: LambdaName,
        body: Box<ParametrisedFunction>,
        ty: Type,
    },
    /// Use of a top-level definition (a one-element signature) or of a let binding, at the
    /// given type arguments.
    Polymorphic {
        signature: InstanceSignature,
        type_arguments: Vec<Type>,
        ty: Type,
    },
}

impl ParametrisedFunction {
    pub fn ty(&self) -> &Type {
        match self {
            ParametrisedFunction::Constructor { ty, .. }
            | ParametrisedFunction::Trainable { ty, .. }
            | ParametrisedFunction::Guarded { ty, .. }
            | ParametrisedFunction::Anonymous { ty, .. }
            | ParametrisedFunction::Recursive { ty, .. }
            | ParametrisedFunction::Polymorphic { ty, .. } => ty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParametrisedCase {
    pub patterns: Vec<TypedPattern>,
    pub body: ParametrisedSpec,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParametrisedBinding {
    pub signature: InstanceSignature,
    pub scheme: Parametrised,
    pub expression: ParametrisedSpec,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParametrisedDefinition {
    pub name: LambdaName,
    pub scheme: Parametrised,
    /// A guarded function, or a recursive wrapper around one.
    pub function: ParametrisedFunction,
    pub arity: usize,
}

impl ParametrisedDefinition {
    pub fn type_signature(&self) -> Vec<TypeSig> {
        self.scheme
            .parameters
            .iter()
            .map(|parameter| TypeSig::Variable(parameter.clone()))
            .collect()
    }
}

/// A run of cells: known up front, or the size of a type parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerSpec {
    Fixed(usize),
    Variable(TypeVariableName),
}

/// The shape of a trainable as far as it is known before instantiation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParametrisedTrainableSpec {
    pub arguments: Vec<LayerSpec>,
    pub result: Vec<LayerSpec>,
    pub result_type: Type,
    pub arity: usize,
}

/// Cell counts of one trainable instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainableShape {
    pub input_size: usize,
    pub output: LayoutId,
}

impl ParametrisedTrainableSpec {
    pub fn from_type(
        ty: &Type,
        definition: &InstanceSignature,
        types: &AlgebraicTypes,
        layouts: &mut Layouts,
    ) -> Result<Self, MonoProblem> {
        let mut builder = ShapeBuilder {
            types,
            layouts,
            definition,
            whole: ty,
            expanding: Vec::new(),
        };

        let argument_types = ty.arguments();
        let mut arguments = Vec::new();
        for argument in &argument_types {
            arguments.extend(builder.layers(argument)?);
        }

        let result_type = ty.result();
        let result = builder.layers(result_type)?;

        Ok(Self {
            arguments: merge_fixed(arguments),
            result: merge_fixed(result),
            result_type: result_type.clone(),
            arity: argument_types.len(),
        })
    }

    pub fn instantiate(
        &self,
        instance: &InstanceName,
        substitution: &VecMap<TypeVariableName, Type>,
        types: &AlgebraicTypes,
        layouts: &mut Layouts,
    ) -> Result<TrainableShape, MonoProblem> {
        let mut input_size = 0;

        for layer in &self.arguments {
            input_size += match layer {
                LayerSpec::Fixed(size) => *size,
                LayerSpec::Variable(name) => {
                    let ty = substitution.get(name).ok_or_else(|| MonoProblem::UnresolvedTypeVariable {
                            instance: instance.clone(),
                            variable: name.clone(),
                        })?;

                    if ty.is_function() {
                        return Err(MonoProblem::UnsupportedTrainableType {
                            definition: instance.signature.clone(),
                            ty: types.display(ty).to_string(),
                        });
                    }

                    let layout = layouts.layout(ty, types)?;
                    layouts.size(layout)
                }
            };
        }

        let result_type = self.result_type.substitute(substitution);
        if result_type.is_function() {
            return Err(MonoProblem::UnsupportedTrainableType {
                definition: instance.signature.clone(),
                ty: types.display(&result_type).to_string(),
            });
        }

        Ok(TrainableShape {
            input_size,
            output: layouts.layout(&result_type, types)?,
        })
    }

    /// Cells the output needs when every layer is already fixed.
    pub fn fixed_result_size(&self) -> Option<usize> {
        self.result.iter().try_fold(0, |size, layer| match layer {
            LayerSpec::Fixed(cells) => Some(size + cells),
            LayerSpec::Variable(_) => None,
        })
    }
}

struct ShapeBuilder<'a> {
    types: &'a AlgebraicTypes,
    layouts: &'a mut Layouts,
    definition: &'a InstanceSignature,
    whole: &'a Type,
    expanding: Vec<AlgebraicTypeId>,
}

impl ShapeBuilder<'_> {
    fn layers(&mut self, ty: &Type) -> Result<Vec<LayerSpec>, MonoProblem> {
        match ty {
            Type::Variable(name) => Ok(vec![LayerSpec::Variable(name.clone())]),
            Type::Function(..) => Err(MonoProblem::UnsupportedTrainableType {
                definition: self.definition.clone(),
                ty: self.types.display(self.whole).to_string(),
            }),
            Type::Application(..) if ty.is_instantiated() => {
                let layout = self.layouts.layout(ty, self.types)?;
                Ok(vec![LayerSpec::Fixed(self.layouts.size(layout))])
            }
            Type::Application(id, arguments) => {
                if self.expanding.contains(id) {
                    let name = InstanceName::new(
                        vec![self.types.get(*id).name.clone()],
                        type_signature(arguments, self.types),
                    );
                    return Err(LayoutProblem::RecursiveType(name).into());
                }

                self.expanding.push(*id);

                let mut layers = Vec::new();
                for operand in self.types.get(*id).instantiate_structure(arguments) {
                    match operand {
                        SumOperand::Object(_) => layers.push(LayerSpec::Fixed(1)),
                        SumOperand::Product(_, arguments) => {
                            for argument in &arguments {
                                layers.extend(self.layers(argument)?);
                            }
                        }
                    }
                }

                self.expanding.pop();
                Ok(layers)
            }
        }
    }
}

fn merge_fixed(layers: Vec<LayerSpec>) -> Vec<LayerSpec> {
    let mut merged: Vec<LayerSpec> = Vec::with_capacity(layers.len());

    for layer in layers {
        match (merged.last_mut(), layer) {
            (Some(LayerSpec::Fixed(size)), LayerSpec::Fixed(more)) => *size += more,
            (_, layer) => merged.push(layer),
        }
    }

    merged
}

/// Lowers every inferred definition, keyed by its name and its own type parameters.
pub fn compile_definitions(
    program: &InferredProgram,
    layouts: &mut Layouts,
) -> Result<Instances<ParametrisedDefinition>, MonoProblem> {
    let mut definitions = Instances::new();

    for definition in &program.definitions {
        let lowered = lower_definition(definition, &program.types, layouts)?;

        definitions.put_if_absent(
            vec![lowered.name.clone()],
            lowered.type_signature(),
            lowered,
        );
    }

    Ok(definitions)
}

pub fn lower_definition(
    definition: &TypedDefinition,
    types: &AlgebraicTypes,
    layouts: &mut Layouts,
) -> Result<ParametrisedDefinition, MonoProblem> {
    let mut lowering = Lowering {
        types,
        layouts,
        trainables: 0,
    };
    let path = vec![definition.name.clone()];

    let guarded = ParametrisedFunction::Guarded {
        cases: lowering.lower_cases(&definition.cases, &path)?,
        ty: definition.scheme.ty.clone(),
    };

    let function = if definition.is_recursive {
        ParametrisedFunction::Recursive {
            name: definition.name.clone(),
            body: Box::new(guarded),
            ty: definition.scheme.ty.clone(),
        }
    } else {
        guarded
    };

    Ok(ParametrisedDefinition {
        name: definition.name.clone(),
        scheme: definition.scheme.clone(),
        function,
        arity: definition.arity(),
    })
}

struct Lowering<'a> {
    types: &'a AlgebraicTypes,
    layouts: &'a mut Layouts,
    trainables: usize,
}

impl Lowering<'_> {
    fn lower_cases(
        &mut self,
        cases: &[TypedCase],
        path: &InstanceSignature,
    ) -> Result<Vec<ParametrisedCase>, MonoProblem> {
        cases
            .iter()
            .map(|case| {
                Ok(ParametrisedCase {
                    patterns: case.patterns.clone(),
                    body: self.lower(&case.body, path)?,
                })
            })
            .collect()
    }

    fn lower(
        &mut self,
        lambda: &TypedLambda,
        path: &InstanceSignature,
    ) -> Result<ParametrisedSpec, MonoProblem> {
        let spec = match lambda {
            TypedLambda::Literal {
                name,
                reference,
                ty,
            } => match reference {
                Reference::Local | Reference::Recursive => ParametrisedSpec::Variable {
                    name: name.clone(),
                    ty: ty.clone(),
                },
                Reference::Definition {
                    signature,
                    type_arguments,
                }
                | Reference::LetBinding {
                    signature,
                    type_arguments,
                } => ParametrisedSpec::Function(ParametrisedFunction::Polymorphic {
                    signature: signature.clone(),
                    type_arguments: type_arguments.clone(),
                    ty: ty.clone(),
                }),
                Reference::Constructor { .. } if ty.is_function() => {
                    ParametrisedSpec::Function(ParametrisedFunction::Constructor {
                        name: name.clone(),
                        ty: ty.clone(),
                    })
                }
                Reference::Constructor { .. } => ParametrisedSpec::Object {
                    name: name.clone(),
                    ty: ty.clone(),
                },
            },
            TypedLambda::Trainable { ty } => {
                let index = self.trainables;
                self.trainables += 1;

                ParametrisedSpec::Function(ParametrisedFunction::Trainable {
                    signature: path.clone(),
                    index,
                    spec: ParametrisedTrainableSpec::from_type(
                        ty,
                        path,
                        self.types,
                        self.layouts,
                    )?,
                    ty: ty.clone(),
                })
            }
            TypedLambda::Abstraction {
                arguments,
                body,
                ty,
            } => ParametrisedSpec::Function(ParametrisedFunction::Anonymous {
                arguments: arguments.clone(),
                body: Box::new(self.lower(body, path)?),
                ty: ty.clone(),
            }),
            TypedLambda::Application {
                function,
                arguments,
                ty,
            } => {
                let mut operands = Vec::with_capacity(arguments.len() + 1);
                operands.push(self.lower(function, path)?);
                for argument in arguments {
                    operands.push(self.lower(argument, path)?);
                }

                ParametrisedSpec::Application {
                    operands,
                    ty: ty.clone(),
                }
            }
            TypedLambda::Let { bindings, body, ty } => {
                let mut lowered = Vec::with_capacity(bindings.len());
                for binding in bindings {
                    lowered.push(ParametrisedBinding {
                        signature: binding.signature.clone(),
                        scheme: binding.scheme.clone(),
                        expression: self.lower(&binding.expression, &binding.signature)?,
                    });
                }

                ParametrisedSpec::LetAbstraction {
                    bindings: lowered,
                    expression: Box::new(self.lower(body, path)?),
                    ty: ty.clone(),
                }
            }
            TypedLambda::Case {
                scrutinee,
                branches,
                ty,
            } => {
                let guarded = ParametrisedFunction::Guarded {
                    cases: self.lower_cases(branches, path)?,
                    ty: Type::function(scrutinee.ty().clone(), ty.clone()),
                };

                ParametrisedSpec::Application {
                    operands: vec![
                        ParametrisedSpec::Function(guarded),
                        self.lower(scrutinee, path)?,
                    ],
                    ty: ty.clone(),
                }
            }
        };

        Ok(spec)
    }
}
