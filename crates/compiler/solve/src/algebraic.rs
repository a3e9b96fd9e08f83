//! Turns type definitions into [AlgebraicType]s.
use lnn_ast::{RawSumOperand, RawType, TypeDefinition, TypeVariableName};
use lnn_collections::{VecMap, VecSet};
use lnn_types::{AlgebraicTypeId, AlgebraicTypes, SumOperand, Type};

use crate::problem::TypeProblem;

/// What a type variable in raw syntax may refer to.
#[derive(Clone, Copy, Debug)]
pub enum RawVariables<'a> {
    /// Only the parameters of the type being defined.
    Parameters(&'a [TypeVariableName]),
    /// Any name; used by declarations and annotations.
    Any,
}

pub fn raw_to_type(
    raw: &RawType,
    types: &AlgebraicTypes,
    variables: RawVariables<'_>,
) -> Result<Type, TypeProblem> {
    match raw {
        RawType::Variable(name) => match variables {
            RawVariables::Parameters(parameters) if !parameters.contains(name) => {
                Err(TypeProblem::UnknownType(name.clone()))
            }
            _ => Ok(Type::Variable(name.clone())),
        },
        RawType::Application(name, arguments) => {
            let id = types
                .lookup(name)
                .ok_or_else(|| TypeProblem::UnknownType(name.clone()))?;

            let expected = types.get(id).parameters.len();
            if expected != arguments.len() {
                return Err(TypeProblem::TypeArity {
                    name: name.clone(),
                    expected,
                    found: arguments.len(),
                });
            }

            let arguments = arguments
                .iter()
                .map(|arg| raw_to_type(arg, types, variables))
                .collect::<Result<_, _>>()?;

            Ok(Type::Application(id, arguments))
        }
        RawType::Function(from, to) => Ok(Type::function(
            raw_to_type(from, types, variables)?,
            raw_to_type(to, types, variables)?,
        )),
    }
}

/// Adds one type definition to the arena. Its operands may mention the type itself and any type
/// added before it.
pub fn add_type_definition(
    types: &mut AlgebraicTypes,
    definition: &TypeDefinition,
) -> Result<AlgebraicTypeId, TypeProblem> {
    let TypeDefinition {
        name,
        parameters,
        operands,
    } = definition;

    if types.lookup(name).is_some() {
        return Err(TypeProblem::DuplicateName(name.clone()));
    }

    let mut seen = VecSet::with_capacity(parameters.len());
    for parameter in parameters {
        if seen.insert(parameter.as_str()) {
            return Err(TypeProblem::DuplicateName(parameter.clone()));
        }
    }

    let id = types.reserve(name.clone(), parameters.clone());
    let self_ty = Type::Application(
        id,
        parameters.iter().cloned().map(Type::Variable).collect(),
    );

    let mut structure = Vec::with_capacity(operands.len());
    let mut constructors = VecMap::with_capacity(operands.len());

    for operand in operands {
        let constructor = operand.name();
        if types.lookup_constructor(constructor).is_some()
            || constructors.keys().any(|known: &String| known == constructor)
        {
            return Err(TypeProblem::DuplicateName(constructor.to_string()));
        }

        match operand {
            RawSumOperand::Object(constructor) => {
                structure.push(SumOperand::Object(constructor.clone()));
                constructors.insert(constructor.clone(), self_ty.clone());
            }
            RawSumOperand::Product(constructor, raw_arguments) => {
                let mut arguments = Vec::with_capacity(raw_arguments.len());
                for raw in raw_arguments {
                    let ty = raw_to_type(raw, types, RawVariables::Parameters(parameters))?;
                    if ty.is_function() {
                        return Err(TypeProblem::FunctionInConstructor(constructor.clone()));
                    }
                    arguments.push(ty);
                }

                constructors.insert(
                    constructor.clone(),
                    Type::arrows(arguments.clone(), self_ty.clone()),
                );
                structure.push(SumOperand::Product(constructor.clone(), arguments));
            }
        }
    }

    types.define(id, structure, constructors);

    Ok(id)
}
