use lnn_ast::{Expression, LambdaDefinition, LambdaName, LambdaProgram};
use lnn_collections::{MutMap, VecMap};
use lnn_types::{AlgebraicTypes, Parametrised};

use crate::algebraic::{add_type_definition, raw_to_type, RawVariables};
use crate::infer::infer_definition;
use crate::problem::TypeProblem;
use crate::typed::TypedDefinition;

/// A program that passed inference.
#[derive(Debug)]
pub struct InferredProgram {
    pub types: AlgebraicTypes,
    /// Top-level definitions in source order.
    pub definitions: Vec<TypedDefinition>,
}

impl InferredProgram {
    pub fn definition(&self, name: &str) -> Option<&TypedDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.name == name)
    }

    /// `name :: type` for every definition, one per line.
    pub fn render_types(&self) -> String {
        self.definitions
            .iter()
            .map(|definition| {
                format!(
                    "{} :: {}",
                    definition.name,
                    self.types.display(&definition.scheme.ty)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn infer_program(program: &LambdaProgram) -> Result<InferredProgram, TypeProblem> {
    let mut types = AlgebraicTypes::new();

    for expression in &program.expressions {
        if let Expression::Type(definition) = expression {
            add_type_definition(&mut types, definition)?;
        }
    }

    let mut declarations: VecMap<LambdaName, Parametrised> = VecMap::default();
    for expression in &program.expressions {
        if let Expression::Declaration(declaration) = expression {
            let ty = raw_to_type(&declaration.ty, &types, RawVariables::Any)?;

            if declarations
                .insert(declaration.name.clone(), Parametrised::generalize(ty))
                .is_some()
            {
                return Err(TypeProblem::DuplicateDeclaration(declaration.name.clone()));
            }
        }
    }

    let groups = group_cases(program, &types)?;

    for (name, _) in declarations.iter() {
        if !groups.iter().any(|cases| &cases[0].name == name) {
            return Err(TypeProblem::UnknownExpression(name.clone()));
        }
    }

    let mut schemes: MutMap<LambdaName, Parametrised> = MutMap::default();
    let mut definitions = Vec::with_capacity(groups.len());

    for cases in groups {
        let name = &cases[0].name;
        let definition = infer_definition(&types, &schemes, declarations.get(name), &cases)?;

        lnn_tracing::debug!(
            definition = name.as_str(),
            ty = %types.display(&definition.scheme.ty),
            "inferred"
        );

        schemes.insert(name.clone(), definition.scheme.clone());
        definitions.push(definition);
    }

    Ok(InferredProgram { types, definitions })
}

/// Definitions with one name are the cases of a single function, in the order they are written,
/// wherever they appear. Functions keep the position of their first case. A function may not
/// reuse a constructor's name.
fn group_cases<'a>(
    program: &'a LambdaProgram,
    types: &AlgebraicTypes,
) -> Result<Vec<Vec<&'a LambdaDefinition>>, TypeProblem> {
    let mut groups: Vec<Vec<&LambdaDefinition>> = Vec::new();
    let mut positions: VecMap<&str, usize> = VecMap::default();

    for expression in &program.expressions {
        let Expression::Lambda(definition) = expression else {
            continue;
        };

        match positions.get(&definition.name.as_str()) {
            Some(position) => groups[*position].push(definition),
            None => {
                if types.lookup_constructor(&definition.name).is_some() {
                    return Err(TypeProblem::DuplicateName(definition.name.clone()));
                }

                positions.insert(definition.name.as_str(), groups.len());
                groups.push(vec![definition]);
            }
        }
    }

    Ok(groups)
}
