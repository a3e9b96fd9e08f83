//! Type inference for a single top-level definition.
//!
//! Every definition gets its own name generator and unifier. The definition's type is a fresh
//! variable, equated first with the declaration (if any) and then with the arrow built from each
//! case's patterns and body. Constraints are solved as they are produced, so that let bindings
//! can be generalized over whatever their solved type does not share with the environment.
use lnn_ast::{Binding, Lambda, LambdaDefinition, LambdaName, Pattern, TypeVariableName};
use lnn_collections::{ImMap, MutMap, VecSet};
use lnn_debug_flags::dbg_do;
#[cfg(debug_assertions)]
use lnn_debug_flags::LNN_PRINT_INFERRED_TYPES;
use lnn_error_macros::internal_error;
use lnn_types::{AlgebraicTypes, InstanceSignature, NameGenerator, Parametrised, Type};
use lnn_unify::{AlgebraicTerm, Unifier};

use crate::algebraic::{raw_to_type, RawVariables};
use crate::problem::TypeProblem;
use crate::rename::Renamer;
use crate::term::{term_to_type, type_to_term};
use crate::typed::{
    Reference, TypeVisitor, TypedBinding, TypedCase, TypedDefinition, TypedLambda, TypedPattern,
};

#[derive(Clone, Debug)]
enum Local {
    Monomorphic(Type),
    Let {
        signature: InstanceSignature,
        scheme: Parametrised,
    },
    /// The definition itself.
    Recursive(Type),
}

type Scope = ImMap<LambdaName, Local>;

struct Inference<'a> {
    types: &'a AlgebraicTypes,
    /// Generalized types of the definitions inferred so far.
    definitions: &'a MutMap<LambdaName, Parametrised>,
    definition: LambdaName,
    names: NameGenerator,
    unifier: Unifier,
    /// Declared and annotated variable names. They are never generalized away by renaming.
    known: VecSet<TypeVariableName>,
    let_signatures: VecSet<InstanceSignature>,
    is_recursive: bool,
}

pub(crate) fn infer_definition(
    types: &AlgebraicTypes,
    definitions: &MutMap<LambdaName, Parametrised>,
    declaration: Option<&Parametrised>,
    cases: &[&LambdaDefinition],
) -> Result<TypedDefinition, TypeProblem> {
    let name = match cases.first() {
        Some(case) => case.name.clone(),
        None => internal_error!("definition without cases"),
    };

    let mut inference = Inference {
        types,
        definitions,
        definition: name.clone(),
        names: NameGenerator::new(),
        unifier: Unifier::new(),
        known: VecSet::default(),
        let_signatures: VecSet::default(),
        is_recursive: false,
    };

    let self_ty = Type::Variable(inference.names.fresh("t"));
    if let Some(declaration) = declaration {
        inference
            .known
            .extend(declaration.parameters.iter().cloned());
        inference.unify(&self_ty, &declaration.ty)?;
    }

    let mut scope = Scope::default();
    scope.insert(name.clone(), Local::Recursive(self_ty.clone()));

    let path = vec![name.clone()];
    let arity = cases[0].patterns.len();
    let mut typed_cases = Vec::with_capacity(cases.len());

    for case in cases {
        if case.patterns.len() != arity {
            return Err(TypeProblem::CaseArity {
                definition: name,
                expected: arity,
                found: case.patterns.len(),
            });
        }

        let mut case_scope = scope.clone();
        let mut bound = VecSet::default();
        let patterns = case
            .patterns
            .iter()
            .map(|pattern| inference.infer_pattern(pattern, &mut case_scope, &mut bound))
            .collect::<Result<Vec<_>, _>>()?;

        let body = inference.infer(&case.body, &case_scope, &path)?;

        let case_ty = Type::arrows(
            patterns.iter().map(|pattern| pattern.ty().clone()).collect::<Vec<_>>(),
            body.ty().clone(),
        );
        inference.unify(&self_ty, &case_ty)?;

        typed_cases.push(TypedCase { patterns, body });
    }

    inference.finish(self_ty, typed_cases)
}

impl Inference<'_> {
    fn unify(&mut self, left: &Type, right: &Type) -> Result<(), TypeProblem> {
        self.unifier
            .unify(
                &type_to_term(left, self.types),
                &type_to_term(right, self.types),
            )
            .map_err(|error| TypeProblem::Unification {
                definition: self.definition.clone(),
                error,
            })
    }

    fn resolve(&self, ty: &Type) -> Type {
        term_to_type(
            &self.unifier.resolve(&type_to_term(ty, self.types)),
            self.types,
        )
    }

    fn fresh(&mut self, hint: &str) -> Type {
        Type::Variable(self.names.fresh(hint))
    }

    /// Fresh variables for the parameters of a scheme.
    fn instantiate(&mut self, scheme: &Parametrised) -> (Type, Vec<Type>) {
        let arguments: Vec<Type> = scheme
            .parameters
            .iter()
            .map(|_| self.fresh("i"))
            .collect();

        (scheme.instantiate(&arguments), arguments)
    }

    fn check_not_constructor(&self, name: &str) -> Result<(), TypeProblem> {
        match self.types.lookup_constructor(name) {
            Some(_) => Err(TypeProblem::DuplicateName(name.to_string())),
            None => Ok(()),
        }
    }

    fn constructor_scheme(&self, name: &str) -> Option<Parametrised> {
        let id = self.types.lookup_constructor(name)?;

        self.types.get(id).constructor_scheme(name)
    }

    fn infer_pattern(
        &mut self,
        pattern: &Pattern,
        scope: &mut Scope,
        bound: &mut VecSet<LambdaName>,
    ) -> Result<TypedPattern, TypeProblem> {
        match pattern {
            Pattern::Variable(name) => {
                self.check_not_constructor(name)?;
                if bound.insert(name.clone()) {
                    return Err(TypeProblem::DuplicateName(name.clone()));
                }

                let ty = self.fresh("p");
                scope.insert(name.clone(), Local::Monomorphic(ty.clone()));

                Ok(TypedPattern::Variable {
                    name: name.clone(),
                    ty,
                })
            }
            Pattern::Object(name) => {
                let scheme = self
                    .constructor_scheme(name)
                    .ok_or_else(|| TypeProblem::UnknownExpression(name.clone()))?;
                let (ty, _) = self.instantiate(&scheme);

                if ty.is_function() {
                    return Err(TypeProblem::PatternArity {
                        constructor: name.clone(),
                        expected: ty.arguments().len(),
                        found: 0,
                    });
                }

                Ok(TypedPattern::Object {
                    name: name.clone(),
                    ty,
                })
            }
            Pattern::Constructor(name, arguments) => {
                let scheme = self
                    .constructor_scheme(name)
                    .ok_or_else(|| TypeProblem::UnknownExpression(name.clone()))?;
                let (ty, _) = self.instantiate(&scheme);

                let expected: Vec<Type> = ty.arguments().into_iter().cloned().collect();
                if expected.len() != arguments.len() {
                    return Err(TypeProblem::PatternArity {
                        constructor: name.clone(),
                        expected: expected.len(),
                        found: arguments.len(),
                    });
                }

                let mut typed_arguments = Vec::with_capacity(arguments.len());
                for (argument, expected) in arguments.iter().zip(expected.iter()) {
                    let typed = self.infer_pattern(argument, scope, bound)?;
                    self.unify(typed.ty(), expected)?;
                    typed_arguments.push(typed);
                }

                Ok(TypedPattern::Constructor {
                    name: name.clone(),
                    arguments: typed_arguments,
                    ty: ty.result().clone(),
                })
            }
        }
    }

    fn infer(
        &mut self,
        lambda: &Lambda,
        scope: &Scope,
        path: &InstanceSignature,
    ) -> Result<TypedLambda, TypeProblem> {
        match lambda {
            Lambda::Literal(name) => self.infer_literal(name, scope),
            Lambda::Trainable => {
                let from = self.fresh("t");
                let to = self.fresh("t");

                Ok(TypedLambda::Trainable {
                    ty: Type::function(from, to),
                })
            }
            Lambda::Abstraction { arguments, body } if arguments.is_empty() => {
                self.infer(body, scope, path)
            }
            Lambda::Abstraction { arguments, body } => {
                let mut inner = scope.clone();
                let mut bound = VecSet::with_capacity(arguments.len());
                let mut typed_arguments = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    self.check_not_constructor(argument)?;
                    if bound.insert(argument.clone()) {
                        return Err(TypeProblem::DuplicateName(argument.clone()));
                    }

                    let ty = self.fresh("p");
                    inner.insert(argument.clone(), Local::Monomorphic(ty.clone()));
                    typed_arguments.push((argument.clone(), ty));
                }

                let body = self.infer(body, &inner, path)?;
                let ty = Type::arrows(
                    typed_arguments
                        .iter()
                        .map(|(_, ty)| ty.clone())
                        .collect::<Vec<_>>(),
                    body.ty().clone(),
                );

                Ok(TypedLambda::Abstraction {
                    arguments: typed_arguments,
                    body: Box::new(body),
                    ty,
                })
            }
            Lambda::Application {
                function,
                arguments,
            } if arguments.is_empty() => self.infer(function, scope, path),
            Lambda::Application {
                function,
                arguments,
            } => {
                let function = self.infer(function, scope, path)?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.infer(argument, scope, path))
                    .collect::<Result<Vec<_>, _>>()?;

                let ty = self.fresh("t");
                let expected = Type::arrows(
                    arguments
                        .iter()
                        .map(|argument| argument.ty().clone())
                        .collect::<Vec<_>>(),
                    ty.clone(),
                );
                self.unify(function.ty(), &expected)?;

                Ok(TypedLambda::Application {
                    function: Box::new(function),
                    arguments,
                    ty,
                })
            }
            Lambda::Let { bindings, body } => {
                let mut inner = scope.clone();
                let mut typed_bindings = Vec::with_capacity(bindings.len());

                for binding in bindings {
                    let typed = self.infer_binding(binding, &inner, path)?;

                    inner.insert(
                        binding.name.clone(),
                        Local::Let {
                            signature: typed.signature.clone(),
                            scheme: typed.scheme.clone(),
                        },
                    );
                    typed_bindings.push(typed);
                }

                let body = self.infer(body, &inner, path)?;
                let ty = body.ty().clone();

                Ok(TypedLambda::Let {
                    bindings: typed_bindings,
                    body: Box::new(body),
                    ty,
                })
            }
            Lambda::Typed { expression, ty } => {
                let typed = self.infer(expression, scope, path)?;
                let annotation = raw_to_type(ty, self.types, RawVariables::Any)?;

                self.known.extend(
                    annotation
                        .free_variables()
                        .into_iter()
                        .map(str::to_string),
                );
                self.unify(typed.ty(), &annotation)?;

                Ok(typed)
            }
            Lambda::Case {
                scrutinee,
                branches,
            } => {
                let scrutinee = self.infer(scrutinee, scope, path)?;
                let ty = self.fresh("t");
                let mut typed_branches = Vec::with_capacity(branches.len());

                for branch in branches {
                    let mut inner = scope.clone();
                    let mut bound = VecSet::default();
                    let pattern = self.infer_pattern(&branch.pattern, &mut inner, &mut bound)?;
                    self.unify(pattern.ty(), scrutinee.ty())?;

                    let body = self.infer(&branch.body, &inner, path)?;
                    self.unify(&ty, body.ty())?;

                    typed_branches.push(TypedCase {
                        patterns: vec![pattern],
                        body,
                    });
                }

                Ok(TypedLambda::Case {
                    scrutinee: Box::new(scrutinee),
                    branches: typed_branches,
                    ty,
                })
            }
        }
    }

    fn infer_literal(&mut self, name: &str, scope: &Scope) -> Result<TypedLambda, TypeProblem> {
        let (reference, ty) = match scope.get(name) {
            Some(Local::Monomorphic(ty)) => (Reference::Local, ty.clone()),
            Some(Local::Recursive(ty)) => {
                self.is_recursive = true;
                (Reference::Recursive, ty.clone())
            }
            Some(Local::Let { signature, scheme }) => {
                let signature = signature.clone();
                let (ty, type_arguments) = self.instantiate(scheme);

                (
                    Reference::LetBinding {
                        signature,
                        type_arguments,
                    },
                    ty,
                )
            }
            None => {
                let definitions = self.definitions;
                if let Some(scheme) = definitions.get(name) {
                    let (ty, type_arguments) = self.instantiate(scheme);

                    (
                        Reference::Definition {
                            signature: vec![name.to_string()],
                            type_arguments,
                        },
                        ty,
                    )
                } else if let Some(scheme) = self.constructor_scheme(name) {
                    let (ty, type_arguments) = self.instantiate(&scheme);

                    (Reference::Constructor { type_arguments }, ty)
                } else {
                    return Err(TypeProblem::UnknownExpression(name.to_string()));
                }
            }
        };

        Ok(TypedLambda::Literal {
            name: name.to_string(),
            reference,
            ty,
        })
    }

    fn infer_binding(
        &mut self,
        binding: &Binding,
        scope: &Scope,
        path: &InstanceSignature,
    ) -> Result<TypedBinding, TypeProblem> {
        self.check_not_constructor(&binding.name)?;

        let mut signature = path.clone();
        signature.push(binding.name.clone());
        let mut copy = 1;
        while self.let_signatures.contains(&signature) {
            if let Some(last) = signature.last_mut() {
                *last = format!("{}#{copy}", binding.name);
            }
            copy += 1;
        }
        self.let_signatures.insert(signature.clone());

        let expression = self.infer(&binding.expression, scope, &signature)?;

        let ty = self.resolve(expression.ty());
        let environment = self.environment_variables(scope);
        let parameters = ty
            .free_variables()
            .into_iter()
            .filter(|variable| !environment.contains(&variable.to_string()))
            .map(str::to_string)
            .collect();

        Ok(TypedBinding {
            name: binding.name.clone(),
            signature,
            scheme: Parametrised { parameters, ty },
            expression,
        })
    }

    /// Variables of the solved types visible in `scope`. These cannot be generalized.
    fn environment_variables(&self, scope: &Scope) -> VecSet<TypeVariableName> {
        let mut variables = VecSet::default();

        for (_, local) in scope.iter() {
            match local {
                Local::Monomorphic(ty) | Local::Recursive(ty) => {
                    let resolved = self.resolve(ty);
                    variables.extend(resolved.free_variables().into_iter().map(str::to_string));
                }
                Local::Let { scheme, .. } => {
                    let resolved = self.resolve(&scheme.ty);
                    variables.extend(
                        resolved
                            .free_variables()
                            .into_iter()
                            .filter(|variable| !scheme.parameters.iter().any(|p| p == variable))
                            .map(str::to_string),
                    );
                }
            }
        }

        variables
    }

    fn finish(
        self,
        self_ty: Type,
        mut cases: Vec<TypedCase>,
    ) -> Result<TypedDefinition, TypeProblem> {
        let Inference {
            types,
            definition,
            unifier,
            known,
            is_recursive,
            ..
        } = self;

        let mut renamer = Renamer::new(&definition, unifier.substitution(), &known)?;
        let mut finisher = Finisher {
            types,
            unifier: &unifier,
            renamer: &mut renamer,
        };

        let mut ty = self_ty;
        finisher.visit_type(&mut ty);
        let scheme = Parametrised::generalize(ty);

        for case in cases.iter_mut() {
            case.visit_types(&mut finisher);
        }

        let declared = scheme
            .parameters
            .iter()
            .filter(|parameter| known.contains(parameter))
            .cloned()
            .collect();

        dbg_do!(LNN_PRINT_INFERRED_TYPES, {
            eprintln!("{definition} :: {}", types.display(&scheme.ty));
        });

        Ok(TypedDefinition {
            name: definition,
            scheme,
            declared,
            cases,
            is_recursive,
        })
    }
}

/// Applies the final substitution and renaming to every type of the tree.
struct Finisher<'a> {
    types: &'a AlgebraicTypes,
    unifier: &'a Unifier,
    renamer: &'a mut Renamer,
}

impl TypeVisitor for Finisher<'_> {
    fn visit_type(&mut self, ty: &mut Type) {
        let resolved = term_to_type(
            &self.unifier.resolve(&type_to_term(ty, self.types)),
            self.types,
        );

        *ty = self.renamer.rename(&resolved);
    }

    fn visit_parameter(&mut self, name: &mut TypeVariableName) {
        let resolved = self.unifier.resolve(&AlgebraicTerm::Variable(name.clone()));

        match resolved {
            AlgebraicTerm::Variable(root) => {
                *name = self.renamer.rename_variable(&root);
            }
            _ => internal_error!("generalized variable {name} was bound after generalization"),
        }
    }
}
