//! The program after inference: every node carries its type.
//!
//! Annotations are gone (their types are folded into the annotated node), and every reference
//! records how it was resolved and at which type arguments a polymorphic target was used.
use lnn_ast::{LambdaName, TypeName, TypeVariableName};
use lnn_types::{InstanceSignature, Parametrised, Type};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// A lambda argument or a pattern variable.
    Local,
    /// The definition being inferred, from inside its own body. Always monomorphic.
    Recursive,
    /// An earlier top-level definition.
    Definition {
        signature: InstanceSignature,
        type_arguments: Vec<Type>,
    },
    /// A let binding of an enclosing expression.
    LetBinding {
        signature: InstanceSignature,
        type_arguments: Vec<Type>,
    },
    Constructor { type_arguments: Vec<Type> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypedPattern {
    Variable {
        name: LambdaName,
        ty: Type,
    },
    Object {
        name: TypeName,
        ty: Type,
    },
    Constructor {
        name: TypeName,
        arguments: Vec<TypedPattern>,
        ty: Type,
    },
}

impl TypedPattern {
    pub fn ty(&self) -> &Type {
        match self {
            TypedPattern::Variable { ty, .. }
            | TypedPattern::Object { ty, .. }
            | TypedPattern::Constructor { ty, .. } => ty,
        }
    }

    /// Names bound by the pattern, left to right.
    pub fn variables(&self) -> Vec<(&str, &Type)> {
        let mut buffer = Vec::new();
        self.collect_variables(&mut buffer);
        buffer
    }

    fn collect_variables<'a>(&'a self, buffer: &mut Vec<(&'a str, &'a Type)>) {
        match self {
            TypedPattern::Variable { name, ty } => buffer.push((name, ty)),
            TypedPattern::Object { .. } => {}
            TypedPattern::Constructor { arguments, .. } => {
                for arg in arguments {
                    arg.collect_variables(buffer);
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypedLambda {
    Literal {
        name: LambdaName,
        reference: Reference,
        ty: Type,
    },
    Trainable {
        ty: Type,
    },
    Abstraction {
        arguments: Vec<(LambdaName, Type)>,
        body: Box<TypedLambda>,
        ty: Type,
    },
    Application {
        function: Box<TypedLambda>,
        arguments: Vec<TypedLambda>,
        ty: Type,
    },
    Let {
        bindings: Vec<TypedBinding>,
        body: Box<TypedLambda>,
        ty: Type,
    },
    Case {
        scrutinee: Box<TypedLambda>,
        branches: Vec<TypedCase>,
        ty: Type,
    },
}

impl TypedLambda {
    pub fn ty(&self) -> &Type {
        match self {
            TypedLambda::Literal { ty, .. }
            | TypedLambda::Trainable { ty }
            | TypedLambda::Abstraction { ty, .. }
            | TypedLambda::Application { ty, .. }
            | TypedLambda::Let { ty, .. }
            | TypedLambda::Case { ty, .. } => ty,
        }
    }
}

/// `name = expression` inside a let, generalized over `scheme.parameters`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedBinding {
    pub name: LambdaName,
    pub signature: InstanceSignature,
    pub scheme: Parametrised,
    pub expression: TypedLambda,
}

/// One case of a definition or one branch of a case expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedCase {
    pub patterns: Vec<TypedPattern>,
    pub body: TypedLambda,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedDefinition {
    pub name: LambdaName,
    pub scheme: Parametrised,
    /// Declared and annotated type variable names that survived as parameters.
    pub declared: Vec<TypeVariableName>,
    pub cases: Vec<TypedCase>,
    pub is_recursive: bool,
}

impl TypedDefinition {
    pub fn arity(&self) -> usize {
        self.cases.first().map_or(0, |case| case.patterns.len())
    }
}

/// Visits every type slot of a typed tree, including let schemes.
pub(crate) trait TypeVisitor {
    fn visit_type(&mut self, ty: &mut Type);

    fn visit_parameter(&mut self, name: &mut TypeVariableName);
}

impl TypedPattern {
    pub(crate) fn visit_types<V: TypeVisitor>(&mut self, visitor: &mut V) {
        match self {
            TypedPattern::Variable { ty, .. } | TypedPattern::Object { ty, .. } => {
                visitor.visit_type(ty)
            }
            TypedPattern::Constructor { arguments, ty, .. } => {
                for arg in arguments {
                    arg.visit_types(visitor);
                }
                visitor.visit_type(ty);
            }
        }
    }
}

impl TypedCase {
    pub(crate) fn visit_types<V: TypeVisitor>(&mut self, visitor: &mut V) {
        for pattern in self.patterns.iter_mut() {
            pattern.visit_types(visitor);
        }
        self.body.visit_types(visitor);
    }
}

impl TypedLambda {
    pub(crate) fn visit_types<V: TypeVisitor>(&mut self, visitor: &mut V) {
        match self {
            TypedLambda::Literal { reference, ty, .. } => {
                match reference {
                    Reference::Definition { type_arguments, .. }
                    | Reference::LetBinding { type_arguments, .. }
                    | Reference::Constructor { type_arguments } => {
                        for arg in type_arguments {
                            visitor.visit_type(arg);
                        }
                    }
                    Reference::Local | Reference::Recursive => {}
                }
                visitor.visit_type(ty);
            }
            TypedLambda::Trainable { ty } => visitor.visit_type(ty),
            TypedLambda::Abstraction {
                arguments,
                body,
                ty,
            } => {
                for (_, arg) in arguments {
                    visitor.visit_type(arg);
                }
                body.visit_types(visitor);
                visitor.visit_type(ty);
            }
            TypedLambda::Application {
                function,
                arguments,
                ty,
            } => {
                function.visit_types(visitor);
                for arg in arguments {
                    arg.visit_types(visitor);
                }
                visitor.visit_type(ty);
            }
            TypedLambda::Let { bindings, body, ty } => {
                for binding in bindings {
                    for parameter in binding.scheme.parameters.iter_mut() {
                        visitor.visit_parameter(parameter);
                    }
                    visitor.visit_type(&mut binding.scheme.ty);
                    binding.expression.visit_types(visitor);
                }
                body.visit_types(visitor);
                visitor.visit_type(ty);
            }
            TypedLambda::Case {
                scrutinee,
                branches,
                ty,
            } => {
                scrutinee.visit_types(visitor);
                for branch in branches {
                    branch.visit_types(visitor);
                }
                visitor.visit_type(ty);
            }
        }
    }
}
