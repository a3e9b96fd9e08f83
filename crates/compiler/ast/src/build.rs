//! Shorthands for assembling a [LambdaProgram] without a parser.
//!
//! ```
//! use lnn_ast::build::*;
//!
//! let program = program(vec![
//!     data("Bool", &[], vec![object("True"), object("False")]),
//!     def("not", vec![p_obj("True")], lit("False")),
//!     def("not", vec![p_obj("False")], lit("True")),
//! ]);
//! assert_eq!(program.expressions.len(), 3);
//! ```
use crate::{
    Binding, CaseBranch, Expression, Lambda, LambdaDefinition, LambdaProgram,
    LambdaTypeDeclaration, Pattern, RawSumOperand, RawType, TypeDefinition,
};

pub fn program(expressions: Vec<Expression>) -> LambdaProgram {
    LambdaProgram { expressions }
}

pub fn data(name: &str, parameters: &[&str], operands: Vec<RawSumOperand>) -> Expression {
    Expression::Type(TypeDefinition {
        name: name.to_string(),
        parameters: parameters.iter().map(|p| p.to_string()).collect(),
        operands,
    })
}

pub fn object(name: &str) -> RawSumOperand {
    RawSumOperand::Object(name.to_string())
}

pub fn product(name: &str, arguments: Vec<RawType>) -> RawSumOperand {
    RawSumOperand::Product(name.to_string(), arguments)
}

pub fn ty(name: &str) -> RawType {
    RawType::Application(name.to_string(), Vec::new())
}

pub fn ty_app(name: &str, arguments: Vec<RawType>) -> RawType {
    RawType::Application(name.to_string(), arguments)
}

pub fn ty_var(name: &str) -> RawType {
    RawType::Variable(name.to_string())
}

pub fn arrow(from: RawType, to: RawType) -> RawType {
    RawType::Function(Box::new(from), Box::new(to))
}

pub fn declare(name: &str, ty: RawType) -> Expression {
    Expression::Declaration(LambdaTypeDeclaration {
        name: name.to_string(),
        ty,
    })
}

pub fn def(name: &str, patterns: Vec<Pattern>, body: Lambda) -> Expression {
    Expression::Lambda(LambdaDefinition {
        name: name.to_string(),
        patterns,
        body,
    })
}

pub fn p_var(name: &str) -> Pattern {
    Pattern::Variable(name.to_string())
}

pub fn p_obj(name: &str) -> Pattern {
    Pattern::Object(name.to_string())
}

pub fn p_con(name: &str, arguments: Vec<Pattern>) -> Pattern {
    Pattern::Constructor(name.to_string(), arguments)
}

pub fn lit(name: &str) -> Lambda {
    Lambda::Literal(name.to_string())
}

pub fn learn() -> Lambda {
    Lambda::Trainable
}

pub fn apply(function: Lambda, arguments: Vec<Lambda>) -> Lambda {
    Lambda::Application {
        function: Box::new(function),
        arguments,
    }
}

pub fn lambda(arguments: &[&str], body: Lambda) -> Lambda {
    Lambda::Abstraction {
        arguments: arguments.iter().map(|a| a.to_string()).collect(),
        body: Box::new(body),
    }
}

pub fn let_in(bindings: Vec<(&str, Lambda)>, body: Lambda) -> Lambda {
    Lambda::Let {
        bindings: bindings
            .into_iter()
            .map(|(name, expression)| Binding {
                name: name.to_string(),
                expression,
            })
            .collect(),
        body: Box::new(body),
    }
}

pub fn typed(expression: Lambda, ty: RawType) -> Lambda {
    Lambda::Typed {
        expression: Box::new(expression),
        ty,
    }
}

pub fn case(scrutinee: Lambda, branches: Vec<(Pattern, Lambda)>) -> Lambda {
    Lambda::Case {
        scrutinee: Box::new(scrutinee),
        branches: branches
            .into_iter()
            .map(|(pattern, body)| CaseBranch { pattern, body })
            .collect(),
    }
}
