//! Types travel through the unifier as terms: an algebraic type application becomes a function
//! symbol named after the type, and an arrow becomes the binary symbol [ARROW].
use lnn_error_macros::internal_error;
use lnn_types::{AlgebraicTypes, Type};
use lnn_unify::AlgebraicTerm;

/// Function symbol of arrow types. No algebraic type can be named like this.
pub const ARROW: &str = "->";

pub fn type_to_term(ty: &Type, types: &AlgebraicTypes) -> AlgebraicTerm {
    match ty {
        Type::Variable(name) => AlgebraicTerm::Variable(name.clone()),
        Type::Application(id, arguments) => AlgebraicTerm::Function(
            types.get(*id).name.clone(),
            arguments
                .iter()
                .map(|arg| type_to_term(arg, types))
                .collect(),
        ),
        Type::Function(from, to) => AlgebraicTerm::Function(
            ARROW.to_string(),
            vec![type_to_term(from, types), type_to_term(to, types)],
        ),
    }
}

/// Inverse of [type_to_term]. Every function symbol the unifier can produce came from a type,
/// so a term that does not map back is a compiler bug.
pub fn term_to_type(term: &AlgebraicTerm, types: &AlgebraicTypes) -> Type {
    match term {
        AlgebraicTerm::Variable(name) => Type::Variable(name.clone()),
        AlgebraicTerm::Function(name, arguments) if name == ARROW => match arguments.as_slice() {
            [from, to] => Type::function(term_to_type(from, types), term_to_type(to, types)),
            _ => internal_error!("arrow term with {} arguments", arguments.len()),
        },
        AlgebraicTerm::Function(name, arguments) => match types.lookup(name) {
            Some(id) => Type::Application(
                id,
                arguments
                    .iter()
                    .map(|arg| term_to_type(arg, types))
                    .collect(),
            ),
            None => internal_error!("term names `{name}`, which is not an algebraic type"),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use lnn_types::SumOperand;
    use pretty_assertions::assert_eq;

    #[test]
    fn arrows_and_applications_survive_the_trip() {
        let mut types = AlgebraicTypes::new();
        let maybe = types.reserve("Maybe".into(), vec!["a".into()]);
        types.define(maybe, vec![SumOperand::Object("Nothing".into())], Default::default());

        let ty = Type::function(
            Type::Application(maybe, vec![Type::variable("a")]),
            Type::variable("b"),
        );
        let term = type_to_term(&ty, &types);

        assert_eq!(term.to_string(), "->(Maybe(a), b)");
        assert_eq!(term_to_type(&term, &types), ty);
    }
}
