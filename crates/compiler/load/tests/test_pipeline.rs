#[macro_use]
extern crate pretty_assertions;

#[cfg(test)]
mod helpers;

#[cfg(test)]
mod test_pipeline {
    use crate::helpers::*;
    use indoc::indoc;
    use lnn_ast::build::*;
    use lnn_eval::{RuntimeError, TrainableBackend};
    use lnn_load::{compile, LoadConfig};
    use lnn_types::InstanceName;

    #[test]
    fn object_constant() {
        let compiled = load(with_prelude(vec![def("t", vec![], lit("True"))]));

        assert_eq!(run(&compiled, "t", &[]), TRUE.to_vec());
    }

    #[test]
    fn product_constant() {
        let compiled = load(with_prelude(vec![def(
            "p",
            vec![],
            apply(lit("MkPair"), vec![lit("True"), lit("False")]),
        )]));

        let cells = run(&compiled, "p", &[]);
        assert_eq!(cells, vec![1.0, 0.0, 0.0, 1.0]);

        let root = compiled.root("p").unwrap();
        assert_eq!(decode(&compiled, root, &cells), "(MkPair True False)");
    }

    #[test]
    fn not_by_cases() {
        let compiled = load(with_prelude(not()));

        assert_eq!(run(&compiled, "not", &[&TRUE]), FALSE.to_vec());
        assert_eq!(run(&compiled, "not", &[&FALSE]), TRUE.to_vec());
    }

    #[test]
    fn weak_presence_still_selects_a_case() {
        let compiled = load(with_prelude(not()));

        assert_eq!(run(&compiled, "not", &[&[0.25, 0.75]]), FALSE.to_vec());
        assert_eq!(run(&compiled, "not", &[&[0.0, 0.75]]), TRUE.to_vec());

        let root = compiled.root("not").unwrap();
        let error = compiled
            .evaluator()
            .apply(root, arguments(&[&[0.0, 0.0]]))
            .unwrap_err();
        assert!(matches!(error, RuntimeError::NoMatchingCase { .. }));
    }

    #[test]
    fn not_by_case_expression() {
        let compiled = load(with_prelude(vec![def(
            "not",
            vec![p_var("b")],
            case(
                lit("b"),
                vec![(p_obj("True"), lit("False")), (p_obj("False"), lit("True"))],
            ),
        )]));

        let root = compiled.root("not").unwrap();
        assert_eq!(
            compiled.render(root),
            indoc!(
                r#"
                not <0, 0> : Bool -> Bool
                  | b[0..2] ->
                    apply : Bool
                        case <2, 0> : Bool -> Bool
                          | True@2 ->
                            False : Bool
                          | False@3 ->
                            True : Bool
                        b[0..2] : Bool
                "#
            )
        );
        assert_eq!(run(&compiled, "not", &[&TRUE]), FALSE.to_vec());
        assert_eq!(run(&compiled, "not", &[&FALSE]), TRUE.to_vec());
    }

    #[test]
    fn polymorphic_identity_gets_one_instance_per_type() {
        let mut compiled = load(with_prelude(vec![def("id", vec![p_var("x")], lit("x"))]));
        assert_eq!(compiled.root("id"), None);

        let bool_ty = compiled.types().named("Bool").unwrap();
        let pair_ty = compiled.types().named("Pair").unwrap();

        let at_bool = compiled.instantiate("id", &[bool_ty.clone()]).unwrap();
        let at_pair = compiled.instantiate("id", &[pair_ty]).unwrap();
        assert_ne!(at_bool, at_pair);
        assert_eq!(
            compiled
                .mono
                .instances
                .get_instances(&["id".to_string()])
                .count(),
            2
        );

        // asking again hits the cache
        assert_eq!(compiled.instantiate("id", &[bool_ty]).unwrap(), at_bool);

        assert_eq!(run_with(&compiled, None, at_bool, &[&TRUE]), TRUE.to_vec());
        assert_eq!(
            run_with(&compiled, None, at_pair, &[&[0.0, 1.0, 1.0, 0.0]]),
            vec![0.0, 1.0, 1.0, 0.0]
        );
    }

    #[test]
    fn partial_application_is_a_function() {
        let mut compiled = load(with_prelude(vec![
            def("first", vec![p_var("x"), p_var("y")], lit("x")),
            def("partial", vec![], apply(lit("first"), vec![lit("True")])),
        ]));

        let scheme = &compiled.program.definition("partial").unwrap().scheme;
        assert_eq!(scheme.parameters.len(), 1);

        let pair_ty = compiled.types().named("Pair").unwrap();
        let id = compiled.instantiate("partial", &[pair_ty]).unwrap();

        let evaluator = compiled.evaluator();
        let value = evaluator.value(id).unwrap();
        assert!(value.is_function());

        let result = evaluator
            .apply_value(value, arguments(&[&[0.0, 1.0, 0.0, 1.0]]))
            .unwrap();
        assert_eq!(cells(result), TRUE.to_vec());
    }

    #[test]
    fn first_case_that_matches_wins() {
        let compiled = load(with_prelude(vec![
            def("f", vec![p_var("x")], lit("True")),
            def("f", vec![p_obj("False")], lit("False")),
        ]));

        assert_eq!(run(&compiled, "f", &[&FALSE]), TRUE.to_vec());
    }

    #[test]
    fn recursive_definition() {
        let compiled = load(with_prelude(vec![
            def(
                "settle",
                vec![p_obj("True")],
                apply(lit("settle"), vec![lit("False")]),
            ),
            def("settle", vec![p_obj("False")], lit("True")),
        ]));

        assert!(compiled.program.definition("settle").unwrap().is_recursive);
        assert_eq!(run(&compiled, "settle", &[&TRUE]), TRUE.to_vec());
        assert_eq!(run(&compiled, "settle", &[&FALSE]), TRUE.to_vec());
    }

    #[test]
    fn higher_order_arguments() {
        let mut expressions = not();
        expressions.extend([
            def(
                "twice",
                vec![p_var("f"), p_var("x")],
                apply(lit("f"), vec![apply(lit("f"), vec![lit("x")])]),
            ),
            def("nn", vec![], apply(lit("twice"), vec![lit("not")])),
        ]);
        let compiled = load(with_prelude(expressions));

        assert_eq!(run(&compiled, "nn", &[&TRUE]), TRUE.to_vec());
        assert_eq!(run(&compiled, "nn", &[&FALSE]), FALSE.to_vec());
    }

    #[test]
    fn let_binding_used_at_two_types() {
        let compiled = load(with_prelude(vec![def(
            "swap",
            vec![p_var("p")],
            let_in(
                vec![("same", lambda(&["y"], lit("y")))],
                case(
                    apply(lit("same"), vec![lit("p")]),
                    vec![(
                        p_con("MkPair", vec![p_var("a"), p_var("b")]),
                        apply(
                            lit("MkPair"),
                            vec![
                                apply(lit("same"), vec![lit("b")]),
                                apply(lit("same"), vec![lit("a")]),
                            ],
                        ),
                    )],
                ),
            ),
        )]));

        assert_eq!(
            compiled
                .mono
                .instances
                .get_instances(&["swap".to_string(), "same".to_string()])
                .count(),
            2
        );
        assert_eq!(
            run(&compiled, "swap", &[&[1.0, 0.0, 0.0, 1.0]]),
            vec![0.0, 1.0, 1.0, 0.0]
        );
    }

    #[test]
    fn closures_capture_their_arguments() {
        let mut compiled = load(with_prelude(vec![def(
            "keep",
            vec![p_var("x")],
            let_in(
                vec![("pick", lambda(&["y"], lit("x")))],
                apply(lit("pick"), vec![lit("True")]),
            ),
        )]));

        // `keep :: a -> a`, so it is only instantiated on request
        assert_eq!(compiled.root("keep"), None);

        let bool_ty = compiled.types().named("Bool").unwrap();
        let pair_ty = compiled.types().named("Pair").unwrap();
        let at_bool = compiled.instantiate("keep", &[bool_ty]).unwrap();
        let at_pair = compiled.instantiate("keep", &[pair_ty]).unwrap();

        assert_eq!(run_with(&compiled, None, at_bool, &[&FALSE]), FALSE.to_vec());
        assert_eq!(
            run_with(&compiled, None, at_pair, &[&[0.0, 1.0, 1.0, 0.0]]),
            vec![0.0, 1.0, 1.0, 0.0]
        );
    }

    #[test]
    fn declared_type_makes_a_root() {
        let compiled = load(with_prelude(vec![
            declare("keep", arrow(ty("Bool"), ty("Bool"))),
            def(
                "keep",
                vec![p_var("x")],
                let_in(
                    vec![("pick", lambda(&["y"], lit("x")))],
                    apply(lit("pick"), vec![lit("True")]),
                ),
            ),
        ]));

        assert_eq!(run(&compiled, "keep", &[&FALSE]), FALSE.to_vec());
        assert_eq!(run(&compiled, "keep", &[&TRUE]), TRUE.to_vec());
    }

    #[test]
    fn case_over_a_parametrised_type() {
        let mut expressions = vec![data(
            "Maybe",
            &["a"],
            vec![object("Nothing"), product("Just", vec![ty_var("a")])],
        )];
        expressions.extend([
            def(
                "from_maybe",
                vec![p_var("d"), p_var("m")],
                case(
                    lit("m"),
                    vec![
                        (p_obj("Nothing"), lit("d")),
                        (p_con("Just", vec![p_var("x")]), lit("x")),
                    ],
                ),
            ),
            def("fm", vec![], apply(lit("from_maybe"), vec![lit("False")])),
        ]);
        let compiled = load(with_prelude(expressions));

        let maybe_bool = layout_named(&compiled, "(Maybe Bool)");
        let just_true = compiled
            .layouts()
            .encode(maybe_bool, "Just", &[&TRUE])
            .unwrap();
        let nothing = compiled
            .layouts()
            .encode(maybe_bool, "Nothing", &[])
            .unwrap();

        assert_eq!(just_true, vec![0.0, 1.0, 0.0]);
        assert_eq!(run(&compiled, "fm", &[&just_true]), TRUE.to_vec());
        assert_eq!(run(&compiled, "fm", &[&nothing]), FALSE.to_vec());
    }

    struct Fixed(Vec<f32>);

    impl TrainableBackend for Fixed {
        fn run(&self, _: &InstanceName, _: usize, _: &[f32], output_size: usize) -> Vec<f32> {
            self.0.iter().copied().take(output_size).collect()
        }
    }

    fn learned() -> Vec<lnn_ast::Expression> {
        with_prelude(vec![
            declare("learned", arrow(ty("Bool"), ty("Pair"))),
            def("learned", vec![], learn()),
        ])
    }

    #[test]
    fn trainable_runs_on_the_backend() {
        let compiled = load(learned());
        let root = compiled.root("learned").unwrap();

        let backend = Fixed(vec![1.0, 0.0, 0.0, 1.0]);
        let cells = run_with(&compiled, Some(&backend), root, &[&TRUE]);

        assert_eq!(cells, vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(decode(&compiled, root, &cells), "(MkPair True False)");

        // the default backend answers with absent cells
        assert_eq!(run(&compiled, "learned", &[&TRUE]), vec![0.0; 4]);
    }

    #[test]
    fn trainable_output_is_checked() {
        let compiled = load(learned());
        let root = compiled.root("learned").unwrap();

        let backend = Fixed(vec![1.0, 0.0, 0.0]);
        let error = compiled
            .evaluator()
            .with_backend(&backend)
            .apply(root, arguments(&[&TRUE]))
            .unwrap_err();

        assert!(matches!(error, RuntimeError::TrainableShape { .. }));
        assert_eq!(
            error.to_string(),
            "trainable 0 of learned produced 3 cells instead of 4"
        );
    }

    #[test]
    fn named_roots_only() {
        let mut expressions = not();
        expressions.push(def("t", vec![], lit("True")));

        let compiled = compile(
            &program(with_prelude(expressions)),
            LoadConfig::named(["not"]).checked(),
        )
        .unwrap();

        assert!(compiled.root("not").is_some());
        assert_eq!(compiled.root("t"), None);
    }
}
