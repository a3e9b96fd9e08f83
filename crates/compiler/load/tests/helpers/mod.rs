#![allow(dead_code)]

use lnn_ast::build::*;
use lnn_ast::Expression;
use lnn_eval::{EvalResult, TrainableBackend};
use lnn_load::{compile, Compiled, LoadConfig, Problem};
use lnn_mono::layout::LayoutId;

pub const TRUE: [f32; 2] = [1.0, 0.0];
pub const FALSE: [f32; 2] = [0.0, 1.0];

/// `Bool = True | False` and `Pair = MkPair Bool Bool`.
pub fn bool_and_pair() -> Vec<Expression> {
    vec![
        data("Bool", &[], vec![object("True"), object("False")]),
        data(
            "Pair",
            &[],
            vec![product("MkPair", vec![ty("Bool"), ty("Bool")])],
        ),
    ]
}

/// `not` by cases.
pub fn not() -> Vec<Expression> {
    vec![
        def("not", vec![p_obj("True")], lit("False")),
        def("not", vec![p_obj("False")], lit("True")),
    ]
}

pub fn with_prelude(expressions: Vec<Expression>) -> Vec<Expression> {
    let mut all = bool_and_pair();
    all.extend(expressions);
    all
}

pub fn try_load(expressions: Vec<Expression>) -> Result<Compiled, Problem> {
    let _guards = lnn_tracing::setup_tracing!();

    compile(&program(expressions), LoadConfig::default().checked())
}

pub fn load(expressions: Vec<Expression>) -> Compiled {
    match try_load(expressions) {
        Ok(compiled) => compiled,
        Err(problem) => panic!("failed to load: {problem}"),
    }
}

pub fn load_err(expressions: Vec<Expression>) -> String {
    match try_load(expressions) {
        Ok(_) => panic!("expected a problem"),
        Err(problem) => problem.to_string(),
    }
}

pub fn cells(result: EvalResult) -> Vec<f32> {
    match result {
        EvalResult::Data(cells) => cells,
        EvalResult::Function(_) => panic!("expected data, got a function"),
    }
}

pub fn arguments<'a>(values: &[&[f32]]) -> Vec<EvalResult<'a>> {
    values
        .iter()
        .map(|value| EvalResult::Data(value.to_vec()))
        .collect()
}

/// Applies the root `name` to data arguments and returns the resulting cells.
pub fn run(compiled: &Compiled, name: &str, values: &[&[f32]]) -> Vec<f32> {
    let root = compiled
        .root(name)
        .unwrap_or_else(|| panic!("{name} is not a root"));

    run_with(compiled, None, root, values)
}

pub fn run_with(
    compiled: &Compiled,
    backend: Option<&dyn TrainableBackend>,
    id: lnn_mono::ir::SpecId,
    values: &[&[f32]],
) -> Vec<f32> {
    let evaluator = match backend {
        Some(backend) => compiled.evaluator().with_backend(backend),
        None => compiled.evaluator(),
    };

    let result = if values.is_empty() {
        evaluator.value(id)
    } else {
        evaluator.apply(id, arguments(values))
    };

    match result {
        Ok(result) => cells(result),
        Err(error) => panic!("evaluation failed: {error}"),
    }
}

pub fn layout_named(compiled: &Compiled, name: &str) -> LayoutId {
    compiled
        .layouts()
        .iter()
        .find(|(_, spec)| spec.name.to_string() == name)
        .map(|(id, _)| id)
        .unwrap_or_else(|| panic!("{name} was never laid out"))
}

/// The strongest reading of the cells `id` produces.
pub fn decode(compiled: &Compiled, id: lnn_mono::ir::SpecId, cells: &[f32]) -> String {
    let layout = compiled.result_layout(id).expect("result is not data");

    compiled
        .layouts()
        .decode(layout, cells)
        .map_or_else(|| "<absent>".to_string(), |decoded| decoded.to_string())
}
