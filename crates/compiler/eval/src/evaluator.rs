use lnn_error_macros::internal_error;
use lnn_mono::ir::{DataPattern, FunctionSpec, GuardedCase, Spec, SpecId, Specs, VariableSpec};
use lnn_mono::layout::Layouts;
use lnn_types::InstanceName;
use std::rc::Rc;

use crate::bag::{Closure, DataBag, EvalResult};
use crate::error::RuntimeError;
use crate::trainable::{TrainableBackend, ZeroTrainable};

/// Runs specs. Holds no state between calls; values borrow the specs they were built from.
pub struct Evaluator<'a> {
    specs: &'a Specs,
    layouts: &'a Layouts,
    backend: &'a dyn TrainableBackend,
}

impl<'a> Evaluator<'a> {
    pub fn new(specs: &'a Specs, layouts: &'a Layouts) -> Self {
        Self {
            specs,
            layouts,
            backend: &ZeroTrainable,
        }
    }

    pub fn with_backend(self, backend: &'a dyn TrainableBackend) -> Self {
        Self { backend, ..self }
    }

    /// The value of a global instance.
    pub fn value(&self, id: SpecId) -> Result<EvalResult<'a>, RuntimeError> {
        self.eval(id, &DataBag::empty())
    }

    /// Applies a global instance to `arguments`.
    pub fn apply(
        &self,
        id: SpecId,
        arguments: Vec<EvalResult<'a>>,
    ) -> Result<EvalResult<'a>, RuntimeError> {
        let function = self.value(id)?;
        self.apply_value(function, arguments)
    }

    pub fn apply_value(
        &self,
        function: EvalResult<'a>,
        arguments: Vec<EvalResult<'a>>,
    ) -> Result<EvalResult<'a>, RuntimeError> {
        match function {
            EvalResult::Function(closure) => self.call(closure, arguments),
            EvalResult::Data(_) if arguments.is_empty() => Ok(function),
            EvalResult::Data(_) => Err(RuntimeError::NotAFunction),
        }
    }

    pub fn eval(&self, id: SpecId, bag: &DataBag<'a>) -> Result<EvalResult<'a>, RuntimeError> {
        let specs = self.specs;

        match specs.get(id) {
            Spec::Variable(VariableSpec::Object { start, end, .. }) => {
                Ok(EvalResult::Data(bag.data[*start..*end].to_vec()))
            }
            Spec::Variable(VariableSpec::Function { position, .. }) => {
                Ok(EvalResult::Function(Rc::clone(&bag.functions[*position])))
            }
            Spec::Variable(VariableSpec::Bound { id, .. }) => self.eval(*id, bag),
            Spec::External { id, .. } => self.value(*id),
            Spec::Object { data, .. } => Ok(EvalResult::Data(data.clone())),
            Spec::Function(function) => self.close(function, bag),
            Spec::Application {
                operands,
                constants,
                data,
                ..
            } => {
                let mut values = Vec::with_capacity(operands.len());

                for (index, operand) in operands.iter().enumerate() {
                    let value = if constants.contains(&index) {
                        self.value(*operand)?
                    } else {
                        self.eval(*operand, bag)?
                    };

                    if value.is_function() && data.contains(&index) {
                        return Err(RuntimeError::NotData);
                    }

                    values.push(value);
                }

                let mut values = values.into_iter();
                match values.next() {
                    Some(function) => self.apply_value(function, values.collect()),
                    None => internal_error!("application {id:?} has no operands"),
                }
            }
        }
    }

    /// A closure over the visible prefix of `bag`. Functions without arguments run right away.
    fn close(
        &self,
        function: &'a FunctionSpec,
        bag: &DataBag<'a>,
    ) -> Result<EvalResult<'a>, RuntimeError> {
        let closure = Rc::new(Closure {
            function,
            captured: bag.arguments_before(function.closure_pointer()),
            supplied: Vec::new(),
        });

        if function.arity() == 0 {
            self.invoke(&closure, Vec::new())
        } else {
            Ok(EvalResult::Function(closure))
        }
    }

    fn call(
        &self,
        closure: Rc<Closure<'a>>,
        mut arguments: Vec<EvalResult<'a>>,
    ) -> Result<EvalResult<'a>, RuntimeError> {
        if arguments.is_empty() {
            return Ok(EvalResult::Function(closure));
        }

        let missing = closure.function.arity() - closure.supplied.len();
        let mut supplied = closure.supplied.clone();

        if arguments.len() < missing {
            supplied.extend(arguments);

            return Ok(EvalResult::Function(Rc::new(Closure {
                function: closure.function,
                captured: closure.captured.clone(),
                supplied,
            })));
        }

        let rest = arguments.split_off(missing);
        supplied.extend(arguments);

        let result = self.invoke(&closure, supplied)?;

        if rest.is_empty() {
            Ok(result)
        } else {
            self.apply_value(result, rest)
        }
    }

    /// Runs the function of `closure` on its captured prefix followed by all of its arguments.
    fn invoke(
        &self,
        closure: &Closure<'a>,
        arguments: Vec<EvalResult<'a>>,
    ) -> Result<EvalResult<'a>, RuntimeError> {
        match closure.function {
            FunctionSpec::Constructor { layout, offset, .. } => {
                let mut cells = vec![0.0; self.layouts.size(*layout)];
                let mut position = *offset;

                for argument in arguments {
                    let argument = argument.into_data()?;
                    cells[position..position + argument.len()].copy_from_slice(&argument);
                    position += argument.len();
                }

                Ok(EvalResult::Data(cells))
            }
            FunctionSpec::Trainable {
                name,
                index,
                input_size,
                output,
                ..
            } => {
                let mut input = Vec::with_capacity(*input_size);
                for argument in arguments {
                    input.extend(argument.into_data()?);
                }
                debug_assert_eq!(input.len(), *input_size);

                let expected = self.layouts.size(*output);
                let cells = self.backend.run(name, *index, &input, expected);

                if cells.len() != expected {
                    return Err(RuntimeError::TrainableShape {
                        name: name.clone(),
                        index: *index,
                        expected,
                        found: cells.len(),
                    });
                }

                Ok(EvalResult::Data(cells))
            }
            FunctionSpec::Guarded { name, cases, .. } => {
                let bag = extend(closure.captured.clone(), arguments);
                self.run_guarded(name.as_ref(), cases, &bag)
            }
            FunctionSpec::Anonymous { body, .. } => {
                let bag = extend(closure.captured.clone(), arguments);
                self.eval(*body, &bag)
            }
            FunctionSpec::Recursive { name, body, .. } => {
                let itself = Rc::new(Closure {
                    function: closure.function,
                    captured: closure.captured.clone(),
                    supplied: Vec::new(),
                });

                let mut bag = closure.captured.clone();
                bag.functions.push(itself);
                let bag = extend(bag, arguments);

                match self.specs.get(*body) {
                    Spec::Function(FunctionSpec::Guarded { cases, .. }) => {
                        self.run_guarded(Some(name), cases, &bag)
                    }
                    _ => internal_error!("the body of {name} is not a guarded function"),
                }
            }
        }
    }

    /// Runs the first case whose patterns are present.
    fn run_guarded(
        &self,
        name: Option<&InstanceName>,
        cases: &'a [GuardedCase],
        bag: &DataBag<'a>,
    ) -> Result<EvalResult<'a>, RuntimeError> {
        for (index, case) in cases.iter().enumerate() {
            let presence: f32 = case
                .patterns
                .iter()
                .map(|pattern| self.presence(pattern, bag))
                .product();

            if presence != 0.0 {
                lnn_tracing::trace!(case = index, presence, "matched");
                return self.eval(case.body, bag);
            }
        }

        Err(RuntimeError::NoMatchingCase {
            function: name.cloned(),
        })
    }

    fn presence(&self, pattern: &DataPattern, bag: &DataBag<'a>) -> f32 {
        match pattern {
            DataPattern::Object { position, .. } => bag.data[*position],
            DataPattern::Variable {
                layout, start, end, ..
            } => self.layouts.presence(*layout, &bag.data[*start..*end]),
        }
    }
}

fn extend<'a>(mut bag: DataBag<'a>, arguments: Vec<EvalResult<'a>>) -> DataBag<'a> {
    for argument in arguments {
        bag.push(argument);
    }

    bag
}

#[cfg(test)]
mod test {
    use super::*;
    use lnn_collections::VecMap;
    use lnn_mono::ir::DataPointer;
    use lnn_types::{AlgebraicTypes, SumOperand, Type};
    use pretty_assertions::assert_eq;

    struct Fixture {
        types: AlgebraicTypes,
        layouts: Layouts,
        specs: Specs,
        boolean: Type,
        pair: Type,
    }

    fn fixture() -> Fixture {
        let mut types = AlgebraicTypes::new();

        let bool_id = types.reserve("Bool".into(), vec![]);
        let boolean = Type::Application(bool_id, vec![]);
        types.define(
            bool_id,
            vec![
                SumOperand::Object("True".into()),
                SumOperand::Object("False".into()),
            ],
            VecMap::default(),
        );

        let pair_id = types.reserve("Pair".into(), vec![]);
        types.define(
            pair_id,
            vec![SumOperand::Product(
                "MkPair".into(),
                vec![boolean.clone(), boolean.clone()],
            )],
            VecMap::default(),
        );

        let mut layouts = Layouts::new();
        layouts.layout(&boolean, &types).unwrap();

        Fixture {
            types,
            layouts,
            specs: Specs::new(),
            boolean,
            pair: Type::Application(pair_id, vec![]),
        }
    }

    const TRUE: [f32; 2] = [1.0, 0.0];
    const FALSE: [f32; 2] = [0.0, 1.0];

    fn data(cells: &[f32]) -> EvalResult<'static> {
        EvalResult::Data(cells.to_vec())
    }

    fn cells(result: EvalResult) -> Vec<f32> {
        result.into_data().unwrap()
    }

    fn make_pair(f: &mut Fixture) -> SpecId {
        let layout = f.layouts.layout(&f.pair, &f.types).unwrap();
        let ty = Type::arrows([f.boolean.clone(), f.boolean.clone()], f.pair.clone());

        f.specs.add(
            Spec::Function(FunctionSpec::Constructor {
                name: "MkPair".into(),
                layout,
                offset: 0,
                arity: 2,
            }),
            ty,
        )
    }

    #[test]
    fn constructors_apply_partially() {
        let mut f = fixture();
        let id = make_pair(&mut f);
        let evaluator = Evaluator::new(&f.specs, &f.layouts);

        let partial = evaluator.apply(id, vec![data(&TRUE)]).unwrap();
        assert!(partial.is_function());

        let full = evaluator.apply_value(partial, vec![data(&FALSE)]).unwrap();
        assert_eq!(cells(full), vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn over_application_applies_the_result() {
        let mut f = fixture();
        let make_pair = make_pair(&mut f);
        let function = f.specs.ty(make_pair).clone();

        // \g -> g
        let body = f.specs.add(
            Spec::Variable(VariableSpec::Function {
                name: "g".into(),
                position: 0,
            }),
            function.clone(),
        );
        let identity = f.specs.add(
            Spec::Function(FunctionSpec::Anonymous {
                arity: 1,
                body,
                closure_pointer: DataPointer::START,
            }),
            Type::function(function.clone(), function),
        );

        let evaluator = Evaluator::new(&f.specs, &f.layouts);
        let constructor = evaluator.value(make_pair).unwrap();
        let result = evaluator
            .apply(identity, vec![constructor, data(&FALSE), data(&FALSE)])
            .unwrap();

        assert_eq!(cells(result), vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn closures_keep_their_captured_prefix() {
        let mut f = fixture();
        let layout = f.layouts.layout(&f.boolean, &f.types).unwrap();
        let boolean = f.boolean.clone();

        // \x -> \y -> x
        let x = f.specs.add(
            Spec::Variable(VariableSpec::Object {
                name: "x".into(),
                layout,
                start: 0,
                end: 2,
            }),
            boolean.clone(),
        );
        let inner = f.specs.add(
            Spec::Function(FunctionSpec::Anonymous {
                arity: 1,
                body: x,
                closure_pointer: DataPointer::START.with_data(2),
            }),
            Type::function(boolean.clone(), boolean.clone()),
        );
        let outer = f.specs.add(
            Spec::Function(FunctionSpec::Anonymous {
                arity: 1,
                body: inner,
                closure_pointer: DataPointer::START,
            }),
            Type::arrows([boolean.clone(), boolean.clone()], boolean),
        );

        let evaluator = Evaluator::new(&f.specs, &f.layouts);
        let constant = evaluator.apply(outer, vec![data(&TRUE)]).unwrap();
        let result = evaluator.apply_value(constant, vec![data(&FALSE)]).unwrap();

        assert_eq!(cells(result), TRUE.to_vec());
    }

    #[test]
    fn first_present_case_wins_and_absent_cases_fail() {
        let mut f = fixture();
        let layout = f.layouts.layout(&f.boolean, &f.types).unwrap();
        let boolean = f.boolean.clone();

        let truth = f.specs.add(
            Spec::Object {
                layout,
                data: TRUE.to_vec(),
            },
            boolean.clone(),
        );
        let falsity = f.specs.add(
            Spec::Object {
                layout,
                data: FALSE.to_vec(),
            },
            boolean.clone(),
        );

        let name = InstanceName::new(vec!["f".into()], vec![]);
        let guarded = f.specs.add(
            Spec::Function(FunctionSpec::Guarded {
                name: Some(name.clone()),
                cases: vec![
                    GuardedCase {
                        patterns: vec![DataPattern::Object {
                            constructor: "True".into(),
                            position: 0,
                        }],
                        body: falsity,
                    },
                    GuardedCase {
                        patterns: vec![DataPattern::Variable {
                            name: "b".into(),
                            type_name: f.layouts.get(layout).name.clone(),
                            layout,
                            start: 0,
                            end: 2,
                        }],
                        body: truth,
                    },
                ],
                closure_pointer: DataPointer::START,
                arity: 1,
            }),
            Type::function(boolean.clone(), boolean),
        );

        let evaluator = Evaluator::new(&f.specs, &f.layouts);

        let both = evaluator.apply(guarded, vec![data(&TRUE)]).unwrap();
        assert_eq!(cells(both), FALSE.to_vec());

        let second = evaluator.apply(guarded, vec![data(&FALSE)]).unwrap();
        assert_eq!(cells(second), TRUE.to_vec());

        let absent = evaluator.apply(guarded, vec![data(&[0.0, 0.0])]);
        assert_eq!(
            absent.unwrap_err(),
            RuntimeError::NoMatchingCase {
                function: Some(name)
            }
        );
    }

    struct Swap;

    impl TrainableBackend for Swap {
        fn run(&self, _: &InstanceName, _: usize, input: &[f32], _: usize) -> Vec<f32> {
            input.iter().rev().copied().collect()
        }
    }

    #[test]
    fn trainables_go_through_the_backend() {
        let mut f = fixture();
        let layout = f.layouts.layout(&f.boolean, &f.types).unwrap();
        let name = InstanceName::new(vec!["learned".into()], vec![]);

        let trainable = f.specs.add(
            Spec::Function(FunctionSpec::Trainable {
                name: name.clone(),
                index: 0,
                arity: 1,
                input_size: 2,
                output: layout,
            }),
            Type::function(f.boolean.clone(), f.boolean.clone()),
        );
        let widen = f.specs.add(
            Spec::Function(FunctionSpec::Trainable {
                name: name.clone(),
                index: 1,
                arity: 2,
                input_size: 4,
                output: layout,
            }),
            Type::arrows([f.boolean.clone(), f.boolean.clone()], f.boolean.clone()),
        );

        let zero = Evaluator::new(&f.specs, &f.layouts);
        assert_eq!(
            cells(zero.apply(trainable, vec![data(&TRUE)]).unwrap()),
            vec![0.0, 0.0]
        );

        let swap = Evaluator::new(&f.specs, &f.layouts).with_backend(&Swap);
        assert_eq!(
            cells(swap.apply(trainable, vec![data(&TRUE)]).unwrap()),
            FALSE.to_vec()
        );
        assert_eq!(
            swap.apply(widen, vec![data(&TRUE), data(&TRUE)])
                .unwrap_err()
                .to_string(),
            "trainable 1 of learned produced 4 cells instead of 2"
        );
    }
}
