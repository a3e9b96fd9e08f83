//! Flat layouts of concrete algebraic types.
//!
//! A value is an array of presence cells. Every variant owns a contiguous region: an object
//! variant is one indicator cell, a product variant is the concatenation of its arguments'
//! regions. There is no tag cell; which variant a value is follows from where its non-zero cells
//! are, so a blend of several variants is still a well-formed value.
use lnn_ast::{TypeName, TypeVariableName};
use lnn_collections::{MutMap, VecMap, VecSet};
use lnn_debug_flags::dbg_do;
#[cfg(debug_assertions)]
use lnn_debug_flags::LNN_PRINT_LAYOUTS;
use lnn_types::{signature::type_signature, AlgebraicTypes, InstanceName, SumOperand, Type};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutId(u32);

impl LayoutId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutProblem {
    /// Only instantiated types have a layout.
    UnresolvedTypeVariable(TypeVariableName),
    /// Functions are carried next to the cells, never inside them.
    FunctionHasNoLayout,
    /// The type contains itself through a product argument, so it has no finite size.
    RecursiveType(InstanceName),
}

impl fmt::Display for LayoutProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutProblem::UnresolvedTypeVariable(name) => {
                write!(f, "type variable {name} has no layout")
            }
            LayoutProblem::FunctionHasNoLayout => write!(f, "a function type has no layout"),
            LayoutProblem::RecursiveType(name) => {
                write!(f, "type {name} contains itself and has no finite layout")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperandSpec {
    Object {
        name: TypeName,
        start: usize,
    },
    Product {
        name: TypeName,
        arguments: Vec<LayoutId>,
        start: usize,
        end: usize,
    },
}

impl OperandSpec {
    pub fn name(&self) -> &str {
        match self {
            OperandSpec::Object { name, .. } | OperandSpec::Product { name, .. } => name,
        }
    }

    pub fn start(&self) -> usize {
        match self {
            OperandSpec::Object { start, .. } | OperandSpec::Product { start, .. } => *start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            OperandSpec::Object { start, .. } => start + 1,
            OperandSpec::Product { end, .. } => *end,
        }
    }
}

/// Where a constructor writes its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorInfo {
    pub start: usize,
    pub arguments: Vec<LayoutId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: InstanceName,
    /// In declaration order; the ranges are contiguous and ascending.
    pub operands: Vec<OperandSpec>,
    pub constructors: VecMap<TypeName, ConstructorInfo>,
    pub size: usize,
}

impl TypeSpec {
    pub fn constructor(&self, name: &str) -> Option<&ConstructorInfo> {
        self.constructors
            .iter()
            .find(|(constructor, _)| constructor.as_str() == name)
            .map(|(_, info)| info)
    }
}

/// The strongest variant found in a region of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub constructor: TypeName,
    pub presence: f32,
    pub arguments: Vec<Decoded>,
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arguments.is_empty() {
            return write!(f, "{}", self.constructor);
        }

        write!(f, "({}", self.constructor)?;
        for arg in &self.arguments {
            write!(f, " {arg}")?;
        }
        write!(f, ")")
    }
}

/// Every layout computed so far. A concrete type is laid out once and keeps its id.
#[derive(Debug, Default)]
pub struct Layouts {
    specs: Vec<TypeSpec>,
    by_name: MutMap<InstanceName, LayoutId>,
    in_progress: VecSet<InstanceName>,
}

impl Layouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, id: LayoutId) -> &TypeSpec {
        &self.specs[id.index()]
    }

    pub fn size(&self, id: LayoutId) -> usize {
        self.specs[id.index()].size
    }

    pub fn lookup(&self, name: &InstanceName) -> Option<LayoutId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayoutId, &TypeSpec)> {
        self.specs
            .iter()
            .enumerate()
            .map(|(index, spec)| (LayoutId(index as u32), spec))
    }

    /// The layout of a concrete data type, computing it and the layouts of its arguments on
    /// first use.
    pub fn layout(&mut self, ty: &Type, types: &AlgebraicTypes) -> Result<LayoutId, LayoutProblem> {
        let (id, arguments) = match ty {
            Type::Variable(name) => {
                return Err(LayoutProblem::UnresolvedTypeVariable(name.clone()))
            }
            Type::Function(..) => return Err(LayoutProblem::FunctionHasNoLayout),
            Type::Application(id, arguments) => (*id, arguments),
        };

        let algebraic = types.get(id);
        let name = InstanceName::new(
            vec![algebraic.name.clone()],
            type_signature(arguments, types),
        );

        if let Some(layout) = self.by_name.get(&name) {
            return Ok(*layout);
        }

        if let Some(variable) = ty.free_variables().first() {
            return Err(LayoutProblem::UnresolvedTypeVariable(variable.to_string()));
        }

        if self.in_progress.insert(name.clone()) {
            return Err(LayoutProblem::RecursiveType(name));
        }

        let mut operands = Vec::with_capacity(algebraic.structure.len());
        let mut constructors = VecMap::with_capacity(algebraic.structure.len());
        let mut offset = 0;

        for operand in algebraic.instantiate_structure(arguments) {
            match operand {
                SumOperand::Object(constructor) => {
                    constructors.insert(
                        constructor.clone(),
                        ConstructorInfo {
                            start: offset,
                            arguments: Vec::new(),
                        },
                    );
                    operands.push(OperandSpec::Object {
                        name: constructor,
                        start: offset,
                    });
                    offset += 1;
                }
                SumOperand::Product(constructor, argument_types) => {
                    let start = offset;
                    let mut layouts = Vec::with_capacity(argument_types.len());

                    for argument in &argument_types {
                        let layout = match self.layout(argument, types) {
                            Ok(layout) => layout,
                            Err(problem) => {
                                self.in_progress.remove(&name);
                                return Err(problem);
                            }
                        };
                        offset += self.size(layout);
                        layouts.push(layout);
                    }

                    constructors.insert(
                        constructor.clone(),
                        ConstructorInfo {
                            start,
                            arguments: layouts.clone(),
                        },
                    );
                    operands.push(OperandSpec::Product {
                        name: constructor,
                        arguments: layouts,
                        start,
                        end: offset,
                    });
                }
            }
        }

        self.in_progress.remove(&name);

        let spec = TypeSpec {
            name: name.clone(),
            operands,
            constructors,
            size: offset,
        };

        dbg_do!(LNN_PRINT_LAYOUTS, {
            eprintln!("{}", self.render(&spec));
        });
        lnn_tracing::debug!(layout = %name, size = spec.size, "laid out");

        let id = LayoutId(self.specs.len() as u32);
        self.specs.push(spec);
        self.by_name.insert(name, id);

        Ok(id)
    }

    /// How strongly `data`, a region of exactly `size` cells, holds a value of the type: the sum
    /// over variants, where an object counts its indicator cell and a product multiplies the
    /// presences of its arguments.
    pub fn presence(&self, id: LayoutId, data: &[f32]) -> f32 {
        self.get(id)
            .operands
            .iter()
            .map(|operand| self.operand_presence(operand, data))
            .sum()
    }

    fn operand_presence(&self, operand: &OperandSpec, data: &[f32]) -> f32 {
        match operand {
            OperandSpec::Object { start, .. } => data[*start],
            OperandSpec::Product {
                arguments, start, ..
            } => {
                let mut offset = *start;
                let mut presence = 1.0;

                for argument in arguments {
                    let size = self.size(*argument);
                    presence *= self.presence(*argument, &data[offset..offset + size]);
                    offset += size;
                }

                presence
            }
        }
    }

    /// Cells of `constructor` applied to `arguments`, every other cell zero. `None` when the
    /// constructor is not a variant of the layout or an argument has the wrong size.
    pub fn encode(&self, id: LayoutId, constructor: &str, arguments: &[&[f32]]) -> Option<Vec<f32>> {
        let spec = self.get(id);
        let info = spec.constructor(constructor)?;

        if info.arguments.len() != arguments.len() {
            return None;
        }

        let mut data = vec![0.0; spec.size];
        if info.arguments.is_empty() {
            data[info.start] = 1.0;
            return Some(data);
        }

        let mut offset = info.start;
        for (layout, cells) in info.arguments.iter().zip(arguments) {
            let size = self.size(*layout);
            if cells.len() != size {
                return None;
            }

            data[offset..offset + size].copy_from_slice(cells);
            offset += size;
        }

        Some(data)
    }

    /// The variant with the highest presence, the first one on ties. `None` when nothing is
    /// present at all.
    pub fn decode(&self, id: LayoutId, data: &[f32]) -> Option<Decoded> {
        let spec = self.get(id);
        let mut best: Option<(f32, &OperandSpec)> = None;

        for operand in &spec.operands {
            let presence = self.operand_presence(operand, data);

            match best {
                Some((strongest, _)) if strongest >= presence => {}
                _ if presence == 0.0 => {}
                _ => best = Some((presence, operand)),
            }
        }

        let (presence, operand) = best?;
        let arguments = match operand {
            OperandSpec::Object { .. } => Vec::new(),
            OperandSpec::Product {
                arguments, start, ..
            } => {
                let mut offset = *start;
                let mut decoded = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    let size = self.size(*argument);
                    decoded.push(self.decode(*argument, &data[offset..offset + size])?);
                    offset += size;
                }

                decoded
            }
        };

        Some(Decoded {
            constructor: operand.name().to_string(),
            presence,
            arguments,
        })
    }

    pub fn render(&self, spec: &TypeSpec) -> String {
        let mut buf = format!("{} [{}]:", spec.name, spec.size);

        for operand in &spec.operands {
            match operand {
                OperandSpec::Object { name, start } => {
                    buf.push_str(&format!(" {name}@{start}"));
                }
                OperandSpec::Product {
                    name,
                    arguments,
                    start,
                    end,
                } => {
                    let arguments: Vec<_> = arguments
                        .iter()
                        .map(|argument| self.get(*argument).name.to_string())
                        .collect();
                    buf.push_str(&format!(" {name}({})@{start}..{end}", arguments.join(", ")));
                }
            }
        }

        buf
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use lnn_collections::VecMap;
    use pretty_assertions::assert_eq;

    struct Fixture {
        types: AlgebraicTypes,
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
        let pair = Type::Application(pair_id, vec![]);
        types.define(
            pair_id,
            vec![SumOperand::Product(
                "MkPair".into(),
                vec![boolean.clone(), boolean.clone()],
            )],
            VecMap::default(),
        );

        let maybe_id = types.reserve("Maybe".into(), vec!["a".into()]);
        types.define(
            maybe_id,
            vec![
                SumOperand::Object("Nothing".into()),
                SumOperand::Product("Just".into(), vec![Type::variable("a")]),
            ],
            VecMap::default(),
        );

        let list_id = types.reserve("List".into(), vec![]);
        types.define(
            list_id,
            vec![
                SumOperand::Object("Nil".into()),
                SumOperand::Product(
                    "Cons".into(),
                    vec![boolean.clone(), Type::Application(list_id, vec![])],
                ),
            ],
            VecMap::default(),
        );

        Fixture {
            types,
            boolean,
            pair,
        }
    }

    fn maybe(fixture: &Fixture, argument: Type) -> Type {
        Type::Application(fixture.types.lookup("Maybe").unwrap(), vec![argument])
    }

    #[test]
    fn bool_and_pair_sizes() {
        let f = fixture();
        let mut layouts = Layouts::new();

        let boolean = layouts.layout(&f.boolean, &f.types).unwrap();
        let pair = layouts.layout(&f.pair, &f.types).unwrap();

        assert_eq!(layouts.size(boolean), 2);
        assert_eq!(layouts.get(boolean).constructor("False").unwrap().start, 1);
        assert_eq!(layouts.size(pair), 4);
        assert_eq!(
            layouts.render(layouts.get(pair)),
            "Pair [4]: MkPair(Bool, Bool)@0..4"
        );
    }

    #[test]
    fn operands_are_contiguous() {
        let f = fixture();
        let mut layouts = Layouts::new();
        let maybe_pair = maybe(&f, f.pair.clone());

        let id = layouts.layout(&maybe_pair, &f.types).unwrap();
        let spec = layouts.get(id);

        let mut expected_start = 0;
        for operand in &spec.operands {
            assert_eq!(operand.start(), expected_start);
            expected_start = operand.end();
        }
        assert_eq!(expected_start, spec.size);
        assert_eq!(spec.size, 1 + 4);
    }

    #[test]
    fn each_instantiation_is_laid_out_once() {
        let f = fixture();
        let mut layouts = Layouts::new();

        let first = layouts.layout(&maybe(&f, f.boolean.clone()), &f.types).unwrap();
        let second = layouts.layout(&maybe(&f, f.boolean.clone()), &f.types).unwrap();
        let other = layouts.layout(&maybe(&f, f.pair.clone()), &f.types).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(layouts.get(first).name.to_string(), "(Maybe Bool)");
    }

    #[test]
    fn layout_problems() {
        let f = fixture();
        let mut layouts = Layouts::new();
        let list = f.types.named("List").unwrap();

        assert!(matches!(
            layouts.layout(&list, &f.types),
            Err(LayoutProblem::RecursiveType(_))
        ));
        assert_eq!(
            layouts.layout(&maybe(&f, Type::variable("a")), &f.types),
            Err(LayoutProblem::UnresolvedTypeVariable("a".into()))
        );
        assert_eq!(
            layouts.layout(&Type::function(f.boolean.clone(), f.boolean), &f.types),
            Err(LayoutProblem::FunctionHasNoLayout)
        );
    }

    #[test]
    fn presence_multiplies_products_and_adds_sums() {
        let f = fixture();
        let mut layouts = Layouts::new();
        let pair = layouts.layout(&f.pair, &f.types).unwrap();

        assert_eq!(layouts.presence(pair, &[1.0, 0.0, 0.0, 1.0]), 1.0);
        assert_eq!(layouts.presence(pair, &[0.5, 0.0, 0.5, 0.5]), 0.5);
        assert_eq!(layouts.presence(pair, &[1.0, 0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn encode_then_decode() {
        let f = fixture();
        let mut layouts = Layouts::new();
        let boolean = layouts.layout(&f.boolean, &f.types).unwrap();
        let pair = layouts.layout(&f.pair, &f.types).unwrap();

        let truth = layouts.encode(boolean, "True", &[]).unwrap();
        let falsity = layouts.encode(boolean, "False", &[]).unwrap();
        let cells = layouts.encode(pair, "MkPair", &[&truth, &falsity]).unwrap();

        assert_eq!(cells, vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(layouts.decode(pair, &cells).unwrap().to_string(), "(MkPair True False)");
        assert_eq!(layouts.decode(boolean, &[0.0, 0.0]), None);
        assert_eq!(layouts.encode(pair, "MkPair", &[&truth]), None);
    }
}
