//! The monomorphic IR: every node is concrete, every variable is a flat offset.
//!
//! Nodes live in a [Specs] arena and refer to each other by [SpecId]. A definition instance gets
//! its id before its body is lowered and the node is filled in once lowering succeeds. An id left
//! unfilled by a failed attempt is never handed out as an instance. A recursive definition reaches
//! itself through its [FunctionSpec::Recursive] slot, not through its id.
use lnn_ast::{LambdaName, TypeName};
use lnn_error_macros::internal_error;
use lnn_types::{AlgebraicTypes, InstanceName, Type};
use std::fmt::Write;

use crate::layout::{LayoutId, Layouts};

pub mod pattern;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecId(u32);

impl SpecId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position in the argument bag: how many cells and how many function slots come before.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DataPointer {
    pub data_offset: usize,
    pub functions_count: usize,
}

impl DataPointer {
    pub const START: DataPointer = DataPointer {
        data_offset: 0,
        functions_count: 0,
    };

    pub fn with_data(self, size: usize) -> Self {
        DataPointer {
            data_offset: self.data_offset + size,
            ..self
        }
    }

    pub fn with_function(self) -> Self {
        DataPointer {
            functions_count: self.functions_count + 1,
            ..self
        }
    }
}

/// A compiled pattern guard. Positions are absolute in the bag the guarded function runs on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataPattern {
    /// Presence is the indicator cell at `position`.
    Object { constructor: TypeName, position: usize },
    /// Presence is the presence of a whole `layout` value in `start..end`.
    Variable {
        name: LambdaName,
        type_name: InstanceName,
        layout: LayoutId,
        start: usize,
        end: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VariableSpec {
    Object {
        name: LambdaName,
        layout: LayoutId,
        start: usize,
        end: usize,
    },
    Function {
        name: LambdaName,
        position: usize,
    },
    /// An instance of a let binding, evaluated in the bag of its use.
    Bound { name: InstanceName, id: SpecId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardedCase {
    pub patterns: Vec<DataPattern>,
    pub body: SpecId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FunctionSpec {
    Constructor {
        name: TypeName,
        layout: LayoutId,
        /// Start of the constructor's region.
        offset: usize,
        arity: usize,
    },
    Trainable {
        /// The definition or let binding instance holding it.
        name: InstanceName,
        index: usize,
        arity: usize,
        input_size: usize,
        output: LayoutId,
    },
    Guarded {
        /// `None` for case expressions.
        name: Option<InstanceName>,
        cases: Vec<GuardedCase>,
        closure_pointer: DataPointer,
        arity: usize,
    },
    Anonymous {
        arity: usize,
        body: SpecId,
        closure_pointer: DataPointer,
    },
    /// Puts itself in the function slot at `closure_pointer` and runs `body`, a guarded
    /// function whose closure pointer is one slot further.
    Recursive {
        name: InstanceName,
        arity: usize,
        body: SpecId,
        closure_pointer: DataPointer,
    },
}

impl FunctionSpec {
    pub fn arity(&self) -> usize {
        match self {
            FunctionSpec::Constructor { arity, .. }
            | FunctionSpec::Trainable { arity, .. }
            | FunctionSpec::Guarded { arity, .. }
            | FunctionSpec::Anonymous { arity, .. }
            | FunctionSpec::Recursive { arity, .. } => *arity,
        }
    }

    /// How much of the creating bag a value of this function keeps.
    pub fn closure_pointer(&self) -> DataPointer {
        match self {
            FunctionSpec::Constructor { .. } | FunctionSpec::Trainable { .. } => {
                DataPointer::START
            }
            FunctionSpec::Guarded {
                closure_pointer, ..
            }
            | FunctionSpec::Anonymous {
                closure_pointer, ..
            }
            | FunctionSpec::Recursive {
                closure_pointer, ..
            } => *closure_pointer,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Spec {
    Variable(VariableSpec),
    /// A global instance, evaluated in the empty bag.
    External { name: InstanceName, id: SpecId },
    /// A nullary constructor value.
    Object { layout: LayoutId, data: Vec<f32> },
    Function(FunctionSpec),
    /// `operands[0]` applied to the rest. Every operand index is in exactly one of `call`,
    /// `constants` and `closures`; every argument index is in exactly one of `data` and
    /// `functions`.
    Application {
        operands: Vec<SpecId>,
        /// Evaluated in the current bag.
        call: Vec<usize>,
        /// Evaluated in the empty bag.
        constants: Vec<usize>,
        /// Function nodes, closed over the current bag.
        closures: Vec<usize>,
        /// Arguments supplying cells.
        data: Vec<usize>,
        /// Arguments supplying function slots.
        functions: Vec<usize>,
    },
}

/// Arena of every lowered node with its concrete type.
#[derive(Debug, Default)]
pub struct Specs {
    nodes: Vec<Option<(Spec, Type)>>,
}

impl Specs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn reserve_id(&mut self) -> SpecId {
        let id = SpecId(self.nodes.len() as u32);
        self.nodes.push(None);
        id
    }

    pub fn insert(&mut self, id: SpecId, spec: Spec, ty: Type) {
        let slot = &mut self.nodes[id.index()];
        debug_assert!(slot.is_none(), "{id:?} was filled twice");

        *slot = Some((spec, ty));
    }

    pub fn add(&mut self, spec: Spec, ty: Type) -> SpecId {
        let id = SpecId(self.nodes.len() as u32);
        self.nodes.push(Some((spec, ty)));
        id
    }

    pub fn get(&self, id: SpecId) -> &Spec {
        match &self.nodes[id.index()] {
            Some((spec, _)) => spec,
            None => internal_error!("{id:?} was reserved but never filled"),
        }
    }

    pub fn ty(&self, id: SpecId) -> &Type {
        match &self.nodes[id.index()] {
            Some((_, ty)) => ty,
            None => internal_error!("{id:?} was reserved but never filled"),
        }
    }

    pub fn is_filled(&self, id: SpecId) -> bool {
        matches!(self.nodes.get(id.index()), Some(Some(_)))
    }

    /// Multi-line rendering of the node tree under `id`. External instances are named, not
    /// expanded.
    pub fn render(&self, id: SpecId, types: &AlgebraicTypes, layouts: &Layouts) -> String {
        let mut buf = String::new();
        self.render_help(&mut buf, id, types, layouts, 0);
        buf
    }

    fn render_help(
        &self,
        buf: &mut String,
        id: SpecId,
        types: &AlgebraicTypes,
        layouts: &Layouts,
        indent: usize,
    ) {
        let pad = "    ".repeat(indent);
        let ty = types.display(self.ty(id));

        let _ = match self.get(id) {
            Spec::Variable(VariableSpec::Object {
                name, start, end, ..
            }) => writeln!(buf, "{pad}{name}[{start}..{end}] : {ty}"),
            Spec::Variable(VariableSpec::Function { name, position }) => {
                writeln!(buf, "{pad}{name}<{position}> : {ty}")
            }
            Spec::Variable(VariableSpec::Bound { name, .. }) => {
                writeln!(buf, "{pad}let {name} : {ty}")
            }
            Spec::External { name, .. } => writeln!(buf, "{pad}{name} : {ty}"),
            Spec::Object { data, .. } => writeln!(buf, "{pad}{data:?} : {ty}"),
            Spec::Function(function) => {
                match function {
                    FunctionSpec::Constructor { name, offset, .. } => {
                        writeln!(buf, "{pad}{name}@{offset} : {ty}")
                    }
                    FunctionSpec::Trainable {
                        name,
                        index,
                        input_size,
                        output,
                        ..
                    } => writeln!(
                        buf,
                        "{pad}@learn {name}#{index} [{input_size} -> {}] : {ty}",
                        layouts.size(*output)
                    ),
                    FunctionSpec::Guarded {
                        name,
                        cases,
                        closure_pointer,
                        ..
                    } => {
                        let label = name
                            .as_ref()
                            .map_or_else(|| "case".to_string(), ToString::to_string);
                        let _ = writeln!(
                            buf,
                            "{pad}{label} {} : {ty}",
                            render_pointer(*closure_pointer)
                        );
                        for case in cases {
                            let patterns: Vec<_> =
                                case.patterns.iter().map(render_pattern).collect();
                            let _ = writeln!(buf, "{pad}  | {} ->", patterns.join(" "));
                            self.render_help(buf, case.body, types, layouts, indent + 1);
                        }
                        Ok(())
                    }
                    FunctionSpec::Anonymous {
                        body,
                        closure_pointer,
                        ..
                    } => {
                        let _ = writeln!(buf, "{pad}\\ {} : {ty}", render_pointer(*closure_pointer));
                        self.render_help(buf, *body, types, layouts, indent + 1);
                        Ok(())
                    }
                    FunctionSpec::Recursive {
                        name,
                        body,
                        closure_pointer,
                        ..
                    } => {
                        let _ = writeln!(
                            buf,
                            "{pad}rec {name} {} : {ty}",
                            render_pointer(*closure_pointer)
                        );
                        self.render_help(buf, *body, types, layouts, indent + 1);
                        Ok(())
                    }
                }
            }
            Spec::Application { operands, .. } => {
                let _ = writeln!(buf, "{pad}apply : {ty}");
                for operand in operands {
                    self.render_help(buf, *operand, types, layouts, indent + 1);
                }
                Ok(())
            }
        };
    }
}

fn render_pointer(pointer: DataPointer) -> String {
    format!("<{}, {}>", pointer.data_offset, pointer.functions_count)
}

fn render_pattern(pattern: &DataPattern) -> String {
    match pattern {
        DataPattern::Object {
            constructor,
            position,
        } => format!("{constructor}@{position}"),
        DataPattern::Variable {
            name, start, end, ..
        } => format!("{name}[{start}..{end}]"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reserved_ids_are_filled_later() {
        let mut specs = Specs::new();
        let ty = Type::variable("a");

        let reserved = specs.reserve_id();
        let leaf = specs.add(
            Spec::Variable(VariableSpec::Function {
                name: "f".into(),
                position: 0,
            }),
            ty.clone(),
        );

        assert!(!specs.is_filled(reserved));
        specs.insert(
            reserved,
            Spec::Function(FunctionSpec::Anonymous {
                arity: 1,
                body: leaf,
                closure_pointer: DataPointer::START.with_function(),
            }),
            ty,
        );

        assert!(specs.is_filled(reserved));
        assert_eq!(
            specs.get(reserved),
            &Spec::Function(FunctionSpec::Anonymous {
                arity: 1,
                body: leaf,
                closure_pointer: DataPointer {
                    data_offset: 0,
                    functions_count: 1
                },
            })
        );
    }

    #[test]
    fn object_nodes_compare_by_cells() {
        let mut types = AlgebraicTypes::new();
        let bool_id = types.reserve("Bool".into(), vec![]);
        types.define(
            bool_id,
            vec![
                lnn_types::SumOperand::Object("True".into()),
                lnn_types::SumOperand::Object("False".into()),
            ],
            Default::default(),
        );
        let boolean = Type::Application(bool_id, vec![]);

        let mut layouts = Layouts::new();
        let layout = layouts.layout(&boolean, &types).unwrap();

        let mut specs = Specs::new();
        let truth = specs.add(
            Spec::Object {
                layout,
                data: layouts.encode(layout, "True", &[]).unwrap(),
            },
            boolean.clone(),
        );
        let falsity = specs.add(
            Spec::Object {
                layout,
                data: layouts.encode(layout, "False", &[]).unwrap(),
            },
            boolean,
        );

        assert_eq!(
            specs.get(truth),
            &Spec::Object {
                layout,
                data: vec![1.0, 0.0]
            }
        );
        assert_ne!(specs.get(truth), specs.get(falsity));
        assert_eq!(specs.render(falsity, &types, &layouts), "[0.0, 1.0] : Bool\n");
    }

    #[test]
    #[should_panic(expected = "never filled")]
    fn unfilled_ids_are_a_compiler_bug() {
        let mut specs = Specs::new();
        let id = specs.reserve_id();

        specs.get(id);
    }
}
