//! Lowering of structural patterns into guards over flat offsets.
use lnn_ast::LambdaName;
use lnn_error_macros::internal_error;
use lnn_solve::TypedPattern;
use lnn_types::{AlgebraicTypes, Type};

use crate::ir::{DataPattern, DataPointer};
use crate::layout::{LayoutId, Layouts};
use crate::problem::MonoProblem;

/// Where a bound name lives in the argument bag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Data {
        layout: LayoutId,
        start: usize,
        end: usize,
    },
    Function(usize),
}

#[derive(Debug, Default, PartialEq)]
pub struct CompiledPatterns {
    pub patterns: Vec<DataPattern>,
    pub bindings: Vec<(LambdaName, Slot)>,
    /// Just past the last argument.
    pub pointer: DataPointer,
}

/// Lays the arguments of one case out after `pointer`: a data argument takes the cells of its
/// layout, a function argument takes the next function slot.
pub fn compile_patterns(
    patterns: &[TypedPattern],
    argument_types: &[&Type],
    pointer: DataPointer,
    types: &AlgebraicTypes,
    layouts: &mut Layouts,
) -> Result<CompiledPatterns, MonoProblem> {
    debug_assert_eq!(patterns.len(), argument_types.len());

    let mut compiled = CompiledPatterns {
        pointer,
        ..Default::default()
    };

    for (pattern, ty) in patterns.iter().zip(argument_types) {
        if ty.is_function() {
            match pattern {
                TypedPattern::Variable { name, .. } => {
                    let position = compiled.pointer.functions_count;
                    compiled
                        .bindings
                        .push((name.clone(), Slot::Function(position)));
                    compiled.pointer = compiled.pointer.with_function();
                }
                _ => internal_error!("a constructor pattern was inferred with a function type"),
            }
            continue;
        }

        let layout = layouts.layout(ty, types)?;
        let start = compiled.pointer.data_offset;

        compile_data_pattern(pattern, layout, start, layouts, &mut compiled)?;
        compiled.pointer = compiled.pointer.with_data(layouts.size(layout));
    }

    Ok(compiled)
}

fn compile_data_pattern(
    pattern: &TypedPattern,
    layout: LayoutId,
    start: usize,
    layouts: &Layouts,
    compiled: &mut CompiledPatterns,
) -> Result<(), MonoProblem> {
    match pattern {
        TypedPattern::Variable { name, .. } => {
            let end = start + layouts.size(layout);

            compiled
                .bindings
                .push((name.clone(), Slot::Data { layout, start, end }));
            compiled.patterns.push(DataPattern::Variable {
                name: name.clone(),
                type_name: layouts.get(layout).name.clone(),
                layout,
                start,
                end,
            });
        }
        TypedPattern::Object { name, .. } => {
            let info = layouts
                .get(layout)
                .constructor(name)
                .ok_or_else(|| MonoProblem::UnknownType(name.clone()))?;

            compiled.patterns.push(DataPattern::Object {
                constructor: name.clone(),
                position: start + info.start,
            });
        }
        TypedPattern::Constructor {
            name, arguments, ..
        } => {
            let info = layouts
                .get(layout)
                .constructor(name)
                .ok_or_else(|| MonoProblem::UnknownType(name.clone()))?;
            let mut offset = start + info.start;

            for (argument, argument_layout) in arguments.iter().zip(info.arguments.clone()) {
                compile_data_pattern(argument, argument_layout, offset, layouts, compiled)?;
                offset += layouts.size(argument_layout);
            }
        }
    }

    Ok(())
}
