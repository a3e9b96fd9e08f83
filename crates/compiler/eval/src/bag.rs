//! Runtime values: flat cells, closures, and the argument bag a function body runs on.
use lnn_mono::ir::{DataPointer, FunctionSpec};
use std::rc::Rc;

use crate::error::RuntimeError;

#[derive(Clone, Debug)]
pub enum EvalResult<'a> {
    Data(Vec<f32>),
    Function(Rc<Closure<'a>>),
}

impl<'a> EvalResult<'a> {
    pub fn as_data(&self) -> Option<&[f32]> {
        match self {
            EvalResult::Data(cells) => Some(cells),
            EvalResult::Function(_) => None,
        }
    }

    pub fn into_data(self) -> Result<Vec<f32>, RuntimeError> {
        match self {
            EvalResult::Data(cells) => Ok(cells),
            EvalResult::Function(_) => Err(RuntimeError::NotData),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, EvalResult::Function(_))
    }
}

/// A function value: the bag prefix it was created in, and the arguments it was partially
/// applied to so far.
#[derive(Debug)]
pub struct Closure<'a> {
    pub function: &'a FunctionSpec,
    pub captured: DataBag<'a>,
    pub supplied: Vec<EvalResult<'a>>,
}

/// Cells and function slots, each in the order they were bound.
#[derive(Clone, Debug, Default)]
pub struct DataBag<'a> {
    pub data: Vec<f32>,
    pub functions: Vec<Rc<Closure<'a>>>,
}

impl<'a> DataBag<'a> {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The part of the bag that was bound before `pointer`.
    pub fn arguments_before(&self, pointer: DataPointer) -> DataBag<'a> {
        debug_assert!(pointer.data_offset <= self.data.len());
        debug_assert!(pointer.functions_count <= self.functions.len());

        DataBag {
            data: self.data[..pointer.data_offset].to_vec(),
            functions: self.functions[..pointer.functions_count].to_vec(),
        }
    }

    pub fn push(&mut self, value: EvalResult<'a>) {
        match value {
            EvalResult::Data(cells) => self.data.extend(cells),
            EvalResult::Function(closure) => self.functions.push(closure),
        }
    }

    pub fn pointer(&self) -> DataPointer {
        DataPointer {
            data_offset: self.data.len(),
            functions_count: self.functions.len(),
        }
    }
}
