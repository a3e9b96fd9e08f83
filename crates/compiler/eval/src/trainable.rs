use lnn_types::InstanceName;

/// Computes the output cells of a trainable.
///
/// A trainable is identified by the instance it is written in and its position among that
/// instance's trainables. `input` is the concatenation of all of its arguments.
pub trait TrainableBackend {
    fn run(&self, name: &InstanceName, index: usize, input: &[f32], output_size: usize)
        -> Vec<f32>;
}

/// Answers every trainable with absent cells.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroTrainable;

impl TrainableBackend for ZeroTrainable {
    fn run(&self, _: &InstanceName, _: usize, _: &[f32], output_size: usize) -> Vec<f32> {
        vec![0.0; output_size]
    }
}
