#![recursion_limit = "256"]

//! Handwritten digit classification on MNIST with two small networks, an MLP
//! and a strided ConvNet, trained with plain SGD.

pub mod data;
pub mod error;
pub mod evaluation;
pub mod inference;
pub mod logging;
pub mod loss;
pub mod model;
pub mod renderer;
pub mod training;

pub use error::TrainingError;

/// Backend for test cases
#[cfg(test)]
pub(crate) type TestBackend = burn::backend::NdArray<f32>;

/// Backend for autodiff test cases
#[cfg(test)]
pub(crate) type TestAutodiffBackend = burn::backend::Autodiff<TestBackend>;
