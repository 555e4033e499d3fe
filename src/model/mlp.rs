use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
    tensor::activation::log_softmax,
};

use super::NUM_CLASSES;
use crate::data::IMAGE_SIZE;

/// Configuration to create a [multilayer perceptron](Mlp).
#[derive(Config, Debug)]
pub struct MlpConfig {
    /// Size of the first hidden layer.
    #[config(default = 128)]
    pub d_hidden_1: usize,
    /// Size of the second hidden layer.
    #[config(default = 32)]
    pub d_hidden_2: usize,
}

/// Three fully-connected layers over the flattened image.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    activation: Relu,
}

impl MlpConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        Mlp {
            fc1: LinearConfig::new(IMAGE_SIZE * IMAGE_SIZE, self.d_hidden_1).init(device),
            fc2: LinearConfig::new(self.d_hidden_1, self.d_hidden_2).init(device),
            fc3: LinearConfig::new(self.d_hidden_2, NUM_CLASSES).init(device),
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> Mlp<B> {
    /// # Shapes
    ///
    /// - images: `[batch_size, 1, 28, 28]`
    /// - output: `[batch_size, 10]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x: Tensor<B, 2> = images.flatten(1, 3);

        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.activation.forward(self.fc2.forward(x));
        let x = self.fc3.forward(x);

        log_softmax(x, 1)
    }
}
