mod conv;
mod mlp;

pub use conv::*;
pub use mlp::*;

use burn::prelude::*;

/// Number of digit classes.
pub const NUM_CLASSES: usize = 10;

/// Network variant to train.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum Architecture {
    /// Fully-connected layers over the flattened image.
    Mlp,
    /// Strided convolutions followed by a fully-connected layer.
    ConvNet,
}

#[derive(Config, Debug)]
pub struct ModelConfig {
    #[config(default = "Architecture::Mlp")]
    pub architecture: Architecture,
    #[config(default = "MlpConfig::new()")]
    pub mlp: MlpConfig,
    #[config(default = "ConvNetConfig::new()")]
    pub conv_net: ConvNetConfig,
}

/// A digit classifier, either of the two supported networks.
///
/// Both variants map `[batch_size, 1, 28, 28]` images to `[batch_size, 10]`
/// log-probabilities.
#[derive(Module, Debug)]
pub enum Classifier<B: Backend> {
    Mlp(Mlp<B>),
    ConvNet(ConvNet<B>),
}

impl ModelConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Classifier<B> {
        match self.architecture {
            Architecture::Mlp => Classifier::Mlp(self.mlp.init(device)),
            Architecture::ConvNet => Classifier::ConvNet(self.conv_net.init(device)),
        }
    }
}

impl<B: Backend> Classifier<B> {
    /// # Shapes
    ///
    /// - images: `[batch_size, 1, 28, 28]`
    /// - output: `[batch_size, 10]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        match self {
            Classifier::Mlp(model) => model.forward(images),
            Classifier::ConvNet(model) => model.forward(images),
        }
    }
}
