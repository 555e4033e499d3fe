use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Linear, LinearConfig, Relu,
    },
    prelude::*,
    tensor::activation::log_softmax,
};

use super::NUM_CLASSES;
use crate::data::IMAGE_SIZE;

/// Configuration to create a [convolutional network](ConvNet).
///
/// Both convolutions use the same kernel size and stride with no padding, so
/// each one maps a side of `n` pixels to `(n - kernel_size) / stride + 1`.
#[derive(Config, Debug)]
pub struct ConvNetConfig {
    /// Output channels of both convolutions.
    #[config(default = 32)]
    pub channels: usize,
    #[config(default = 3)]
    pub kernel_size: usize,
    #[config(default = 2)]
    pub stride: usize,
}

/// Two strided convolutions followed by a single fully-connected layer.
///
/// Downsampling comes from the convolution stride, there is no pooling layer.
#[derive(Module, Debug)]
pub struct ConvNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    fc: Linear<B>,
    activation: Relu,
}

impl ConvNetConfig {
    /// Side length of the feature maps after both convolutions.
    pub fn feature_size(&self) -> usize {
        let once = (IMAGE_SIZE - self.kernel_size) / self.stride + 1;
        (once - self.kernel_size) / self.stride + 1
    }

    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvNet<B> {
        let kernel = [self.kernel_size, self.kernel_size];
        let stride = [self.stride, self.stride];
        let feature_size = self.feature_size();

        ConvNet {
            conv1: Conv2dConfig::new([1, self.channels], kernel)
                .with_stride(stride)
                .init(device),
            conv2: Conv2dConfig::new([self.channels, self.channels], kernel)
                .with_stride(stride)
                .init(device),
            fc: LinearConfig::new(self.channels * feature_size * feature_size, NUM_CLASSES)
                .init(device),
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> ConvNet<B> {
    /// Feature maps before flattening.
    ///
    /// # Shapes
    ///
    /// - images: `[batch_size, 1, 28, 28]`
    /// - output: `[batch_size, channels, 6, 6]`
    pub fn features(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.activation.forward(self.conv1.forward(images));
        self.activation.forward(self.conv2.forward(x))
    }

    /// # Shapes
    ///
    /// - images: `[batch_size, 1, 28, 28]`
    /// - output: `[batch_size, 10]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x: Tensor<B, 2> = self.features(images).flatten(1, 3);
        let x = self.fc.forward(x);

        log_softmax(x, 1)
    }
}
