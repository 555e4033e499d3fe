use burn::{
    data::{dataloader::batcher::Batcher, dataset::vision::MnistItem},
    prelude::*,
};

/// Width and height of an MNIST image.
pub const IMAGE_SIZE: usize = 28;

/// Mean of the MNIST training pixels, scaled to [0, 1].
pub const MNIST_MEAN: f32 = 0.1307;

/// Standard deviation of the MNIST training pixels, scaled to [0, 1].
pub const MNIST_STD: f32 = 0.3081;

#[derive(Clone, Default)]
pub struct MnistBatcher {}

#[derive(Clone, Debug)]
pub struct MnistBatch<B: Backend> {
    /// Normalized images, `[batch_size, 1, 28, 28]`.
    pub images: Tensor<B, 4>,
    /// Class labels, `[batch_size]`.
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> MnistBatch<B> {
    /// Number of samples in the batch. The last batch of a split may be smaller.
    pub fn len(&self) -> usize {
        let [batch_size] = self.targets.dims();
        batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<B: Backend> Batcher<B, MnistItem, MnistBatch<B>> for MnistBatcher {
    fn batch(&self, items: Vec<MnistItem>, device: &B::Device) -> MnistBatch<B> {
        let images = items
            .iter()
            .map(|item| TensorData::from(item.image).convert::<B::FloatElem>())
            .map(|data| Tensor::<B, 2>::from_data(data, device))
            .map(|tensor| tensor.reshape([1, 1, IMAGE_SIZE, IMAGE_SIZE]))
            // Scale to [0, 1], then standardize with the dataset statistics.
            .map(|tensor| ((tensor / 255) - MNIST_MEAN) / MNIST_STD)
            .collect();

        let targets = items
            .iter()
            .map(|item| {
                Tensor::<B, 1, Int>::from_data(
                    [(item.label as i64).elem::<B::IntElem>()],
                    device,
                )
            })
            .collect();

        let images = Tensor::cat(images, 0);
        let targets = Tensor::cat(targets, 0);

        MnistBatch { images, targets }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::TestBackend;

    /// Builds a synthetic item whose only bright pixels form a horizontal band
    /// chosen by the label, so the classes are trivially separable.
    pub(crate) fn banded_item(label: u8) -> MnistItem {
        let mut image = [[0f32; IMAGE_SIZE]; IMAGE_SIZE];
        let row = 2 + 2 * label as usize;
        for column in 4..IMAGE_SIZE - 4 {
            image[row][column] = 255.0;
            image[row + 1][column] = 255.0;
        }

        MnistItem { image, label }
    }

    #[test]
    fn batch_has_image_and_label_shapes() {
        let device = Default::default();
        let items = (0..7).map(|label| banded_item(label % 10)).collect();

        let batch: MnistBatch<TestBackend> = MnistBatcher::default().batch(items, &device);

        assert_eq!(batch.images.dims(), [7, 1, IMAGE_SIZE, IMAGE_SIZE]);
        assert_eq!(batch.targets.dims(), [7]);
        assert_eq!(batch.len(), 7);
        assert_eq!(
            batch.targets.into_data().to_vec::<i64>().unwrap(),
            vec![0, 1, 2, 3, 4, 5, 6]
        );
    }

    #[test]
    fn batch_normalizes_pixels() {
        let device = Default::default();
        let items = vec![banded_item(0)];

        let batch: MnistBatch<TestBackend> = MnistBatcher::default().batch(items, &device);
        let pixels = batch.images.into_data().to_vec::<f32>().unwrap();

        let background = (0.0 - MNIST_MEAN) / MNIST_STD;
        let foreground = (1.0 - MNIST_MEAN) / MNIST_STD;
        // Row 0 is background, row 2 column 4 is in the band of label 0.
        assert!((pixels[0] - background).abs() < 1e-5);
        assert!((pixels[2 * IMAGE_SIZE + 4] - foreground).abs() < 1e-5);
    }
}
