use burn::{
    data::{
        dataloader::batcher::Batcher,
        dataset::{
            vision::{MnistDataset, MnistItem},
            Dataset,
        },
    },
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::{
    data::{MnistBatch, MnistBatcher},
    error::TrainingError,
    loss::predicted_classes,
    model::Classifier,
    training::TrainingConfig,
};

/// Rebuilds the classifier saved by [train](crate::training::train) in
/// `artifact_dir`.
pub fn load_model<B: Backend>(
    artifact_dir: &str,
    device: &B::Device,
) -> Result<Classifier<B>, TrainingError> {
    let config = TrainingConfig::load(format!("{artifact_dir}/config.json"))?;
    let record = CompactRecorder::new().load(format!("{artifact_dir}/model").into(), device)?;

    Ok(config.model.init::<B>(device).load_record(record))
}

/// Predicted digit for a single image.
pub fn classify<B: Backend>(model: &Classifier<B>, item: MnistItem, device: &B::Device) -> usize {
    let batch: MnistBatch<B> = MnistBatcher::default().batch(vec![item], device);
    let predicted = predicted_classes(model.forward(batch.images)).into_scalar();

    predicted.elem::<i64>() as usize
}

/// Classifies the test-split image at `index` with the model saved in
/// `artifact_dir`. Returns the predicted and the expected digit.
pub fn infer<B: Backend>(
    artifact_dir: &str,
    device: B::Device,
    index: usize,
) -> Result<(usize, u8), TrainingError> {
    let model = load_model::<B>(artifact_dir, &device)?;

    let dataset = MnistDataset::test();
    let item = dataset.get(index).ok_or(TrainingError::IndexOutOfRange {
        index,
        len: dataset.len(),
    })?;

    let expected = item.label;
    let predicted = classify(&model, item, &device);
    log::info!("Test image {index}: predicted {predicted}, expected {expected}");

    Ok((predicted, expected))
}
