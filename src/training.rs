use std::sync::Arc;

use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::vision::MnistDataset,
    },
    module::AutodiffModule,
    nn::loss::Reduction,
    optim::{GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    record::CompactRecorder,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::{
    data::{MnistBatch, MnistBatcher},
    error::TrainingError,
    evaluation::{evaluate, EvaluationSummary},
    loss::nll_loss,
    model::{Classifier, ModelConfig},
    renderer::{ProgressRenderer, TrainingProgress},
};

#[derive(Config)]
pub struct TrainingConfig {
    pub model: ModelConfig,
    pub optimizer: SgdConfig,
    #[config(default = 10)]
    pub num_epochs: usize,
    #[config(default = 64)]
    pub batch_size: usize,
    #[config(default = 1000)]
    pub test_batch_size: usize,
    #[config(default = 1e-2)]
    pub learning_rate: f64,
    /// Batches between two progress lines.
    #[config(default = 10)]
    pub log_interval: usize,
    #[config(default = 1)]
    pub num_workers: usize,
    #[config(default = 42)]
    pub seed: u64,
    /// Run on the GPU backend when the binary is built with one.
    #[config(default = false)]
    pub use_accelerator: bool,
}

impl TrainingConfig {
    /// Checks the values that would otherwise fail deep inside the run.
    pub fn validate(&self) -> Result<(), TrainingError> {
        let invalid = |message: &str| Err(TrainingError::InvalidConfig(message.to_string()));

        if self.num_epochs == 0 {
            return invalid("num_epochs must be at least 1");
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1");
        }
        if self.test_batch_size == 0 {
            return invalid("test_batch_size must be at least 1");
        }
        if self.log_interval == 0 {
            return invalid("log_interval must be at least 1");
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid("learning_rate must be a positive number");
        }

        Ok(())
    }
}

/// Loss and accuracy recorded after one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: usize,
    /// Mean of the training batch losses.
    pub train_loss: f64,
    /// Average test loss per sample.
    pub test_loss: f64,
    pub correct: usize,
    pub total: usize,
    /// Test accuracy as a percentage.
    pub accuracy: f64,
}

impl EpochSummary {
    fn new(epoch: usize, train_loss: f64, evaluation: &EvaluationSummary) -> Self {
        Self {
            epoch,
            train_loss,
            test_loss: evaluation.average_loss(),
            correct: evaluation.correct,
            total: evaluation.total,
            accuracy: evaluation.accuracy(),
        }
    }
}

#[derive(Config)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochSummary>,
}

impl TrainingHistory {
    /// Test accuracy after the last epoch, as a percentage.
    pub fn final_accuracy(&self) -> Option<f64> {
        self.epochs.last().map(|epoch| epoch.accuracy)
    }
}

/// Trains a classifier on MNIST and writes the artifacts to `artifact_dir`.
///
/// The directory receives `config.json` before training starts, then the model
/// record (`model.mpk`) and `history.json` once every epoch completed.
pub fn train<B: AutodiffBackend>(
    artifact_dir: &str,
    config: TrainingConfig,
    device: B::Device,
    renderer: &mut dyn ProgressRenderer,
) -> Result<Classifier<B>, TrainingError> {
    config.validate()?;

    std::fs::create_dir_all(artifact_dir)?;
    config.save(format!("{artifact_dir}/config.json"))?;

    B::seed(config.seed);

    let batcher = MnistBatcher::default();

    let dataloader_train: Arc<dyn DataLoader<B, MnistBatch<B>>> =
        DataLoaderBuilder::new(batcher.clone())
            .batch_size(config.batch_size)
            .shuffle(config.seed)
            .num_workers(config.num_workers)
            .set_device(device.clone())
            .build(MnistDataset::train());

    let dataloader_test: Arc<dyn DataLoader<B::InnerBackend, MnistBatch<B::InnerBackend>>> =
        DataLoaderBuilder::new(batcher)
            .batch_size(config.test_batch_size)
            .num_workers(config.num_workers)
            .set_device(device.clone())
            .build(MnistDataset::test());

    let model = config.model.init::<B>(&device);
    log::info!(
        "Training {:?} ({} parameters) for {} epochs on {} samples",
        config.model.architecture,
        model.num_params(),
        config.num_epochs,
        dataloader_train.num_items()
    );

    let (model, history) = fit(&config, model, dataloader_train, dataloader_test, renderer)?;

    model
        .clone()
        .save_file(format!("{artifact_dir}/model"), &CompactRecorder::new())?;
    history.save(format!("{artifact_dir}/history.json"))?;

    if let Some(accuracy) = history.final_accuracy() {
        log::info!("Final test accuracy {accuracy:.2}%, artifacts saved to {artifact_dir}");
    }

    Ok(model)
}

/// Runs the epochs: one pass over the training split, then one evaluation of
/// the test split.
pub fn fit<B: AutodiffBackend>(
    config: &TrainingConfig,
    mut model: Classifier<B>,
    dataloader_train: Arc<dyn DataLoader<B, MnistBatch<B>>>,
    dataloader_test: Arc<dyn DataLoader<B::InnerBackend, MnistBatch<B::InnerBackend>>>,
    renderer: &mut dyn ProgressRenderer,
) -> Result<(Classifier<B>, TrainingHistory), TrainingError> {
    config.validate()?;

    let mut optim = config.optimizer.init::<B, Classifier<B>>();
    let mut epochs = Vec::with_capacity(config.num_epochs);

    for epoch in 1..config.num_epochs + 1 {
        let (trained, train_loss) = train_epoch(
            epoch,
            config,
            model,
            &mut optim,
            dataloader_train.as_ref(),
            renderer,
        )?;
        model = trained;

        let summary = evaluate(&model.valid(), dataloader_test.as_ref());
        if summary.total == 0 {
            return Err(TrainingError::EmptyDataset);
        }
        renderer.render_evaluation(epoch, &summary);
        log::info!(
            "Epoch {epoch}/{} done, test accuracy {:.2}%",
            config.num_epochs,
            summary.accuracy()
        );

        epochs.push(EpochSummary::new(epoch, train_loss, &summary));
    }

    Ok((model, TrainingHistory::new(epochs)))
}

/// One pass over the training split. Returns the updated model and the mean of
/// the batch losses.
fn train_epoch<B, O>(
    epoch: usize,
    config: &TrainingConfig,
    mut model: Classifier<B>,
    optim: &mut O,
    dataloader: &dyn DataLoader<B, MnistBatch<B>>,
    renderer: &mut dyn ProgressRenderer,
) -> Result<(Classifier<B>, f64), TrainingError>
where
    B: AutodiffBackend,
    O: Optimizer<Classifier<B>, B>,
{
    let items_total = dataloader.num_items();
    let num_iterations = items_total.div_ceil(config.batch_size);
    let mut loss_sum = 0.0;
    let mut num_batches = 0;

    for (iteration, batch) in dataloader.iter().enumerate() {
        let (updated, loss) = train_step(model, optim, batch, config.learning_rate);
        model = updated;
        let loss = check_loss(loss, epoch, iteration)?;

        loss_sum += loss;
        num_batches += 1;

        if iteration % config.log_interval == 0 {
            renderer.render_train(&TrainingProgress {
                epoch,
                iteration,
                items_processed: iteration * config.batch_size,
                items_total,
                num_iterations,
                loss,
            });
        }
    }

    let mean_loss = if num_batches == 0 {
        0.0
    } else {
        loss_sum / num_batches as f64
    };

    Ok((model, mean_loss))
}

/// Forward pass, mean NLL loss, backward pass and one optimizer step.
///
/// Gradients come from a fresh backward pass, nothing is accumulated across
/// steps. Returns the updated model and the batch loss.
pub fn train_step<B, O>(
    model: Classifier<B>,
    optim: &mut O,
    batch: MnistBatch<B>,
    learning_rate: f64,
) -> (Classifier<B>, f64)
where
    B: AutodiffBackend,
    O: Optimizer<Classifier<B>, B>,
{
    let output = model.forward(batch.images);
    let loss = nll_loss(output, batch.targets, Reduction::Mean);
    let loss_value = loss.clone().into_scalar().elem::<f64>();

    // Gradients for the current backward pass, linked to each parameter.
    let grads = GradientsParams::from_grads(loss.backward(), &model);
    let model = optim.step(learning_rate, model, grads);

    (model, loss_value)
}

fn check_loss(loss: f64, epoch: usize, iteration: usize) -> Result<f64, TrainingError> {
    if loss.is_finite() {
        Ok(loss)
    } else {
        Err(TrainingError::NonFiniteLoss { epoch, iteration })
    }
}
