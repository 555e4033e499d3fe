use burn::{data::dataloader::DataLoader, nn::loss::Reduction, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    data::MnistBatch,
    loss::{nll_loss, num_correct},
    model::Classifier,
};

/// Loss and accuracy accumulated over a whole split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Sum of the per-sample negative log-likelihoods.
    pub loss_sum: f64,
    /// Number of correctly classified samples.
    pub correct: usize,
    /// Number of evaluated samples.
    pub total: usize,
}

impl EvaluationSummary {
    pub fn average_loss(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.loss_sum / self.total as f64
    }

    /// Accuracy as a percentage.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * self.correct as f64 / self.total as f64
    }
}

/// Evaluates the model over every batch of the dataloader.
///
/// The model is only read: pass the inference view (`model.valid()`) of an
/// autodiff model so no graph is recorded.
pub fn evaluate<B: Backend>(
    model: &Classifier<B>,
    dataloader: &dyn DataLoader<B, MnistBatch<B>>,
) -> EvaluationSummary {
    let mut summary = EvaluationSummary {
        loss_sum: 0.0,
        correct: 0,
        total: 0,
    };

    for batch in dataloader.iter() {
        let batch_size = batch.len();
        let output = model.forward(batch.images);

        let loss = nll_loss(output.clone(), batch.targets.clone(), Reduction::Sum);
        summary.loss_sum += loss.into_scalar().elem::<f64>();
        summary.correct += num_correct(output, batch.targets);
        summary.total += batch_size;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{tests::banded_item, MnistBatcher},
        model::{Architecture, ModelConfig},
        TestBackend,
    };
    use burn::data::{dataloader::DataLoaderBuilder, dataset::InMemDataset};
    use std::sync::Arc;

    fn dataloader(
        num_items: usize,
        batch_size: usize,
    ) -> Arc<dyn DataLoader<TestBackend, MnistBatch<TestBackend>>> {
        let items = (0..num_items).map(|i| banded_item((i % 10) as u8)).collect();

        DataLoaderBuilder::new(MnistBatcher::default())
            .batch_size(batch_size)
            .build(InMemDataset::new(items))
    }

    #[test]
    fn counts_every_sample_including_the_last_partial_batch() {
        let device = Default::default();
        let model = ModelConfig::new().init::<TestBackend>(&device);

        let summary = evaluate(&model, dataloader(23, 5).as_ref());

        assert_eq!(summary.total, 23);
        assert!(summary.correct <= 23);
        assert!(summary.loss_sum.is_finite() && summary.loss_sum > 0.0);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let device = Default::default();
        let loader = dataloader(30, 8);

        for architecture in [Architecture::Mlp, Architecture::ConvNet] {
            let model = ModelConfig::new()
                .with_architecture(architecture)
                .init::<TestBackend>(&device);

            let first = evaluate(&model, loader.as_ref());
            let second = evaluate(&model, loader.as_ref());

            assert_eq!(first, second);
            assert_eq!(first.average_loss(), second.average_loss());
            assert_eq!(first.accuracy(), second.accuracy());
        }
    }

    #[test]
    fn averages_divide_by_sample_count() {
        let summary = EvaluationSummary {
            loss_sum: 5.0,
            correct: 3,
            total: 4,
        };

        assert_eq!(summary.average_loss(), 1.25);
        assert_eq!(summary.accuracy(), 75.0);
    }
}
