use crate::evaluation::EvaluationSummary;

/// Progress of the training loop within one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingProgress {
    /// The epoch, starting at 1.
    pub epoch: usize,
    /// The batch index within the epoch, starting at 0.
    pub iteration: usize,
    /// Samples processed before this batch.
    pub items_processed: usize,
    /// Samples in the training split.
    pub items_total: usize,
    /// Batches in the training split.
    pub num_iterations: usize,
    /// Mean loss of the current batch.
    pub loss: f64,
}

impl TrainingProgress {
    /// Percentage of the epoch's batches already processed.
    pub fn percent(&self) -> f64 {
        if self.num_iterations == 0 {
            return 0.0;
        }
        100.0 * self.iteration as f64 / self.num_iterations as f64
    }
}

/// Trait for rendering training progress and evaluation results.
pub trait ProgressRenderer {
    /// Renders the training progress.
    ///
    /// # Arguments
    ///
    /// * `item` - The training progress.
    fn render_train(&mut self, item: &TrainingProgress);

    /// Renders the evaluation summary of an epoch.
    ///
    /// # Arguments
    ///
    /// * `epoch` - The epoch that was just evaluated.
    /// * `summary` - The evaluation summary.
    fn render_evaluation(&mut self, epoch: usize, summary: &EvaluationSummary);
}

/// Prints progress lines to standard output.
#[derive(Default)]
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressRenderer for ConsoleRenderer {
    fn render_train(&mut self, item: &TrainingProgress) {
        println!("{}", format_train(item));
    }

    fn render_evaluation(&mut self, _epoch: usize, summary: &EvaluationSummary) {
        println!("\n{}\n", format_evaluation(summary));
    }
}

/// `Train Epoch: 1 [640/60000 (1%)]\tLoss: 0.512345`
pub fn format_train(item: &TrainingProgress) -> String {
    format!(
        "Train Epoch: {} [{}/{} ({:.0}%)]\tLoss: {:.6}",
        item.epoch,
        item.items_processed,
        item.items_total,
        item.percent(),
        item.loss
    )
}

/// `Test set: Average loss: 0.1234, Accuracy: 9612/10000 (96%)`
pub fn format_evaluation(summary: &EvaluationSummary) -> String {
    format!(
        "Test set: Average loss: {:.4}, Accuracy: {}/{} ({:.0}%)",
        summary.average_loss(),
        summary.correct,
        summary.total,
        summary.accuracy()
    )
}
