use std::process::ExitCode;

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    optim::SgdConfig,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mnist_classifier::{
    inference::infer,
    logging::install_logger,
    model::{Architecture, ModelConfig},
    renderer::ConsoleRenderer,
    training::{train, TrainingConfig},
    TrainingError,
};

const DEFAULT_ARTIFACT_DIR: &str = "/tmp/mnist-classifier";

/// Trains and evaluates small MNIST digit classifiers.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trains a new model and saves it to the artifact directory.
    Train(TrainArgs),
    /// Classifies one test image with a trained model.
    Infer {
        #[arg(long, default_value = DEFAULT_ARTIFACT_DIR)]
        artifact_dir: String,
        /// Index of the image in the test split.
        #[arg(long)]
        index: usize,
        #[arg(long)]
        use_accelerator: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ArchitectureArg {
    Mlp,
    ConvNet,
}

#[derive(Args, Debug)]
struct TrainArgs {
    #[arg(short, long, value_enum, default_value_t = ArchitectureArg::Mlp)]
    architecture: ArchitectureArg,
    #[arg(short, long, default_value_t = 10)]
    epochs: usize,
    #[arg(short, long, default_value_t = 64)]
    batch_size: usize,
    #[arg(long, default_value_t = 1000)]
    test_batch_size: usize,
    #[arg(short, long, default_value_t = 0.01)]
    learning_rate: f64,
    /// Batches between two progress lines.
    #[arg(long, default_value_t = 10)]
    log_interval: usize,
    #[arg(long, default_value_t = 1)]
    num_workers: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Train on the GPU when the binary is built with the `wgpu` feature.
    #[arg(long)]
    use_accelerator: bool,
    #[arg(long, default_value = DEFAULT_ARTIFACT_DIR)]
    artifact_dir: String,
}

impl TrainArgs {
    fn config(&self) -> TrainingConfig {
        let architecture = match self.architecture {
            ArchitectureArg::Mlp => Architecture::Mlp,
            ArchitectureArg::ConvNet => Architecture::ConvNet,
        };

        TrainingConfig::new(
            ModelConfig::new().with_architecture(architecture),
            SgdConfig::new(),
        )
        .with_num_epochs(self.epochs)
        .with_batch_size(self.batch_size)
        .with_test_batch_size(self.test_batch_size)
        .with_learning_rate(self.learning_rate)
        .with_log_interval(self.log_interval)
        .with_num_workers(self.num_workers)
        .with_seed(self.seed)
        .with_use_accelerator(self.use_accelerator)
    }
}

#[cfg(feature = "wgpu")]
mod accelerated {
    use burn::backend::{wgpu::WgpuDevice, Autodiff, Wgpu};
    use mnist_classifier::{
        inference::infer, renderer::ConsoleRenderer, training::train, training::TrainingConfig,
        TrainingError,
    };

    pub fn run_train(artifact_dir: &str, config: TrainingConfig) -> Result<(), TrainingError> {
        let device = WgpuDevice::default();
        train::<Autodiff<Wgpu>>(artifact_dir, config, device, &mut ConsoleRenderer::new())?;
        Ok(())
    }

    pub fn run_infer(artifact_dir: &str, index: usize) -> Result<(usize, u8), TrainingError> {
        infer::<Wgpu>(artifact_dir, WgpuDevice::default(), index)
    }
}

#[cfg(not(feature = "wgpu"))]
mod accelerated {
    use mnist_classifier::{training::TrainingConfig, TrainingError};

    pub fn run_train(artifact_dir: &str, config: TrainingConfig) -> Result<(), TrainingError> {
        log::warn!("Built without an accelerator backend, training on the CPU.");
        super::run_train_cpu(artifact_dir, config)
    }

    pub fn run_infer(artifact_dir: &str, index: usize) -> Result<(usize, u8), TrainingError> {
        log::warn!("Built without an accelerator backend, running on the CPU.");
        super::run_infer_cpu(artifact_dir, index)
    }
}

fn run_train_cpu(artifact_dir: &str, config: TrainingConfig) -> Result<(), TrainingError> {
    let device = NdArrayDevice::Cpu;
    train::<Autodiff<NdArray>>(artifact_dir, config, device, &mut ConsoleRenderer::new())?;
    Ok(())
}

fn run_infer_cpu(artifact_dir: &str, index: usize) -> Result<(usize, u8), TrainingError> {
    infer::<NdArray>(artifact_dir, NdArrayDevice::Cpu, index)
}

fn run(cli: Cli) -> Result<(), TrainingError> {
    match cli.command {
        Command::Train(args) => {
            let config = args.config();
            if config.use_accelerator {
                accelerated::run_train(&args.artifact_dir, config)
            } else {
                run_train_cpu(&args.artifact_dir, config)
            }
        }
        Command::Infer {
            artifact_dir,
            index,
            use_accelerator,
        } => {
            let (predicted, expected) = if use_accelerator {
                accelerated::run_infer(&artifact_dir, index)?
            } else {
                run_infer_cpu(&artifact_dir, index)?
            };
            println!("Predicted {predicted} Expected {expected}");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    install_logger();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_the_config_defaults() {
        let cli = Cli::parse_from(["mnist-classifier", "train"]);
        let Command::Train(args) = cli.command else {
            panic!("expected the train command");
        };

        let config = args.config();
        assert_eq!(config.model.architecture, Architecture::Mlp);
        assert_eq!(config.num_epochs, 10);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.learning_rate, 1e-2);
        assert_eq!(config.log_interval, 10);
        assert!(!config.use_accelerator);
        assert_eq!(args.artifact_dir, DEFAULT_ARTIFACT_DIR);
    }

    #[test]
    fn parses_train_options() {
        let cli = Cli::parse_from([
            "mnist-classifier",
            "train",
            "--architecture",
            "conv-net",
            "--epochs",
            "3",
            "--learning-rate",
            "0.05",
            "--use-accelerator",
        ]);
        let Command::Train(args) = cli.command else {
            panic!("expected the train command");
        };

        let config = args.config();
        assert_eq!(config.model.architecture, Architecture::ConvNet);
        assert_eq!(config.num_epochs, 3);
        assert_eq!(config.learning_rate, 0.05);
        assert!(config.use_accelerator);
    }

    #[test]
    fn parses_infer() {
        let cli = Cli::parse_from(["mnist-classifier", "infer", "--index", "12"]);

        assert!(matches!(
            cli.command,
            Command::Infer { index: 12, use_accelerator: false, .. }
        ));
    }
}
