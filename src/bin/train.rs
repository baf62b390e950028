//! Command line tool to run the full training pipeline

use burn::backend::{libtorch::LibTorchDevice, Autodiff, LibTorch};
use burn_sentiment::{
    cli::Model,
    pipelines::sentiment::run_training,
    service::MetricsResponse,
    settings::{Settings, DEFAULT_CONFIG_PATH},
};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Usage: train [OPTIONS]

Options:
  -h, --help           Print help
  -c, --config         Path to the YAML settings (defaults to 'config/config.yaml')
  -m, --model          The pretrained model to fine-tune (e.g., 'cointegrated/rubert-tiny2')
  -n, --num-epochs     Number of epochs to train for
  -b, --batch-size     Batch size
  --freeze-backbone    Train the classification head only
  --cpu                Train on the CPU instead of the first CUDA device
";

#[derive(Debug)]
struct Args {
    config: Option<String>,
    model: Option<String>,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    freeze_backbone: bool,
    cpu: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            config: pargs.opt_value_from_str(["-c", "--config"])?,
            model: pargs.opt_value_from_str(["-m", "--model"])?,
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            freeze_backbone: pargs.contains("--freeze-backbone"),
            cpu: pargs.contains("--cpu"),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow::anyhow!("Unexpected arguments: {:?}", remaining));
        }

        Ok(Some(args))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut settings = Settings::load(config_path)?;

    if let Some(model) = &args.model {
        let model = Model::try_from(model.as_str())?;
        let dir_name = model.name().rsplit('/').next().unwrap_or(model.name());

        settings.train.model_path = format!("models/{}", dir_name);
        settings.train.model_name = model.to_string();
    }

    if let Some(num_epochs) = args.num_epochs {
        settings.train.num_epochs = num_epochs;
    }

    if let Some(batch_size) = args.batch_size {
        settings.train.batch_size = batch_size;
    }

    if args.freeze_backbone {
        settings.train.fine_tune_backbone = false;
    }

    let device = if args.cpu {
        LibTorchDevice::Cpu
    } else {
        LibTorchDevice::Cuda(0)
    };

    info!(
        "Fine-tuning {} for {} epochs on {:?}",
        settings.train.model_name, settings.train.num_epochs, device
    );

    let metrics = run_training::<Autodiff<LibTorch>>(&settings, &device).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&MetricsResponse { metrics })?
    );

    Ok(())
}
