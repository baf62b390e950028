//! Command line tool for predictions with a trained model

use std::process::ExitCode;

use burn::backend::{libtorch::LibTorchDevice, LibTorch};
use burn_sentiment::{
    pipelines::sentiment::{load_metrics, Predictor},
    service::{
        ErrorResponse, InputPredictionResponse, MetricsResponse, PredictionResponse,
        SentimentRequest,
    },
    settings::{Settings, DEFAULT_CONFIG_PATH},
};
use log::error;
use pico_args::Arguments;
use serde::Serialize;

const HELP: &str = "\
Usage: infer [OPTIONS] (--file FILE | --text TEXT | --metrics)

Options:
  -h, --help           Print help
  -c, --config         Path to the YAML settings (defaults to 'config/config.yaml')
  -f, --file           A CSV file of reviews to classify
  -t, --text           A single review to classify
  -b, --batch-size     Batch size for file predictions
  --metrics            Print the metrics of the last training run
  --cpu                Run on the CPU instead of the first CUDA device
";

#[derive(Debug)]
enum Command {
    File(String),
    Text(String),
    Metrics,
}

#[derive(Debug)]
struct Args {
    config: Option<String>,
    command: Command,
    batch_size: Option<usize>,
    cpu: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        Self::parse_from(Arguments::from_env())
    }

    fn parse_from(mut pargs: Arguments) -> anyhow::Result<Option<Self>> {
        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let config = pargs.opt_value_from_str(["-c", "--config"])?;
        let batch_size = pargs.opt_value_from_str(["-b", "--batch-size"])?;
        let cpu = pargs.contains("--cpu");

        let file: Option<String> = pargs.opt_value_from_str(["-f", "--file"])?;
        let text: Option<String> = pargs.opt_value_from_str(["-t", "--text"])?;
        let metrics = pargs.contains("--metrics");

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow::anyhow!("Unexpected arguments: {:?}", remaining));
        }

        let command = match (file, text, metrics) {
            (Some(file), None, false) => Command::File(file),
            (None, Some(text), false) => Command::Text(text),
            (None, None, true) => Command::Metrics,
            _ => {
                return Err(anyhow::anyhow!(
                    "Expected exactly one of --file, --text or --metrics"
                ))
            }
        };

        Ok(Some(Args {
            config,
            command,
            batch_size,
            cpu,
        }))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

fn run(args: &Args, settings: &Settings) -> anyhow::Result<ExitCode> {
    let device = if args.cpu {
        LibTorchDevice::Cpu
    } else {
        LibTorchDevice::Cuda(0)
    };

    let result = match &args.command {
        Command::Metrics => load_metrics(&settings.train.metrics_path)
            .map(|metrics| serde_json::to_value(MetricsResponse { metrics })),
        Command::File(path) => {
            let batch_size = args
                .batch_size
                .unwrap_or_else(|| settings.evaluate_batch_size());

            Predictor::<LibTorch>::from_settings(settings, device)
                .and_then(|predictor| {
                    predictor.predict_file(path, batch_size, settings.train.encode_chunks)
                })
                .map(|(predictions, stats)| {
                    serde_json::to_value(PredictionResponse::new(predictions, stats))
                })
        }
        Command::Text(text) => {
            let request = SentimentRequest { text: text.clone() };

            request
                .validate()
                .and_then(|_| Predictor::<LibTorch>::from_settings(settings, device))
                .and_then(|predictor| predictor.predict_text(&request.text))
                .map(|prediction| serde_json::to_value(InputPredictionResponse::from(prediction)))
        }
    };

    match result {
        Ok(value) => {
            print_json(&value?)?;

            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if error.is_fatal() {
                error!("{}", error);
            }

            print_json(&ErrorResponse::from(&error))?;

            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(ExitCode::SUCCESS);
    };

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let settings = Settings::load(config_path)?;

    run(&args, &settings)
}
