//! Command line tool printing dashboard statistics of the training corpus as JSON

use burn_sentiment::{
    pipelines::Eda,
    service::EdaResponse,
    settings::{Settings, DEFAULT_CONFIG_PATH},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: eda [OPTIONS]

Options:
  -h, --help           Print help
  -c, --config         Path to the YAML settings (defaults to 'config/config.yaml')
  -p, --path           The table to describe (defaults to the processed training set)
";

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP);

        return Ok(());
    }

    let config: Option<String> = pargs.opt_value_from_str(["-c", "--config"])?;
    let path: Option<String> = pargs.opt_value_from_str(["-p", "--path"])?;

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        return Err(anyhow::anyhow!("Unexpected arguments: {:?}", remaining));
    }

    let settings = Settings::load(config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH))?;
    let path = path.unwrap_or(settings.preprocessing.train_path);

    let report = Eda::new().report(&path)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&EdaResponse::from_report(&report)?)?
    );

    Ok(())
}
