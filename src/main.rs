// Demo binary: a training config loaded from an optional JSON file, then
// overridden from the command line and printed back as JSON.
//
//   coqpit --config_path run.json --coqpit.epochs 20 --coqpit.datasets.0.name ljspeech
//
// Flags are registered from the defaults, before the file is read, so list
// indices only reach as far as the default lists do. A file with a longer
// `datasets` list can be loaded, but its extra entries have no flags.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Arg, Command};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use coqpit::{ArgumentCheck, Config, Field, FieldType, ParserOptions, Result, Schema, Value, check_argument};

fn audio_schema() -> Result<Arc<Schema>> {
    Schema::builder("AudioConfig")
        .field(
            Field::new("sample_rate", FieldType::Int)
                .default(22050)
                .help("Target sampling rate")
                .contract(|v| v.as_i64().is_some_and(|sr| sr > 0)),
        )
        .field(Field::new("num_mels", FieldType::Int).default(80))
        .field(Field::new("preemphasis", FieldType::Float).default(0.0))
        .build()
}

fn dataset_schema() -> Result<Arc<Schema>> {
    Schema::builder("DatasetConfig")
        .field(Field::new("name", FieldType::Str).default("ljspeech"))
        .field(Field::new("path", FieldType::Path).default(Value::Path("data/".into())))
        .field(Field::new("language", FieldType::literal(["en".into(), "de".into(), "fr".into()])).default("en"))
        .build()
}

fn training_schema() -> Result<Arc<Schema>> {
    let audio = audio_schema()?;
    let dataset = dataset_schema()?;
    let default_dataset = Config::new(&dataset)?;
    let default_audio = Config::new(&audio)?;
    Schema::builder("TrainingConfig")
        .field(Field::new("run_name", FieldType::Str).default("run").help("Name of the run"))
        .field(Field::new("epochs", FieldType::Int).default(1000))
        .field(Field::new("lr", FieldType::union([FieldType::Float, FieldType::list(FieldType::Float)])).default(0.001))
        .field(Field::new("mixed_precision", FieldType::Bool).default(false))
        .field(Field::new("output_path", FieldType::optional(FieldType::Path)).default(Value::Null))
        .field(Field::new("audio", FieldType::record(&audio)).default_factory(move || default_audio.clone().into()))
        .field(
            Field::new("datasets", FieldType::list(FieldType::record(&dataset)))
                .default_factory(move || Value::List(vec![default_dataset.clone().into()])),
        )
        .check(|config| {
            check_argument("epochs", config, &ArgumentCheck::new().restricted().min_val(1.0))?;
            check_argument("run_name", config, &ArgumentCheck::new().deny_none())
        })
        .build()
}

fn run() -> Result<()> {
    let schema = training_schema()?;
    let mut config = Config::new(&schema)?;
    let parser = config.init_argparse(&ParserOptions::default())?;
    let command = parser.augment(
        Command::new("coqpit")
            .about("Load, override and print a training config")
            .arg(Arg::new("config_path").long("config_path").value_name("FILE")),
    );
    let matches = command.get_matches();
    if let Some(path) = matches.get_one::<String>("config_path") {
        config.load_json(path)?;
        info!(%path, "loaded config file");
    }
    let overrides = parser.overrides(&matches)?;
    info!(count = overrides.len(), "applying command-line overrides");
    for (path, value) in overrides {
        config.set_path(&path, value)?;
    }
    config.validate()?;
    config.check_values()?;
    println!("{config}");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "config failed");
            ExitCode::FAILURE
        }
    }
}
