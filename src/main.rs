//! slnguard: Melanoma SLN metastasis risk predictor
//!
//! Command-line front end for the prediction core.
//!
//! ```bash
//! slnguard --subungual no --breslow 4.0 --ki67 0 --treatment no [--json]
//! ```

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use slnguard::domain::{parse_yes_no, ClinicalObservation};
use slnguard::{PredictionService, ResolverConfig, SlnError};

const USAGE: &str = "Usage: slnguard --subungual <yes|no> --breslow <mm> --ki67 <percent> --treatment <yes|no> [--json]";

struct Args {
    observation: ClinicalObservation,
    json: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut subungual = None;
    let mut breslow = None;
    let mut ki67 = None;
    let mut treatment = None;
    let mut json = false;

    while let Some(flag) = args.next() {
        if flag == "--json" {
            json = true;
            continue;
        }
        let value = args
            .next()
            .with_context(|| format!("Missing value for {flag}"))?;
        match flag.as_str() {
            "--subungual" => subungual = Some(parse_yes_no(&value)?),
            "--treatment" => treatment = Some(parse_yes_no(&value)?),
            "--breslow" => {
                breslow = Some(value.parse::<f64>().context("Invalid Breslow thickness")?)
            }
            "--ki67" => ki67 = Some(value.parse::<f64>().context("Invalid Ki67 index")?),
            other => bail!("Unknown argument: {other}"),
        }
    }

    let observation = ClinicalObservation::new(
        subungual.context("--subungual is required")?,
        breslow.context("--breslow is required")?,
        ki67.context("--ki67 is required")?,
        treatment.context("--treatment is required")?,
    );
    observation.validate()?;

    Ok(Args { observation, json })
}

fn main() -> ExitCode {
    // Logs go to stderr (or a file) so stdout carries only the result.
    let log_mode = std::env::var("SLNGUARD_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());
    let (writer, _guard) = if log_mode == "file" {
        let log_file =
            std::env::var("SLNGUARD_LOG_FILE").unwrap_or_else(|_| "slnguard.log".to_string());
        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: a missing directory surfaces when opening the file.
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
        {
            Ok(file) => tracing_appender::non_blocking(file),
            Err(e) => {
                eprintln!("Cannot open log file {log_file}: {e}");
                return ExitCode::from(1);
            }
        }
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e:#}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<SlnError>() {
            Some(SlnError::ModelNotFound(err)) => {
                eprintln!("Model loading failed: {err}");
                ExitCode::from(1)
            }
            Some(SlnError::Prediction(err)) => {
                eprintln!("{}", err.user_message());
                ExitCode::from(3)
            }
            _ => {
                eprintln!("{e:#}");
                ExitCode::from(1)
            }
        },
    }
}

fn run(args: &Args) -> Result<()> {
    let config = ResolverConfig::from_env().map_err(SlnError::from)?;
    let service = PredictionService::from_config(&config);
    service.initialize().map_err(SlnError::from)?;

    let result = service.predict(&args.observation)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", result.report());

    Ok(())
}
