//! Model export utility for slnguard artifacts.
//!
//! Converts estimator parameters exported by the training pipeline (JSON,
//! e.g. `{"mlp": {...}}`) into a deployable artifact and prints its SHA-256
//! so the candidate can be pinned in the resolver configuration.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin export_model -- <estimator.json> <output> --format <binary|bundle> [--bare]
//! ```
//!
//! By default the model is wrapped in a container under `"model"` together
//! with export metadata; `--bare` writes the estimator alone.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

use slnguard::adapters::binary::{self, StoredEntry, StoredObject};
use slnguard::adapters::bundle;
use slnguard::adapters::estimators::Estimator;
use slnguard::application::ModelValidator;
use slnguard::domain::{ArtifactCandidate, ModelFormat};
use slnguard::ports::LoadedObject;

struct Options {
    input: PathBuf,
    output: PathBuf,
    format: ModelFormat,
    bare: bool,
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn parse_options() -> Result<Options> {
    let mut positional = Vec::new();
    let mut format = None;
    let mut bare = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--format" => {
                let value = args.next().context("Missing value for --format")?;
                format = Some(value.parse::<ModelFormat>().map_err(|e| anyhow!(e))?);
            }
            "--bare" => bare = true,
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let [input, output]: [PathBuf; 2] = positional.try_into().map_err(|_| {
        anyhow!("Usage: export_model <estimator.json> <output> --format <binary|bundle> [--bare]")
    })?;

    Ok(Options {
        input,
        output,
        format: format.context("--format is required")?,
        bare,
    })
}

fn metadata() -> BTreeMap<String, Value> {
    let mut meta = BTreeMap::new();
    meta.insert("format_version".to_string(), Value::from(1));
    meta.insert(
        "exported_at".to_string(),
        Value::from(chrono::Utc::now().to_rfc3339()),
    );
    meta.insert(
        "exported_by".to_string(),
        Value::from(concat!("slnguard ", env!("CARGO_PKG_VERSION"))),
    );
    meta
}

fn encode(estimator: Estimator, format: ModelFormat, bare: bool) -> Result<Vec<u8>> {
    let bytes = match (format, bare) {
        (ModelFormat::Bundle, false) => bundle::encode(&estimator, &metadata()),
        (ModelFormat::Bundle, true) => {
            serde_json::to_vec_pretty(&estimator).map_err(|e| e.to_string())
        }
        (ModelFormat::Binary, false) => {
            let mut map: BTreeMap<String, StoredEntry> = metadata()
                .into_iter()
                .map(|(k, v)| (k, StoredEntry::Text(v.to_string())))
                .collect();
            map.insert(bundle::MODEL_KEY.to_string(), StoredEntry::Model(estimator));
            binary::encode(&StoredObject::Mapping(map))
        }
        (ModelFormat::Binary, true) => binary::encode(&StoredObject::Model(estimator)),
    };
    bytes.map_err(|e| anyhow!(e))
}

fn main() -> Result<()> {
    let opts = parse_options()?;

    let content = fs::read_to_string(&opts.input)
        .with_context(|| format!("Failed to read {:?}", opts.input))?;
    let estimator: Estimator = serde_json::from_str(&content)
        .with_context(|| format!("Invalid estimator parameters in {:?}", opts.input))?;

    // Refuse to export something the resolver would reject.
    if let Err(e) = ModelValidator::new().accept(LoadedObject::Model(Box::new(estimator.clone()))) {
        bail!("Model would not pass validation: {e}");
    }

    let bytes = encode(estimator, opts.format, opts.bare)?;
    fs::write(&opts.output, &bytes)
        .with_context(|| format!("Failed to write {:?}", opts.output))?;

    let digest = to_hex(&Sha256::digest(&bytes));
    let candidate = ArtifactCandidate::new(opts.format, &opts.output).with_sha256(digest.clone());

    println!("Wrote {} ({} bytes)", opts.output.display(), bytes.len());
    println!("SHA-256: {digest}");
    println!("Candidate entry:");
    println!("{}", serde_json::to_string_pretty(&candidate)?);

    Ok(())
}
