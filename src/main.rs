use anyhow::{bail, Context, Result};
use log::{info, warn};
use splitter_rs::config::Config;
use splitter_rs::core::batch;
use splitter_rs::utils::{files, summary, tagger};
use std::path::PathBuf;

const USAGE: &str = "\
Usage: splitter_rs [OPTIONS] <INPUT>...

Splits .docx documents into one file per section, nested by heading level.

Arguments:
  <INPUT>...             input .docx files, or directories to scan

Options:
  -o, --output <DIR>     results root (default: the configured results folder)
  -l, --level <N>        heading depth to split at, 1-based (default: 1)
  -k, --keywords <FILE>  .csv/.txt keyword reference; tags every section file
      --summary <MIN> <MAX>
                         write a word-count summary over the inputs
      --zip              pack the batch folder into processed_documents.zip
      --clear-uploads    empty the configured upload folder afterwards
      --config <FILE>    JSON config file
  -h, --help             print this help
";

struct Args {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    parse_level: usize,
    keywords_file: Option<PathBuf>,
    summary_range: Option<(usize, usize)>,
    zip: bool,
    clear_uploads: bool,
    config_file: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        inputs: Vec::new(),
        output: None,
        parse_level: 1,
        keywords_file: None,
        summary_range: None,
        zip: false,
        clear_uploads: false,
        config_file: None,
    };

    let mut raw = std::env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print!("{}", USAGE);
                std::process::exit(0);
            }
            "-o" | "--output" => args.output = Some(PathBuf::from(required(&mut raw, &arg)?)),
            "-l" | "--level" => {
                let value = required(&mut raw, &arg)?;
                args.parse_level = value
                    .parse()
                    .with_context(|| format!("Invalid level: {}", value))?;
            }
            "-k" | "--keywords" => {
                args.keywords_file = Some(PathBuf::from(required(&mut raw, &arg)?))
            }
            "--summary" => {
                let min = required(&mut raw, &arg)?
                    .parse()
                    .context("Invalid summary minimum")?;
                let max = required(&mut raw, &arg)?
                    .parse()
                    .context("Invalid summary maximum")?;
                args.summary_range = Some((min, max));
            }
            "--zip" => args.zip = true,
            "--clear-uploads" => args.clear_uploads = true,
            "--config" => args.config_file = Some(PathBuf::from(required(&mut raw, &arg)?)),
            other if other.starts_with('-') => bail!("Unknown option: {}\n{}", other, USAGE),
            _ => args.inputs.push(PathBuf::from(arg)),
        }
    }

    if args.inputs.is_empty() {
        bail!("No input given\n{}", USAGE);
    }
    Ok(args)
}

fn required(raw: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    raw.next()
        .ok_or_else(|| anyhow::anyhow!("Missing value for {}", flag))
}

/// Expands directories, applies the allowed-extension check and drops
/// anything over the configured size limit.
fn collect_inputs(requested: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for input in requested {
        if input.is_dir() {
            let entries = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read input directory {}", input.display()))?;
            for entry in entries {
                let path = entry?.path();
                if !path.is_file() {
                    continue;
                }
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if files::is_allowed_file(&name, &config.allowed_extensions)
                    && name.to_lowercase().ends_with(".docx")
                {
                    inputs.push(path);
                }
            }
        } else {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !files::is_allowed_file(&name, &config.allowed_extensions) {
                warn!("Skipping disallowed file: {}", input.display());
                continue;
            }
            inputs.push(input.clone());
        }
    }

    inputs.retain(|path| match std::fs::metadata(path) {
        Ok(meta) if meta.len() > config.max_content_length => {
            warn!(
                "Skipping {}: {} bytes exceeds the {} byte limit",
                path.display(),
                meta.len(),
                config.max_content_length
            );
            false
        }
        // Unreadable paths stay in; the batch reports them per file.
        _ => true,
    });
    inputs.sort();
    Ok(inputs)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args()?;
    let config = match &args.config_file {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env(),
    };

    let inputs = collect_inputs(&args.inputs, &config)?;
    if inputs.is_empty() {
        bail!("No processable inputs found");
    }

    let keywords = match &args.keywords_file {
        Some(path) => Some(tagger::read_keywords(path)?),
        None => None,
    };

    let results_root = args
        .output
        .clone()
        .unwrap_or_else(|| config.results_folder.clone());
    std::fs::create_dir_all(&results_root)
        .with_context(|| format!("Failed to create {}", results_root.display()))?;
    let (batch_id, batch_folder) = files::create_batch_folder(&results_root)?;
    info!("Batch {} started with {} document(s)", batch_id, inputs.len());

    let entries = batch::process_batch(
        &inputs,
        &batch_folder,
        args.parse_level,
        keywords.as_ref(),
    )?;

    if let Some((min_count, max_count)) = args.summary_range {
        let (_, message) =
            summary::create_word_count_summary(&inputs, &batch_folder, min_count, max_count)?;
        println!("{}", message);
    }

    if args.zip {
        let zip_path = files::create_zip_file(&batch_folder, "processed_documents.zip")?;
        println!("Archive: {}", zip_path.display());
    }

    if args.clear_uploads {
        files::clear_folder(&config.upload_folder)?;
        info!("Cleared upload folder: {}", config.upload_folder.display());
    }

    println!("{}", serde_json::to_string_pretty(&entries)?);

    let failures = entries.iter().filter(|e| e.is_failure()).count();
    if failures > 0 {
        warn!("{} of {} document(s) failed", failures, entries.len());
    }
    Ok(())
}
