//! `terceros clean`: validate, normalize and deduplicate CSV exports.

use std::path::{Path, PathBuf};

use serde::Serialize;
use terceros_core::model::{KeyScheme, ValidationReport};
use terceros_core::Pipeline;
use terceros_io::csv::collect_inputs;
use terceros_io::export::{export_output, timestamp, OutputPaths};

use crate::exit_codes::EXIT_IO;
use crate::util::{build_pipeline, load_config, output_dir, run_file};
use crate::CliError;

/// Outcome of one input file, as printed by `--json` / `--report`.
#[derive(Debug, Serialize)]
struct FileSummary {
    input: PathBuf,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<OutputPaths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn cmd_clean(
    inputs: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    key_scheme: Option<KeyScheme>,
    out_dir: Option<PathBuf>,
    json_output: bool,
    report_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let pipeline = build_pipeline(&config, key_scheme);

    let files = collect_inputs(&inputs)?;
    if files.is_empty() {
        return Err(CliError::usage("no CSV files found in the given inputs"));
    }

    let ts = timestamp(chrono::Local::now());
    let mut summaries = Vec::with_capacity(files.len());
    let mut first_failure: Option<CliError> = None;

    for file in &files {
        match clean_file(file, &pipeline, out_dir.as_deref(), &ts) {
            Ok((report, outputs)) => {
                eprintln!("{}: {}", file.display(), report.summary_line());
                summaries.push(FileSummary {
                    input: file.clone(),
                    status: "ok",
                    report: Some(report),
                    outputs: Some(outputs),
                    error: None,
                });
            }
            Err(err) => {
                eprintln!("{}: failed: {}", file.display(), err.message);
                summaries.push(FileSummary {
                    input: file.clone(),
                    status: "error",
                    report: None,
                    outputs: None,
                    error: Some(err.message.clone()),
                });
                first_failure.get_or_insert(err);
            }
        }
    }

    if json_output || report_file.is_some() {
        let json_str = serde_json::to_string_pretty(&summaries)
            .map_err(|e| CliError::new(EXIT_IO, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = report_file {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::new(EXIT_IO, format!("cannot write report: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if json_output {
            println!("{json_str}");
        }
    }

    let failed = summaries.iter().filter(|s| s.error.is_some()).count();
    match first_failure {
        Some(err) => Err(CliError {
            code: err.code,
            message: format!("{failed} of {} file(s) failed", summaries.len()),
            hint: err.hint,
        }),
        None => Ok(()),
    }
}

fn clean_file(
    file: &Path,
    pipeline: &Pipeline,
    out_dir: Option<&Path>,
    ts: &str,
) -> Result<(ValidationReport, OutputPaths), CliError> {
    let (set, output) = run_file(file, pipeline)?;
    let dir = output_dir(out_dir, file);
    let outputs = export_output(&dir, file, &set.columns, &output, ts)?;
    Ok((output.report, outputs))
}
