// Export of pipeline output: valid / invalid CSV and JSON report

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use terceros_core::model::{
    ProcessOutput, Record, RejectReason, Rejected, ValidationReport, CANONICAL_FIELDS,
};

use crate::error::IoError;

pub const EXPORT_DELIMITER: u8 = b';';
/// Extra column on the invalid export holding the reason tag.
pub const REASON_COLUMN: &str = "motivo";
/// Extra column on the invalid export: transform message or duplicate survivor.
pub const DETAIL_COLUMN: &str = "detalle";

/// Paths of the three files written for one processed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub valid: PathBuf,
    pub invalid: PathBuf,
    pub report: PathBuf,
}

pub fn timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// `<stem>_procesado_<ts>.csv`, `<stem>_invalidos_<ts>.csv`, `<stem>_reporte_<ts>.json` in `out_dir`.
pub fn output_paths(out_dir: &Path, input: &Path, timestamp: &str) -> OutputPaths {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "terceros".to_string());

    OutputPaths {
        valid: out_dir.join(format!("{stem}_procesado_{timestamp}.csv")),
        invalid: out_dir.join(format!("{stem}_invalidos_{timestamp}.csv")),
        report: out_dir.join(format!("{stem}_reporte_{timestamp}.json")),
    }
}

/// Whether `path` is a CSV written by [`export_output`] (`*_procesado_<ts>` or
/// `*_invalidos_<ts>`), so directory scans do not feed outputs back in.
pub fn is_export_output(path: &Path) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    ["_procesado_", "_invalidos_"]
        .iter()
        .any(|marker| stem.rsplit_once(marker).is_some_and(|(_, ts)| is_timestamp(ts)))
}

/// `%Y%m%d_%H%M%S` shape: 8 digits, underscore, 6 digits.
fn is_timestamp(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 15
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 8 { *b == b'_' } else { b.is_ascii_digit() })
}

/// Canonical fields first, then the source's other columns in first-seen
/// order, then any field that only appears on records (e.g. filled by a transform).
pub fn export_columns<'a>(
    source_columns: &[String],
    records: impl IntoIterator<Item = &'a Record>,
) -> Vec<String> {
    let mut columns: Vec<String> = CANONICAL_FIELDS.iter().map(|c| c.to_string()).collect();
    for column in source_columns {
        if !columns.contains(column) {
            columns.push(column.clone());
        }
    }
    for record in records {
        for (field, _) in record.fields() {
            if !columns.iter().any(|c| c == field) {
                columns.push(field.to_string());
            }
        }
    }
    columns
}

fn record_values(record: &Record, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| record.get(c).unwrap_or("").to_string())
        .collect()
}

pub fn write_valid_csv<W: Write>(writer: W, columns: &[String], records: &[Record]) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .from_writer(writer);

    writer.write_record(columns)?;
    for record in records {
        writer.write_record(record_values(record, columns))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_invalid_csv<W: Write>(writer: W, columns: &[String], rejected: &[Rejected]) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .from_writer(writer);

    let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
    header.push(REASON_COLUMN);
    header.push(DETAIL_COLUMN);
    writer.write_record(&header)?;

    for r in rejected {
        let mut values = record_values(&r.record, columns);
        values.push(r.reason.as_str().to_string());
        values.push(reason_detail(&r.reason));
        writer.write_record(values)?;
    }
    writer.flush()?;
    Ok(())
}

fn reason_detail(reason: &RejectReason) -> String {
    match reason {
        RejectReason::TransformError { message } => message.clone(),
        RejectReason::DuplicateLoser { key, survivor_row } => {
            format!("key {key}, kept row {survivor_row}")
        }
        RejectReason::InvalidIdentifier | RejectReason::UnresolvableName => String::new(),
    }
}

pub fn write_report_json(path: &Path, report: &ValidationReport) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|e| IoError::Write(format!("{}: {e}", path.display())))
}

/// Write all three outputs for one input file.
pub fn export_output(
    out_dir: &Path,
    input: &Path,
    source_columns: &[String],
    output: &ProcessOutput,
    timestamp: &str,
) -> Result<OutputPaths, IoError> {
    std::fs::create_dir_all(out_dir).map_err(|e| IoError::Write(format!("{}: {e}", out_dir.display())))?;
    let paths = output_paths(out_dir, input, timestamp);

    let columns = export_columns(
        source_columns,
        output
            .valid_records
            .iter()
            .chain(output.invalid_records.iter().map(|r| &r.record)),
    );

    let valid = create(&paths.valid)?;
    write_valid_csv(valid, &columns, &output.valid_records)?;

    let invalid = create(&paths.invalid)?;
    write_invalid_csv(invalid, &columns, &output.invalid_records)?;

    write_report_json(&paths.report, &output.report)?;

    log::info!(
        "wrote {} valid / {} invalid records to {}",
        output.valid_records.len(),
        output.invalid_records.len(),
        out_dir.display()
    );
    Ok(paths)
}

fn create(path: &Path) -> Result<std::fs::File, IoError> {
    std::fs::File::create(path).map_err(|e| IoError::Write(format!("{}: {e}", path.display())))
}
