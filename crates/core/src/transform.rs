//! Per-record transforms applied before identifier validation.
//!
//! A transform takes a record by value and returns a new one. A failing
//! transform only rejects its own record; the pipeline keeps going.

use regex::Regex;

use crate::error::RegistryError;
use crate::model::{Record, RecordSet, APELLIDOS, IDENTIFICACION, NOMBRES, NOMBRE_COMPLETO, TIPO_DOCUMENTO};
use crate::normalize::collapse_whitespace;

pub trait RecordTransform: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, record: Record) -> Result<Record, RegistryError>;

    /// Whether this transform can fill `column` for `set` when the column itself is absent.
    fn supplies_column(&self, _set: &RecordSet, _column: &str) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Document type repair
// ---------------------------------------------------------------------------

/// Type words whose accented letter was lost to a replacement character.
const DOCUMENT_TYPE_CORRECTIONS: [(&str, &str); 4] = [
    ("EXTRANJER\u{FFFD}A", "EXTRANJERIA"),
    ("DEFUNSI\u{FFFD}N", "DEFUNCION"),
    ("IDENTIFICACI\u{FFFD}N", "IDENTIFICACION"),
    ("N\u{FFFD}MERO \u{FFFD}NICO", "NUMERO UNICO"),
];

/// Uppercase, collapse whitespace and fix known damaged type words.
pub fn repair_document_type(text: &str) -> Option<String> {
    let mut repaired = collapse_whitespace(text).to_uppercase();
    for (damaged, correct) in DOCUMENT_TYPE_CORRECTIONS {
        if repaired.contains(damaged) {
            repaired = repaired.replace(damaged, correct);
        }
    }
    (!repaired.is_empty()).then_some(repaired)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RepairDocumentType;

impl RecordTransform for RepairDocumentType {
    fn name(&self) -> &'static str {
        "repair_document_type"
    }

    fn apply(&self, record: Record) -> Result<Record, RegistryError> {
        let repaired = record.tipo_documento().and_then(repair_document_type);
        Ok(record.with(TIPO_DOCUMENTO, repaired.as_deref()))
    }
}

// ---------------------------------------------------------------------------
// Document prefix stripping
// ---------------------------------------------------------------------------

/// Remove a leading document-type code from an identifier
/// (`"RC 123456"`, `"RC-123456"`, `"rc123456"` with type `RC` -> `"123456"`).
/// Numeric type codes (`"13"`, `"31"`) are never stripped: they cannot be told
/// apart from the identifier's own leading digits.
pub fn strip_document_prefix(tipo: &str, identificacion: &str) -> Result<String, regex::Error> {
    let tipo = tipo.trim();
    let identificacion = identificacion.trim();
    if !tipo.chars().any(char::is_alphabetic) {
        return Ok(identificacion.to_string());
    }

    let pattern = Regex::new(&format!(r"(?i)^{}[\s\-]*", regex::escape(tipo)))?;
    Ok(pattern.replace(identificacion, "").into_owned())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StripDocumentPrefix;

impl RecordTransform for StripDocumentPrefix {
    fn name(&self) -> &'static str {
        "strip_document_prefix"
    }

    fn apply(&self, record: Record) -> Result<Record, RegistryError> {
        let (Some(tipo), Some(ident)) = (record.tipo_documento(), record.identificacion()) else {
            return Ok(record);
        };

        let stripped = strip_document_prefix(tipo, ident).map_err(|e| RegistryError::Transform {
            row: record.row,
            message: format!("{}: {e}", self.name()),
        })?;
        Ok(record.with(IDENTIFICACION, Some(&stripped)))
    }
}

// ---------------------------------------------------------------------------
// Full-name splitting
// ---------------------------------------------------------------------------

/// Split a combined name into (names, surnames) by word count:
/// 4+ words -> 2 + rest, 3 -> 1 + 2, 2 -> 1 + 1, 1 -> names only.
pub fn split_full_name(full_name: &str) -> (Option<String>, Option<String>) {
    let words: Vec<&str> = full_name.split_whitespace().collect();
    let names_len = match words.len() {
        0 => return (None, None),
        1..=3 => 1,
        _ => 2,
    };
    let (names, surnames) = words.split_at(names_len);
    let surnames = (!surnames.is_empty()).then(|| surnames.join(" "));
    (Some(names.join(" ")), surnames)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SplitFullName;

impl RecordTransform for SplitFullName {
    fn name(&self) -> &'static str {
        "split_full_name"
    }

    fn apply(&self, record: Record) -> Result<Record, RegistryError> {
        if record.apellidos().is_some() {
            return Ok(record);
        }
        let Some(full_name) = record.get(NOMBRE_COMPLETO) else {
            return Ok(record);
        };

        let (names, surnames) = split_full_name(full_name);
        let record = if record.nombres().is_none() {
            record.with(NOMBRES, names.as_deref())
        } else {
            record
        };
        Ok(record.with(APELLIDOS, surnames.as_deref()))
    }

    fn supplies_column(&self, set: &RecordSet, column: &str) -> bool {
        (column == NOMBRES || column == APELLIDOS) && set.has_column(NOMBRE_COMPLETO)
    }
}
