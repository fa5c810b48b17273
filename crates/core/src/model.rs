use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Canonical field names
// ---------------------------------------------------------------------------

pub const IDENTIFICACION: &str = "identificacion";
pub const NOMBRES: &str = "nombres";
pub const APELLIDOS: &str = "apellidos";
pub const TIPO_DOCUMENTO: &str = "tipo_documento";
/// Combined "names + surnames" column found in some exports.
pub const NOMBRE_COMPLETO: &str = "nombre_completo";

/// Canonical columns, in output order.
pub const CANONICAL_FIELDS: [&str; 4] = [IDENTIFICACION, NOMBRES, APELLIDOS, TIPO_DOCUMENTO];

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One row of identity data.
///
/// Values are either absent or a non-empty trimmed string; whitespace-only
/// input is stored as absent. `row` is the zero-based position of the row in
/// its source and is never renumbered by later stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub row: usize,
    #[serde(flatten)]
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            fields: BTreeMap::new(),
        }
    }

    /// Build a record from `(column, value)` pairs, dropping blank values.
    pub fn from_pairs<I, K, V>(row: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut record = Self::new(row);
        for (key, value) in pairs {
            record = record.with(key, Some(value.as_ref()));
        }
        record
    }

    /// Return a copy of this record with `field` set to `value` (or removed).
    pub fn with(mut self, field: impl Into<String>, value: Option<&str>) -> Self {
        let field = field.into();
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => {
                self.fields.insert(field, v.to_string());
            }
            None => {
                self.fields.remove(&field);
            }
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn identificacion(&self) -> Option<&str> {
        self.get(IDENTIFICACION)
    }

    pub fn nombres(&self) -> Option<&str> {
        self.get(NOMBRES)
    }

    pub fn apellidos(&self) -> Option<&str> {
        self.get(APELLIDOS)
    }

    pub fn tipo_documento(&self) -> Option<&str> {
        self.get(TIPO_DOCUMENTO)
    }
}

// ---------------------------------------------------------------------------
// Record set
// ---------------------------------------------------------------------------

/// Ordered records plus the column names present in the source.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Build a set from a header and positional rows; row indexes follow input order.
    pub fn from_rows<S: AsRef<str>>(columns: &[&str], rows: &[Vec<S>]) -> Self {
        let mut set = Self::new(columns.iter().map(|c| c.to_string()).collect());
        for values in rows {
            set.push(columns.iter().copied().zip(values.iter().map(AsRef::as_ref)));
        }
        set
    }

    /// Append a row; its index is the current record count.
    pub fn push<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let row = self.records.len();
        self.records.push(Record::from_pairs(row, pairs));
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Key scheme
// ---------------------------------------------------------------------------

/// How records are grouped into duplicate candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    /// The bare identifier.
    #[default]
    Identifier,
    /// Identifier plus the uppercased document-type code.
    IdentifierDocumentType,
}

impl KeyScheme {
    pub fn key_for(&self, record: &Record) -> Result<String, RegistryError> {
        let ident = record
            .identificacion()
            .ok_or_else(|| RegistryError::KeyUnavailable {
                row: record.row,
                field: IDENTIFICACION.into(),
            })?;

        match self {
            Self::Identifier => Ok(ident.to_string()),
            Self::IdentifierDocumentType => {
                let tipo = record.tipo_documento().unwrap_or("").to_uppercase();
                Ok(format!("{ident}|{tipo}"))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::IdentifierDocumentType => "identifier_document_type",
        }
    }
}

impl std::fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyScheme {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "identifier" => Ok(Self::Identifier),
            "identifier_document_type" => Ok(Self::IdentifierDocumentType),
            other => Err(RegistryError::ConfigValidation(format!(
                "unknown key scheme '{other}' (expected 'identifier' or 'identifier_document_type')"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    InvalidIdentifier,
    UnresolvableName,
    DuplicateLoser { key: String, survivor_row: usize },
    TransformError { message: String },
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "invalid_identifier",
            Self::UnresolvableName => "unresolvable_name",
            Self::DuplicateLoser { .. } => "duplicate_loser",
            Self::TransformError { .. } => "transform_error",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record routed out of the valid set, tagged with why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
    pub record: Record,
    #[serde(flatten)]
    pub reason: RejectReason,
}

// ---------------------------------------------------------------------------
// Report + Output
// ---------------------------------------------------------------------------

/// Counts observed at each pipeline stage. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total_records: usize,
    pub invalid_identifiers: usize,
    pub unresolvable_names: usize,
    pub transform_errors: usize,
    pub duplicates_eliminated: usize,
    pub records_valid: usize,
    pub names_corrected: usize,
    pub surnames_corrected: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessOutput {
    pub valid_records: Vec<Record>,
    pub invalid_records: Vec<Rejected>,
    pub report: ValidationReport,
}

impl ProcessOutput {
    /// Rejected records carrying the given reason tag.
    pub fn rejected_as<'a>(&'a self, reason: &'a str) -> impl Iterator<Item = &'a Rejected> + 'a {
        self.invalid_records
            .iter()
            .filter(move |r| r.reason.as_str() == reason)
    }
}
