//! Validation pipeline: transforms, identifier filter, name normalization,
//! duplicate resolution and report, in that order.
//!
//! Every input row ends up in exactly one of `valid_records` or
//! `invalid_records`. Content problems never abort a run; only a missing
//! required column does.

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::identifier::IdentifierRule;
use crate::model::{
    KeyScheme, ProcessOutput, Record, RecordSet, RejectReason, Rejected, APELLIDOS, IDENTIFICACION,
    NOMBRES, TIPO_DOCUMENTO,
};
use crate::normalize::{FieldKind, NameNormalizer};
use crate::report::{compute_report, NameCorrections};
use crate::resolve::resolve;
use crate::score::{CompletenessScorer, Scorer};
use crate::transform::{RecordTransform, RepairDocumentType, SplitFullName, StripDocumentPrefix};

/// Columns that must exist in the record set, directly or via a transform.
pub const REQUIRED_COLUMNS: [&str; 2] = [IDENTIFICACION, NOMBRES];

pub struct Pipeline {
    key_scheme: KeyScheme,
    scorer: Box<dyn Scorer>,
    identifier: IdentifierRule,
    names: NameNormalizer,
    transforms: Vec<Box<dyn RecordTransform>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

impl Pipeline {
    /// Core stages only: default identifier rule, default stoplist,
    /// completeness scorer, no transforms.
    pub fn new(key_scheme: KeyScheme) -> Self {
        Self {
            key_scheme,
            scorer: Box::new(CompletenessScorer),
            identifier: IdentifierRule::default(),
            names: NameNormalizer::default(),
            transforms: Vec::new(),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        let mut pipeline = Self {
            key_scheme: config.key_scheme,
            scorer: config.scorer.build(),
            identifier: config.identifier,
            names: NameNormalizer::with_extra_stoplist(&config.names.extra_stoplist),
            transforms: Vec::new(),
        };

        // Repair runs first so prefix stripping sees the canonical type code.
        if config.transforms.repair_document_type {
            pipeline = pipeline.with_transform(RepairDocumentType);
        }
        if config.transforms.strip_document_prefix {
            pipeline = pipeline.with_transform(StripDocumentPrefix);
        }
        if config.transforms.split_full_name {
            pipeline = pipeline.with_transform(SplitFullName);
        }
        pipeline
    }

    pub fn with_key_scheme(mut self, key_scheme: KeyScheme) -> Self {
        self.key_scheme = key_scheme;
        self
    }

    pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn with_transform(mut self, transform: impl RecordTransform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    pub fn key_scheme(&self) -> KeyScheme {
        self.key_scheme
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    pub fn transform_names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Partition `set` into survivors and rejections and count each stage.
    pub fn process(&self, set: &RecordSet) -> Result<ProcessOutput, RegistryError> {
        if set.is_empty() {
            return Ok(ProcessOutput::default());
        }
        self.check_columns(set)?;

        let mut invalid: Vec<Rejected> = Vec::new();
        let mut staged: Vec<Record> = Vec::with_capacity(set.len());
        let mut corrections = NameCorrections::default();

        for input in &set.records {
            let record = match self.apply_transforms(input.clone()) {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("row {}: transform failed, record rejected: {e}", input.row);
                    invalid.push(Rejected {
                        record: input.clone(),
                        reason: RejectReason::TransformError {
                            message: transform_message(e),
                        },
                    });
                    continue;
                }
            };

            if !self.identifier.is_valid(record.identificacion()) {
                invalid.push(Rejected {
                    record: input.clone(),
                    reason: RejectReason::InvalidIdentifier,
                });
                continue;
            }

            match self.normalize_fields(record, &mut corrections) {
                Some(record) => staged.push(record),
                None => invalid.push(Rejected {
                    record: input.clone(),
                    reason: RejectReason::UnresolvableName,
                }),
            }
        }

        let key_scheme = self.key_scheme;
        let resolution = resolve(staged, |r| key_scheme.key_for(r), self.scorer.as_ref())?;

        invalid.extend(resolution.discarded.into_iter().map(|d| Rejected {
            record: d.record,
            reason: RejectReason::DuplicateLoser {
                key: d.key,
                survivor_row: d.survivor_row,
            },
        }));
        invalid.sort_by_key(|r| r.record.row);

        let report = compute_report(set.len(), &resolution.survivors, &invalid, corrections);
        log::info!("{}", report.summary_line());

        Ok(ProcessOutput {
            valid_records: resolution.survivors,
            invalid_records: invalid,
            report,
        })
    }

    fn check_columns(&self, set: &RecordSet) -> Result<(), RegistryError> {
        for column in REQUIRED_COLUMNS {
            let supplied = set.has_column(column)
                || self.transforms.iter().any(|t| t.supplies_column(set, column));
            if !supplied {
                return Err(RegistryError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    fn apply_transforms(&self, record: Record) -> Result<Record, RegistryError> {
        self.transforms
            .iter()
            .try_fold(record, |record, transform| transform.apply(record))
    }

    /// Normalized view of an identifier-valid record, or `None` when no
    /// usable given name remains.
    fn normalize_fields(&self, record: Record, corrections: &mut NameCorrections) -> Option<Record> {
        let nombres = record
            .nombres()
            .and_then(|n| self.names.normalize(n, FieldKind::Name))?;
        let apellidos = record
            .apellidos()
            .and_then(|a| self.names.normalize(a, FieldKind::Name));
        let tipo = record
            .tipo_documento()
            .and_then(|t| self.names.normalize(t, FieldKind::Text));

        if record.nombres() != Some(nombres.as_str()) {
            corrections.names += 1;
        }
        if record.apellidos() != apellidos.as_deref() {
            corrections.surnames += 1;
        }

        Some(
            record
                .with(NOMBRES, Some(&nombres))
                .with(APELLIDOS, apellidos.as_deref())
                .with(TIPO_DOCUMENTO, tipo.as_deref()),
        )
    }
}

fn transform_message(error: RegistryError) -> String {
    match error {
        RegistryError::Transform { message, .. } => message,
        other => other.to_string(),
    }
}

/// Run the core stages over `set` with the given key scheme.
pub fn process(set: &RecordSet, key_scheme: KeyScheme) -> Result<ProcessOutput, RegistryError> {
    Pipeline::new(key_scheme).process(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::PenaltyScorer;

    const COLUMNS: [&str; 4] = ["identificacion", "nombres", "apellidos", "tipo_documento"];

    fn set(rows: &[[&str; 4]]) -> RecordSet {
        let rows: Vec<Vec<&str>> = rows.iter().map(|r| r.to_vec()).collect();
        RecordSet::from_rows(&COLUMNS, &rows)
    }

    struct FailOnRow(usize);

    impl RecordTransform for FailOnRow {
        fn name(&self) -> &'static str {
            "fail_on_row"
        }

        fn apply(&self, record: Record) -> Result<Record, RegistryError> {
            if record.row == self.0 {
                return Err(RegistryError::Transform {
                    row: record.row,
                    message: "unparseable value".into(),
                });
            }
            Ok(record)
        }
    }

    #[test]
    fn zero_rows_is_not_an_error() {
        let out = process(&RecordSet::default(), KeyScheme::Identifier).unwrap();
        assert!(out.valid_records.is_empty());
        assert!(out.invalid_records.is_empty());
        assert_eq!(out.report.total_records, 0);
    }

    #[test]
    fn richer_duplicate_survives() {
        let out = process(
            &set(&[
                ["123456", "ana", "", ""],
                ["123456", "ana maria", "lopez", "CC"],
            ]),
            KeyScheme::Identifier,
        )
        .unwrap();

        assert_eq!(out.valid_records.len(), 1);
        let survivor = &out.valid_records[0];
        assert_eq!(survivor.row, 1);
        assert_eq!(survivor.nombres(), Some("Ana Maria"));
        assert_eq!(survivor.apellidos(), Some("Lopez"));

        assert_eq!(out.invalid_records.len(), 1);
        assert_eq!(out.invalid_records[0].record.row, 0);
        assert_eq!(
            out.invalid_records[0].reason,
            RejectReason::DuplicateLoser {
                key: "123456".into(),
                survivor_row: 1
            }
        );
        assert_eq!(out.report.duplicates_eliminated, 1);
        assert_eq!(out.report.invalid_identifiers, 0);
    }

    #[test]
    fn rejections_are_tagged_and_counted() {
        let out = process(
            &set(&[
                ["12345", "ana", "paz", "CC"],
                ["000000", "eva", "paz", "CC"],
                ["222222", "N/A", "paz", "CC"],
                ["333333", "luz", "", ""],
                ["abc123", "", "", ""],
            ]),
            KeyScheme::Identifier,
        )
        .unwrap();

        assert_eq!(out.report.total_records, 5);
        assert_eq!(out.report.invalid_identifiers, 3);
        assert_eq!(out.report.unresolvable_names, 1);
        assert_eq!(out.report.records_valid, 1);
        assert!(out.report.is_balanced());

        let rows: Vec<usize> = out.invalid_records.iter().map(|r| r.record.row).collect();
        assert_eq!(rows, vec![0, 1, 2, 4]);
        assert_eq!(out.rejected_as("unresolvable_name").count(), 1);
        assert_eq!(out.invalid_records[2].record.nombres(), Some("N/A"));
    }

    #[test]
    fn missing_required_column_is_structural() {
        let rows = vec![vec!["ana", "lopez"]];
        let no_ident = RecordSet::from_rows(&["nombres", "apellidos"], &rows);
        let err = process(&no_ident, KeyScheme::Identifier).unwrap_err();
        assert!(err.is_structural());
        assert_eq!(
            err,
            RegistryError::MissingColumn {
                column: "identificacion".into()
            }
        );

        let rows = vec![vec!["123456", "lopez"]];
        let no_names = RecordSet::from_rows(&["identificacion", "apellidos"], &rows);
        let err = process(&no_names, KeyScheme::Identifier).unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingColumn {
                column: "nombres".into()
            }
        );
    }

    #[test]
    fn full_name_column_satisfies_names_requirement() {
        let rows = vec![vec!["123456", "ana maria lopez diaz"]];
        let s = RecordSet::from_rows(&["identificacion", "nombre_completo"], &rows);

        assert!(process(&s, KeyScheme::Identifier).is_err());

        let out = Pipeline::default().process(&s).unwrap();
        assert_eq!(out.valid_records[0].nombres(), Some("Ana Maria"));
        assert_eq!(out.valid_records[0].apellidos(), Some("Lopez Diaz"));
    }

    #[test]
    fn numeric_document_type_does_not_merge_distinct_people() {
        let out = Pipeline::default()
            .process(&set(&[
                ["1310203040", "ana", "paz", "13"],
                ["10203040", "luis", "rojas", "13"],
            ]))
            .unwrap();

        assert_eq!(out.report.duplicates_eliminated, 0);
        let idents: Vec<_> = out.valid_records.iter().map(|r| r.identificacion()).collect();
        assert_eq!(idents, vec![Some("1310203040"), Some("10203040")]);
    }

    #[test]
    fn failing_transform_rejects_only_its_row() {
        let pipeline = Pipeline::new(KeyScheme::Identifier).with_transform(FailOnRow(1));
        let out = pipeline
            .process(&set(&[
                ["111111", "ana", "paz", "CC"],
                ["222222", "eva", "paz", "CC"],
                ["333333", "luz", "paz", "CC"],
            ]))
            .unwrap();

        assert_eq!(out.valid_records.len(), 2);
        assert_eq!(out.report.transform_errors, 1);
        assert_eq!(
            out.invalid_records[0].reason,
            RejectReason::TransformError {
                message: "unparseable value".into()
            }
        );
        assert!(out.report.is_balanced());
    }

    #[test]
    fn default_transforms_clean_identifier_and_type() {
        let out = Pipeline::default()
            .process(&set(&[["RC 1234567", "ana", "paz", " rc "]]))
            .unwrap();
        let r = &out.valid_records[0];
        assert_eq!(r.identificacion(), Some("1234567"));
        assert_eq!(r.tipo_documento(), Some("RC"));
    }

    #[test]
    fn key_scheme_with_document_type_keeps_both() {
        let s = set(&[
            ["900123456", "ana", "paz", "NIT"],
            ["900123456", "ana", "paz", "CC"],
        ]);
        let by_id = process(&s, KeyScheme::Identifier).unwrap();
        assert_eq!(by_id.valid_records.len(), 1);

        let by_type = process(&s, KeyScheme::IdentifierDocumentType).unwrap();
        assert_eq!(by_type.valid_records.len(), 2);
    }

    #[test]
    fn injected_scorer_changes_survivor() {
        let s = set(&[
            ["123456", "ana maria lopez diaz", "", "CC"],
            ["123456", "ana", "", ""],
        ]);
        // completeness: 3 vs 2; penalty: 15 - 7 vs 15 - 4
        let completeness = process(&s, KeyScheme::Identifier).unwrap();
        assert_eq!(completeness.valid_records[0].row, 0);

        let penalty = Pipeline::new(KeyScheme::Identifier)
            .with_scorer(PenaltyScorer)
            .process(&s)
            .unwrap();
        assert_eq!(penalty.valid_records[0].row, 1);
        assert_eq!(Pipeline::new(KeyScheme::Identifier).with_scorer(PenaltyScorer).scorer_name(), "penalty");
    }

    #[test]
    fn corrections_are_counted() {
        let out = process(
            &set(&[["123456", "JOSÉ   LUIS", "Pérez", ""], ["654321", "Ana", "LOPEZ", ""]]),
            KeyScheme::Identifier,
        )
        .unwrap();
        assert_eq!(out.report.names_corrected, 1);
        assert_eq!(out.report.surnames_corrected, 1);
        assert_eq!(out.valid_records[0].nombres(), Some("José Luis"));
    }

    #[test]
    fn rerun_on_valid_output_is_stable() {
        let s = set(&[
            ["123456", "ana", "", ""],
            ["123456", "ana maria", "lopez", "CC"],
            ["777777", "o'conner", "mcdonald", "ce"],
        ]);
        let first = process(&s, KeyScheme::Identifier).unwrap();

        let mut refed = RecordSet::new(COLUMNS.iter().map(|c| c.to_string()).collect());
        for r in &first.valid_records {
            refed.push(r.fields());
        }
        let second = process(&refed, KeyScheme::Identifier).unwrap();

        let strip = |records: &[Record]| -> Vec<Vec<(String, String)>> {
            records
                .iter()
                .map(|r| r.fields().map(|(k, v)| (k.to_string(), v.to_string())).collect())
                .collect()
        };
        assert_eq!(strip(&first.valid_records), strip(&second.valid_records));
        assert_eq!(second.report.names_corrected, 0);
    }

    #[test]
    fn default_pipeline_reports_configured_stages() {
        let pipeline = Pipeline::default();
        assert_eq!(pipeline.key_scheme(), KeyScheme::Identifier);
        assert_eq!(pipeline.scorer_name(), "completeness");
        assert_eq!(
            pipeline.transform_names(),
            vec!["repair_document_type", "strip_document_prefix", "split_full_name"]
        );
    }
}
