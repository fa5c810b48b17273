use crate::model::{Record, RejectReason, Rejected, ValidationReport};

/// How many surviving-stage records had their name fields rewritten by normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameCorrections {
    pub names: usize,
    pub surnames: usize,
}

/// Compute report counts from a finished partition.
pub fn compute_report(
    total_records: usize,
    valid: &[Record],
    invalid: &[Rejected],
    corrections: NameCorrections,
) -> ValidationReport {
    let mut report = ValidationReport {
        total_records,
        records_valid: valid.len(),
        names_corrected: corrections.names,
        surnames_corrected: corrections.surnames,
        ..ValidationReport::default()
    };

    for rejected in invalid {
        match rejected.reason {
            RejectReason::InvalidIdentifier => report.invalid_identifiers += 1,
            RejectReason::UnresolvableName => report.unresolvable_names += 1,
            RejectReason::DuplicateLoser { .. } => report.duplicates_eliminated += 1,
            RejectReason::TransformError { .. } => report.transform_errors += 1,
        }
    }

    report
}

impl ValidationReport {
    pub fn rejected(&self) -> usize {
        self.invalid_identifiers + self.unresolvable_names + self.transform_errors + self.duplicates_eliminated
    }

    /// Every input row is accounted for exactly once.
    pub fn is_balanced(&self) -> bool {
        self.total_records == self.records_valid + self.rejected()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} records: {} valid, {} invalid identifier, {} unresolvable name, {} duplicate, {} transform error",
            self.total_records,
            self.records_valid,
            self.invalid_identifiers,
            self.unresolvable_names,
            self.duplicates_eliminated,
            self.transform_errors,
        )
    }
}
