use serde::{Deserialize, Serialize};

use crate::model::Record;
use crate::normalize::is_name_letter;

/// Ranks records inside one duplicate group. Higher is better.
///
/// Scores are only comparable within a group.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(&self, record: &Record) -> u32;
}

/// Which scorer a pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    #[default]
    Completeness,
    Penalty,
}

impl ScorerKind {
    pub fn build(&self) -> Box<dyn Scorer> {
        match self {
            Self::Completeness => Box::new(CompletenessScorer),
            Self::Penalty => Box::new(PenaltyScorer),
        }
    }
}

// ---------------------------------------------------------------------------
// Completeness (default)
// ---------------------------------------------------------------------------

pub const MAX_COMPLETENESS_SCORE: u32 = 5;

/// One point each for: names present, names legible, surnames present,
/// surnames legible, document type present.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessScorer;

impl Scorer for CompletenessScorer {
    fn name(&self) -> &'static str {
        "completeness"
    }

    fn score(&self, record: &Record) -> u32 {
        let mut points = 0;

        if let Some(nombres) = record.nombres() {
            points += 1;
            if has_letter_run(nombres, 2) {
                points += 1;
            }
        }

        if let Some(apellidos) = record.apellidos() {
            points += 1;
            if has_letter_run(apellidos, 2) {
                points += 1;
            }
        }

        if record.tipo_documento().is_some() {
            points += 1;
        }

        points
    }
}

/// Score with the default completeness scorer.
pub fn score(record: &Record) -> u32 {
    CompletenessScorer.score(record)
}

/// True if `text` contains at least `min_len` consecutive name letters.
pub fn has_letter_run(text: &str, min_len: usize) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if is_name_letter(c) {
            run += 1;
            if run >= min_len {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Penalty (legacy heuristic)
// ---------------------------------------------------------------------------

pub const PENALTY_CEILING: u32 = 15;

/// Penalizes missing or suspicious name shapes; exposed as
/// `PENALTY_CEILING - penalty` so higher still ranks first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PenaltyScorer;

impl PenaltyScorer {
    pub fn penalty(record: &Record) -> u32 {
        let nombres = record.nombres().unwrap_or("");
        let apellidos = record.apellidos().unwrap_or("");
        let name_words = nombres.split_whitespace().count();
        let surname_words = apellidos.split_whitespace().count();

        let mut penalty = 0;

        if nombres.is_empty() {
            penalty += 3;
        }
        if apellidos.is_empty() {
            penalty += 2;
        }

        // Surnames probably mixed into the names column
        if name_words > 2 {
            penalty += 1;
        }
        if name_words >= 4 {
            penalty += 2;
        }

        if surname_words == 0 {
            penalty += 2;
        }
        if surname_words > 4 {
            penalty += 2;
        }

        // Exact comparison: two empty columns also count as equal.
        if nombres == apellidos {
            penalty += 3;
        }

        penalty
    }
}

impl Scorer for PenaltyScorer {
    fn name(&self) -> &'static str {
        "penalty"
    }

    fn score(&self, record: &Record) -> u32 {
        PENALTY_CEILING.saturating_sub(Self::penalty(record))
    }
}
