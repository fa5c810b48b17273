//! Field normalization: whitespace, alphabet, placeholder stoplist, casing.
//!
//! Every function here is pure. The resolution stage ranks records by the
//! normalized view, so the same input must always produce the same output.

use std::collections::BTreeSet;

/// Placeholder words that never identify a real person.
pub const DEFAULT_STOPLIST: &[&str] = &[
    "ok",
    "na",
    "n/a",
    "anonimo",
    "desconocido",
    "empresa",
    "distribuidora",
    "proveedor",
    "cliente",
    "razon social",
    "no aplica",
    "sin nombre",
];

/// Prefixes whose following letter also starts a capitalized run.
const IRREGULAR_PREFIXES: [&str; 1] = ["Mc"];

/// Accented letters accepted in names, besides ASCII letters.
const ACCENTED_LETTERS: &str = "ÁÉÍÓÚÑÜáéíóúñü";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Given names and surnames: alphabet-restricted, stoplisted, title-cased.
    Name,
    /// Any other text: trimmed and whitespace-collapsed only.
    Text,
}

/// Name normalizer with a configurable placeholder stoplist.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    stoplist: BTreeSet<String>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self {
            stoplist: DEFAULT_STOPLIST.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl NameNormalizer {
    /// Default stoplist plus `extra` words (compared case- and accent-insensitively).
    pub fn with_extra_stoplist<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalizer = Self::default();
        for word in extra {
            let folded = fold(&collapse_whitespace(word.as_ref()));
            if !folded.is_empty() {
                normalizer.stoplist.insert(folded);
            }
        }
        normalizer
    }

    pub fn normalize(&self, text: &str, kind: FieldKind) -> Option<String> {
        let collapsed = collapse_whitespace(text);
        if collapsed.is_empty() {
            return None;
        }

        match kind {
            FieldKind::Text => Some(collapsed),
            FieldKind::Name => self.normalize_name(&collapsed),
        }
    }

    fn normalize_name(&self, collapsed: &str) -> Option<String> {
        // "n/a" must be caught before '/' is stripped, "na." after '.' is stripped.
        if self.is_placeholder(collapsed) {
            return None;
        }

        let stripped: String = collapsed.chars().filter(|&c| is_allowed_char(c)).collect();
        let stripped = collapse_whitespace(&stripped);
        let stripped = stripped.trim_matches(|c| c == ' ' || c == '-' || c == '\'');

        if self.is_placeholder(stripped) {
            return None;
        }

        if stripped.chars().filter(|&c| is_name_letter(c)).count() < 2 {
            return None;
        }

        Some(title_case(stripped))
    }

    fn is_placeholder(&self, text: &str) -> bool {
        self.stoplist.contains(&fold(text))
    }
}

/// Normalize with the default stoplist.
pub fn normalize(text: &str, kind: FieldKind) -> Option<String> {
    NameNormalizer::default().normalize(text, kind)
}

/// Trim and collapse every internal whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Latin letter, including the accented Spanish letters.
pub fn is_name_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || ACCENTED_LETTERS.contains(c)
}

fn is_allowed_char(c: char) -> bool {
    is_name_letter(c) || c == '\'' || c == '-' || c == ' '
}

/// Lowercase and drop accents, for stoplist comparison only.
fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

/// Capitalize the first letter after every space, hyphen or apostrophe
/// (`o'neil` -> `O'Neil`, `d'angelo` -> `D'Angelo`), lowercase the rest,
/// then apply the `Mc` exception.
pub fn title_case(text: &str) -> String {
    let mut cased = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.to_lowercase().chars() {
        if c == ' ' || c == '-' || c == '\'' {
            at_word_start = true;
            cased.push(c);
        } else if at_word_start && is_name_letter(c) {
            cased.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            cased.push(c);
        }
    }

    cased
        .split(' ')
        .map(|word| {
            word.split('-')
                .map(capitalize_after_prefix)
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_after_prefix(word: &str) -> String {
    for prefix in IRREGULAR_PREFIXES {
        if let Some(rest) = word.strip_prefix(prefix) {
            let mut chars = rest.chars();
            if let Some(first) = chars.next().filter(|&c| is_name_letter(c)) {
                return format!("{prefix}{}{}", first.to_uppercase(), chars.as_str());
            }
        }
    }
    word.to_string()
}
