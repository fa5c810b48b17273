use serde::Deserialize;

pub const DEFAULT_MIN_DIGITS: usize = 6;
pub const DEFAULT_MAX_DIGITS: usize = 15;

/// Well-formedness rule for identification numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IdentifierRule {
    #[serde(default = "default_min_digits")]
    pub min_digits: usize,
    #[serde(default = "default_max_digits")]
    pub max_digits: usize,
}

fn default_min_digits() -> usize {
    DEFAULT_MIN_DIGITS
}

fn default_max_digits() -> usize {
    DEFAULT_MAX_DIGITS
}

impl Default for IdentifierRule {
    fn default() -> Self {
        Self {
            min_digits: DEFAULT_MIN_DIGITS,
            max_digits: DEFAULT_MAX_DIGITS,
        }
    }
}

impl IdentifierRule {
    /// Valid iff, after trimming, the text is `min..=max` ASCII digits and not all zeros.
    /// Absent input is invalid.
    pub fn is_valid(&self, text: Option<&str>) -> bool {
        let Some(text) = text.map(str::trim) else {
            return false;
        };

        (self.min_digits..=self.max_digits).contains(&text.len())
            && text.bytes().all(|b| b.is_ascii_digit())
            && text.bytes().any(|b| b != b'0')
    }
}

/// Check an identifier against the default 6-15 digit rule.
pub fn is_valid_identifier(text: &str) -> bool {
    IdentifierRule::default().is_valid(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_boundaries() {
        assert!(is_valid_identifier("123456"));
        assert!(!is_valid_identifier("12345"));
        assert!(is_valid_identifier("123456789012345"));
        assert!(!is_valid_identifier("1234567890123456"));
    }

    #[test]
    fn all_zeros_rejected() {
        assert!(!is_valid_identifier("000000"));
        assert!(!is_valid_identifier("000000000000000"));
        assert!(is_valid_identifier("000001"));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert!(is_valid_identifier("  1098765432 "));
    }

    #[test]
    fn non_digits_rejected() {
        assert!(!is_valid_identifier("12345a"));
        assert!(!is_valid_identifier("123 456"));
        assert!(!is_valid_identifier("1.234.567"));
        assert!(!is_valid_identifier("-123456"));
        // Non-ASCII digits (Arabic-Indic) do not count
        assert!(!is_valid_identifier("١٢٣٤٥٦"));
    }

    #[test]
    fn empty_and_absent_rejected() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("   "));
        assert!(!IdentifierRule::default().is_valid(None));
    }

    #[test]
    fn custom_range() {
        let rule = IdentifierRule {
            min_digits: 4,
            max_digits: 6,
        };
        assert!(rule.is_valid(Some("1234")));
        assert!(!rule.is_valid(Some("1234567")));
    }
}
