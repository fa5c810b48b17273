//! Repair of UTF-8 text that was decoded as Windows-1252 somewhere upstream
//! (`"JosÃ©"` -> `"José"`).

use std::borrow::Cow;

/// UTF-8 byte pairs for common Latin letters, as they read after a
/// Windows-1252 decode. Bytes undefined in Windows-1252 show up as C1 controls.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã\u{AD}", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã±", "ñ"),
    ("Ã¼", "ü"),
    ("Ã§", "ç"),
    ("Ã£", "ã"),
    ("Ãµ", "õ"),
    ("Ã¢", "â"),
    ("Ãª", "ê"),
    ("Ã´", "ô"),
    ("Ã¨", "è"),
    ("Ã¬", "ì"),
    ("Ã²", "ò"),
    ("Ã¹", "ù"),
    ("Ã¤", "ä"),
    ("Ã«", "ë"),
    ("Ã¯", "ï"),
    ("Ã¶", "ö"),
    ("Ã\u{A0}", "à"),
    ("Ã\u{81}", "Á"),
    ("Ã‰", "É"),
    ("Ã\u{8D}", "Í"),
    ("Ã“", "Ó"),
    ("Ãš", "Ú"),
    ("Ã‘", "Ñ"),
    ("Ãœ", "Ü"),
    ("Ã‡", "Ç"),
    ("Ã€", "À"),
    ("Ãˆ", "È"),
    ("ÃŒ", "Ì"),
    ("Ã’", "Ò"),
    ("Ã”", "Ô"),
    ("Ã–", "Ö"),
    ("Â°", "°"),
    ("Â´", "´"),
    // UTF-8 BOM read as Windows-1252
    ("ï»¿", ""),
];

/// Invisible debris removed outright.
const DEBRIS: [char; 2] = ['\u{0}', '\u{FEFF}'];

pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Replace known mojibake sequences and drop NUL / BOM characters.
/// U+FFFD is left alone; see [`strip_replacement_chars`].
pub fn repair(text: &str) -> Cow<'_, str> {
    let needs_work = text.contains(['Ã', 'Â', 'ï']) || text.contains(DEBRIS);
    if !needs_work {
        return Cow::Borrowed(text);
    }

    let mut repaired = text.replace(DEBRIS, "");
    for (damaged, correct) in REPLACEMENTS {
        if repaired.contains(damaged) {
            repaired = repaired.replace(damaged, correct);
        }
    }
    Cow::Owned(repaired)
}

/// Drop U+FFFD. The letter it stood for is unrecoverable.
pub fn strip_replacement_chars(text: &str) -> Cow<'_, str> {
    if text.contains(REPLACEMENT_CHAR) {
        Cow::Owned(text.replace(REPLACEMENT_CHAR, ""))
    } else {
        Cow::Borrowed(text)
    }
}
