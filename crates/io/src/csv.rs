// CSV ingestion: decoding, delimiter sniffing, header aliasing

use std::path::{Path, PathBuf};

use terceros_core::model::{RecordSet, TIPO_DOCUMENTO};

use crate::error::IoError;
use crate::mojibake;

/// Header aliases seen in source exports, keyed by canonical field name.
const HEADER_ALIASES: &[(&str, &[&str])] = &[
    ("nombres", &["nombre", "primer_nombre", "person_name"]),
    ("apellidos", &["apellido", "segundo_apellido", "last_name"]),
    (
        "tipo_documento",
        &["tipo_doc", "tipo", "tipo id", "document_type", "tdoc"],
    ),
    (
        "identificacion",
        &[
            "ident",
            "id_tercero",
            "documento",
            "document",
            "numero_documento",
            "doc_number",
            "cedula",
            "num_id",
            "numdocumento",
        ],
    ),
    ("nombre_completo", &["nombres_apellidos", "nomapellido"]),
];

/// Load a CSV file into a record set with canonical column names.
pub fn load_record_set(path: &Path) -> Result<RecordSet, IoError> {
    let content = read_file_as_utf8(path)?;
    let set = parse_record_set(&content)?;
    log::info!("{}: loaded {} rows, columns {:?}", path.display(), set.len(), set.columns);
    Ok(set)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::read(path, e))?;
    Ok(decode_bytes(bytes))
}

/// UTF-8 first; on failure fall back to Windows-1252 (common for Excel-exported CSVs).
/// A leading BOM is removed either way.
pub fn decode_bytes(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("input is not valid UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    match text.strip_prefix('\u{FEFF}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Delimiters seen in registry exports, in preference order for ties.
const DELIMITER_CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];
/// Non-blank lines inspected when sniffing, header included.
const SNIFF_LINES: usize = 10;

/// Pick the delimiter that splits the header into at least two columns and
/// that the most sampled data rows agree with, weighted by column count.
/// Falls back to `,`.
pub fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let Some((header, rows)) = sample.split_first() else {
        return b',';
    };

    let mut best: Option<(u8, usize)> = None;
    for delimiter in DELIMITER_CANDIDATES {
        let width = field_count(header, delimiter);
        if width < 2 {
            continue;
        }
        let agreeing = rows.iter().filter(|row| field_count(row, delimiter) == width).count();
        let weight = (agreeing + 1) * width;
        if best.map_or(true, |(_, top)| weight > top) {
            best = Some((delimiter, weight));
        }
    }

    best.map_or(b',', |(delimiter, _)| delimiter)
}

/// Quote-aware field count of a single line.
fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

/// Lowercase, trim, drop BOM and quotes, collapse whitespace, then resolve aliases.
/// Unknown headers pass through in their cleaned form.
pub fn canonical_header(raw: &str) -> String {
    let cleaned: String = mojibake::repair(raw)
        .chars()
        .filter(|&c| c != '"' && c != '\'' && c != '\u{FEFF}')
        .collect();
    let cleaned = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    for (canonical, aliases) in HEADER_ALIASES {
        if cleaned == *canonical || aliases.contains(&cleaned.as_str()) {
            return canonical.to_string();
        }
    }
    cleaned
}

/// Parse CSV text (header row first) into a record set.
///
/// Values go through mojibake repair. Rows with every field empty are skipped.
/// Short rows leave trailing columns absent; extra fields beyond the header are ignored.
pub fn parse_record_set(content: &str) -> Result<RecordSet, IoError> {
    let delimiter = sniff_delimiter(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = reader.records();
    let header = match rows.next() {
        Some(result) => result?,
        None => return Ok(RecordSet::default()),
    };

    let columns = dedupe_columns(header.iter().map(canonical_header).collect());
    let mut set = RecordSet::new(columns.iter().filter(|c| !c.is_empty()).cloned().collect());
    let mut skipped = 0usize;

    for result in rows {
        let row = result?;
        if row.iter().all(|field| field.trim().is_empty()) {
            skipped += 1;
            continue;
        }

        let pairs: Vec<(&str, String)> = columns
            .iter()
            .zip(row.iter())
            .filter(|(column, _)| !column.is_empty())
            .map(|(column, value)| (column.as_str(), clean_value(column, value)))
            .collect();
        set.push(pairs);
    }

    if skipped > 0 {
        log::debug!("skipped {skipped} empty rows");
    }
    Ok(set)
}

/// Two headers resolving to the same name: the first keeps it, later ones
/// get a numeric suffix so no value is silently overwritten.
fn dedupe_columns(columns: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        if column.is_empty() || !seen.contains(&column) {
            seen.push(column);
            continue;
        }
        let mut n = 2;
        while seen.contains(&format!("{column}_{n}")) {
            n += 1;
        }
        seen.push(format!("{column}_{n}"));
    }
    seen
}

fn clean_value(column: &str, value: &str) -> String {
    let repaired = mojibake::repair(value);
    // Document types keep U+FFFD so the type repair table can still match them.
    if column == TIPO_DOCUMENTO {
        repaired.into_owned()
    } else {
        mojibake::strip_replacement_chars(&repaired).into_owned()
    }
}

/// Input files to process: a file as-is, or every `*.csv` directly inside a directory, sorted.
/// Directory scans skip CSVs written by a previous `clean` run.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, IoError> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)
                .map_err(|e| IoError::read(path, e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
                })
                .filter(|p| {
                    let own = crate::export::is_export_output(p);
                    if own {
                        log::debug!("skipping previous output {}", p.display());
                    }
                    !own
                })
                .collect();
            found.sort();
            log::debug!("{}: {} CSV files", path.display(), found.len());
            inputs.extend(found);
        } else {
            inputs.push(path.clone());
        }
    }
    Ok(inputs)
}
