//! SQL batch files for the target `t_tercero` table.
//!
//! Rendering is pure: records or ids in, named file contents out. Files are
//! split so that each holds at most `statements_per_file` statements of at
//! most `rows_per_statement` rows, each statement terminated by `GO`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use terceros_core::config::SqlConfig;
use terceros_core::model::{ProcessOutput, Record, RejectReason};

use crate::error::IoError;

/// Column holding the target table's numeric row id in exports.
pub const DATABASE_ID_COLUMN: &str = "id";

const INSERT_COLUMNS: [&str; 4] = ["identificacion", "nombres", "apellidos", "tipo_documento"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFile {
    pub name: String,
    pub contents: String,
}

/// Single-quoted literal with embedded quotes doubled.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.trim().replace('\'', "''"))
}

fn file_header(config: &SqlConfig) -> String {
    match &config.database {
        Some(db) => format!("USE {db};\nGO\n\n"),
        None => String::new(),
    }
}

/// Chunk `items` into statements, statements into files.
fn render_files<T>(
    items: &[T],
    config: &SqlConfig,
    file_prefix: &str,
    statement: impl Fn(&[T]) -> String,
) -> Vec<SqlFile> {
    let rows_per_statement = config.rows_per_statement.max(1);
    let statements_per_file = config.statements_per_file.max(1);
    let header = file_header(config);

    let statements: Vec<String> = items.chunks(rows_per_statement).map(statement).collect();

    statements
        .chunks(statements_per_file)
        .enumerate()
        .map(|(i, chunk)| {
            let mut contents = header.clone();
            for stmt in chunk {
                contents.push_str(stmt);
                contents.push_str(";\nGO\n\n");
            }
            SqlFile {
                name: format!("{file_prefix}{}.sql", i + 1),
                contents,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// INSERT
// ---------------------------------------------------------------------------

pub fn render_inserts(records: &[Record], config: &SqlConfig) -> Vec<SqlFile> {
    let table = &config.table;
    render_files(records, config, "insert_terceros_parte", |chunk| {
        let values: Vec<String> = chunk
            .iter()
            .map(|r| {
                let fields: Vec<String> = INSERT_COLUMNS
                    .iter()
                    .map(|c| quote(r.get(c).unwrap_or("")))
                    .collect();
                format!("({})", fields.join(", "))
            })
            .collect();
        format!(
            "INSERT INTO {table} (\n    {}\n) VALUES\n{}",
            INSERT_COLUMNS.join(",\n    "),
            values.join(",\n")
        )
    })
}

/// Survivors to insert after dropping identifiers already in the target
/// table or already emitted earlier in this plan.
#[derive(Debug, Clone, Default)]
pub struct InsertPlan {
    pub records: Vec<Record>,
    pub skipped_existing: usize,
    pub skipped_repeated: usize,
}

pub fn plan_inserts(records: &[Record], existing: &HashSet<String>) -> InsertPlan {
    let mut plan = InsertPlan::default();
    let mut emitted: HashSet<&str> = HashSet::new();

    for record in records {
        let Some(ident) = record.identificacion() else {
            continue;
        };
        if existing.contains(ident) {
            plan.skipped_existing += 1;
        } else if !emitted.insert(ident) {
            plan.skipped_repeated += 1;
        } else {
            plan.records.push(record.clone());
        }
    }
    plan
}

/// Identifiers already present in the target table: first column of a CSV
/// export, header optional. Leading/trailing whitespace is ignored.
pub fn load_existing_ids(path: &Path) -> Result<HashSet<String>, IoError> {
    let content = crate::csv::read_file_as_utf8(path)?;
    let delimiter = crate::csv::sniff_delimiter(&content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut ids = HashSet::new();
    for result in reader.records() {
        let row = result?;
        if let Some(first) = row.get(0).map(str::trim).filter(|v| !v.is_empty()) {
            // A header cell is never a bare number; skip it along with other junk.
            if first.bytes().all(|b| b.is_ascii_digit()) {
                ids.insert(first.to_string());
            }
        }
    }
    log::info!("{}: {} existing identifiers", path.display(), ids.len());
    Ok(ids)
}

// ---------------------------------------------------------------------------
// DELETE
// ---------------------------------------------------------------------------

pub fn render_deletes(ids: &[u64], config: &SqlConfig) -> Vec<SqlFile> {
    let table = &config.table;
    render_files(ids, config, "delete_parte", |chunk| {
        let list: Vec<String> = chunk.iter().map(|id| id.to_string()).collect();
        format!("DELETE FROM {table}\nWHERE id IN ({})", list.join(", "))
    })
}

/// Database ids of every duplicate loser. Losers whose `id` is absent or not
/// an integer are counted in the second value and left out.
pub fn duplicate_loser_ids(output: &ProcessOutput) -> (Vec<u64>, usize) {
    let mut ids = Vec::new();
    let mut skipped = 0;

    for rejected in &output.invalid_records {
        if !matches!(rejected.reason, RejectReason::DuplicateLoser { .. }) {
            continue;
        }
        let raw = rejected.record.get(DATABASE_ID_COLUMN);
        match raw.and_then(|v| v.parse::<u64>().ok()) {
            Some(id) => ids.push(id),
            None => {
                log::warn!(
                    "row {}: duplicate loser has no numeric database id ({:?}), skipped",
                    rejected.record.row,
                    raw,
                );
                skipped += 1;
            }
        }
    }
    (ids, skipped)
}

// ---------------------------------------------------------------------------
// UPDATE tipo_documento
// ---------------------------------------------------------------------------

pub fn render_document_type_updates(
    identifiers: &[String],
    document_type: &str,
    config: &SqlConfig,
) -> Vec<SqlFile> {
    let table = &config.table;
    let document_type = quote(document_type);
    render_files(identifiers, config, "update_tipo_documento_parte", |chunk| {
        let list: Vec<String> = chunk.iter().map(|id| format!("    {}", quote(id))).collect();
        format!(
            "UPDATE {table}\nSET tipo_documento = {document_type}\nWHERE identificacion IN (\n{}\n)",
            list.join(",\n")
        )
    })
}

/// Valid identifiers whose document type matches `document_type`, case-insensitively.
pub fn identifiers_with_document_type(records: &[Record], document_type: &str) -> Vec<String> {
    let wanted = document_type.trim().to_uppercase();
    records
        .iter()
        .filter(|r| r.tipo_documento().is_some_and(|t| t.to_uppercase() == wanted))
        .filter_map(|r| r.identificacion().map(str::to_string))
        .collect()
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

pub fn write_sql_files(dir: &Path, files: &[SqlFile]) -> Result<Vec<PathBuf>, IoError> {
    std::fs::create_dir_all(dir).map_err(|e| IoError::Write(format!("{}: {e}", dir.display())))?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = dir.join(&file.name);
        std::fs::write(&path, &file.contents)
            .map_err(|e| IoError::Write(format!("{}: {e}", path.display())))?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use terceros_core::model::{Rejected, ValidationReport};
    use tempfile::tempdir;

    fn rec(row: usize, pairs: &[(&str, &str)]) -> Record {
        Record::from_pairs(row, pairs.iter().copied())
    }

    fn small_batches(database: Option<&str>) -> SqlConfig {
        SqlConfig {
            database: database.map(String::from),
            rows_per_statement: 2,
            statements_per_file: 2,
            ..SqlConfig::default()
        }
    }

    #[test]
    fn quote_doubles_single_quotes() {
        assert_eq!(quote("O'Conner"), "'O''Conner'");
        assert_eq!(quote(" Ana "), "'Ana'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn insert_statement_layout() {
        let records = vec![
            rec(0, &[("identificacion", "123456"), ("nombres", "Ana"), ("tipo_documento", "CC")]),
            rec(1, &[("identificacion", "654321"), ("nombres", "O'Neil"), ("apellidos", "Paz")]),
        ];
        let files = render_inserts(&records, &SqlConfig::default());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "insert_terceros_parte1.sql");
        assert_eq!(
            files[0].contents,
            "INSERT INTO t_tercero (\n    identificacion,\n    nombres,\n    apellidos,\n    tipo_documento\n) VALUES\n\
             ('123456', 'Ana', '', 'CC'),\n\
             ('654321', 'O''Neil', 'Paz', '');\nGO\n\n"
        );
    }

    #[test]
    fn batches_split_across_files() {
        let records: Vec<Record> = (0..9)
            .map(|i| {
                let ident = format!("10000{i}");
                rec(i, &[("identificacion", ident.as_str()), ("nombres", "Ana")])
            })
            .collect();
        let files = render_inserts(&records, &small_batches(Some("gdocxhl")));

        // 9 rows -> 5 statements -> 3 files of at most 2 statements
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["insert_terceros_parte1.sql", "insert_terceros_parte2.sql", "insert_terceros_parte3.sql"]
        );
        for file in &files {
            assert!(file.contents.starts_with("USE gdocxhl;\nGO\n\n"));
        }
        assert_eq!(files[0].contents.matches("INSERT INTO").count(), 2);
        assert_eq!(files[2].contents.matches("INSERT INTO").count(), 1);
        assert_eq!(files[2].contents.matches("GO\n").count(), 2);
    }

    #[test]
    fn no_records_no_files() {
        assert!(render_inserts(&[], &SqlConfig::default()).is_empty());
        assert!(render_deletes(&[], &SqlConfig::default()).is_empty());
    }

    #[test]
    fn insert_plan_skips_existing_and_repeats() {
        let records = vec![
            rec(0, &[("identificacion", "111111")]),
            rec(1, &[("identificacion", "222222")]),
            rec(2, &[("identificacion", "111111")]),
            rec(3, &[("identificacion", "333333")]),
        ];
        let existing: HashSet<String> = ["333333".to_string()].into_iter().collect();
        let plan = plan_inserts(&records, &existing);
        let rows: Vec<usize> = plan.records.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 1]);
        assert_eq!(plan.skipped_existing, 1);
        assert_eq!(plan.skipped_repeated, 1);
    }

    #[test]
    fn existing_ids_from_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existentes.csv");
        std::fs::write(&path, "identificacion;nombres\n 123456 ;Ana\n654321;Eva\n;\n").unwrap();
        let ids = load_existing_ids(&path).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("123456"));
    }

    #[test]
    fn delete_ids_from_duplicate_losers() {
        let loser = |row: usize, id: &str| Rejected {
            record: rec(row, &[("id", id), ("identificacion", "123456")]),
            reason: RejectReason::DuplicateLoser {
                key: "123456".into(),
                survivor_row: 0,
            },
        };
        let output = ProcessOutput {
            valid_records: vec![],
            invalid_records: vec![
                loser(1, "42"),
                Rejected {
                    record: rec(2, &[("id", "77")]),
                    reason: RejectReason::InvalidIdentifier,
                },
                loser(3, "abc"),
                loser(4, "43"),
            ],
            report: ValidationReport::default(),
        };

        let (ids, skipped) = duplicate_loser_ids(&output);
        assert_eq!(ids, vec![42, 43]);
        assert_eq!(skipped, 1);

        let files = render_deletes(&ids, &SqlConfig::default());
        assert_eq!(files[0].name, "delete_parte1.sql");
        assert_eq!(files[0].contents, "DELETE FROM t_tercero\nWHERE id IN (42, 43);\nGO\n\n");
    }

    #[test]
    fn document_type_updates() {
        let records = vec![
            rec(0, &[("identificacion", "900123456"), ("tipo_documento", "nit")]),
            rec(1, &[("identificacion", "123456"), ("tipo_documento", "CC")]),
            rec(2, &[("identificacion", "900654321"), ("tipo_documento", "NIT")]),
        ];
        let ids = identifiers_with_document_type(&records, "NIT");
        assert_eq!(ids, vec!["900123456", "900654321"]);

        let files = render_document_type_updates(&ids, "NIT", &SqlConfig::default());
        assert_eq!(files[0].name, "update_tipo_documento_parte1.sql");
        assert_eq!(
            files[0].contents,
            "UPDATE t_tercero\nSET tipo_documento = 'NIT'\nWHERE identificacion IN (\n    '900123456',\n    '900654321'\n);\nGO\n\n"
        );
    }

    #[test]
    fn write_files_to_dir() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("sql");
        let files = vec![SqlFile {
            name: "delete_parte1.sql".into(),
            contents: "DELETE FROM t_tercero\nWHERE id IN (1);\nGO\n\n".into(),
        }];
        let written = write_sql_files(&out, &files).unwrap();
        assert_eq!(written, vec![out.join("delete_parte1.sql")]);
        assert!(std::fs::read_to_string(&written[0]).unwrap().contains("id IN (1)"));
    }
}
