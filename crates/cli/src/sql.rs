//! `terceros sql`: render INSERT / DELETE / UPDATE batch files.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use terceros_core::config::SqlConfig;
use terceros_io::sql::{
    duplicate_loser_ids, identifiers_with_document_type, load_existing_ids, plan_inserts,
    render_deletes, render_document_type_updates, render_inserts, write_sql_files, SqlFile,
    DATABASE_ID_COLUMN,
};

use crate::exit_codes::EXIT_MISSING_COLUMN;
use crate::util::{build_pipeline, load_config, run_file};
use crate::{CliError, KeySchemeArg};

#[derive(Subcommand)]
pub enum SqlCommands {
    /// INSERT statements for the resolved survivors
    #[command(after_help = "\
Examples:
  terceros sql insert validos.csv
  terceros sql insert validos.csv --existing existentes.csv --out-dir salida")]
    Insert {
        /// Input CSV
        input: PathBuf,

        /// CSV whose first column lists identifiers already in the table
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Output directory for the .sql files
        #[arg(long, default_value = "salida")]
        out_dir: PathBuf,

        /// Config file (.terceros.toml)
        #[arg(long, env = "TERCEROS_CONFIG")]
        config: Option<PathBuf>,

        /// Resolution key scheme (overrides the config file)
        #[arg(long, value_enum)]
        key_scheme: Option<KeySchemeArg>,
    },

    /// DELETE statements for the database ids of duplicate losers
    #[command(after_help = "\
Examples:
  terceros sql delete t_tercero_export.csv
  terceros sql delete t_tercero_export.csv --key-scheme identifier-document-type")]
    Delete {
        /// Input CSV carrying an `id` column
        input: PathBuf,

        /// Output directory for the .sql files
        #[arg(long, default_value = "salida")]
        out_dir: PathBuf,

        /// Config file (.terceros.toml)
        #[arg(long, env = "TERCEROS_CONFIG")]
        config: Option<PathBuf>,

        /// Resolution key scheme (overrides the config file)
        #[arg(long, value_enum)]
        key_scheme: Option<KeySchemeArg>,
    },

    /// UPDATE tipo_documento for valid identifiers of one document type
    #[command(after_help = "\
Examples:
  terceros sql update-type nits.csv --document-type NIT")]
    UpdateType {
        /// Input CSV
        input: PathBuf,

        /// Document type to select and set (case-insensitive match)
        #[arg(long)]
        document_type: String,

        /// Output directory for the .sql files
        #[arg(long, default_value = "salida")]
        out_dir: PathBuf,

        /// Config file (.terceros.toml)
        #[arg(long, env = "TERCEROS_CONFIG")]
        config: Option<PathBuf>,
    },
}

pub fn cmd_sql(cmd: SqlCommands) -> Result<(), CliError> {
    match cmd {
        SqlCommands::Insert { input, existing, out_dir, config, key_scheme } => {
            cmd_sql_insert(&input, existing.as_deref(), &out_dir, config.as_deref(), key_scheme)
        }
        SqlCommands::Delete { input, out_dir, config, key_scheme } => {
            cmd_sql_delete(&input, &out_dir, config.as_deref(), key_scheme)
        }
        SqlCommands::UpdateType { input, document_type, out_dir, config } => {
            cmd_sql_update_type(&input, &document_type, &out_dir, config.as_deref())
        }
    }
}

fn cmd_sql_insert(
    input: &Path,
    existing: Option<&Path>,
    out_dir: &Path,
    config_path: Option<&Path>,
    key_scheme: Option<KeySchemeArg>,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config, key_scheme.map(Into::into));
    let (_, output) = run_file(input, &pipeline)?;

    let existing_ids = match existing {
        Some(path) => load_existing_ids(path)?,
        None => Default::default(),
    };
    let plan = plan_inserts(&output.valid_records, &existing_ids);

    let files = render_inserts(&plan.records, &config.sql);
    write_files(out_dir, &files, &config.sql)?;

    eprintln!(
        "{}: {} valid records, {} to insert ({} already in table, {} repeated)",
        input.display(),
        output.valid_records.len(),
        plan.records.len(),
        plan.skipped_existing,
        plan.skipped_repeated,
    );
    Ok(())
}

fn cmd_sql_delete(
    input: &Path,
    out_dir: &Path,
    config_path: Option<&Path>,
    key_scheme: Option<KeySchemeArg>,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config, key_scheme.map(Into::into));
    let (set, output) = run_file(input, &pipeline)?;

    if !set.is_empty() && !set.has_column(DATABASE_ID_COLUMN) {
        return Err(CliError::new(
            EXIT_MISSING_COLUMN,
            format!("{}: column '{DATABASE_ID_COLUMN}' is required to delete duplicates", input.display()),
        )
        .with_hint("export t_tercero including its numeric id column"));
    }

    let (ids, skipped) = duplicate_loser_ids(&output);
    let files = render_deletes(&ids, &config.sql);
    write_files(out_dir, &files, &config.sql)?;

    eprintln!(
        "{}: {} duplicates, {} ids to delete ({} without a numeric id)",
        input.display(),
        output.report.duplicates_eliminated,
        ids.len(),
        skipped,
    );
    Ok(())
}

fn cmd_sql_update_type(
    input: &Path,
    document_type: &str,
    out_dir: &Path,
    config_path: Option<&Path>,
) -> Result<(), CliError> {
    if document_type.trim().is_empty() {
        return Err(CliError::usage("--document-type must not be empty"));
    }

    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config, None);
    let (_, output) = run_file(input, &pipeline)?;

    let wanted = document_type.trim().to_uppercase();
    let identifiers = identifiers_with_document_type(&output.valid_records, &wanted);
    let files = render_document_type_updates(&identifiers, &wanted, &config.sql);
    write_files(out_dir, &files, &config.sql)?;

    eprintln!(
        "{}: {} identifiers with document type {wanted}",
        input.display(),
        identifiers.len(),
    );
    Ok(())
}

fn write_files(out_dir: &Path, files: &[SqlFile], sql: &SqlConfig) -> Result<(), CliError> {
    if files.is_empty() {
        eprintln!("nothing to write");
        return Ok(());
    }
    let written = write_sql_files(out_dir, files)?;
    eprintln!(
        "wrote {} file(s) to {} (table {}, {} rows per statement)",
        written.len(),
        out_dir.display(),
        sql.table,
        sql.rows_per_statement,
    );
    Ok(())
}
