// terceros CLI - tercero registry cleaning and SQL batch generation

mod clean;
mod config_cmd;
mod exit_codes;
mod sql;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use terceros_core::{KeyScheme, RegistryError};
use terceros_io::IoError;

use exit_codes::{io_exit_code, registry_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "terceros")]
#[command(about = "Clean, validate and deduplicate tercero registries; render SQL batch files")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, normalize and deduplicate CSV exports
    #[command(after_help = "\
Examples:
  terceros clean terceros.csv
  terceros clean entrada/ --out-dir salida
  terceros clean a.csv b.csv --key-scheme identifier-document-type --json
  terceros clean entrada/ --config carga.terceros.toml --report resumen.json")]
    Clean {
        /// Input CSV files or directories (every *.csv inside, sorted)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Config file (.terceros.toml)
        #[arg(long, env = "TERCEROS_CONFIG")]
        config: Option<PathBuf>,

        /// Resolution key scheme (overrides the config file)
        #[arg(long, value_enum)]
        key_scheme: Option<KeySchemeArg>,

        /// Output directory (default: a `salida/` directory beside each input)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print per-file JSON summaries to stdout
        #[arg(long)]
        json: bool,

        /// Write per-file JSON summaries to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Render SQL batch files
    #[command(subcommand)]
    Sql(sql::SqlCommands),

    /// Config file utilities
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KeySchemeArg {
    /// Bare identifier
    Identifier,
    /// Identifier plus uppercased document type
    IdentifierDocumentType,
}

impl From<KeySchemeArg> for KeyScheme {
    fn from(arg: KeySchemeArg) -> Self {
        match arg {
            KeySchemeArg::Identifier => KeyScheme::Identifier,
            KeySchemeArg::IdentifierDocumentType => KeyScheme::IdentifierDocumentType,
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<RegistryError> for CliError {
    fn from(err: RegistryError) -> Self {
        let code = registry_exit_code(&err);
        let hint = match &err {
            RegistryError::MissingColumn { .. } => Some(
                "inputs need 'identificacion' and 'nombres' columns (or 'nombre_completo'); see header aliases in the docs"
                    .to_string(),
            ),
            RegistryError::ConfigParse(_) | RegistryError::ConfigValidation(_) => {
                Some("run `terceros config validate <FILE>` for details".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Registry(inner) => inner.into(),
            other => Self::new(io_exit_code(&other), other.to_string()),
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Also installs the `log` bridge, so library records reach stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Clean {
            inputs,
            config,
            key_scheme,
            out_dir,
            json,
            report,
        } => clean::cmd_clean(inputs, config, key_scheme.map(Into::into), out_dir, json, report),
        Commands::Sql(cmd) => sql::cmd_sql(cmd),
        Commands::Config(cmd) => config_cmd::cmd_config(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
