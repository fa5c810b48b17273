//! `terceros config`: config file utilities.

use std::path::PathBuf;

use clap::Subcommand;

use crate::util::load_config;
use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Parse and validate a config file without processing data
    #[command(after_help = "\
Examples:
  terceros config validate carga.terceros.toml")]
    Validate {
        /// Path to the .terceros.toml file
        file: PathBuf,
    },
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { file } => {
            let config = load_config(Some(&file))?;
            let transforms = [
                ("repair_document_type", config.transforms.repair_document_type),
                ("strip_document_prefix", config.transforms.strip_document_prefix),
                ("split_full_name", config.transforms.split_full_name),
            ]
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| *name)
            .collect::<Vec<_>>();

            eprintln!(
                "config \"{}\" is valid: key scheme {}, scorer {:?}, identifiers {}-{} digits, transforms [{}]",
                config.name,
                config.key_scheme,
                config.scorer,
                config.identifier.min_digits,
                config.identifier.max_digits,
                transforms.join(", "),
            );
            Ok(())
        }
    }
}
