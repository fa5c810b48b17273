use std::path::{Path, PathBuf};

use terceros_core::model::{KeyScheme, ProcessOutput, RecordSet};
use terceros_core::{Pipeline, RegistryConfig};
use terceros_io::csv::load_record_set;

use crate::exit_codes::EXIT_IO;
use crate::CliError;

/// Load and validate a config file, or the defaults when none is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<RegistryConfig, CliError> {
    let Some(path) = path else {
        return Ok(RegistryConfig::default());
    };

    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::new(EXIT_IO, format!("cannot read config {}: {e}", path.display())))?;
    let config = RegistryConfig::from_toml(&text)?;
    log::info!("config '{}' loaded from {}", config.name, path.display());
    Ok(config)
}

pub(crate) fn build_pipeline(config: &RegistryConfig, key_scheme: Option<KeyScheme>) -> Pipeline {
    let pipeline = Pipeline::from_config(config);
    match key_scheme {
        Some(scheme) => pipeline.with_key_scheme(scheme),
        None => pipeline,
    }
}

/// Load one CSV and run it through the pipeline.
pub(crate) fn run_file(path: &Path, pipeline: &Pipeline) -> Result<(RecordSet, ProcessOutput), CliError> {
    let set = load_record_set(path)?;
    let output = pipeline
        .process(&set)
        .map_err(|e| CliError::from(e).with_context(path))?;
    Ok((set, output))
}

/// Subdirectory that receives outputs when no `--out-dir` is given.
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "salida";

/// Directory for outputs: the explicit one, else `salida/` beside the input.
pub(crate) fn output_dir(out_dir: Option<&Path>, input: &Path) -> PathBuf {
    match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .join(DEFAULT_OUTPUT_DIR),
    }
}

impl CliError {
    /// Prefix the message with the file it concerns.
    pub(crate) fn with_context(mut self, path: &Path) -> Self {
        self.message = format!("{}: {}", path.display(), self.message);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_defaults_to_salida_beside_input() {
        assert_eq!(output_dir(None, Path::new("entrada/a.csv")), PathBuf::from("entrada/salida"));
        assert_eq!(output_dir(None, Path::new("a.csv")), PathBuf::from("./salida"));
        assert_eq!(
            output_dir(Some(Path::new("salida")), Path::new("entrada/a.csv")),
            PathBuf::from("salida")
        );
    }

    #[test]
    fn key_scheme_flag_overrides_config() {
        let config = RegistryConfig::default();
        assert_eq!(build_pipeline(&config, None).key_scheme(), KeyScheme::Identifier);
        assert_eq!(
            build_pipeline(&config, Some(KeyScheme::IdentifierDocumentType)).key_scheme(),
            KeyScheme::IdentifierDocumentType
        );
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/x.terceros.toml"))).unwrap_err();
        assert_eq!(err.code, EXIT_IO);
    }
}
