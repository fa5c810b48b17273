//! CLI Exit Code Registry
//!
//! Single source of truth for `terceros` exit codes.
//! Scripts driving batch loads rely on them.
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Success                                                      |
//! | 1    | General error (unspecified)                                  |
//! | 2    | CLI usage error (bad args, no input files)                   |
//! | 3    | Required column missing from an input                        |
//! | 4    | Invalid config file                                          |
//! | 5    | I/O error (unreadable input, malformed CSV, unwritable output) |

use terceros_core::RegistryError;
use terceros_io::IoError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, no input files found.
pub const EXIT_USAGE: u8 = 2;

/// An input lacks `identificacion` or `nombres` (or `id` for `sql delete`).
pub const EXIT_MISSING_COLUMN: u8 = 3;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Read, CSV, write or JSON failure.
pub const EXIT_IO: u8 = 5;

/// Map an engine error to its exit code.
pub fn registry_exit_code(err: &RegistryError) -> u8 {
    match err {
        RegistryError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        RegistryError::ConfigParse(_) | RegistryError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        RegistryError::KeyUnavailable { .. } | RegistryError::Transform { .. } => EXIT_ERROR,
    }
}

/// Map an I/O layer error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Registry(inner) => registry_exit_code(inner),
        IoError::Read { .. } | IoError::Csv(_) | IoError::Write(_) | IoError::Json(_) => EXIT_IO,
    }
}
