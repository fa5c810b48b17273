// File I/O operations

pub mod csv;
pub mod error;
pub mod export;
pub mod mojibake;
pub mod sql;

pub use error::IoError;
