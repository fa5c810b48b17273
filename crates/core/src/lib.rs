//! `terceros-core`: identity resolution for tercero registries.
//!
//! Pure engine crate: receives a pre-loaded record set, returns the resolved
//! survivors, the rejected records and a validation report.
//! No CLI or IO dependencies.

pub mod config;
pub mod error;
pub mod identifier;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod resolve;
pub mod score;
pub mod transform;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use identifier::is_valid_identifier;
pub use model::{KeyScheme, ProcessOutput, Record, RecordSet, RejectReason, Rejected, ValidationReport};
pub use normalize::{normalize, FieldKind};
pub use pipeline::{process, Pipeline};
pub use resolve::{resolve, Resolution};
pub use score::{score, Scorer, ScorerKind};
pub use transform::RecordTransform;
