//! Batch input/output types and their text and JSON renderings

pub mod formatting;
pub mod types;

pub use formatting::{JsonFormatter, TextFormatter};
pub use types::{BatchReport, GroupStatus, ObservationRecord};
