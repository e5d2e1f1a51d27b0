//! Structural Validation
//!
//! Context building, the individual structural validators, and the
//! orchestrator that runs them in order.

pub mod charset;
pub mod context;
pub mod engine;
pub mod file_level;
pub mod phase_two;
pub mod report;
pub mod sequence;
pub mod structure;

pub use context::{build_context, EntityAggregate, ValidationContext};
pub use engine::{resolve_phase, validate_bytes, validate_document, validate_lines, ValidationOptions};
pub use report::{Rule, Severity, ValidationError, ValidationReport};
