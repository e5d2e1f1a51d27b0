//! School Census Structural Validator
//!
//! Structural validation of pipe-delimited school census files.
//!
//! This library provides:
//! - Census line parsing
//! - Per-phase record layouts (enrollment and situation)
//! - Structural validation: record sequence, entity structure, file-level checks
//! - Rules profiles and configuration management
//! - LSP protocol implementation

pub mod config;
pub mod layout;
pub mod lsp;
pub mod parser;
pub mod profile;
pub mod validation;

// Re-exports for clean public API
pub use config::Config;
pub use layout::{detect_phase, layout_for, Phase, PhaseLayout};
pub use parser::{parse_line, parse_lines, LineRecord, ParsedLine};
pub use profile::{Limits, ProfileManager, RulesProfile};
pub use validation::{
    validate_bytes, validate_document, validate_lines, Rule, Severity, ValidationError,
    ValidationOptions, ValidationReport,
};
