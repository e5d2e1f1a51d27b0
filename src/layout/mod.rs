//! Census Record Layouts
//!
//! Static, per-phase grammar tables. Adding a record type or a phase is a
//! table edit here, not a code change in the validators.

pub mod enrollment;
pub mod registry;
pub mod schema;
pub mod situation;

pub use registry::{all_layouts, detect_phase, layout_for};
pub use schema::{Phase, PhaseLayout, Predecessor, RecordRole, RecordSpec, StatusRule};
