//! Rules Profiles
//!
//! The tunable limits of the structural checks, loaded from TOML files.

pub mod manager;
pub mod schema;

pub use manager::{LoadedProfile, ProfileManager, ProfilePriority, ProfileSelectionConfig};
pub use schema::{Limits, RulesProfile};
