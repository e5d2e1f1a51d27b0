//! Rules Profile Types
//!
//! The numeric limits the structural checks enforce, as read from TOML.

use serde::{Deserialize, Serialize};

use crate::layout::Phase;

/// Root profile file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileFile {
    pub profile: ProfileMeta,
    pub default_phase: Option<Phase>,
    #[serde(default)]
    pub limits: Limits,
}

/// Profile metadata
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileMeta {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// Ceilings applied by the file-level and entity checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Limits {
    /// Schools per file
    pub max_entities: usize,
    /// Manager records (40) per school
    pub max_managers_per_entity: usize,
    /// Distinct classes (20) per school
    pub max_classes_per_entity: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_entities: 5000,
            max_managers_per_entity: 3,
            max_classes_per_entity: 999,
        }
    }
}

/// Runtime profile
#[derive(Debug, Clone, PartialEq)]
pub struct RulesProfile {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub default_phase: Option<Phase>,
    pub limits: Limits,
}

impl Default for RulesProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            version: None,
            description: None,
            default_phase: Some(Phase::Enrollment),
            limits: Limits::default(),
        }
    }
}

impl From<ProfileFile> for RulesProfile {
    fn from(file: ProfileFile) -> Self {
        Self {
            name: file.profile.name,
            version: file.profile.version,
            description: file.profile.description,
            default_phase: file.default_phase,
            limits: file.limits,
        }
    }
}
