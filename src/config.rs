//! Configuration management for the census validator.
//!
//! Handles:
//! - Command-line argument parsing
//! - Project configuration (`.censo.toml`)
//! - Profile directory configuration

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::layout::Phase;
use crate::profile::ProfilePriority;

/// Name of the per-project configuration file
pub const PROJECT_CONFIG_FILE: &str = ".censo.toml";

/// Report output format of the command-line checker
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Command-line arguments of the checker
#[derive(Debug, Parser)]
#[command(name = "censo-check")]
#[command(about = "Structural validator for school census files")]
#[command(version)]
pub struct Args {
    /// Census files to validate
    pub files: Vec<PathBuf>,

    /// Census phase of the files (detected from the first record by default)
    #[arg(long, value_enum, help = "Census phase: 'enrollment' or 'situation'")]
    pub phase: Option<Phase>,

    /// Rules profile to apply
    #[arg(long, help = "Rules profile name (e.g., 'default')")]
    pub profile: Option<String>,

    /// Custom profile directory to search for profile files
    #[arg(long, help = "Directory containing rules profile TOML files")]
    pub profile_dir: Option<PathBuf>,

    /// Output format of the report
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Command-line arguments of the language server
#[derive(Debug, Parser)]
#[command(name = "censo-ls")]
#[command(about = "Language server for school census files")]
#[command(version)]
pub struct ServerArgs {
    /// Communicate over stdio (the only transport; accepted for editor compatibility)
    #[arg(long)]
    pub stdio: bool,

    /// Census phase of every opened document (detected per document by default)
    #[arg(long, value_enum)]
    pub phase: Option<Phase>,

    /// Rules profile to apply
    #[arg(long)]
    pub profile: Option<String>,

    /// Custom profile directory to search for profile files
    #[arg(long)]
    pub profile_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl From<ServerArgs> for Args {
    fn from(args: ServerArgs) -> Self {
        Args {
            files: Vec::new(),
            phase: args.phase,
            profile: args.profile,
            profile_dir: args.profile_dir,
            format: OutputFormat::Text,
            log_level: args.log_level,
        }
    }
}

/// Contents of `.censo.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub phase: Option<Phase>,
    pub profile: Option<String>,
}

/// A directory searched for profile files, with the priority of its profiles
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDir {
    pub path: PathBuf,
    pub priority: ProfilePriority,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub files: Vec<PathBuf>,
    /// Phase explicitly set via command line
    pub cli_phase: Option<Phase>,
    /// Profile explicitly set via command line
    pub cli_profile: Option<String>,
    pub project_phase: Option<Phase>,
    pub project_profile: Option<String>,
    pub project_config_path: Option<PathBuf>,
    /// Profile directories, lowest priority first
    pub profile_dirs: Vec<ProfileDir>,
    pub format: OutputFormat,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create the language server configuration from its command line
    pub fn from_server_args_and_env() -> Result<Self> {
        Self::from_args(ServerArgs::parse().into())
    }

    /// Create configuration from explicit arguments, rooted at the current directory
    pub fn from_args(args: Args) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::from_args_in(args, &cwd)
    }

    /// Create configuration from explicit arguments, rooted at `dir` (useful for testing)
    pub fn from_args_in(args: Args, dir: &Path) -> Result<Self> {
        let project_config_path = find_project_config(dir);
        let project = match &project_config_path {
            Some(path) => load_project_config(path)?,
            None => ProjectConfig::default(),
        };

        let project_root = project_config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(dir);

        let mut profile_dirs = Vec::new();

        // Default user config directory
        if let Some(config_dir) = dirs::config_dir() {
            profile_dirs.push(ProfileDir {
                path: config_dir.join("censo-ls").join("profiles"),
                priority: ProfilePriority::UserGlobal,
            });
        }

        profile_dirs.push(ProfileDir {
            path: project_root.join(".censo-ls").join("profiles"),
            priority: ProfilePriority::Workspace,
        });

        // User-specified directory wins over everything else
        if let Some(custom_dir) = args.profile_dir {
            profile_dirs.push(ProfileDir {
                path: custom_dir,
                priority: ProfilePriority::Explicit,
            });
        }

        Ok(Config {
            files: args.files,
            cli_phase: args.phase,
            cli_profile: args.profile,
            project_phase: project.phase,
            project_profile: project.profile,
            project_config_path,
            profile_dirs,
            format: args.format,
            log_level: args.log_level,
        })
    }

    pub fn has_project_config(&self) -> bool {
        self.project_config_path.is_some()
    }

    /// Phase forced by configuration: CLI over project config
    pub fn get_effective_phase(&self) -> Option<Phase> {
        self.cli_phase.or(self.project_phase)
    }

    /// Profile selected by configuration: CLI over project config
    pub fn get_effective_profile(&self) -> Option<String> {
        self.cli_profile
            .clone()
            .or_else(|| self.project_profile.clone())
    }
}

/// Find `.censo.toml` in `start` or any of its ancestors
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

fn load_project_config(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read project config: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse project config: {}", path.display()))
}
