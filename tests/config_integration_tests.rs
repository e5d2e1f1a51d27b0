//! Configuration sources: command line, `.censo.toml` and profile directories
use std::fs;

use clap::Parser;
use censo_validator::config::{find_project_config, Args, Config, OutputFormat};
use censo_validator::profile::ProfilePriority;
use censo_validator::Phase;

#[test]
fn test_project_config_is_found_from_subdirectory() {
    let root = tempfile::tempdir().expect("temp dir");
    fs::write(
        root.path().join(".censo.toml"),
        "phase = \"situation\"\nprofile = \"state\"\n",
    )
    .expect("write project config");
    let nested = root.path().join("files").join("2026");
    fs::create_dir_all(&nested).expect("create nested dir");

    assert_eq!(
        find_project_config(&nested),
        Some(root.path().join(".censo.toml"))
    );

    let config = Config::from_args_in(Args::parse_from(["censo-check"]), &nested)
        .expect("create config");
    assert!(config.has_project_config());
    assert_eq!(config.get_effective_phase(), Some(Phase::Situation));
    assert_eq!(config.get_effective_profile().as_deref(), Some("state"));

    // Workspace profiles live next to the project config
    let workspace = config
        .profile_dirs
        .iter()
        .find(|dir| dir.priority == ProfilePriority::Workspace)
        .expect("workspace profile dir");
    assert_eq!(workspace.path, root.path().join(".censo-ls").join("profiles"));
}

#[test]
fn test_command_line_overrides_project_config() {
    let root = tempfile::tempdir().expect("temp dir");
    fs::write(root.path().join(".censo.toml"), "phase = \"situation\"\n")
        .expect("write project config");

    let args = Args::parse_from([
        "censo-check",
        "--phase",
        "enrollment",
        "--profile",
        "strict",
        "--profile-dir",
        "/opt/profiles",
        "--format",
        "json",
        "school.txt",
    ]);
    let config = Config::from_args_in(args, root.path()).expect("create config");

    assert_eq!(config.get_effective_phase(), Some(Phase::Enrollment));
    assert_eq!(config.get_effective_profile().as_deref(), Some("strict"));
    assert_eq!(config.format, OutputFormat::Json);
    assert_eq!(config.files.len(), 1);

    let explicit = config.profile_dirs.last().expect("explicit profile dir");
    assert_eq!(explicit.priority, ProfilePriority::Explicit);
    assert_eq!(explicit.path.to_str(), Some("/opt/profiles"));
}

#[test]
fn test_no_project_config() {
    let root = tempfile::tempdir().expect("temp dir");
    let config = Config::from_args_in(Args::parse_from(["censo-check"]), root.path())
        .expect("create config");

    assert!(!config.has_project_config());
    assert_eq!(config.get_effective_phase(), None);
    assert_eq!(config.get_effective_profile(), None);
}

#[test]
fn test_invalid_project_config_is_an_error() {
    let root = tempfile::tempdir().expect("temp dir");
    fs::write(root.path().join(".censo.toml"), "phase = \"census\"\n")
        .expect("write project config");

    let result = Config::from_args_in(Args::parse_from(["censo-check"]), root.path());
    let message = format!("{:#}", result.expect_err("unknown phase"));
    assert!(message.contains(".censo.toml"));
}
