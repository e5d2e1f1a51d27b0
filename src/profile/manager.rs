//! Rules profile management.
//!
//! This module handles:
//! - Loading profile definitions from TOML files
//! - File watching for live reload
//! - Loading priority: built-in < user-global < workspace < explicit directory
//! - Profile selection via command line or project config

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config as WatcherConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, RwLock};
use tower_lsp::lsp_types::MessageType;
use tower_lsp::Client;

use super::schema::{ProfileFile, RulesProfile};
use crate::config::{self, ProfileDir};

const BUILT_IN_PROFILE: &str = include_str!("../../resources/profiles/default.censo-profile.toml");

/// Name of the profile used when nothing else is selected
pub const DEFAULT_PROFILE: &str = "default";

/// Loading priority of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProfilePriority {
    BuiltIn = 0,
    UserGlobal = 1,
    Workspace = 2,
    Explicit = 3,
}

/// A loaded profile with its source and priority
#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub profile: RulesProfile,
    pub priority: ProfilePriority,
    pub source_path: Option<PathBuf>,
}

/// Events from the file watcher
#[derive(Debug)]
enum WatcherEvent {
    ProfileFileChanged(PathBuf),
    WatcherError(notify::Error),
}

/// Configuration for profile selection
#[derive(Debug, Clone)]
pub struct ProfileSelectionConfig {
    /// Profile explicitly specified via CLI
    pub cli_profile: Option<String>,
    /// Profile from project configuration
    pub project_profile: Option<String>,
    /// Path to project config (for logging)
    pub project_config_path: Option<PathBuf>,
}

/// Loads, watches and resolves rules profiles
pub struct ProfileManager {
    profiles: Arc<RwLock<HashMap<String, LoadedProfile>>>,
    profile_dirs: Vec<ProfileDir>,
    selection_config: ProfileSelectionConfig,
    _watcher: Option<RecommendedWatcher>,
    watcher_rx: Option<mpsc::UnboundedReceiver<WatcherEvent>>,
    /// LSP client for logging
    client: Option<Client>,
}

impl ProfileManager {
    /// Create a new profile manager with configuration
    pub fn new(config: &config::Config) -> Self {
        Self::with_dirs(
            config.profile_dirs.clone(),
            ProfileSelectionConfig {
                cli_profile: config.cli_profile.clone(),
                project_profile: config.project_profile.clone(),
                project_config_path: config.project_config_path.clone(),
            },
        )
    }

    /// Create a profile manager searching only the given directories
    pub fn with_dirs(profile_dirs: Vec<ProfileDir>, selection_config: ProfileSelectionConfig) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
            profile_dirs,
            selection_config,
            _watcher: None,
            watcher_rx: None,
            client: None,
        }
    }

    /// Load profiles, then start watching the profile directories
    pub async fn initialize(&mut self, client: Option<Client>) -> Result<()> {
        self.client = client;
        self.load().await?;
        self.start_watching()?;
        Ok(())
    }

    /// Load all profiles without watching (one-shot use, e.g. the CLI)
    pub async fn load(&mut self) -> Result<()> {
        let profiles = load_all_profiles(&self.profile_dirs, self.client.as_ref()).await;
        let count = profiles.len();

        *self.profiles.write().await = profiles;

        log::debug!("Loaded {} rules profiles", count);
        if let Some(client) = &self.client {
            client
                .log_message(MessageType::INFO, format!("Loaded {} rules profiles", count))
                .await;
        }

        Ok(())
    }

    /// Get the effective profile based on configuration priority
    pub async fn get_effective_profile(&self) -> RulesProfile {
        // Priority: CLI > Project Config > Built-in Default
        if let Some(cli_profile) = &self.selection_config.cli_profile {
            if let Some(loaded) = self.get_profile(cli_profile).await {
                return loaded.profile;
            }
            self.warn(format!(
                "CLI-specified profile '{}' not found, falling back",
                cli_profile
            ))
            .await;
        }

        if let Some(project_profile) = &self.selection_config.project_profile {
            if let Some(loaded) = self.get_profile(project_profile).await {
                return loaded.profile;
            }
            let config_path = self
                .selection_config
                .project_config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| config::PROJECT_CONFIG_FILE.to_string());
            self.warn(format!(
                "Project profile '{}' from {} not found, falling back",
                project_profile, config_path
            ))
            .await;
        }

        self.get_default_profile()
            .await
            .map(|loaded| loaded.profile)
            .unwrap_or_default()
    }

    async fn warn(&self, message: String) {
        log::warn!("{}", message);
        if let Some(client) = &self.client {
            client.log_message(MessageType::WARNING, message).await;
        }
    }

    /// Start file watching for profile directories
    fn start_watching(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.watcher_rx = Some(rx);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if let EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) =
                        event.kind
                    {
                        for path in event.paths {
                            if is_profile_file(&path) {
                                let _ = tx.send(WatcherEvent::ProfileFileChanged(path));
                            }
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatcherEvent::WatcherError(e));
                }
            },
            WatcherConfig::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        for dir in &self.profile_dirs {
            if dir.path.exists() {
                watcher
                    .watch(&dir.path, RecursiveMode::NonRecursive)
                    .with_context(|| format!("Failed to watch {}", dir.path.display()))?;
            }
        }

        self._watcher = Some(watcher);
        self.start_watcher_task();

        Ok(())
    }

    /// Start the background task that processes file watcher events
    fn start_watcher_task(&mut self) {
        let Some(mut rx) = self.watcher_rx.take() else {
            return;
        };
        let profiles = self.profiles.clone();
        let profile_dirs = self.profile_dirs.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    WatcherEvent::ProfileFileChanged(path) => {
                        log::info!("Profile file changed: {}", path.display());

                        // Reload everything: a removed file must drop its profile too
                        let reloaded = load_all_profiles(&profile_dirs, client.as_ref()).await;
                        *profiles.write().await = reloaded;

                        if let Some(client) = &client {
                            client
                                .log_message(
                                    MessageType::INFO,
                                    "Rules profiles reloaded due to file changes",
                                )
                                .await;
                        }
                    }
                    WatcherEvent::WatcherError(e) => {
                        log::error!("Profile file watcher error: {}", e);
                        if let Some(client) = &client {
                            client
                                .log_message(
                                    MessageType::ERROR,
                                    format!("Profile file watcher error: {}", e),
                                )
                                .await;
                        }
                    }
                }
            }
        });
    }

    /// Get a profile by name
    pub async fn get_profile(&self, name: &str) -> Option<LoadedProfile> {
        let profiles = self.profiles.read().await;
        profiles.get(name).cloned()
    }

    /// List all available profile names, sorted
    pub async fn list_profile_names(&self) -> Vec<String> {
        let profiles = self.profiles.read().await;
        let mut names: Vec<String> = profiles.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the default profile ("default" if available)
    pub async fn get_default_profile(&self) -> Option<LoadedProfile> {
        let profiles = self.profiles.read().await;

        if let Some(profile) = profiles.get(DEFAULT_PROFILE) {
            return Some(profile.clone());
        }

        let mut names: Vec<&String> = profiles.keys().collect();
        names.sort();
        names.first().and_then(|name| profiles.get(*name)).cloned()
    }
}

/// Load the built-in profile and every profile directory, honoring priority
async fn load_all_profiles(
    profile_dirs: &[ProfileDir],
    client: Option<&Client>,
) -> HashMap<String, LoadedProfile> {
    let mut profiles = HashMap::new();

    match parse_profile_content(BUILT_IN_PROFILE, None) {
        Ok(profile) => insert_profile(&mut profiles, profile, ProfilePriority::BuiltIn, None),
        Err(e) => report_load_error(client, format!("Failed to load built-in profile: {:#}", e)).await,
    }

    for dir in profile_dirs {
        if let Err(e) = load_profiles_from_directory(&dir.path, dir.priority, &mut profiles, client).await
        {
            report_load_error(client, format!("{:#}", e)).await;
        }
    }

    profiles
}

/// Load profiles from a specific directory
async fn load_profiles_from_directory(
    dir: &Path,
    priority: ProfilePriority,
    profiles: &mut HashMap<String, LoadedProfile>,
    client: Option<&Client>,
) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read profile directory: {}", dir.display()))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_profile_file(&path) {
            paths.push(path);
        }
    }
    // Directory order is platform dependent
    paths.sort();

    for path in paths {
        let loaded = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read profile file: {}", path.display()))
            .and_then(|content| parse_profile_content(&content, Some(&path)));

        match loaded {
            Ok(profile) => insert_profile(profiles, profile, priority, Some(path)),
            Err(e) => report_load_error(client, format!("{:#}", e)).await,
        }
    }

    Ok(())
}

/// Keep `profile` unless a same-named profile of higher priority is loaded
fn insert_profile(
    profiles: &mut HashMap<String, LoadedProfile>,
    profile: RulesProfile,
    priority: ProfilePriority,
    source_path: Option<PathBuf>,
) {
    let should_load = match profiles.get(&profile.name) {
        Some(existing) => priority >= existing.priority,
        None => true,
    };

    if should_load {
        profiles.insert(
            profile.name.clone(),
            LoadedProfile {
                profile,
                priority,
                source_path,
            },
        );
    }
}

/// Parse profile content from TOML string
pub fn parse_profile_content(content: &str, source_path: Option<&Path>) -> Result<RulesProfile> {
    let file: ProfileFile = toml::from_str(content).with_context(|| match source_path {
        Some(path) => format!("Failed to parse profile TOML: {}", path.display()),
        None => "Failed to parse built-in profile TOML".to_string(),
    })?;
    Ok(RulesProfile::from(file))
}

async fn report_load_error(client: Option<&Client>, message: String) {
    log::error!("{}", message);
    if let Some(client) = client {
        client.log_message(MessageType::ERROR, message).await;
    }
}

fn is_profile_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_selection() -> ProfileSelectionConfig {
        ProfileSelectionConfig {
            cli_profile: None,
            project_profile: None,
            project_config_path: None,
        }
    }

    #[test]
    fn test_parse_profile_content_error_names_file() {
        let err = parse_profile_content("not toml [", Some(Path::new("bad.toml")))
            .expect_err("invalid TOML");
        assert!(format!("{:#}", err).contains("bad.toml"));
    }

    #[test]
    fn test_insert_profile_respects_priority() {
        let mut profiles = HashMap::new();
        let workspace = RulesProfile {
            name: "default".to_string(),
            version: Some("workspace".to_string()),
            ..RulesProfile::default()
        };
        insert_profile(&mut profiles, workspace, ProfilePriority::Workspace, None);
        insert_profile(
            &mut profiles,
            RulesProfile::default(),
            ProfilePriority::UserGlobal,
            None,
        );

        let kept = profiles.get("default").expect("default profile");
        assert_eq!(kept.priority, ProfilePriority::Workspace);
        assert_eq!(kept.profile.version.as_deref(), Some("workspace"));
    }

    #[tokio::test]
    async fn test_built_in_profile_is_default() {
        let mut manager = ProfileManager::with_dirs(Vec::new(), no_selection());
        manager.load().await.expect("load profiles");

        let default = manager.get_default_profile().await.expect("default profile");
        assert_eq!(default.priority, ProfilePriority::BuiltIn);
        assert_eq!(default.profile.name, "default");
        assert_eq!(manager.list_profile_names().await, vec!["default".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_cli_profile_falls_back_to_default() {
        let selection = ProfileSelectionConfig {
            cli_profile: Some("nope".to_string()),
            ..no_selection()
        };
        let mut manager = ProfileManager::with_dirs(Vec::new(), selection);
        manager.load().await.expect("load profiles");

        let profile = manager.get_effective_profile().await;
        assert_eq!(profile.name, "default");
    }
}
