//! Configuration management for gitpuller
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GITPULLER_*)
//! 3. Config file (~/.config/gitpuller/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Default number of simultaneous remote calls or git processes
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default per-command timeout
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Synchronization settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of units running at once
    pub concurrency: usize,

    /// Timeout applied to every git invocation
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,

    /// Remote to pull from
    pub remote: String,

    /// Message attached to stashes created before a pull
    pub stash_message: String,

    /// Path to the git executable
    pub git_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            remote: "origin".to_string(),
            stash_message: "gitpuller: auto-stash before pull".to_string(),
            git_path: "git".to_string(),
        }
    }
}

/// GitHub API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Base URL of the API (GitHub Enterprise); None means api.github.com
    pub api_url: Option<String>,

    /// Timeout for a single API request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Page size used when listing repositories and branches
    pub per_page: u8,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout: Duration::from_secs(30),
            per_page: 100,
        }
    }
}

/// Local clones known to gitpuller
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoriesConfig {
    /// Directories of local clones, matched against remote names by their
    /// last path segment
    pub paths: Vec<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Sync configuration
    pub sync: SyncConfig,

    /// GitHub configuration
    pub github: GitHubConfig,

    /// Local repository paths
    pub repositories: RepositoriesConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a specific file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents).map_err(Error::Io)?;

        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Write configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_config_path()
            .ok_or_else(|| Error::Config("Could not determine config path".to_string()))?;
        self.save_to_file(&path)?;
        Ok(path)
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/gitpuller/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitpuller").join("config.toml"))
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.sync.concurrency == 0 {
            return Err(Error::Config("sync.concurrency must be at least 1".to_string()));
        }

        if self.sync.command_timeout.is_zero() {
            return Err(Error::Config("sync.command_timeout must be non-zero".to_string()));
        }

        if self.sync.remote.trim().is_empty() {
            return Err(Error::Config("sync.remote must not be empty".to_string()));
        }

        if let Some(ref api_url) = self.github.api_url {
            url::Url::parse(api_url)
                .map_err(|e| Error::Config(format!("Invalid github.api_url '{}': {}", api_url, e)))?;
        }

        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITPULLER_CONCURRENCY: Maximum simultaneous units
    /// - GITPULLER_TIMEOUT_SECS: Per-command timeout in seconds
    /// - GITPULLER_REMOTE: Remote to pull from
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(concurrency) = env_parse::<usize>("GITPULLER_CONCURRENCY") {
            self.sync.concurrency = concurrency;
        }

        if let Some(secs) = env_parse::<u64>("GITPULLER_TIMEOUT_SECS") {
            self.sync.command_timeout = Duration::from_secs(secs);
        }

        if let Ok(remote) = std::env::var("GITPULLER_REMOTE") {
            self.sync.remote = remote;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        concurrency: Option<usize>,
        timeout_secs: Option<u64>,
        remote: Option<String>,
    ) -> Self {
        if let Some(c) = concurrency {
            self.sync.concurrency = c;
        }

        if let Some(secs) = timeout_secs {
            self.sync.command_timeout = Duration::from_secs(secs);
        }

        if let Some(r) = remote {
            self.sync.remote = r;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        concurrency: Option<usize>,
        timeout_secs: Option<u64>,
        remote: Option<String>,
    ) -> Result<Self> {
        let config = Self::load()?
            .with_env_overrides()
            .with_cli_overrides(concurrency, timeout_secs, remote);
        config.validate()?;
        Ok(config)
    }

    /// Configured local repository paths
    pub fn paths(&self) -> &[PathBuf] {
        &self.repositories.paths
    }

    /// Add a local repository path
    ///
    /// Returns `false` if the path was already configured.
    pub fn add_path(&mut self, path: &str) -> Result<bool> {
        let normalized = normalize_path(path);
        if normalized.as_os_str().is_empty() {
            return Err(Error::Config("Path must not be empty".to_string()));
        }

        if self.repositories.paths.contains(&normalized) {
            return Ok(false);
        }

        self.repositories.paths.push(normalized);
        Ok(true)
    }

    /// Remove a local repository path
    ///
    /// Returns `false` if the path was not configured.
    pub fn remove_path(&mut self, path: &str) -> bool {
        let normalized = normalize_path(path);
        let before = self.repositories.paths.len();
        self.repositories.paths.retain(|p| *p != normalized);
        self.repositories.paths.len() != before
    }

    /// Remove every configured path, returning how many were removed
    pub fn clear_paths(&mut self) -> usize {
        let removed = self.repositories.paths.len();
        self.repositories.paths.clear();
        removed
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Trim whitespace and trailing separators so `/a/b/` and `/a/b` compare equal
fn normalize_path(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let stripped = trimmed.trim_end_matches(['/', '\\']);
    if stripped.is_empty() && !trimmed.is_empty() {
        // Root directory
        return PathBuf::from(&trimmed[..1]);
    }
    PathBuf::from(stripped)
}
