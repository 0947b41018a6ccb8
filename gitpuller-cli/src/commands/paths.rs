//! Paths commands - manage the configured local clones

use std::path::Path;

use clap::{Args, Subcommand};
use gitpuller_core::{Config, LocalRepo};

/// Local repository path management
#[derive(Args, Debug)]
pub struct PathsArgs {
    #[command(subcommand)]
    pub command: PathsCommand,
}

#[derive(Subcommand, Debug)]
pub enum PathsCommand {
    /// List configured paths with their checked-out branch
    #[command(visible_alias = "ls")]
    List,

    /// Add a local clone
    Add {
        /// Path to the clone's working tree
        path: String,
    },

    /// Remove a configured path
    #[command(visible_alias = "rm")]
    Remove {
        /// Path as configured
        path: String,
    },

    /// Remove every configured path
    Clear,
}

impl PathsArgs {
    /// Execute the paths command
    ///
    /// Works on the config file as stored, without env or flag overrides,
    /// so saving never persists a one-off override. `remote` is the
    /// effective remote, used only for diagnostics.
    pub async fn execute(&self, remote: &str) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match &self.command {
            PathsCommand::List => {
                list_paths(&config, remote);
                return Ok(());
            }
            PathsCommand::Add { path } => {
                if !config.add_path(path)? {
                    println!("Already configured: {}", path);
                    return Ok(());
                }
                match LocalRepo::open(path.trim()) {
                    Ok(repo) if !repo.has_remote(remote) => {
                        eprintln!("Warning: {} has no remote '{}'", path.trim(), remote);
                    }
                    Ok(_) => {}
                    Err(_) => {
                        eprintln!("Warning: {} is not a git working tree", path.trim());
                    }
                }
                println!("Added {}", path.trim());
            }
            PathsCommand::Remove { path } => {
                if !config.remove_path(path) {
                    anyhow::bail!("Path not configured: {}", path);
                }
                println!("Removed {}", path);
            }
            PathsCommand::Clear => {
                let removed = config.clear_paths();
                println!("Removed {} path(s)", removed);
            }
        }

        let saved = config.save()?;
        tracing::debug!(path = %saved.display(), "Configuration saved");
        Ok(())
    }
}

fn list_paths(config: &Config, remote: &str) {
    if config.paths().is_empty() {
        println!("No paths configured.");
        return;
    }

    for path in config.paths() {
        println!("{}  {}", path.display(), describe(path, remote));
    }
}

fn describe(path: &Path, remote: &str) -> String {
    if !path.exists() {
        return "(missing)".to_string();
    }

    match LocalRepo::open(path) {
        Ok(repo) => {
            let head = match repo.current_branch() {
                Ok(Some(branch)) => format!("[{}]", branch),
                Ok(None) => "(detached HEAD)".to_string(),
                Err(e) => format!("({})", e),
            };
            if repo.has_remote(remote) {
                head
            } else {
                format!("{} (no remote '{}')", head, remote)
            }
        }
        Err(_) => "(not a git repository)".to_string(),
    }
}
