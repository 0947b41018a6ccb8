//! Repos command - show the remote catalog and where each branch lives locally

use clap::Args;
use gitpuller_core::{match_local_path, Config};
use serde_json::json;

use super::build_orchestrator;

/// List remote repositories and branches with their matched local paths
#[derive(Args, Debug)]
pub struct ReposArgs {
    /// Only show branches that have a local clone
    #[arg(short, long)]
    matched: bool,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

impl ReposArgs {
    /// Execute the repos command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let orchestrator = build_orchestrator(config)?;
        let entries = orchestrator.fetch_catalog().await?;
        let paths = config.paths();

        if self.json {
            let tree: Vec<_> = entries
                .iter()
                .map(|entry| {
                    let branches: Vec<_> = entry
                        .branches
                        .iter()
                        .map(|branch| {
                            let result =
                                match_local_path(paths, &entry.repository.name, &branch.name);
                            json!({ "name": branch.name, "local_path": result.local_path })
                        })
                        .filter(|b| !self.matched || !b["local_path"].is_null())
                        .collect();
                    json!({
                        "id": entry.repository.id,
                        "owner": entry.repository.owner,
                        "name": entry.repository.name,
                        "branches": branches,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&tree)?);
            return Ok(());
        }

        if entries.is_empty() {
            println!("No repositories visible to this token.");
            return Ok(());
        }

        for entry in &entries {
            let lines: Vec<String> = entry
                .branches
                .iter()
                .filter_map(|branch| {
                    let result = match_local_path(paths, &entry.repository.name, &branch.name);
                    match result.local_path {
                        Some(path) => Some(format!("  {} -> {}", branch.name, path.display())),
                        None if self.matched => None,
                        None => Some(format!("  {} (no local clone)", branch.name)),
                    }
                })
                .collect();

            if self.matched && lines.is_empty() {
                continue;
            }

            println!("{}/{}", entry.repository.owner, entry.repository.name);
            for line in lines {
                println!("{}", line);
            }
        }

        Ok(())
    }
}
