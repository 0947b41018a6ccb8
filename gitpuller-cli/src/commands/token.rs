//! Token commands - manage the GitHub access token

use clap::{Args, Subcommand};
use gitpuller_core::{CatalogSource, Config, Secrets};
use gitpuller_github::GitHubCatalog;

/// GitHub token management
#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Store a personal access token in the secrets file
    Set {
        /// Token value
        token: String,
    },

    /// Delete the stored token
    Remove,

    /// Show where the token comes from
    Status {
        /// Also check the token against the API
        #[arg(long)]
        verify: bool,
    },
}

impl TokenArgs {
    /// Execute the token command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut secrets = Secrets::load()?;

        match &self.command {
            TokenCommand::Set { token } => {
                secrets.set_github_token(token)?;
                let path = secrets.save()?;
                println!("Token saved to {}", path.display());
            }
            TokenCommand::Remove => {
                if secrets.remove_github_token() {
                    let path = secrets.save()?;
                    println!("Token removed from {}", path.display());
                } else {
                    println!("No stored token.");
                }
            }
            TokenCommand::Status { verify } => {
                let env_set = std::env::var("GITHUB_TOKEN")
                    .map(|t| !t.trim().is_empty())
                    .unwrap_or(false);

                if env_set {
                    println!("Token: from GITHUB_TOKEN environment variable");
                } else if secrets.file_token().is_some() {
                    println!("Token: from secrets file");
                } else {
                    println!("Token: not configured");
                    return Ok(());
                }

                if *verify {
                    let catalog = GitHubCatalog::from_secrets(&secrets, &config.github)?;
                    let repositories = catalog.list_repositories().await?;
                    println!("Verified: {} repositories visible", repositories.len());
                }
            }
        }

        Ok(())
    }
}
