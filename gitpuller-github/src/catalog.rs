//! Repository and branch listing through the GitHub REST API

use async_trait::async_trait;
use gitpuller_core::{
    CatalogSource, GitHubConfig, RemoteBranch, RemoteRepository, RepositoryId, Secrets,
};
use octocrab::Octocrab;
use tracing::{debug, info};
use url::Url;

use crate::{Error, Result};

/// [`CatalogSource`] backed by the authenticated user's GitHub account
pub struct GitHubCatalog {
    client: Octocrab,
    per_page: u8,
}

impl GitHubCatalog {
    /// Create a catalog for the token found in `secrets`
    ///
    /// Token is loaded from (in priority order):
    /// 1. GITHUB_TOKEN environment variable
    /// 2. ~/.config/gitpuller/secrets.toml
    pub fn from_secrets(secrets: &Secrets, config: &GitHubConfig) -> Result<Self> {
        let token = secrets.github_token().ok_or(Error::MissingToken)?;
        Self::new(token, config)
    }

    /// Create a catalog authenticating with `token`
    pub fn new(token: impl Into<String>, config: &GitHubConfig) -> Result<Self> {
        let mut builder = Octocrab::builder()
            .personal_token(token.into())
            .set_connect_timeout(Some(config.request_timeout))
            .set_read_timeout(Some(config.request_timeout));

        if let Some(api_url) = &config.api_url {
            let api_url = Url::parse(api_url)
                .map_err(|e| Error::Parse(format!("Invalid API URL {}: {}", api_url, e)))?;
            builder = builder
                .base_uri(api_url.as_str())
                .map_err(|e| Error::Parse(format!("Invalid API URL {}: {}", api_url, e)))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::Other(format!("Failed to create GitHub client: {}", e)))?;

        info!(
            api_url = config.api_url.as_deref().unwrap_or("https://api.github.com"),
            "Created GitHub catalog"
        );

        Ok(Self {
            client,
            per_page: config.per_page.max(1),
        })
    }

    async fn fetch_repositories(&self) -> Result<Vec<RemoteRepository>> {
        debug!(per_page = self.per_page, "Listing repositories for current user");

        let first = self
            .client
            .current()
            .list_repos_for_authenticated_user()
            .per_page(self.per_page)
            .send()
            .await
            .map_err(Error::from_octocrab)?;
        let repos = self
            .client
            .all_pages(first)
            .await
            .map_err(Error::from_octocrab)?;

        let result: Vec<RemoteRepository> = repos
            .into_iter()
            .map(|repo| RemoteRepository {
                id: RepositoryId(repo.id.0),
                owner: repo.owner.map(|owner| owner.login).unwrap_or_default(),
                name: repo.name,
            })
            .collect();

        info!(count = result.len(), "Fetched repositories");
        Ok(result)
    }

    async fn fetch_branches(&self, repository: &RemoteRepository) -> Result<Vec<RemoteBranch>> {
        debug!(
            owner = %repository.owner,
            repo = %repository.name,
            "Listing branches"
        );

        let first = self
            .client
            .repos(&repository.owner, &repository.name)
            .list_branches()
            .per_page(self.per_page)
            .send()
            .await
            .map_err(Error::from_octocrab)?;
        let branches = self
            .client
            .all_pages(first)
            .await
            .map_err(Error::from_octocrab)?;

        Ok(branches
            .into_iter()
            .map(|branch| RemoteBranch {
                repository_id: repository.id,
                name: branch.name,
            })
            .collect())
    }
}

#[async_trait]
impl CatalogSource for GitHubCatalog {
    async fn list_repositories(&self) -> gitpuller_core::Result<Vec<RemoteRepository>> {
        Ok(self.fetch_repositories().await?)
    }

    async fn list_branches(
        &self,
        repository: &RemoteRepository,
    ) -> gitpuller_core::Result<Vec<RemoteBranch>> {
        Ok(self.fetch_branches(repository).await?)
    }
}

impl std::fmt::Debug for GitHubCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubCatalog")
            .field("per_page", &self.per_page)
            .finish_non_exhaustive()
    }
}
