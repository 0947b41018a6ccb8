//! Remote catalog: repositories and branches visible to the current identity
//!
//! The catalog sits in front of a [`CatalogSource`] (the forge API) and
//! caches both listings for the lifetime of the catalog. Cached entries are
//! served until [`RemoteCatalog::invalidate`] is called; there is no
//! staleness check against the remote.

mod cache;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::sync::ConcurrencyGate;
use crate::{Error, Result};

use cache::KeyedCache;

/// Cache key for "all repositories of the current identity"
const CURRENT_IDENTITY: &str = "current_user_repos";

/// Stable identifier of a remote repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryId(pub u64);

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A repository hosted on the forge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    /// Stable identifier
    pub id: RepositoryId,
    /// Repository name (without owner)
    pub name: String,
    /// Owner login
    pub owner: String,
}

/// A branch of a remote repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBranch {
    /// Repository this branch belongs to
    pub repository_id: RepositoryId,
    /// Branch name
    pub name: String,
}

/// Capability to enumerate repositories and branches on the forge.
///
/// Implementations must report authentication problems as
/// [`Error::Auth`](crate::Error::Auth) and other failures as
/// [`Error::Transport`](crate::Error::Transport); an empty listing is a
/// success.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// List every repository visible to the authenticated identity
    async fn list_repositories(&self) -> Result<Vec<RemoteRepository>>;

    /// List the branches of one repository
    async fn list_branches(&self, repository: &RemoteRepository) -> Result<Vec<RemoteBranch>>;
}

/// Caching front for a [`CatalogSource`]
pub struct RemoteCatalog {
    source: Arc<dyn CatalogSource>,
    gate: Option<ConcurrencyGate>,
    repositories: KeyedCache<&'static str, Arc<Vec<RemoteRepository>>>,
    branches: KeyedCache<RepositoryId, Arc<Vec<RemoteBranch>>>,
}

impl fmt::Debug for RemoteCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCatalog")
            .field("gate", &self.gate)
            .field("cached_branch_lists", &self.branches.len())
            .finish_non_exhaustive()
    }
}

impl RemoteCatalog {
    /// Create a catalog with empty caches
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            gate: None,
            repositories: KeyedCache::new(),
            branches: KeyedCache::new(),
        }
    }

    /// Hold a gate permit for every remote call made on a cache miss
    pub fn with_gate(mut self, gate: ConcurrencyGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// List repositories, from cache when populated
    pub async fn list_repositories(&self) -> Result<Arc<Vec<RemoteRepository>>> {
        self.repositories
            .get_or_try_populate(&CURRENT_IDENTITY, || async {
                let _permit = match self.gate {
                    Some(ref gate) => Some(gate.acquire().await?),
                    None => None,
                };
                debug!("Fetching repositories from remote");
                let repositories = self.source.list_repositories().await?;
                info!(count = repositories.len(), "Fetched repositories");
                Ok::<_, Error>(Arc::new(repositories))
            })
            .await
    }

    /// List branches of `repository`, from cache when populated
    pub async fn list_branches(
        &self,
        repository: &RemoteRepository,
    ) -> Result<Arc<Vec<RemoteBranch>>> {
        self.branches
            .get_or_try_populate(&repository.id, || async {
                let _permit = match self.gate {
                    Some(ref gate) => Some(gate.acquire().await?),
                    None => None,
                };
                debug!(repository = %repository.name, "Fetching branches from remote");
                let branches = self.source.list_branches(repository).await?;
                debug!(
                    repository = %repository.name,
                    count = branches.len(),
                    "Fetched branches"
                );
                Ok::<_, Error>(Arc::new(branches))
            })
            .await
    }

    /// Clear every cached listing
    pub fn invalidate(&self) {
        self.repositories.clear();
        self.branches.clear();
        info!("Catalog cache invalidated");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory forge with call counters and an optional failure mode
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub repositories: Vec<RemoteRepository>,
        pub branches: HashMap<RepositoryId, Vec<String>>,
        pub auth_failure: Mutex<bool>,
        pub delay: Duration,
        pub repository_calls: AtomicUsize,
        pub branch_calls: AtomicUsize,
        pub active: AtomicUsize,
        pub max_active: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn with_repo(mut self, id: u64, name: &str, branches: &[&str]) -> Self {
            self.repositories.push(RemoteRepository {
                id: RepositoryId(id),
                name: name.to_string(),
                owner: "u".to_string(),
            });
            self.branches.insert(
                RepositoryId(id),
                branches.iter().map(|b| b.to_string()).collect(),
            );
            self
        }

        pub(crate) fn failing_auth(self) -> Self {
            *self.auth_failure.lock().unwrap() = true;
            self
        }

        async fn enter(&self) {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CatalogSource for FakeSource {
        async fn list_repositories(&self) -> Result<Vec<RemoteRepository>> {
            self.repository_calls.fetch_add(1, Ordering::SeqCst);
            self.enter().await;
            if *self.auth_failure.lock().unwrap() {
                return Err(Error::Auth("Bad credentials".to_string()));
            }
            Ok(self.repositories.clone())
        }

        async fn list_branches(&self, repository: &RemoteRepository) -> Result<Vec<RemoteBranch>> {
            self.branch_calls.fetch_add(1, Ordering::SeqCst);
            self.enter().await;
            let names = self
                .branches
                .get(&repository.id)
                .ok_or_else(|| Error::Transport(format!("404 for {}", repository.name)))?;
            Ok(names
                .iter()
                .map(|name| RemoteBranch {
                    repository_id: repository.id,
                    name: name.clone(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_repository_listing_is_cached() {
        let source = Arc::new(FakeSource::default().with_repo(1, "foo", &["main"]));
        let catalog = RemoteCatalog::new(source.clone());

        let first = catalog.list_repositories().await.unwrap();
        let second = catalog.list_repositories().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].name, "foo");
        assert_eq!(source.repository_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_branch_listing_cached_per_repository() {
        let source = Arc::new(
            FakeSource::default()
                .with_repo(1, "foo", &["main", "dev"])
                .with_repo(2, "bar", &["main"]),
        );
        let catalog = RemoteCatalog::new(source.clone());
        let repos = catalog.list_repositories().await.unwrap();

        for repo in repos.iter().chain(repos.iter()) {
            catalog.list_branches(repo).await.unwrap();
        }

        let foo = catalog.list_branches(&repos[0]).await.unwrap();
        assert_eq!(foo.len(), 2);
        assert!(foo.iter().all(|b| b.repository_id == RepositoryId(1)));
        assert_eq!(source.branch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let source = Arc::new(FakeSource::default().with_repo(1, "foo", &["main"]));
        let catalog = RemoteCatalog::new(source.clone());
        let repos = catalog.list_repositories().await.unwrap();
        catalog.list_branches(&repos[0]).await.unwrap();

        catalog.invalidate();
        let repos = catalog.list_repositories().await.unwrap();
        catalog.list_branches(&repos[0]).await.unwrap();

        assert_eq!(source.repository_calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.branch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_cached() {
        let source = Arc::new(FakeSource::default().with_repo(1, "foo", &["main"]).failing_auth());
        let catalog = RemoteCatalog::new(source.clone());

        let err = catalog.list_repositories().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));

        *source.auth_failure.lock().unwrap() = false;
        let repos = catalog.list_repositories().await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(source.repository_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_issue_one_call() {
        let source = Arc::new(FakeSource {
            delay: Duration::from_millis(50),
            ..FakeSource::default().with_repo(1, "foo", &["main"])
        });
        let catalog = Arc::new(RemoteCatalog::new(source.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let catalog = Arc::clone(&catalog);
            handles.push(tokio::spawn(async move { catalog.list_repositories().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 1);
        }

        assert_eq!(source.repository_calls.load(Ordering::SeqCst), 1);
    }
}
