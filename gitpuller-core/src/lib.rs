//! gitpuller core - keep local clones in step with their remotes
//!
//! This crate discovers the repositories and branches visible to the
//! authenticated identity, matches each branch to a configured local clone
//! by directory name, and pulls every match with its local changes stashed
//! out of the way. Work runs concurrently under a fixed ceiling, and a
//! failure in one (repository, branch) unit never stops its siblings.

pub mod catalog;
pub mod config;
pub mod error;
pub mod git;
pub mod process;
pub mod secrets;
pub mod sync;

pub use catalog::{CatalogSource, RemoteBranch, RemoteCatalog, RemoteRepository, RepositoryId};
pub use config::{Config, GitHubConfig, RepositoriesConfig, SyncConfig};
pub use error::{Error, Result};
pub use git::{match_local_path, safe_pull, LocalRepo, MatchResult, PullOutcome, PullSettings, PullStage};
pub use process::{CommandResult, Invocation, ProcessRunner, SystemRunner};
pub use secrets::Secrets;
pub use sync::{CancelHandle, CatalogEntry, ConcurrencyGate, SyncOrchestrator, SyncReport};
