//! CLI command implementations

pub mod paths;
pub mod repos;
pub mod sync;
pub mod token;

use std::sync::Arc;

use gitpuller_core::{
    Config, ConcurrencyGate, PullSettings, RemoteCatalog, Secrets, SyncOrchestrator,
    SystemRunner,
};
use gitpuller_github::GitHubCatalog;

pub use paths::PathsArgs;
pub use repos::ReposArgs;
pub use sync::SyncArgs;
pub use token::TokenArgs;

/// Wire the GitHub catalog, the git runner and one shared gate together
pub(crate) fn build_orchestrator(config: &Config) -> anyhow::Result<SyncOrchestrator> {
    let secrets = Secrets::load()?;
    let source = GitHubCatalog::from_secrets(&secrets, &config.github)?;

    let gate = ConcurrencyGate::new(config.sync.concurrency);
    let catalog = RemoteCatalog::new(Arc::new(source)).with_gate(gate.clone());

    Ok(SyncOrchestrator::new(
        catalog,
        Arc::new(SystemRunner::new()),
        PullSettings::from(&config.sync),
        gate,
    ))
}
