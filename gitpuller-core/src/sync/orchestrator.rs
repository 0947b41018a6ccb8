//! Sync orchestration: catalog -> matcher -> safe pull
//!
//! A run fetches the remote catalog, matches every (repository, branch) pair
//! against the configured local paths, and safe-pulls each match. Catalog
//! failures abort the run; unit failures are recorded in that unit's
//! [`PullOutcome`] and never affect sibling units.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use super::{CancelHandle, ConcurrencyGate};
use crate::catalog::{RemoteBranch, RemoteCatalog, RemoteRepository};
use crate::git::{match_local_path, safe_pull, PullOutcome, PullSettings, PullStage};
use crate::process::ProcessRunner;
use crate::{Error, Result};

/// A repository with its branches
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// The repository
    pub repository: RemoteRepository,
    /// Its branches
    pub branches: Arc<Vec<RemoteBranch>>,
}

/// Summary of a sync run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// One outcome per attempted unit, in completion order
    pub outcomes: Vec<PullOutcome>,
    /// Pairs with no local clone
    pub unmatched: usize,
    /// Matched units that were never started because of cancellation
    pub not_started: usize,
    /// Whether cancellation was requested during the run
    pub cancelled: bool,
}

impl SyncReport {
    /// Number of successful units
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// Number of failed units
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// One matched (repository, branch) pair
#[derive(Debug, Clone)]
struct Unit {
    repository: String,
    branch: String,
    path: PathBuf,
}

/// Top-level coordinator of sync runs
pub struct SyncOrchestrator {
    catalog: Arc<RemoteCatalog>,
    runner: Arc<dyn ProcessRunner>,
    settings: Arc<PullSettings>,
    gate: ConcurrencyGate,
}

impl std::fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("catalog", &self.catalog)
            .field("settings", &self.settings)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl SyncOrchestrator {
    /// Create an orchestrator.
    ///
    /// `gate` bounds the safe-pull units; give the catalog the same gate
    /// (via [`RemoteCatalog::with_gate`]) so remote calls share the ceiling.
    pub fn new(
        catalog: RemoteCatalog,
        runner: Arc<dyn ProcessRunner>,
        settings: PullSettings,
        gate: ConcurrencyGate,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            runner,
            settings: Arc::new(settings),
            gate,
        }
    }

    /// Clear the catalog cache.
    ///
    /// Takes `&mut self` so it cannot overlap a run on this orchestrator.
    pub fn invalidate_catalog_cache(&mut self) {
        self.catalog.invalidate();
    }

    /// Fetch every repository and its branches.
    ///
    /// Branch listings run concurrently under the catalog's gate. The first
    /// error aborts the remaining listings.
    pub async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let repositories = self.catalog.list_repositories().await?;

        let mut tasks = JoinSet::new();
        for (index, repository) in repositories.iter().cloned().enumerate() {
            let catalog = Arc::clone(&self.catalog);
            tasks.spawn(async move {
                let branches = catalog.list_branches(&repository).await;
                (index, repository, branches)
            });
        }

        let mut entries = Vec::with_capacity(repositories.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, repository, branches) = joined
                .map_err(|e| Error::Other(format!("Branch listing task failed: {}", e)))?;
            let branches = branches?;
            entries.push((index, CatalogEntry { repository, branches }));
        }

        entries.sort_by_key(|(index, _)| *index);
        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    /// Pull every remote branch that has a local clone.
    ///
    /// Returns one outcome per matched pair, in no particular order.
    pub async fn sync_all(&self, local_paths: &[PathBuf]) -> Result<Vec<PullOutcome>> {
        let report = self
            .sync_all_with(local_paths, &CancelHandle::new(), None)
            .await?;
        Ok(report.outcomes)
    }

    /// Like [`sync_all`](Self::sync_all), with cancellation and progress.
    ///
    /// Each outcome is sent on `progress` as soon as its unit finishes. Once
    /// `cancel` fires no further unit starts; units already running finish.
    pub async fn sync_all_with(
        &self,
        local_paths: &[PathBuf],
        cancel: &CancelHandle,
        progress: Option<mpsc::UnboundedSender<PullOutcome>>,
    ) -> Result<SyncReport> {
        let entries = self.fetch_catalog().await?;

        let mut report = SyncReport::default();
        let units = plan_units(&entries, local_paths, &mut report.unmatched);

        info!(
            repositories = entries.len(),
            matched = units.len(),
            unmatched = report.unmatched,
            limit = self.gate.limit(),
            "Starting sync"
        );

        // Pairs can share a clone (the bare `{repo}` directory matches every
        // branch); one unit at a time per path.
        let mut path_locks: HashMap<PathBuf, Arc<Mutex<()>>> = HashMap::new();

        let mut tasks = JoinSet::new();
        for unit in units {
            let lock = Arc::clone(path_locks.entry(unit.path.clone()).or_default());
            let gate = self.gate.clone();
            let runner = Arc::clone(&self.runner);
            let settings = Arc::clone(&self.settings);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let identity = unit.clone();
                let attempt = tokio::spawn(async move {
                    run_unit(unit, lock, gate, runner.as_ref(), &settings, &cancel).await
                });

                // A panicking unit still reports, so siblings and callers see it.
                match attempt.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(
                            repository = %identity.repository,
                            branch = %identity.branch,
                            error = %e,
                            "Sync unit aborted"
                        );
                        Some(failed_outcome(
                            &identity,
                            &format!(
                                "unit aborted ({}); check the working tree and stash in {}",
                                e,
                                identity.path.display()
                            ),
                        ))
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(outcome)) => {
                    if let Some(ref tx) = progress {
                        // Receiver may have gone away; the report still has it.
                        let _ = tx.send(outcome.clone());
                    }
                    report.outcomes.push(outcome);
                }
                Ok(None) => report.not_started += 1,
                Err(e) => {
                    error!(error = %e, "Sync unit task failed");
                    report.not_started += 1;
                }
            }
        }

        report.cancelled = cancel.is_cancelled();

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            not_started = report.not_started,
            cancelled = report.cancelled,
            "Sync finished"
        );

        Ok(report)
    }
}

/// Match every pair and keep the ones with a local clone
fn plan_units(entries: &[CatalogEntry], local_paths: &[PathBuf], unmatched: &mut usize) -> Vec<Unit> {
    let mut units = Vec::new();

    for entry in entries {
        for branch in entry.branches.iter() {
            let result = match_local_path(local_paths, &entry.repository.name, &branch.name);
            match result.local_path {
                Some(path) => units.push(Unit {
                    repository: entry.repository.name.clone(),
                    branch: branch.name.clone(),
                    path,
                }),
                None => {
                    debug!(
                        repository = %entry.repository.name,
                        branch = %branch.name,
                        "No local clone"
                    );
                    *unmatched += 1;
                }
            }
        }
    }

    units
}

/// Wait for the path and a gate slot, then safe-pull; None if cancelled first
async fn run_unit(
    unit: Unit,
    path_lock: Arc<Mutex<()>>,
    gate: ConcurrencyGate,
    runner: &dyn ProcessRunner,
    settings: &PullSettings,
    cancel: &CancelHandle,
) -> Option<PullOutcome> {
    let _path_guard = tokio::select! {
        biased;
        _ = cancel.cancelled() => return None,
        guard = path_lock.lock_owned() => guard,
    };

    let permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return None,
        permit = gate.acquire() => permit,
    };

    let _permit = match permit {
        Ok(permit) => permit,
        Err(e) => return Some(failed_outcome(&unit, &e.to_string())),
    };

    debug!(
        repository = %unit.repository,
        branch = %unit.branch,
        path = %unit.path.display(),
        "Starting unit"
    );

    Some(safe_pull(runner, settings, &unit.repository, &unit.branch, &unit.path).await)
}

fn failed_outcome(unit: &Unit, message: &str) -> PullOutcome {
    PullOutcome {
        repository: unit.repository.clone(),
        branch: unit.branch.clone(),
        path: unit.path.clone(),
        success: false,
        stashed: false,
        error_message: Some(message.to_string()),
        warning: None,
        stage_reached: PullStage::DetectedState,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::FakeSource;
    use crate::process::{CommandResult, Invocation};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Git stand-in: per-path dirty/failing flags, a stash per path, call log,
    /// concurrency high-water mark
    #[derive(Default)]
    struct FakeGit {
        dirty: HashSet<PathBuf>,
        failing_pulls: HashSet<PathBuf>,
        crashing_pulls: HashSet<PathBuf>,
        stashes: std::sync::Mutex<HashMap<PathBuf, usize>>,
        delay: Duration,
        calls: std::sync::Mutex<Vec<(PathBuf, String)>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl FakeGit {
        fn verbs_for(&self, path: &str) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| p == Path::new(path))
                .map(|(_, verb)| verb.clone())
                .collect()
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProcessRunner for FakeGit {
        async fn run(
            &self,
            invocation: &Invocation,
            workdir: &Path,
            _timeout: Duration,
        ) -> Result<CommandResult> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);

            let verb = invocation.args[..2].join(" ");
            self.calls
                .lock()
                .unwrap()
                .push((workdir.to_path_buf(), verb.clone()));

            let mut result = CommandResult::default();
            let mut stashes = self.stashes.lock().unwrap();
            let depth = stashes.entry(workdir.to_path_buf()).or_default();
            match verb.as_str() {
                "status --porcelain" if self.dirty.contains(workdir) => {
                    result.stdout = " M file.txt\n".to_string();
                }
                "rev-parse -q" if *depth == 0 => result.exit_code = 1,
                "rev-parse -q" => result.stdout = format!("stash{}\n", depth),
                "stash push" => *depth += 1,
                "stash pop" => *depth -= 1,
                "pull origin" if self.crashing_pulls.contains(workdir) => {
                    drop(stashes);
                    panic!("git crashed in {}", workdir.display());
                }
                "pull origin" if self.failing_pulls.contains(workdir) => {
                    result.exit_code = 1;
                    result.stderr = "fatal: unable to access remote".to_string();
                }
                _ => {}
            }
            Ok(result)
        }
    }

    fn orchestrator(source: FakeSource, git: Arc<FakeGit>, limit: usize) -> SyncOrchestrator {
        let gate = ConcurrencyGate::new(limit);
        let catalog = RemoteCatalog::new(Arc::new(source)).with_gate(gate.clone());
        SyncOrchestrator::new(catalog, git, PullSettings::default(), gate)
    }

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn test_scenario_clean_pull_succeeds() {
        let git = Arc::new(FakeGit::default());
        let sync = orchestrator(FakeSource::default().with_repo(1, "foo", &["main"]), git.clone(), 10);

        let outcomes = sync.sync_all(&paths(&["/home/u/foo"])).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert_eq!(outcome.repository, "foo");
        assert_eq!(outcome.branch, "main");
        assert!(outcome.success);
        assert!(!outcome.stashed);
        assert_eq!(outcome.stage_reached, PullStage::Pulled);
        assert_eq!(
            git.verbs_for("/home/u/foo"),
            vec!["status --porcelain", "pull origin"]
        );
    }

    #[tokio::test]
    async fn test_scenario_dirty_pull_fails() {
        let git = Arc::new(FakeGit {
            dirty: HashSet::from([PathBuf::from("/home/u/foo")]),
            failing_pulls: HashSet::from([PathBuf::from("/home/u/foo")]),
            ..FakeGit::default()
        });
        let sync = orchestrator(FakeSource::default().with_repo(1, "foo", &["main"]), git.clone(), 10);

        let outcomes = sync.sync_all(&paths(&["/home/u/foo"])).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].success);
        assert!(outcomes[0].stashed);
        assert_eq!(outcomes[0].stage_reached, PullStage::Stashed);
        assert!(!git.verbs_for("/home/u/foo").contains(&"stash pop".to_string()));
    }

    #[tokio::test]
    async fn test_scenario_dirty_pull_restores() {
        let git = Arc::new(FakeGit {
            dirty: HashSet::from([PathBuf::from("/home/u/foo")]),
            ..FakeGit::default()
        });
        let sync = orchestrator(FakeSource::default().with_repo(1, "foo", &["main"]), git.clone(), 10);

        let outcomes = sync.sync_all(&paths(&["/home/u/foo"])).await.unwrap();

        assert!(outcomes[0].success);
        assert!(outcomes[0].stashed);
        assert_eq!(outcomes[0].stage_reached, PullStage::Restored);
        assert_eq!(git.stashes.lock().unwrap()[Path::new("/home/u/foo")], 0);
    }

    #[tokio::test]
    async fn test_panicking_unit_still_yields_outcome() {
        let git = Arc::new(FakeGit {
            crashing_pulls: HashSet::from([PathBuf::from("/w/bar")]),
            ..FakeGit::default()
        });
        let source = FakeSource::default()
            .with_repo(1, "foo", &["main"])
            .with_repo(2, "bar", &["main"]);
        let sync = orchestrator(source, git, 10);

        let report = sync
            .sync_all_with(&paths(&["/w/foo", "/w/bar"]), &CancelHandle::new(), None)
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.not_started, 0);
        let bar = report
            .outcomes
            .iter()
            .find(|o| o.repository == "bar")
            .unwrap();
        assert!(!bar.success);
        assert_eq!(bar.path, PathBuf::from("/w/bar"));
        assert!(bar.error_message.as_deref().unwrap().contains("unit aborted"));
        assert!(report.outcomes.iter().any(|o| o.repository == "foo" && o.success));
    }

    #[tokio::test]
    async fn test_duplicate_spellings_resolve_to_one_path() {
        let git = Arc::new(FakeGit {
            delay: Duration::from_millis(10),
            ..FakeGit::default()
        });
        let source = FakeSource::default().with_repo(1, "foo", &["main", "dev"]);
        let sync = orchestrator(source, git.clone(), 10);

        // First entry per directory name wins, so the second spelling is never used
        let outcomes = sync
            .sync_all(&paths(&["/w/foo/", "/w/foo"]))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.path == PathBuf::from("/w/foo/")));
        assert_eq!(git.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scenario_unmatched_pair_is_skipped() {
        let git = Arc::new(FakeGit::default());
        let sync = orchestrator(FakeSource::default().with_repo(2, "bar", &["dev"]), git.clone(), 10);

        let report = sync
            .sync_all_with(&paths(&["/home/u/foo", "/home/u/bar-main"]), &CancelHandle::new(), None)
            .await
            .unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(report.unmatched, 1);
        assert_eq!(git.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_scenario_auth_error_aborts_run() {
        let git = Arc::new(FakeGit::default());
        let sync = orchestrator(
            FakeSource::default().with_repo(1, "foo", &["main"]).failing_auth(),
            git.clone(),
            10,
        );

        let err = sync.sync_all(&paths(&["/home/u/foo"])).await.unwrap_err();

        assert!(matches!(err, Error::Auth(_)));
        assert!(err.is_catalog());
        assert_eq!(git.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_branch_listing_error_aborts_run() {
        let mut source = FakeSource::default()
            .with_repo(1, "foo", &["main"])
            .with_repo(2, "bar", &["main"]);
        source.branches.remove(&crate::catalog::RepositoryId(2));

        let git = Arc::new(FakeGit::default());
        let sync = orchestrator(source, git.clone(), 10);

        let err = sync.sync_all(&paths(&["/home/u/foo"])).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(git.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_its_unit() {
        let git = Arc::new(FakeGit {
            failing_pulls: HashSet::from([PathBuf::from("/w/bar")]),
            ..FakeGit::default()
        });
        let source = FakeSource::default()
            .with_repo(1, "foo", &["main"])
            .with_repo(2, "bar", &["main"])
            .with_repo(3, "baz", &["main"]);
        let sync = orchestrator(source, git, 10);

        let mut outcomes = sync
            .sync_all(&paths(&["/w/foo", "/w/bar", "/w/baz"]))
            .await
            .unwrap();
        outcomes.sort_by(|a, b| a.repository.cmp(&b.repository));

        let summary: Vec<(&str, bool)> = outcomes
            .iter()
            .map(|o| (o.repository.as_str(), o.success))
            .collect();
        assert_eq!(summary, vec![("bar", false), ("baz", true), ("foo", true)]);
    }

    #[tokio::test]
    async fn test_concurrency_ceiling_respected() {
        let limit = 3;
        let mut source = FakeSource {
            delay: Duration::from_millis(10),
            ..FakeSource::default()
        };
        let mut local = Vec::new();
        for id in 0..12u64 {
            let name = format!("repo{}", id);
            source = source.with_repo(id, &name, &["main"]);
            local.push(PathBuf::from(format!("/w/{}", name)));
        }
        let source = Arc::new(source);

        let git = Arc::new(FakeGit {
            delay: Duration::from_millis(20),
            ..FakeGit::default()
        });
        let gate = ConcurrencyGate::new(limit);
        let catalog = RemoteCatalog::new(source.clone()).with_gate(gate.clone());
        let sync = SyncOrchestrator::new(catalog, git.clone(), PullSettings::default(), gate);

        let outcomes = sync.sync_all(&local).await.unwrap();

        assert_eq!(outcomes.len(), 12);
        assert!(outcomes.iter().all(|o| o.success));
        let git_max = git.max_active.load(Ordering::SeqCst);
        let api_max = source.max_active.load(Ordering::SeqCst);
        assert!(git_max >= 1 && git_max <= limit, "git max {}", git_max);
        assert!(api_max >= 1 && api_max <= limit, "api max {}", api_max);
    }

    #[tokio::test]
    async fn test_shared_path_units_run_one_at_a_time() {
        let git = Arc::new(FakeGit {
            delay: Duration::from_millis(10),
            ..FakeGit::default()
        });
        let source = FakeSource::default().with_repo(1, "foo", &["main", "dev", "release"]);
        let sync = orchestrator(source, git.clone(), 10);

        let outcomes = sync.sync_all(&paths(&["/w/foo"])).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(git.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_progress_channel_receives_every_outcome() {
        let git = Arc::new(FakeGit::default());
        let source = FakeSource::default()
            .with_repo(1, "foo", &["main"])
            .with_repo(2, "bar", &["dev"]);
        let sync = orchestrator(source, git, 10);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let report = sync
            .sync_all_with(&paths(&["/w/foo", "/w/bar-dev"]), &CancelHandle::new(), Some(tx))
            .await
            .unwrap();

        let mut received = Vec::new();
        while let Some(outcome) = rx.recv().await {
            received.push(outcome.repository);
        }
        received.sort();
        assert_eq!(received, vec!["bar", "foo"]);
        assert_eq!(report.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_starts_no_units() {
        let git = Arc::new(FakeGit::default());
        let sync = orchestrator(FakeSource::default().with_repo(1, "foo", &["main"]), git.clone(), 10);

        let cancel = CancelHandle::new();
        cancel.cancel();
        let report = sync
            .sync_all_with(&paths(&["/w/foo"]), &cancel, None)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.not_started, 1);
        assert_eq!(git.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_lets_started_units_finish() {
        let git = Arc::new(FakeGit {
            delay: Duration::from_millis(50),
            ..FakeGit::default()
        });
        let mut source = FakeSource::default();
        let mut local = Vec::new();
        for id in 0..6u64 {
            let name = format!("r{}", id);
            source = source.with_repo(id, &name, &["main"]);
            local.push(PathBuf::from(format!("/w/{}", name)));
        }
        let sync = orchestrator(source, git.clone(), 2);

        let cancel = CancelHandle::new();
        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                cancel.cancel();
            })
        };
        let report = sync.sync_all_with(&local, &cancel, None).await.unwrap();
        canceller.await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.outcomes.len() + report.not_started, 6);
        assert!(report.not_started > 0);
        // Every started unit ran to completion
        for outcome in &report.outcomes {
            assert!(outcome.success);
            assert_eq!(
                git.verbs_for(&outcome.path.to_string_lossy()),
                vec!["status --porcelain", "pull origin"]
            );
        }
    }

    #[tokio::test]
    async fn test_repeated_runs_use_cached_catalog() {
        let source = Arc::new(FakeSource::default().with_repo(1, "foo", &["main"]));
        let gate = ConcurrencyGate::new(4);
        let catalog = RemoteCatalog::new(source.clone()).with_gate(gate.clone());
        let mut sync = SyncOrchestrator::new(
            catalog,
            Arc::new(FakeGit::default()),
            PullSettings::default(),
            gate,
        );
        let local = paths(&["/w/foo"]);

        sync.sync_all(&local).await.unwrap();
        sync.sync_all(&local).await.unwrap();
        assert_eq!(source.repository_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.branch_calls.load(Ordering::SeqCst), 1);

        sync.invalidate_catalog_cache();
        sync.sync_all(&local).await.unwrap();
        assert_eq!(source.repository_calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.branch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_catalog_keeps_repository_order() {
        let source = FakeSource::default()
            .with_repo(5, "e", &["main"])
            .with_repo(1, "a", &["main", "dev"]);
        let sync = orchestrator(source, Arc::new(FakeGit::default()), 2);

        let entries = sync.fetch_catalog().await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.repository.name.as_str()).collect();
        assert_eq!(names, vec!["e", "a"]);
        assert_eq!(entries[1].branches.len(), 2);
    }
}
