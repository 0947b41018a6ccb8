//! Safe pull: stash local changes, pull, then restore them
//!
//! The procedure is a small state machine that stops at the first failing
//! step and records how far it got:
//!
//! ```text
//! DetectingState -> [Stashing] -> Pulling -> [Restoring] -> Done
//! ```
//!
//! A pull is never attempted over uncommitted changes that could not be
//! stashed, and a stash is never popped after a failed pull.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::process::{CommandResult, Invocation, ProcessRunner};

/// Last step of a safe pull that completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullStage {
    /// Working tree state was inspected
    DetectedState,
    /// Local changes were stashed
    Stashed,
    /// The remote branch was pulled
    Pulled,
    /// Stashed changes were restored
    Restored,
}

impl PullStage {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            PullStage::DetectedState => "detected state",
            PullStage::Stashed => "stashed",
            PullStage::Pulled => "pulled",
            PullStage::Restored => "restored",
        }
    }
}

impl fmt::Display for PullStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Result of one safe pull
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullOutcome {
    /// Remote repository name
    pub repository: String,
    /// Branch that was pulled
    pub branch: String,
    /// Local clone the pull ran in
    pub path: PathBuf,
    /// Whether every step succeeded
    pub success: bool,
    /// Whether local changes were stashed
    pub stashed: bool,
    /// Why the unit failed
    pub error_message: Option<String>,
    /// Problem that did not stop the unit (failed state detection, empty stash)
    pub warning: Option<String>,
    /// Last completed step
    pub stage_reached: PullStage,
}

impl PullOutcome {
    /// Changes are still sitting in the stash and need manual attention
    pub fn needs_manual_restore(&self) -> bool {
        self.stashed && self.stage_reached < PullStage::Restored
    }
}

/// Git settings for a safe pull
#[derive(Debug, Clone)]
pub struct PullSettings {
    /// Path to the git executable
    pub git_path: String,
    /// Remote to pull from
    pub remote: String,
    /// Message attached to the stash entry
    pub stash_message: String,
    /// Timeout for each git command
    pub timeout: Duration,
}

impl Default for PullSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for PullSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            git_path: config.git_path.clone(),
            remote: config.remote.clone(),
            stash_message: config.stash_message.clone(),
            timeout: config.command_timeout,
        }
    }
}

impl PullSettings {
    fn git<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::new(&self.git_path).args(args)
    }

    /// `git status --porcelain`
    pub fn status_command(&self) -> Invocation {
        self.git(["status", "--porcelain"])
    }

    /// `git stash push --include-untracked -m <message>`
    ///
    /// `status --porcelain` reports untracked files, so they are stashed too.
    pub fn stash_command(&self) -> Invocation {
        self.git(["stash", "push", "--include-untracked", "-m"])
            .arg(&self.stash_message)
    }

    /// `git rev-parse -q --verify refs/stash`
    pub fn stash_head_command(&self) -> Invocation {
        self.git(["rev-parse", "-q", "--verify", "refs/stash"])
    }

    /// `git pull <remote> <branch>`
    pub fn pull_command(&self, branch: &str) -> Invocation {
        self.git(["pull", self.remote.as_str(), branch])
    }

    /// `git stash pop stash@{0}`
    ///
    /// Pops the top slot; nothing else writes to this working tree's stash
    /// while the unit runs.
    pub fn restore_command(&self) -> Invocation {
        self.git(["stash", "pop", "stash@{0}"])
    }
}

/// Pull `branch` into the clone at `path`, protecting local changes.
pub async fn safe_pull(
    runner: &dyn ProcessRunner,
    settings: &PullSettings,
    repository: &str,
    branch: &str,
    path: &Path,
) -> PullOutcome {
    let mut outcome = PullOutcome {
        repository: repository.to_string(),
        branch: branch.to_string(),
        path: path.to_path_buf(),
        success: false,
        stashed: false,
        error_message: None,
        warning: None,
        stage_reached: PullStage::DetectedState,
    };

    // Detection failures fail open: nothing to stash, but keep the reason.
    let dirty = match step(runner, settings, &settings.status_command(), path).await {
        Ok(result) => !result.stdout.trim().is_empty(),
        Err(message) => {
            warn!(
                repository,
                branch,
                path = %path.display(),
                error = %message,
                "Could not detect working tree state, assuming clean"
            );
            outcome.warning = Some(format!("state detection failed: {}", message));
            false
        }
    };

    if dirty {
        debug!(repository, branch, path = %path.display(), "Working tree dirty, stashing");
        let before = match stash_head(runner, settings, path).await {
            Ok(head) => head,
            Err(message) => {
                outcome.error_message = Some(format!("stash failed: cannot read stash: {}", message));
                return finish(outcome);
            }
        };

        if let Err(message) = step(runner, settings, &settings.stash_command(), path).await {
            outcome.error_message = Some(format!("stash failed: {}", message));
            return finish(outcome);
        }

        // Only an entry this unit pushed may be popped later.
        match stash_head(runner, settings, path).await {
            Ok(after) if after.is_some() && after != before => {
                outcome.stashed = true;
                outcome.stage_reached = PullStage::Stashed;
            }
            Ok(_) => {
                warn!(
                    repository,
                    branch,
                    path = %path.display(),
                    "Stash created no entry, pulling without restore"
                );
                outcome.warning = Some("stash created no entry; nothing to restore".to_string());
            }
            Err(message) => {
                // The push succeeded, so the changes are most likely in the stash.
                outcome.stashed = true;
                outcome.stage_reached = PullStage::Stashed;
                outcome.error_message =
                    Some(format!("cannot verify stash entry: {}", message));
                return finish(outcome);
            }
        }
    }

    if let Err(message) = step(runner, settings, &settings.pull_command(branch), path).await {
        // Leave stashed changes alone: the tree may hold half-applied remote changes.
        outcome.error_message = Some(format!("pull failed: {}", message));
        return finish(outcome);
    }
    outcome.stage_reached = PullStage::Pulled;

    if outcome.stashed {
        if let Err(message) = step(runner, settings, &settings.restore_command(), path).await {
            outcome.error_message = Some(format!(
                "pull succeeded but restoring stashed changes failed ({}); \
                 resolve the stash manually in {}",
                message,
                path.display()
            ));
            return finish(outcome);
        }
        outcome.stage_reached = PullStage::Restored;
    }

    outcome.success = true;
    finish(outcome)
}

/// Run one git step, turning spawn errors and failed exits into a message
async fn step(
    runner: &dyn ProcessRunner,
    settings: &PullSettings,
    invocation: &Invocation,
    path: &Path,
) -> std::result::Result<CommandResult, String> {
    match runner.run(invocation, path, settings.timeout).await {
        Ok(result) if result.success() => Ok(result),
        Ok(result) => Err(result.failure_message()),
        Err(e) => Err(e.to_string()),
    }
}

/// Commit id at the top of the stash, or None when the stash is empty
async fn stash_head(
    runner: &dyn ProcessRunner,
    settings: &PullSettings,
    path: &Path,
) -> std::result::Result<Option<String>, String> {
    match runner.run(&settings.stash_head_command(), path, settings.timeout).await {
        Ok(result) if result.success() => {
            Ok(Some(result.stdout.trim().to_string()).filter(|id| !id.is_empty()))
        }
        // `rev-parse -q --verify` exits 1 silently for a missing ref
        Ok(result) if !result.timed_out && result.exit_code == 1 => Ok(None),
        Ok(result) => Err(result.failure_message()),
        Err(e) => Err(e.to_string()),
    }
}

fn finish(outcome: PullOutcome) -> PullOutcome {
    if outcome.success {
        info!(
            repository = %outcome.repository,
            branch = %outcome.branch,
            stashed = outcome.stashed,
            "Pulled"
        );
    } else {
        warn!(
            repository = %outcome.repository,
            branch = %outcome.branch,
            stage = %outcome.stage_reached,
            error = outcome.error_message.as_deref().unwrap_or_default(),
            "Pull failed"
        );
    }
    outcome
}
