//! Local git operations for gitpuller
//!
//! This module provides path matching, the safe-pull procedure, and
//! read-only inspection of configured clones.

mod matcher;
mod pull;
mod repo;

pub use matcher::{match_local_path, MatchResult};
pub use pull::{safe_pull, PullOutcome, PullSettings, PullStage};
pub use repo::LocalRepo;
