//! Matching remote (repository, branch) pairs to local clone directories
//!
//! A local directory belongs to a remote pair when its final path segment is
//! either `{repo}` or `{repo}-{branch}`, compared case-insensitively.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Result of matching one (repository, branch) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// Whether a local clone was found
    pub matched: bool,
    /// The first configured path that matched
    pub local_path: Option<PathBuf>,
}

impl MatchResult {
    fn found(path: &Path) -> Self {
        Self {
            matched: true,
            local_path: Some(path.to_path_buf()),
        }
    }

    fn none() -> Self {
        Self {
            matched: false,
            local_path: None,
        }
    }
}

/// Find the local clone for `repo_name`/`branch_name`.
///
/// Entries are scanned in order and the first whose directory name equals
/// `repo_name` or `{repo_name}-{branch_name}` wins. Paths are not checked
/// for existence.
pub fn match_local_path<P: AsRef<Path>>(
    local_paths: &[P],
    repo_name: &str,
    branch_name: &str,
) -> MatchResult {
    let repo = repo_name.to_lowercase();
    let repo_branch = format!("{}-{}", repo_name, branch_name).to_lowercase();

    local_paths
        .iter()
        .map(AsRef::as_ref)
        .find(|path| {
            directory_name(path).is_some_and(|name| {
                let name = name.to_lowercase();
                name == repo || name == repo_branch
            })
        })
        .map_or_else(MatchResult::none, MatchResult::found)
}

/// Last path segment, tolerating trailing separators of either style
fn directory_name(path: &Path) -> Option<String> {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
