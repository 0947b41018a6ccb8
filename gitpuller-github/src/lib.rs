//! gitpuller GitHub - GitHub catalog source for gitpuller
//!
//! This crate lists the repositories and branches visible to a personal
//! access token and hands them to the core sync engine.

mod catalog;
mod error;

pub use catalog::GitHubCatalog;
pub use error::{Error, Result};
