//! Raised failures, as opposed to collected diagnostics.
//!
//! Only lookups for objects that do not exist at all raise; a file that
//! exists but fails validation is reported through `ValidationReport`.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    #[error("No profile named '{0}' in the library")]
    ProfileNotFound(String),

    #[error("No hook named '{0}' in the library")]
    HookNotFound(String),

    #[error("Library root does not exist: {}", .0.display())]
    LibraryRootMissing(PathBuf),
}
