//! Typed error variants for link convergence operations.
//!
//! This module provides [`LinkError`], a structured error type for probe,
//! reconcile, and apply operations.  Internal code may return these variants
//! directly; callers convert to [`anyhow::Error`] via `?` and can downcast
//! when they need to branch on the kind.

use thiserror::Error;

/// Errors that arise from link convergence and removal.
#[derive(Error, Debug)]
pub enum LinkError {
    /// A symbolic user or group name does not resolve to a numeric id.
    #[error("identity not found: {scope} '{name}'")]
    IdentityNotFound {
        /// `"user"` or `"group"`.
        scope: &'static str,
        /// The name that failed to resolve.
        name: String,
    },

    /// The platform ownership primitive rejected the change.
    #[error("ownership change failed on {path}: {source}")]
    OwnershipChangeFailed {
        /// Path of the link whose ownership could not be changed.
        path: String,
        /// Underlying I/O error from the chown call.
        source: std::io::Error,
    },

    /// A removal was requested but the object at the path is not the
    /// expected link kind.  Never converted into a no-op or a forced delete.
    #[error("cannot delete {path}: not a {expected} link")]
    WrongLinkKind {
        /// Path of the offending object.
        path: String,
        /// Expected link kind (`"symbolic"` or `"hard"`).
        expected: &'static str,
    },

    /// A filesystem creation/removal/inspection primitive failed.
    #[error("filesystem operation '{operation}' failed on {path}: {source}")]
    FilesystemOperationFailed {
        /// Name of the primitive that failed (`"symlink"`, `"unlink"`, ...).
        operation: &'static str,
        /// Path the operation was applied to.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl LinkError {
    /// Wrap an I/O error from a filesystem primitive with the offending
    /// operation and path.
    pub fn fs(operation: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::FilesystemOperationFailed {
            operation,
            path: path.display().to_string(),
            source,
        }
    }
}
