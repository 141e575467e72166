//! Link resources under a desired-state model (probe + decide + apply).
//!
//! A [`LinkSpec`] declares what a link should look like; [`LinkResource`]
//! probes the filesystem, decides the minimal change, applies it, and
//! reports whether anything changed.  Each convergence run is self-contained
//! and recomputes the current state; nothing is cached across runs.
//!
//! Concurrent runs against the same path are not serialised here — callers
//! needing mutual exclusion must provide it per path.

pub mod apply;
pub mod probe;
pub mod reconcile;

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::LinkError;
use crate::identity::IdentityRef;
use crate::ownership::OwnershipReconciler;

/// The kind of link a resource manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LinkKind {
    /// A symbolic link: stores a path, resolved on access.
    Symbolic,
    /// A hard link: a second directory entry for the same file data.
    Hard,
}

impl LinkKind {
    /// Lower-case name used in messages and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Symbolic => "symbolic",
            Self::Hard => "hard",
        }
    }

    /// Whether ownership reconciliation is wired up for this kind.
    ///
    /// Policy: owner/group management applies to symbolic links only; hard
    /// links share ownership with their source file and are left alone.
    #[must_use]
    pub const fn supports_ownership(self) -> bool {
        matches!(self, Self::Symbolic)
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state of a link resource.  Immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct LinkSpec {
    /// Filesystem location the link occupies.
    pub path: PathBuf,
    /// Link kind to converge to.
    pub kind: LinkKind,
    /// What the link should point to (symbolic) or be linked from (hard).
    pub target: PathBuf,
    /// Desired owner; applicable to symbolic links only.
    pub owner: Option<IdentityRef>,
    /// Desired group; applicable to symbolic links only.
    pub group: Option<IdentityRef>,
}

impl LinkSpec {
    /// Desired symbolic link at `path` pointing to `target`.
    #[must_use]
    pub fn symbolic(path: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: LinkKind::Symbolic,
            target: target.into(),
            owner: None,
            group: None,
        }
    }

    /// Desired hard link at `path` linked from `target`.
    #[must_use]
    pub fn hard(path: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: LinkKind::Hard,
            target: target.into(),
            owner: None,
            group: None,
        }
    }

    /// Request a specific owner for the link.
    #[must_use]
    pub fn with_owner(mut self, owner: IdentityRef) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Request a specific group for the link.
    #[must_use]
    pub fn with_group(mut self, group: IdentityRef) -> Self {
        self.group = Some(group);
        self
    }
}

/// What currently occupies the spec's path, recomputed every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentLinkState {
    /// Whether anything occupies the path at all.
    pub exists: bool,
    /// Whether the occupant is itself a symbolic link.
    pub is_symlink: bool,
    /// The occupant's target, resolved to an absolute path, when it is a
    /// link of the expected kind.  `None` means "not a matching link" — a
    /// same-named regular file or directory never yields a target.
    pub resolved_target: Option<PathBuf>,
    /// Current numeric owner; probed for symbolic links only.
    pub owner: Option<u32>,
    /// Current numeric group; probed for symbolic links only.
    pub group: Option<u32>,
}

impl CurrentLinkState {
    /// State for an unoccupied path.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            exists: false,
            is_symlink: false,
            resolved_target: None,
            owner: None,
            group: None,
        }
    }
}

/// The minimal change needed to reach the desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Already correct; no filesystem access needed.
    NoOp,
    /// Nothing occupies the path; create the link.
    Create,
    /// Something conflicting occupies the path; remove it, then create.
    Replace,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Replace => "replace",
        })
    }
}

/// Outcome of a convergence or removal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConvergenceResult {
    /// Whether any filesystem mutation occurred.
    pub changed: bool,
}

impl ConvergenceResult {
    /// Wrap a `changed` flag.
    #[must_use]
    pub const fn new(changed: bool) -> Self {
        Self { changed }
    }
}

/// A link resource that can be planned, converged, and removed.
#[derive(Debug, Clone)]
pub struct LinkResource {
    /// The desired state this resource converges to.
    pub spec: LinkSpec,
}

impl LinkResource {
    /// Create a resource from its desired spec.
    #[must_use]
    pub const fn new(spec: LinkSpec) -> Self {
        Self { spec }
    }

    /// Human-readable description of this resource.
    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "{} -> {} ({})",
            self.spec.path.display(),
            self.spec.target.display(),
            self.spec.kind
        )
    }

    /// Probe the current state of the path.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::FilesystemOperationFailed`] when the filesystem
    /// cannot be inspected.  Absence is a normal result, not a failure.
    pub fn current_state(&self) -> Result<CurrentLinkState> {
        probe::probe(&self.spec)
    }

    /// Probe and decide without any side effects.
    ///
    /// # Errors
    ///
    /// Propagates probe failures.
    pub fn plan(&self) -> Result<(CurrentLinkState, Decision)> {
        let current = probe::probe(&self.spec)?;
        let decision = reconcile::decide(&self.spec, &current);
        tracing::debug!("{}: {decision}", self.description());
        Ok((current, decision))
    }

    /// Bring the filesystem to the desired state (create-or-update).
    ///
    /// Ownership reconciliation runs only after a successful create or
    /// replace of a symbolic link, and only when owner/group were requested;
    /// its result is OR-ed into `changed`.  The create resets ownership to
    /// the invoking process, so the requested ids are applied without
    /// comparing against the previous occupant.
    ///
    /// # Errors
    ///
    /// Propagates probe, apply, identity, and ownership failures.  A failed
    /// run leaves the filesystem in whatever state the partially-completed
    /// operation produced.
    pub fn converge(&self, ownership: &OwnershipReconciler<'_>) -> Result<ConvergenceResult> {
        let (_, decision) = self.plan()?;
        let mut result = apply::apply(&self.spec, decision)?;

        if result.changed && self.spec.kind.supports_ownership() {
            // The link is freshly created here; the probed ids describe the
            // old occupant, not the current one.
            let owner_changed =
                ownership.reconcile_owner(&self.spec.path, self.spec.owner.as_ref(), None)?;
            let group_changed =
                ownership.reconcile_group(&self.spec.path, self.spec.group.as_ref(), None)?;
            result.changed = result.changed || owner_changed || group_changed;
        }

        Ok(result)
    }

    /// Remove the link, undoing a previous convergence.
    ///
    /// # Errors
    ///
    /// Same contract as [`remove`].
    pub fn remove(&self) -> Result<ConvergenceResult> {
        remove(&self.spec.path, self.spec.kind)
    }
}

/// Delete the link at `path`, verifying it is the expected kind first.
///
/// An absent path is a no-op.  A path occupied by something that is not the
/// expected kind fails with [`LinkError::WrongLinkKind`] and is left
/// untouched — deletion never silently removes an unrelated object.
///
/// # Errors
///
/// [`LinkError::WrongLinkKind`] for a mismatched occupant;
/// [`LinkError::FilesystemOperationFailed`] when inspection or unlinking
/// fails.
pub fn remove(path: &Path, kind: LinkKind) -> Result<ConvergenceResult> {
    match probe::classify(path, kind)? {
        probe::Occupancy::Absent => Ok(ConvergenceResult::new(false)),
        probe::Occupancy::ExpectedKind => {
            apply::remove_occupant(path)?;
            tracing::info!("{} deleted", path.display());
            Ok(ConvergenceResult::new(true))
        }
        probe::Occupancy::OtherObject => Err(LinkError::WrongLinkKind {
            path: path.display().to_string(),
            expected: kind.as_str(),
        }
        .into()),
    }
}
