//! Read-only inspection of what currently occupies a link's path.

use anyhow::Result;
use std::path::Path;

use super::reconcile::resolve_target_at;
use super::{CurrentLinkState, LinkKind, LinkSpec};
use crate::error::LinkError;

/// Classification of a path against an expected link kind (the delete-flow
/// state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    /// Nothing occupies the path.
    Absent,
    /// The occupant is a link of the expected kind (for hard links: any
    /// existing object, since hard links are indistinguishable by metadata).
    ExpectedKind,
    /// Something occupies the path but is not the expected kind.
    OtherObject,
}

/// Classify what occupies `path` with respect to the expected `kind`.
///
/// Absence is a normal result, never a failure.
///
/// # Errors
///
/// Returns [`LinkError::FilesystemOperationFailed`] when the path cannot be
/// inspected for a reason other than absence.
pub fn classify(path: &Path, kind: LinkKind) -> Result<Occupancy> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Occupancy::Absent),
        Err(e) => return Err(LinkError::fs("lstat", path, e).into()),
    };
    Ok(match kind {
        LinkKind::Symbolic if meta.is_symlink() => Occupancy::ExpectedKind,
        LinkKind::Symbolic => Occupancy::OtherObject,
        LinkKind::Hard => Occupancy::ExpectedKind,
    })
}

/// Probe the current state of the path named by `spec`.
///
/// For a symbolic spec, only a path that is *itself* a symlink yields a
/// `resolved_target`; the raw link value is resolved to an absolute path
/// for comparison.  A non-link occupant never satisfies a symbolic desire.
///
/// For a hard spec, a link has no distinguishable target in metadata, so
/// the probe checks that both the path and the claimed source exist and
/// reports the (resolved) claimed source.  This is a conservative
/// approximation: it does not verify that the two paths share an inode.
///
/// # Errors
///
/// Returns [`LinkError::FilesystemOperationFailed`] when inspection fails.
pub fn probe(spec: &LinkSpec) -> Result<CurrentLinkState> {
    let meta = match std::fs::symlink_metadata(&spec.path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CurrentLinkState::absent());
        }
        Err(e) => return Err(LinkError::fs("lstat", &spec.path, e).into()),
    };

    match spec.kind {
        LinkKind::Symbolic => {
            if !meta.is_symlink() {
                return Ok(CurrentLinkState {
                    exists: true,
                    is_symlink: false,
                    resolved_target: None,
                    owner: None,
                    group: None,
                });
            }
            let raw = std::fs::read_link(&spec.path)
                .map_err(|e| LinkError::fs("readlink", &spec.path, e))?;
            let (owner, group) = link_ids(&meta);
            Ok(CurrentLinkState {
                exists: true,
                is_symlink: true,
                resolved_target: Some(resolve_target_at(&raw, &spec.path)),
                owner,
                group,
            })
        }
        LinkKind::Hard => {
            let claimed = resolve_target_at(&spec.target, &spec.path);
            let source_exists = std::fs::metadata(&claimed).is_ok();
            Ok(CurrentLinkState {
                exists: true,
                is_symlink: meta.is_symlink(),
                resolved_target: source_exists.then_some(claimed),
                owner: None,
                group: None,
            })
        }
    }
}

#[cfg(unix)]
fn link_ids(meta: &std::fs::Metadata) -> (Option<u32>, Option<u32>) {
    use std::os::unix::fs::MetadataExt as _;
    (Some(meta.uid()), Some(meta.gid()))
}

#[cfg(not(unix))]
fn link_ids(_meta: &std::fs::Metadata) -> (Option<u32>, Option<u32>) {
    (None, None)
}
