//! The decision engine: desired spec vs. probed state.

use std::path::{Component, Path, PathBuf};

use super::{CurrentLinkState, Decision, LinkSpec};

/// Resolve a link target the way it would resolve when read back from the
/// link's location: absolute targets are used as-is, relative targets are
/// joined to the link's parent directory.  The result is normalised
/// lexically (no filesystem access), so `.` and `..` components compare
/// equal across spellings.
#[must_use]
pub fn resolve_target_at(target: &Path, link_path: &Path) -> PathBuf {
    if target.is_absolute() {
        normalize(target)
    } else {
        let base = link_path.parent().unwrap_or_else(|| Path::new(""));
        normalize(&base.join(target))
    }
}

/// Lexical path normalisation: drops `.`, folds `name/..` pairs, and keeps
/// `..` that would climb past a relative path's start.  `..` directly under
/// the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(comp),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.iter().collect()
    }
}

/// Decide the minimal change needed to reach the desired state.
///
/// - The occupant already resolves to the desired absolute target: no-op.
/// - Nothing occupies the path: create.
/// - Anything else — wrong target, wrong kind, or an unrelated object
///   blocking the path: replace (remove the occupant, then create).
#[must_use]
pub fn decide(spec: &LinkSpec, current: &CurrentLinkState) -> Decision {
    let desired = resolve_target_at(&spec.target, &spec.path);
    if current.resolved_target.as_deref() == Some(desired.as_path()) {
        Decision::NoOp
    } else if current.exists {
        Decision::Replace
    } else {
        Decision::Create
    }
}
