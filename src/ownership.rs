//! Ownership reconciliation for symbolic links.
//!
//! Compares desired owner/group against the probed state and issues a
//! link-local chown only for the component that differs.  The chown seam
//! takes ids in the platform's signed representation (see
//! [`crate::identity::to_platform_id`]).

use anyhow::Result;
use std::path::Path;

use crate::error::LinkError;
use crate::identity::{self, IdentityLookup, IdentityRef};

/// Ownership-change primitive operating on the link itself (never the
/// object it points to).  `None` leaves that component untouched.
pub trait OwnershipOps: std::fmt::Debug {
    /// Change the owner and/or group of `path` without following symlinks.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the platform rejects the change.
    fn lchown(&self, path: &Path, owner: Option<i32>, group: Option<i32>) -> std::io::Result<()>;
}

/// [`OwnershipOps`] backed by the real platform chown call.
#[derive(Debug, Default)]
pub struct SystemOwnership;

impl OwnershipOps for SystemOwnership {
    #[cfg(unix)]
    fn lchown(&self, path: &Path, owner: Option<i32>, group: Option<i32>) -> std::io::Result<()> {
        std::os::unix::fs::lchown(
            path,
            owner.map(identity::from_platform_id),
            group.map(identity::from_platform_id),
        )
    }

    #[cfg(not(unix))]
    fn lchown(&self, path: &Path, owner: Option<i32>, group: Option<i32>) -> std::io::Result<()> {
        let _ = (path, owner, group);
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "link ownership changes are not supported on this platform",
        ))
    }
}

/// Compares desired vs. current numeric owner/group and applies the delta.
#[derive(Debug)]
pub struct OwnershipReconciler<'a> {
    lookup: &'a dyn IdentityLookup,
    ops: &'a dyn OwnershipOps,
}

impl<'a> OwnershipReconciler<'a> {
    /// Create a reconciler over the given identity and chown seams.
    pub fn new(lookup: &'a dyn IdentityLookup, ops: &'a dyn OwnershipOps) -> Self {
        Self { lookup, ops }
    }

    /// Bring the owner of `path` to `desired`, leaving the group untouched.
    ///
    /// An absent `desired` is already-satisfied: no comparison, no chown,
    /// `false`.
    ///
    /// # Errors
    ///
    /// [`LinkError::IdentityNotFound`] when a symbolic name does not
    /// resolve; [`LinkError::OwnershipChangeFailed`] when the chown call is
    /// rejected.
    pub fn reconcile_owner(
        &self,
        path: &Path,
        desired: Option<&IdentityRef>,
        current: Option<u32>,
    ) -> Result<bool> {
        let Some(reference) = desired else {
            return Ok(false);
        };
        let uid = identity::resolve_user(reference, self.lookup)?;
        if current == Some(uid) {
            return Ok(false);
        }
        self.chown(path, Some(identity::to_platform_id(uid)), None)?;
        tracing::info!("{} owner changed to {uid}", path.display());
        Ok(true)
    }

    /// Bring the group of `path` to `desired`, leaving the owner untouched.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`reconcile_owner`](Self::reconcile_owner).
    pub fn reconcile_group(
        &self,
        path: &Path,
        desired: Option<&IdentityRef>,
        current: Option<u32>,
    ) -> Result<bool> {
        let Some(reference) = desired else {
            return Ok(false);
        };
        let gid = identity::resolve_group(reference, self.lookup)?;
        if current == Some(gid) {
            return Ok(false);
        }
        self.chown(path, None, Some(identity::to_platform_id(gid)))?;
        tracing::info!("{} group changed to {gid}", path.display());
        Ok(true)
    }

    fn chown(&self, path: &Path, owner: Option<i32>, group: Option<i32>) -> Result<()> {
        self.ops
            .lchown(path, owner, group)
            .map_err(|source| LinkError::OwnershipChangeFailed {
                path: path.display().to_string(),
                source,
            })?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records every lchown call; optionally fails them all.
    #[derive(Debug, Default)]
    struct RecordingOwnership {
        calls: Mutex<Vec<(PathBuf, Option<i32>, Option<i32>)>>,
        deny: bool,
    }

    impl RecordingOwnership {
        fn denying() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                deny: true,
            }
        }

        fn calls(&self) -> Vec<(PathBuf, Option<i32>, Option<i32>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl OwnershipOps for RecordingOwnership {
        fn lchown(
            &self,
            path: &Path,
            owner: Option<i32>,
            group: Option<i32>,
        ) -> std::io::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_path_buf(), owner, group));
            if self.deny {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "operation not permitted",
                ));
            }
            Ok(())
        }
    }

    /// Fixed name → id tables, no system access.
    #[derive(Debug, Default)]
    struct StaticIdentity {
        users: Vec<(&'static str, u32)>,
        groups: Vec<(&'static str, u32)>,
    }

    impl IdentityLookup for StaticIdentity {
        fn user_id(&self, name: &str) -> Result<Option<u32>> {
            Ok(self.users.iter().find(|(n, _)| *n == name).map(|(_, id)| *id))
        }

        fn group_id(&self, name: &str) -> Result<Option<u32>> {
            Ok(self.groups.iter().find(|(n, _)| *n == name).map(|(_, id)| *id))
        }
    }

    #[test]
    fn absent_owner_is_satisfied_without_any_call() {
        let ops = RecordingOwnership::default();
        let lookup = StaticIdentity::default();
        let reconciler = OwnershipReconciler::new(&lookup, &ops);

        let changed = reconciler
            .reconcile_owner(Path::new("/a/link"), None, Some(0))
            .unwrap();

        assert!(!changed);
        assert!(ops.calls().is_empty(), "no chown call for an unset owner");
    }

    #[test]
    fn matching_owner_is_a_noop() {
        let ops = RecordingOwnership::default();
        let lookup = StaticIdentity::default();
        let reconciler = OwnershipReconciler::new(&lookup, &ops);

        let changed = reconciler
            .reconcile_owner(Path::new("/a/link"), Some(&IdentityRef::Id(1000)), Some(1000))
            .unwrap();

        assert!(!changed);
        assert!(ops.calls().is_empty());
    }

    #[test]
    fn differing_owner_issues_owner_only_chown() {
        let ops = RecordingOwnership::default();
        let lookup = StaticIdentity::default();
        let reconciler = OwnershipReconciler::new(&lookup, &ops);

        let changed = reconciler
            .reconcile_owner(Path::new("/a/link"), Some(&IdentityRef::Id(1000)), Some(0))
            .unwrap();

        assert!(changed);
        let calls = ops.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (PathBuf::from("/a/link"), Some(1000), None));
    }

    #[test]
    fn differing_group_issues_group_only_chown() {
        let ops = RecordingOwnership::default();
        let lookup = StaticIdentity {
            groups: vec![("wheel", 998)],
            ..StaticIdentity::default()
        };
        let reconciler = OwnershipReconciler::new(&lookup, &ops);

        let changed = reconciler
            .reconcile_group(
                Path::new("/a/link"),
                Some(&IdentityRef::Name("wheel".to_string())),
                Some(0),
            )
            .unwrap();

        assert!(changed);
        let calls = ops.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (PathBuf::from("/a/link"), None, Some(998)));
    }

    #[test]
    fn owner_above_signed_max_is_wrapped_for_the_platform() {
        let ops = RecordingOwnership::default();
        let lookup = StaticIdentity::default();
        let reconciler = OwnershipReconciler::new(&lookup, &ops);

        let changed = reconciler
            .reconcile_owner(
                Path::new("/a/link"),
                Some(&IdentityRef::Id(4_294_967_294)),
                Some(0),
            )
            .unwrap();

        assert!(changed);
        assert_eq!(ops.calls()[0].1, Some(-2), "id must be handed over wrapped");
    }

    #[test]
    fn unknown_name_surfaces_identity_not_found() {
        let ops = RecordingOwnership::default();
        let lookup = StaticIdentity::default();
        let reconciler = OwnershipReconciler::new(&lookup, &ops);

        let err = reconciler
            .reconcile_owner(
                Path::new("/a/link"),
                Some(&IdentityRef::Name("ghost".to_string())),
                None,
            )
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::IdentityNotFound { .. })
        ));
        assert!(ops.calls().is_empty(), "failed lookup must not chown");
    }

    #[test]
    fn rejected_chown_surfaces_ownership_change_failed() {
        let ops = RecordingOwnership::denying();
        let lookup = StaticIdentity::default();
        let reconciler = OwnershipReconciler::new(&lookup, &ops);

        let err = reconciler
            .reconcile_owner(Path::new("/a/link"), Some(&IdentityRef::Id(0)), Some(1000))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LinkError>(),
            Some(LinkError::OwnershipChangeFailed { .. })
        ));
    }
}
