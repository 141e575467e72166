//! Filesystem side effects for create/replace/delete decisions.
//!
//! A `Replace` is two calls, remove then create, and the pair is not
//! atomic: a crash between them leaves the path absent.  Failures surface
//! with the offending operation and path; the filesystem is left in
//! whatever state the partially-completed operation produced.

use anyhow::Result;
use std::path::Path;

use super::{ConvergenceResult, Decision, LinkKind, LinkSpec};
use crate::error::LinkError;

/// Perform the side effects for a decision.
///
/// `NoOp` returns immediately without touching the filesystem.
///
/// # Errors
///
/// Returns [`LinkError::FilesystemOperationFailed`] when a removal or
/// creation primitive fails.
pub fn apply(spec: &LinkSpec, decision: Decision) -> Result<ConvergenceResult> {
    match decision {
        Decision::NoOp => Ok(ConvergenceResult::new(false)),
        Decision::Create => {
            create_link(spec)?;
            Ok(ConvergenceResult::new(true))
        }
        Decision::Replace => {
            remove_occupant(&spec.path)?;
            create_link(spec)?;
            Ok(ConvergenceResult::new(true))
        }
    }
}

fn create_link(spec: &LinkSpec) -> Result<()> {
    match spec.kind {
        LinkKind::Symbolic => create_symlink(&spec.target, &spec.path)?,
        LinkKind::Hard => std::fs::hard_link(&spec.target, &spec.path)
            .map_err(|e| LinkError::fs("link", &spec.path, e))?,
    }
    tracing::debug!(
        "created {} link from {} -> {}",
        spec.kind,
        spec.target.display(),
        spec.path.display()
    );
    tracing::info!("{} created", spec.path.display());
    Ok(())
}

/// Create a symlink at `link` pointing to `target` (the raw target value,
/// not its absolute resolution).
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
            .map_err(|e| LinkError::fs("symlink", link, e))?;
    }

    #[cfg(windows)]
    {
        let result = if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        match result {
            Ok(()) => {}
            // OS error 5: symlink creation denied without Developer Mode or
            // elevation; mklink in a separate cmd process may still succeed.
            Err(e) if e.raw_os_error() == Some(5) => {
                create_symlink_fallback(target, link)?;
            }
            Err(e) => return Err(LinkError::fs("symlink", link, e).into()),
        }
    }

    Ok(())
}

/// Remove whatever occupies `path`, handling platform differences.
///
/// On Windows, directory symlinks must be removed with `remove_dir` (not
/// `remove_file`); the raw `FILE_ATTRIBUTE_DIRECTORY` bit detects them
/// since `symlink_metadata().is_dir()` returns `false` for symlinks.
pub(crate) fn remove_occupant(path: &Path) -> Result<()> {
    let meta =
        std::fs::symlink_metadata(path).map_err(|e| LinkError::fs("lstat", path, e))?;
    if is_dir_like(&meta) {
        std::fs::remove_dir(path).map_err(|e| LinkError::fs("rmdir", path, e))?;
    } else {
        std::fs::remove_file(path).map_err(|e| LinkError::fs("unlink", path, e))?;
    }
    Ok(())
}

fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

/// Fallback for Windows when symlink creation is not permitted: junctions
/// for directories, hard links for files.
#[cfg(windows)]
fn create_symlink_fallback(target: &Path, link: &Path) -> Result<()> {
    use anyhow::Context as _;
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    if target.is_dir() {
        let output = std::process::Command::new("cmd")
            .arg("/c")
            .arg(format!(
                "mklink /J \"{}\" \"{}\"",
                link.display(),
                target.display()
            ))
            .creation_flags(CREATE_NO_WINDOW)
            .output()
            .context("failed to run mklink /J")?;
        if !output.status.success() {
            anyhow::bail!(
                "cannot create symlink or junction for '{}': {}",
                link.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
    } else {
        std::fs::hard_link(target, link).map_err(|e| LinkError::fs("link", link, e))?;
    }
    Ok(())
}
