//! Subcommand orchestration: wire the system seams and run one operation.

use anyhow::Result;

use crate::cli::{ConvergeOpts, GlobalOpts, RemoveOpts};
use crate::exec::SystemExecutor;
use crate::identity::SystemIdentity;
use crate::link::{self, ConvergenceResult, Decision, LinkKind, LinkResource, LinkSpec};
use crate::ownership::{OwnershipReconciler, SystemOwnership};

/// Run the `converge` command.
///
/// # Errors
///
/// Returns an error if probing, applying, identity resolution, or ownership
/// reconciliation fails.
pub fn converge(global: &GlobalOpts, opts: &ConvergeOpts) -> Result<()> {
    let mut spec = match opts.kind {
        LinkKind::Symbolic => LinkSpec::symbolic(&opts.path, &opts.target),
        LinkKind::Hard => LinkSpec::hard(&opts.path, &opts.target),
    };
    spec.owner = opts.owner.clone();
    spec.group = opts.group.clone();
    let resource = LinkResource::new(spec);

    if global.dry_run {
        let (_, decision) = resource.plan()?;
        match decision {
            Decision::NoOp => tracing::info!("{} already correct", resource.description()),
            Decision::Create => tracing::info!("would create {}", resource.description()),
            Decision::Replace => tracing::info!("would replace {}", resource.description()),
        }
        return emit(global, ConvergenceResult::new(decision != Decision::NoOp));
    }

    let exec = SystemExecutor;
    let identity = SystemIdentity::new(&exec);
    let ownership = OwnershipReconciler::new(&identity, &SystemOwnership);
    let result = resource.converge(&ownership)?;
    emit(global, result)
}

/// Run the `remove` command.
///
/// # Errors
///
/// Returns an error if the path holds something other than the expected
/// link kind, or if unlinking fails.
pub fn remove(global: &GlobalOpts, opts: &RemoveOpts) -> Result<()> {
    if global.dry_run {
        use crate::link::probe::{Occupancy, classify};
        let result = match classify(&opts.path, opts.kind)? {
            Occupancy::Absent => ConvergenceResult::new(false),
            Occupancy::ExpectedKind => {
                tracing::info!("would remove {}", opts.path.display());
                ConvergenceResult::new(true)
            }
            Occupancy::OtherObject => {
                return Err(crate::error::LinkError::WrongLinkKind {
                    path: opts.path.display().to_string(),
                    expected: opts.kind.as_str(),
                }
                .into());
            }
        };
        return emit(global, result);
    }

    let result = link::remove(&opts.path, opts.kind)?;
    emit(global, result)
}

/// Report the outcome on stdout (JSON) or through the log.
fn emit(global: &GlobalOpts, result: ConvergenceResult) -> Result<()> {
    if global.json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        tracing::info!("changed: {}", result.changed);
    }
    Ok(())
}
