//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::identity::IdentityRef;
use crate::link::LinkKind;

/// Top-level CLI entry point for the link convergence engine.
#[derive(Parser, Debug)]
#[command(
    name = "linkctl",
    about = "Declarative symlink and hard-link convergence",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Print the result as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bring a link to its desired state (create-or-update)
    Converge(ConvergeOpts),
    /// Delete a link, verifying it is the expected kind first
    Remove(RemoveOpts),
    /// Print version information
    Version,
}

/// Options for the `converge` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ConvergeOpts {
    /// Filesystem location the link occupies
    pub path: PathBuf,

    /// What the link should point to (symbolic) or be linked from (hard)
    pub target: PathBuf,

    /// Link kind to converge to
    #[arg(short, long, value_enum, default_value_t = LinkKind::Symbolic)]
    pub kind: LinkKind,

    /// Desired owner: numeric id or user name (symbolic links only)
    #[arg(long)]
    pub owner: Option<IdentityRef>,

    /// Desired group: numeric id or group name (symbolic links only)
    #[arg(long)]
    pub group: Option<IdentityRef>,
}

/// Options for the `remove` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RemoveOpts {
    /// Filesystem location of the link to delete
    pub path: PathBuf,

    /// Expected link kind at the path
    #[arg(short, long, value_enum, default_value_t = LinkKind::Symbolic)]
    pub kind: LinkKind,
}
