//! Declarative convergence engine for filesystem link resources.
//!
//! Given a desired link spec — path, kind (symbolic or hard), target, and
//! optionally owner/group — the engine probes the current filesystem state,
//! decides the minimal change (`no-op`, `create`, or `replace`), applies
//! it, and reports whether anything changed.  Running the same spec twice
//! yields at most one change: the second run is a no-op.
//!
//! The public API is organised into focused layers:
//!
//! - **[`link`]** — the desired-state model: probe, decide, apply
//! - **[`identity`]** — user/group references and numeric-id resolution
//! - **[`ownership`]** — link ownership reconciliation (symbolic links only)
//! - **[`commands`]** — top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod exec;
pub mod identity;
pub mod link;
pub mod logging;
pub mod ownership;
