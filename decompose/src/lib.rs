//! Recursive decomposition of work-item trees.
//!
//! Items are rewritten into finer-grained items until each satisfies a
//! caller-supplied acceptance predicate or cannot be rewritten any further.
//! The crate is split into:
//!
//! - **[`core`]**: Pure, deterministic logic (flattening, single-step expansion,
//!   the expansion chain, and the worklist engine). No I/O.
//! - **[`io`]**: Rule library files on disk.
//!
//! [`library`] turns a rule file into concrete work items, and the
//! orchestration modules ([`run`], [`validate`]) back the CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod library;
pub mod logging;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
