//! Stable exit codes for CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid rules, arguments, or configuration, or any other error.
pub const INVALID: i32 = 1;
/// `decompose run` hit an operation it could neither keep nor decompose.
pub const STUCK: i32 = 3;
/// `decompose run --once` was given an operation with no usable decomposition.
pub const NOT_EXPANDABLE: i32 = 4;
