//! Stable exit codes for the autopilot CLI.

/// Plan completed (or validated, with `--dry-run`).
pub const OK: i32 = 0;
/// Invalid configuration, I/O failure, or any other error.
pub const INVALID: i32 = 1;
/// The planner failed or returned something that is not a plan.
pub const PLANNER: i32 = 2;
/// The plan was rejected before dispatch (shape, unknown tool, bad arguments).
pub const REJECTED: i32 = 3;
/// A step failed while talking to the application (including timeouts).
pub const STEP_FAILED: i32 = 4;
