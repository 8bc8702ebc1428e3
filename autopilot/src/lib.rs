//! Goal-to-plan automation for a single scripted desktop application.
//!
//! A free-text goal is turned into a plan of named operations by a planner,
//! then executed step by step against the application while tracking its
//! lifecycle (closed, open, open with a document). The crate is split as:
//!
//! - **[`core`]**: Pure logic (plan validation, application state, script
//!   templates). No I/O.
//! - **[`io`]**: Side effects (config, child processes, the script transport,
//!   the planner command). Isolated behind traits so tests can fake them.
//! - **[`tools`]** and **[`engine`]**: the tool layer and the plan execution
//!   engine that ties core logic to a transport.

pub mod core;
pub mod engine;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
