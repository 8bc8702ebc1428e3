//! I/O adapters: configuration, child processes, transport, planner.

pub mod config;
pub mod planner;
pub mod process;
pub mod prompt;
pub mod transport;
