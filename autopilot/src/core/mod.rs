//! Deterministic, pure logic shared by the engine and tools.
//!
//! Core modules are free of I/O side effects. They validate plans, describe
//! application state, and render script payloads.

pub mod plan;
pub mod script;
pub mod state;
pub mod types;
