//! Shared deterministic types for plan execution.

use std::fmt;

use serde::Serialize;

use crate::core::plan::ToolName;

/// Recorded result of one executed step, in plan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub tool: ToolName,
    pub result: String,
}

impl Outcome {
    pub fn new(tool: ToolName, result: impl Into<String>) -> Self {
        Self {
            tool,
            result: result.into(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tool, self.result)
    }
}
