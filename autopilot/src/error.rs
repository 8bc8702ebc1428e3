//! Error taxonomy for planning, validation, and execution.
//!
//! Every error is fatal to the current plan run. Kinds are preserved as they
//! propagate: a transport failure inside step 3 still surfaces as a
//! [`TransportError`] reachable through [`PlanError::Tool`].

use thiserror::Error;

use crate::core::plan::{ToolName, registry_names};

/// Failure of a single script round-trip with the target application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The application (or the automation host) rejected the script.
    /// `message` is the host's error text, passed through verbatim.
    #[error("script failed: {message}")]
    Script { message: String },

    #[error("script timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("failed to run transport: {message}")]
    Launch { message: String },
}

/// A script template could not be rendered.
#[derive(Debug, Error)]
#[error("render {template} script")]
pub struct ScriptError {
    pub template: &'static str,
    #[source]
    pub source: minijinja::Error,
}

/// Failure raised by a tool operation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Failure of a plan run.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan must be a JSON array of steps, got {found}")]
    InvalidPlanShape { found: &'static str },

    #[error("step[{index}]: unknown tool '{tool}' (known tools: {known})", known = registry_names())]
    UnknownTool { index: usize, tool: String },

    #[error("step[{index}] ({tool}): {reason}")]
    MalformedStep {
        index: usize,
        /// Tool label as written in the step, or `<missing>`.
        tool: String,
        reason: String,
    },

    #[error("step[{index}] ({tool}) failed")]
    Tool {
        index: usize,
        tool: ToolName,
        #[source]
        source: ToolError,
    },
}

impl PlanError {
    /// True for errors raised before dispatch (shape, registry, arguments).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, PlanError::Tool { .. })
    }

    /// The transport failure behind a failed step, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            PlanError::Tool {
                source: ToolError::Transport(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}

/// Failure at the planner boundary.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The planner replied, but the reply is not a well-formed plan.
    #[error("planner returned an invalid plan: {reason}\n--- raw output ---\n{raw}")]
    Output { reason: String, raw: String },

    /// The planner command could not produce a reply at all.
    #[error("planner command failed: {message}")]
    Command { message: String },
}
