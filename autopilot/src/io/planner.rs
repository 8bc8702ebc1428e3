//! Planner boundary: goal string in, untyped plan JSON out.
//!
//! The [`Planner`] trait decouples the CLI from the planning backend (by
//! default `codex exec` constrained by the plan JSON Schema). Whatever the
//! backend returns is checked here and rejected as
//! [`PlannerError::Output`] if it is not a plan; the engine validates again
//! independently before dispatching anything.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use jsonschema::{Draft, Validator};
use regex::Regex;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::core::plan::json_kind;
use crate::error::PlannerError;
use crate::io::config::{OUTPUT_PLACEHOLDER, PlannerConfig, SCHEMA_PLACEHOLDER};
use crate::io::process::run_command_with_timeout;
use crate::io::prompt::PromptEngine;

/// JSON Schema for a planner reply (`{"steps": [...]}`).
pub const PLAN_SCHEMA: &str = include_str!("../../schemas/plan.schema.json");

static PLAN_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    let schema: Value =
        serde_json::from_str(PLAN_SCHEMA).expect("bundled plan schema should be valid json");
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .expect("bundled plan schema should compile")
});

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*\n(.*?)\n?```$").expect("fence regex should compile")
});

/// Produces a plan for a free-text goal.
pub trait Planner {
    fn create_plan(&self, goal: &str) -> Result<Value, PlannerError>;
}

/// Planner that runs an external command with the prompt on stdin.
pub struct CommandPlanner {
    config: PlannerConfig,
    app: String,
    prompts: PromptEngine,
}

impl CommandPlanner {
    pub fn new(config: PlannerConfig, app: impl Into<String>) -> Self {
        Self {
            config,
            app: app.into(),
            prompts: PromptEngine::new(),
        }
    }

    fn reads_output_file(&self) -> bool {
        self.config
            .command
            .iter()
            .any(|arg| arg.contains(OUTPUT_PLACEHOLDER))
    }

    fn command(&self, schema_path: &Path, output_path: &Path) -> Result<Command, PlannerError> {
        let args: Vec<String> = self
            .config
            .command
            .iter()
            .map(|arg| {
                arg.replace(SCHEMA_PLACEHOLDER, &schema_path.display().to_string())
                    .replace(OUTPUT_PLACEHOLDER, &output_path.display().to_string())
            })
            .collect();
        let (program, rest) = args.split_first().ok_or_else(|| PlannerError::Command {
            message: "planner command is empty".to_string(),
        })?;
        let mut cmd = Command::new(program);
        cmd.args(rest);
        Ok(cmd)
    }
}

impl Planner for CommandPlanner {
    #[instrument(skip_all, fields(timeout_secs = self.config.timeout_secs))]
    fn create_plan(&self, goal: &str) -> Result<Value, PlannerError> {
        let command_failed = |message: String| PlannerError::Command { message };

        let prompt = self
            .prompts
            .render_planner(&self.app, goal)
            .map_err(|err| command_failed(format!("render planner prompt: {err:#}")))?;

        let scratch = tempfile::tempdir()
            .map_err(|err| command_failed(format!("create planner scratch dir: {err}")))?;
        let schema_path = scratch.path().join("plan.schema.json");
        let output_path = scratch.path().join("reply.json");
        fs::write(&schema_path, PLAN_SCHEMA)
            .map_err(|err| command_failed(format!("write {}: {err}", schema_path.display())))?;

        info!(goal_bytes = goal.len(), "requesting plan");
        let output = run_command_with_timeout(
            self.command(&schema_path, &output_path)?,
            Some(prompt.as_bytes()),
            self.config.timeout(),
            self.config.output_limit_bytes,
        )
        .map_err(|err| command_failed(format!("{err:#}")))?;

        if output.timed_out {
            warn!(timeout_secs = self.config.timeout_secs, "planner timed out");
            return Err(command_failed(format!(
                "timed out after {}s",
                self.config.timeout_secs
            )));
        }
        if !output.success() {
            warn!(exit_code = ?output.status.code(), "planner failed");
            return Err(command_failed(format!(
                "exited with status {:?}: {}",
                output.status.code(),
                output.stderr_text()
            )));
        }

        let raw = if self.reads_output_file() {
            fs::read_to_string(&output_path).map_err(|err| PlannerError::Output {
                reason: format!("no reply at {}: {err}", output_path.display()),
                raw: output.stdout_text(),
            })?
        } else {
            output.stdout_text()
        };
        debug!(reply_bytes = raw.len(), "planner replied");
        parse_planner_reply(&raw)
    }
}

/// Turn a raw planner reply into a plan (a JSON array of steps).
///
/// Accepts a bare array or `{"steps": [...]}`, optionally wrapped in a
/// markdown code fence, and checks it against [`PLAN_SCHEMA`].
pub fn parse_planner_reply(raw: &str) -> Result<Value, PlannerError> {
    let invalid = |reason: String| PlannerError::Output {
        reason,
        raw: raw.to_string(),
    };

    let trimmed = raw.trim();
    let body = match FENCE_RE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    };

    let reply: Value =
        serde_json::from_str(body).map_err(|err| invalid(format!("invalid JSON: {err}")))?;
    let wrapped = match reply {
        Value::Array(steps) => json!({ "steps": steps }),
        Value::Object(_) => reply,
        other => {
            return Err(invalid(format!(
                "expected a JSON array of steps, got {}",
                json_kind(&other)
            )));
        }
    };

    let errors: Vec<String> = PLAN_VALIDATOR
        .iter_errors(&wrapped)
        .map(|err| err.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(invalid(format!(
            "schema validation failed:\n- {}",
            errors.join("\n- ")
        )));
    }

    Ok(wrapped
        .get("steps")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new())))
}
