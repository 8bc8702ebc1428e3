//! Plan shape validation and the closed tool registry.
//!
//! Plans arrive as untyped JSON from the planner (or a saved file). Each step is
//! turned into a typed [`ToolCall`] here, so the tool layer never sees raw
//! argument maps.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PlanError;

/// Names of the fixed operation set. The wire strings are a stable contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    OpenApp,
    NewDocument,
    WriteText,
    SaveDocument,
    CloseApp,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::OpenApp,
        ToolName::NewDocument,
        ToolName::WriteText,
        ToolName::SaveDocument,
        ToolName::CloseApp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::OpenApp => "open_app",
            ToolName::NewDocument => "new_document",
            ToolName::WriteText => "write_text",
            ToolName::SaveDocument => "save_document",
            ToolName::CloseApp => "close_app",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Declared parameter names, all required and all strings.
    pub fn params(self) -> &'static [&'static str] {
        match self {
            ToolName::WriteText => &["text"],
            ToolName::SaveDocument => &["path"],
            ToolName::OpenApp | ToolName::NewDocument | ToolName::CloseApp => &[],
        }
    }

    /// One-line summary used in the planner prompt.
    pub fn summary(self) -> &'static str {
        match self {
            ToolName::OpenApp => "launch and activate the application (it opens a blank document)",
            ToolName::NewDocument => "create a new document when the application is open and has none",
            ToolName::WriteText => "replace the whole content of the front document with `text`",
            ToolName::SaveDocument => "save the front document to the absolute file `path`",
            ToolName::CloseApp => "quit the application without saving",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comma-separated registry names, for error messages.
pub fn registry_names() -> String {
    ToolName::ALL
        .iter()
        .map(|tool| tool.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A validated step with typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case")]
pub enum ToolCall {
    OpenApp,
    NewDocument,
    WriteText { text: String },
    SaveDocument { path: String },
    CloseApp,
}

impl ToolCall {
    pub fn tool(&self) -> ToolName {
        match self {
            ToolCall::OpenApp => ToolName::OpenApp,
            ToolCall::NewDocument => ToolName::NewDocument,
            ToolCall::WriteText { .. } => ToolName::WriteText,
            ToolCall::SaveDocument { .. } => ToolName::SaveDocument,
            ToolCall::CloseApp => ToolName::CloseApp,
        }
    }

    /// Arguments as a JSON object (empty for parameterless tools).
    pub fn args(&self) -> Value {
        let mut args = Map::new();
        match self {
            ToolCall::WriteText { text } => {
                args.insert("text".to_string(), Value::String(text.clone()));
            }
            ToolCall::SaveDocument { path } => {
                args.insert("path".to_string(), Value::String(path.clone()));
            }
            ToolCall::OpenApp | ToolCall::NewDocument | ToolCall::CloseApp => {}
        }
        Value::Object(args)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TextArgs {
    text: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PathArgs {
    path: String,
}

const MISSING_TOOL: &str = "<missing>";

/// Borrow the step list, rejecting anything that is not a JSON array.
pub fn plan_steps(plan: &Value) -> Result<&[Value], PlanError> {
    plan.as_array()
        .map(Vec::as_slice)
        .ok_or(PlanError::InvalidPlanShape {
            found: json_kind(plan),
        })
}

/// Validate one step and convert it into a typed call.
///
/// Checks run in order: object shape, `tool` presence, registry membership
/// (`UnknownTool`), then step fields and arguments (`MalformedStep`).
pub fn parse_step(index: usize, step: &Value) -> Result<ToolCall, PlanError> {
    let malformed = |tool: &str, reason: String| PlanError::MalformedStep {
        index,
        tool: tool.to_string(),
        reason,
    };

    let fields = step.as_object().ok_or_else(|| {
        malformed(
            MISSING_TOOL,
            format!("step must be an object, got {}", json_kind(step)),
        )
    })?;

    let raw_tool = match fields.get("tool") {
        Some(Value::String(name)) => name.as_str(),
        Some(other) => {
            return Err(malformed(
                MISSING_TOOL,
                format!("'tool' must be a string, got {}", json_kind(other)),
            ));
        }
        None => return Err(malformed(MISSING_TOOL, "missing 'tool' field".to_string())),
    };

    let tool = ToolName::parse(raw_tool).ok_or_else(|| PlanError::UnknownTool {
        index,
        tool: raw_tool.to_string(),
    })?;

    if let Some(extra) = fields.keys().find(|key| *key != "tool" && *key != "args") {
        return Err(malformed(raw_tool, format!("unexpected step field '{extra}'")));
    }

    let args = match fields.get("args") {
        None => Value::Object(Map::new()),
        Some(value @ Value::Object(_)) => value.clone(),
        Some(other) => {
            return Err(malformed(
                raw_tool,
                format!("'args' must be an object, got {}", json_kind(other)),
            ));
        }
    };

    let typed = match tool {
        ToolName::OpenApp => decode::<NoArgs>(args).map(|_| ToolCall::OpenApp),
        ToolName::NewDocument => decode::<NoArgs>(args).map(|_| ToolCall::NewDocument),
        ToolName::WriteText => {
            decode::<TextArgs>(args).map(|a| ToolCall::WriteText { text: a.text })
        }
        ToolName::SaveDocument => {
            decode::<PathArgs>(args).map(|a| ToolCall::SaveDocument { path: a.path })
        }
        ToolName::CloseApp => decode::<NoArgs>(args).map(|_| ToolCall::CloseApp),
    };

    typed.map_err(|reason| malformed(raw_tool, format!("invalid args: {reason}")))
}

/// Validate a whole plan without executing anything.
pub fn parse_plan(plan: &Value) -> Result<Vec<ToolCall>, PlanError> {
    plan_steps(plan)?
        .iter()
        .enumerate()
        .map(|(index, step)| parse_step(index, step))
        .collect()
}

fn decode<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|err| err.to_string())
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
