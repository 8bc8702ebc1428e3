//! Planner prompt rendering.

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::plan::ToolName;

const PLANNER_TEMPLATE: &str = include_str!("prompts/planner.md");

/// Registry entry as shown to the planner.
#[derive(Debug, Clone, Serialize)]
struct ToolContext {
    name: &'static str,
    params: &'static [&'static str],
    summary: &'static str,
}

impl ToolContext {
    fn from_tool(tool: ToolName) -> Self {
        Self {
            name: tool.as_str(),
            params: tool.params(),
            summary: tool.summary(),
        }
    }
}

/// Template engine wrapper for the planner prompt.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template("planner", PLANNER_TEMPLATE)
            .expect("planner template should be valid");
        Self { env }
    }

    /// Render the planner prompt for `goal`, listing the whole registry.
    pub fn render_planner(&self, app: &str, goal: &str) -> Result<String> {
        let tools: Vec<ToolContext> = ToolName::ALL.into_iter().map(ToolContext::from_tool).collect();
        let template = self.env.get_template("planner")?;
        let rendered = template.render(context! {
            app => app,
            tools => tools,
            goal => goal.trim(),
        })?;
        Ok(rendered)
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}
