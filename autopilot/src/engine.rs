//! Plan execution: validate and dispatch steps strictly in order.
//!
//! A run is all-or-nothing from the caller's point of view. Either every step
//! succeeds and the full outcome list comes back, or the first failing step
//! aborts the run and its error is returned. State changes made by steps that
//! already ran are kept; nothing is rolled back.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::plan::{ToolCall, parse_step, plan_steps};
use crate::core::state::AppState;
use crate::core::types::Outcome;
use crate::error::PlanError;
use crate::io::transport::Transport;
use crate::tools::Toolbox;

/// Execute `plan` against `state`.
pub fn execute_plan<T: Transport>(
    plan: &Value,
    tools: &Toolbox<T>,
    state: &mut AppState,
) -> Result<Vec<Outcome>, PlanError> {
    execute_plan_with(plan, tools, state, |_, _| {})
}

/// Execute `plan`, calling `on_step` with each validated step right before
/// it is dispatched.
pub fn execute_plan_with<T: Transport, F: FnMut(usize, &ToolCall)>(
    plan: &Value,
    tools: &Toolbox<T>,
    state: &mut AppState,
    mut on_step: F,
) -> Result<Vec<Outcome>, PlanError> {
    let steps = plan_steps(plan)?;
    debug!(steps = steps.len(), ?state, "plan run started");

    let mut outcomes = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let call = parse_step(index, step).inspect_err(|err| {
            warn!(index, error = %err, "plan rejected");
        })?;
        let tool = call.tool();

        info!(index, %tool, args = %call.args(), "executing step");
        on_step(index, &call);

        let result = tools.dispatch(state, &call).map_err(|source| {
            warn!(index, %tool, error = %source, "step failed, aborting plan");
            PlanError::Tool {
                index,
                tool,
                source,
            }
        })?;
        debug!(index, %tool, %result, ?state, "step applied");
        outcomes.push(Outcome::new(tool, result));
    }

    debug!(steps = outcomes.len(), ?state, "plan run completed");
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::ToolName;
    use crate::error::{ToolError, TransportError};
    use crate::test_support::{RecordingTransport, toolbox};
    use serde_json::json;

    #[test]
    fn non_array_plan_dispatches_nothing() {
        let tools = toolbox(RecordingTransport::new());
        let mut state = AppState::default();

        for plan in [json!({"tool": "open_app"}), json!(null), json!("open_app")] {
            let err = execute_plan(&plan, &tools, &mut state).unwrap_err();
            assert!(matches!(err, PlanError::InvalidPlanShape { .. }));
        }
        assert_eq!(tools.transport().calls(), 0);
    }

    #[test]
    fn empty_plan_yields_no_outcomes() {
        let tools = toolbox(RecordingTransport::new());
        let mut state = AppState::default();
        let outcomes = execute_plan(&json!([]), &tools, &mut state).expect("run");
        assert!(outcomes.is_empty());
    }

    #[test]
    fn outcomes_follow_plan_order() {
        let tools = toolbox(RecordingTransport::new());
        let mut state = AppState::default();
        let plan = json!([
            {"tool": "open_app"},
            {"tool": "write_text", "args": {"text": "A"}},
            {"tool": "save_document", "args": {"path": "/tmp/x"}}
        ]);

        let outcomes = execute_plan(&plan, &tools, &mut state).expect("run");
        assert_eq!(
            outcomes,
            vec![
                Outcome::new(ToolName::OpenApp, "TextEdit opened"),
                Outcome::new(ToolName::WriteText, "text written"),
                Outcome::new(ToolName::SaveDocument, "saved to /tmp/x"),
            ]
        );
    }

    #[test]
    fn unknown_tool_stops_before_later_steps() {
        let tools = toolbox(RecordingTransport::new());
        let mut state = AppState::default();
        let plan = json!([
            {"tool": "open_app"},
            {"tool": "format_disk"},
            {"tool": "close_app"}
        ]);

        let err = execute_plan(&plan, &tools, &mut state).unwrap_err();
        assert!(matches!(err, PlanError::UnknownTool { index: 1, .. }));
        // open_app ran, close_app never did.
        assert_eq!(tools.transport().calls(), 1);
        assert!(state.application_open);
    }

    #[test]
    fn malformed_step_aborts_without_dispatch() {
        let tools = toolbox(RecordingTransport::new());
        let mut state = AppState::default();
        let plan = json!([{"tool": "write_text", "args": {"body": "A"}}]);

        let err = execute_plan(&plan, &tools, &mut state).unwrap_err();
        assert!(matches!(err, PlanError::MalformedStep { index: 0, .. }));
        assert_eq!(tools.transport().calls(), 0);
    }

    #[test]
    fn transport_failure_keeps_its_kind() {
        let transport = RecordingTransport::new();
        transport.fail_matching(
            "save document",
            TransportError::Script {
                message: "No document to save".to_string(),
            },
        );
        let tools = toolbox(transport);
        let mut state = AppState::default();
        let plan = json!([
            {"tool": "save_document", "args": {"path": "/tmp/x"}},
            {"tool": "open_app"}
        ]);

        let err = execute_plan(&plan, &tools, &mut state).unwrap_err();
        match &err {
            PlanError::Tool {
                index,
                tool,
                source: ToolError::Transport(TransportError::Script { message }),
            } => {
                assert_eq!(*index, 0);
                assert_eq!(*tool, ToolName::SaveDocument);
                assert_eq!(message, "No document to save");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(tools.transport().calls(), 1);
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn on_step_sees_each_step_before_dispatch() {
        let tools = toolbox(RecordingTransport::new());
        let mut state = AppState::default();
        let plan = json!([
            {"tool": "new_document"},
            {"tool": "write_text", "args": {"text": "B"}}
        ]);

        let mut seen = Vec::new();
        execute_plan_with(&plan, &tools, &mut state, |index, call| {
            seen.push((index, call.tool(), tools.transport().calls()));
        })
        .expect("run");

        // new_document skipped (closed app), so write_text is the first call.
        assert_eq!(
            seen,
            vec![(0, ToolName::NewDocument, 0), (1, ToolName::WriteText, 0)]
        );
    }
}
