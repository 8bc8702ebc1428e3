//! Test-only fakes for the transport and planner boundaries.

use std::cell::RefCell;

use serde_json::Value;

use crate::core::script::ScriptBook;
use crate::error::{PlannerError, TransportError};
use crate::io::planner::Planner;
use crate::io::transport::Transport;
use crate::tools::Toolbox;

/// Transport that records every payload and answers with an empty string,
/// unless a failure has been queued for that call.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    payloads: RefCell<Vec<String>>,
    fail_at: RefCell<Vec<(usize, TransportError)>>,
    fail_matching: RefCell<Vec<(String, TransportError)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call with `err`.
    pub fn fail_next(&self, err: TransportError) {
        let next = self.calls();
        self.fail_at.borrow_mut().push((next, err));
    }

    /// Fail every call whose payload contains `needle`.
    pub fn fail_matching(&self, needle: &str, err: TransportError) {
        self.fail_matching
            .borrow_mut()
            .push((needle.to_string(), err));
    }

    /// Number of scripts sent so far (including failed ones).
    pub fn calls(&self) -> usize {
        self.payloads.borrow().len()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.borrow().clone()
    }
}

impl Transport for RecordingTransport {
    fn run_script(&self, payload: &str) -> Result<String, TransportError> {
        let index = self.calls();
        self.payloads.borrow_mut().push(payload.to_string());

        if let Some((_, err)) = self.fail_at.borrow().iter().find(|(at, _)| *at == index) {
            return Err(err.clone());
        }
        if let Some((_, err)) = self
            .fail_matching
            .borrow()
            .iter()
            .find(|(needle, _)| payload.contains(needle.as_str()))
        {
            return Err(err.clone());
        }
        Ok(String::new())
    }
}

/// Toolbox targeting `TextEdit` over the given transport.
pub fn toolbox<T: Transport>(transport: T) -> Toolbox<T> {
    Toolbox::new(transport, ScriptBook::new("TextEdit"))
}

/// Planner that returns a fixed reply and records the goals it was given.
#[derive(Debug)]
pub struct ScriptedPlanner {
    reply: Value,
    goals: RefCell<Vec<String>>,
}

impl ScriptedPlanner {
    pub fn new(reply: Value) -> Self {
        Self {
            reply,
            goals: RefCell::new(Vec::new()),
        }
    }

    pub fn goals(&self) -> Vec<String> {
        self.goals.borrow().clone()
    }
}

impl Planner for ScriptedPlanner {
    fn create_plan(&self, goal: &str) -> Result<Value, PlannerError> {
        self.goals.borrow_mut().push(goal.to_string());
        Ok(self.reply.clone())
    }
}
