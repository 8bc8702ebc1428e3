//! Tool layer: one idempotent, state-aware wrapper per registry operation.
//!
//! Each operation reads the caller's [`AppState`], issues at most one transport
//! call, and only updates state after that call succeeds. None of them assume
//! an earlier step ran: they either check the state or provision what they need
//! inside the same script.

use tracing::debug;

use crate::core::plan::ToolCall;
use crate::core::script::ScriptBook;
use crate::core::state::AppState;
use crate::error::ToolError;
use crate::io::transport::Transport;

/// Registry operations bound to a transport and a script book.
pub struct Toolbox<T> {
    transport: T,
    scripts: ScriptBook,
}

impl<T: Transport> Toolbox<T> {
    pub fn new(transport: T, scripts: ScriptBook) -> Self {
        Self { transport, scripts }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Route a validated call to its operation.
    pub fn dispatch(&self, state: &mut AppState, call: &ToolCall) -> Result<String, ToolError> {
        match call {
            ToolCall::OpenApp => self.open_app(state),
            ToolCall::NewDocument => self.new_document(state),
            ToolCall::WriteText { text } => self.write_text(state, text),
            ToolCall::SaveDocument { path } => self.save_document(state, path),
            ToolCall::CloseApp => self.close_app(state),
        }
    }

    /// Activate the application. It creates a blank document on launch.
    pub fn open_app(&self, state: &mut AppState) -> Result<String, ToolError> {
        let app = self.scripts.app();
        if state.application_open {
            debug!(app, "application already open, skipping");
            return Ok(format!("{app} already open"));
        }

        self.transport.run_script(&self.scripts.open_app()?)?;
        state.application_open = true;
        state.document_open = true;
        Ok(format!("{app} opened"))
    }

    /// Create a document, but never launch the application to do so.
    pub fn new_document(&self, state: &mut AppState) -> Result<String, ToolError> {
        if !state.application_open {
            return Ok(format!("{} not open, skipping", self.scripts.app()));
        }
        if state.document_open {
            return Ok("document already exists".to_string());
        }

        self.transport.run_script(&self.scripts.new_document()?)?;
        state.document_open = true;
        Ok("document created".to_string())
    }

    /// Replace the front document's content, creating the document if needed.
    pub fn write_text(&self, state: &mut AppState, text: &str) -> Result<String, ToolError> {
        self.transport.run_script(&self.scripts.write_text(text)?)?;
        state.application_open = true;
        state.document_open = true;
        Ok("text written".to_string())
    }

    /// Save the front document to `path`.
    ///
    /// The application decides whether a document exists; a missing document
    /// surfaces as its script error rather than a local state check.
    pub fn save_document(&self, _state: &mut AppState, path: &str) -> Result<String, ToolError> {
        self.transport.run_script(&self.scripts.save_document(path)?)?;
        Ok(format!("saved to {path}"))
    }

    /// Quit the application, discarding unsaved changes.
    pub fn close_app(&self, state: &mut AppState) -> Result<String, ToolError> {
        let app = self.scripts.app();
        if !state.application_open {
            return Ok(format!("{app} already closed"));
        }

        self.transport.run_script(&self.scripts.close_app()?)?;
        state.application_open = false;
        state.document_open = false;
        Ok(format!("{app} closed"))
    }
}
