//! Best-effort record of the target application's lifecycle.
//!
//! The record reflects what this process caused, not what the application
//! reports. It drifts if someone quits the application by hand; tools tolerate
//! that by checking or re-provisioning at the application level where it matters.

/// Observable lifecycle of the target application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Closed,
    OpenNoDocument,
    OpenWithDocument,
}

/// Application state threaded by `&mut` through every tool call.
///
/// Invariant: `document_open` implies `application_open`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppState {
    /// Set once the application has been activated by this process.
    pub application_open: bool,
    /// Set once a document is known to exist in the application.
    pub document_open: bool,
}

impl AppState {
    pub fn lifecycle(&self) -> Lifecycle {
        match (self.application_open, self.document_open) {
            (true, true) => Lifecycle::OpenWithDocument,
            (true, false) => Lifecycle::OpenNoDocument,
            (false, _) => Lifecycle::Closed,
        }
    }

    /// True unless a document is recorded while the application is closed.
    pub fn is_consistent(&self) -> bool {
        self.application_open || !self.document_open
    }
}
