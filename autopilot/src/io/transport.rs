//! Transport boundary: send one script to the application, get text back.
//!
//! The [`Transport`] trait decouples the tool layer from the automation host
//! (currently `osascript`). Tests use recording transports that answer from a
//! script queue without spawning processes.

use std::process::Command;

use tracing::{debug, instrument, warn};

use crate::error::TransportError;
use crate::io::config::TransportConfig;
use crate::io::process::run_command_with_timeout;

/// Synchronous script execution against the target application.
pub trait Transport {
    /// Run `payload` and return the host's trimmed textual output.
    fn run_script(&self, payload: &str) -> Result<String, TransportError>;
}

/// Transport that pipes scripts into `osascript -` (or the configured host).
#[derive(Debug, Clone)]
pub struct OsascriptTransport {
    config: TransportConfig,
}

impl OsascriptTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    fn command(&self) -> Result<Command, TransportError> {
        let (program, args) =
            self.config
                .command
                .split_first()
                .ok_or_else(|| TransportError::Launch {
                    message: "transport command is empty".to_string(),
                })?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        Ok(cmd)
    }
}

impl Transport for OsascriptTransport {
    #[instrument(skip_all, fields(timeout_secs = self.config.timeout_secs, payload_bytes = payload.len()))]
    fn run_script(&self, payload: &str) -> Result<String, TransportError> {
        let output = run_command_with_timeout(
            self.command()?,
            Some(payload.as_bytes()),
            self.config.timeout(),
            self.config.output_limit_bytes,
        )
        .map_err(|err| TransportError::Launch {
            message: format!("{err:#}"),
        })?;

        if output.timed_out {
            warn!(timeout_secs = self.config.timeout_secs, "script timed out");
            return Err(TransportError::Timeout {
                timeout_secs: self.config.timeout_secs,
            });
        }
        if !output.success() {
            let message = output.stderr_text();
            warn!(exit_code = ?output.status.code(), %message, "script failed");
            return Err(TransportError::Script {
                message: if message.is_empty() {
                    format!("script host exited with status {:?}", output.status.code())
                } else {
                    message
                },
            });
        }

        debug!("script completed");
        Ok(output.stdout_text())
    }
}
