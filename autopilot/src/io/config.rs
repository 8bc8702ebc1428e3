//! Autopilot configuration stored under `.autopilot/config.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".autopilot/config.toml";

/// Placeholder in `planner.command` replaced with the reply file path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";
/// Placeholder in `planner.command` replaced with the plan JSON Schema path.
pub const SCHEMA_PLACEHOLDER: &str = "{schema}";

/// Top-level configuration (TOML). Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutopilotConfig {
    /// Application targeted by every script (`tell application "<app_name>"`).
    pub app_name: String,

    pub transport: TransportConfig,

    pub planner: PlannerConfig,
}

/// How scripts reach the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    /// Script host command; the payload is written to its stdin.
    pub command: Vec<String>,

    /// Per-script wall-clock limit in seconds.
    pub timeout_secs: u64,

    /// Keep at most this many bytes of host stdout/stderr.
    pub output_limit_bytes: usize,
}

/// How goals are turned into plans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlannerConfig {
    /// Planner command; the prompt is written to its stdin. `{output}` and
    /// `{schema}` are substituted with scratch file paths. Without `{output}`
    /// the reply is read from stdout.
    pub command: Vec<String>,

    pub timeout_secs: u64,

    pub output_limit_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            command: vec!["osascript".to_string(), "-".to_string()],
            timeout_secs: 30,
            output_limit_bytes: 100_000,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            command: [
                "codex",
                "exec",
                "--skip-git-repo-check",
                "--output-schema",
                SCHEMA_PLACEHOLDER,
                "--output-last-message",
                OUTPUT_PLACEHOLDER,
                "-",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            timeout_secs: 5 * 60,
            output_limit_bytes: 100_000,
        }
    }
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            app_name: "TextEdit".to_string(),
            transport: TransportConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PlannerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AutopilotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(anyhow!("app_name must not be empty"));
        }
        validate_command("transport.command", &self.transport.command)?;
        validate_command("planner.command", &self.planner.command)?;
        if self.transport.timeout_secs == 0 {
            return Err(anyhow!("transport.timeout_secs must be > 0"));
        }
        if self.planner.timeout_secs == 0 {
            return Err(anyhow!("planner.timeout_secs must be > 0"));
        }
        if self.transport.output_limit_bytes == 0 {
            return Err(anyhow!("transport.output_limit_bytes must be > 0"));
        }
        if self.planner.output_limit_bytes == 0 {
            return Err(anyhow!("planner.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

fn validate_command(field: &str, command: &[String]) -> Result<()> {
    match command.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(anyhow!("{field} must be a non-empty array")),
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AutopilotConfig::default()`.
pub fn load_config(path: &Path) -> Result<AutopilotConfig> {
    if !path.exists() {
        let cfg = AutopilotConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AutopilotConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AutopilotConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
