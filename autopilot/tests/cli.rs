//! CLI tests for the `autopilot` binary.
//!
//! Each test writes a config into a temp dir whose transport and planner
//! commands are plain shell stand-ins, then spawns the binary there and
//! checks its exit code and output.

#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use autopilot::exit_codes;
use autopilot::io::config::{AutopilotConfig, DEFAULT_CONFIG_PATH, write_config};

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn setup(transport: &[&str], planner: &[&str]) -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut cfg = AutopilotConfig::default();
    cfg.transport.command = strings(transport);
    cfg.transport.timeout_secs = 5;
    cfg.planner.command = strings(planner);
    cfg.planner.timeout_secs = 5;
    write_config(&temp.path().join(DEFAULT_CONFIG_PATH), &cfg).expect("write config");
    temp
}

fn run(dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_autopilot"))
        .current_dir(dir)
        .args(args)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn autopilot");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("autopilot output")
}

fn write_plan(dir: &Path, plan: &str) {
    fs::write(dir.join("plan.json"), plan).expect("write plan");
}

const SESSION: &str = r#"[
    {"tool": "open_app", "args": {}},
    {"tool": "write_text", "args": {"text": "hi"}},
    {"tool": "save_document", "args": {"path": "/tmp/autopilot-cli.txt"}},
    {"tool": "close_app", "args": {}}
]"#;

#[test]
fn plan_file_runs_to_completion() {
    let temp = setup(&["cat"], &["false"]);
    write_plan(temp.path(), SESSION);

    let output = run(temp.path(), &["--plan", "plan.json"], "");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{stdout}");
    assert!(stdout.contains(r#"→ Executing write_text {"text":"hi"}"#), "{stdout}");
    assert!(stdout.contains("open_app: TextEdit opened"), "{stdout}");
    assert!(stdout.contains("save_document: saved to /tmp/autopilot-cli.txt"), "{stdout}");
    assert!(stdout.contains("close_app: TextEdit closed"), "{stdout}");
}

#[test]
fn script_failure_exits_with_step_failed() {
    let temp = setup(
        &["sh", "-c", "cat >/dev/null; echo 'TextEdit got an error' >&2; exit 1"],
        &["false"],
    );
    write_plan(temp.path(), SESSION);

    let output = run(temp.path(), &["--plan", "plan.json"], "");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(exit_codes::STEP_FAILED));
    assert!(stderr.contains("step[0] (open_app) failed"), "{stderr}");
    assert!(stderr.contains("TextEdit got an error"), "{stderr}");
}

#[test]
fn unknown_tool_exits_with_rejected() {
    let temp = setup(&["cat"], &["false"]);
    write_plan(temp.path(), r#"[{"tool": "open_app"}, {"tool": "rm_rf"}]"#);

    let output = run(temp.path(), &["--plan", "plan.json"], "");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(exit_codes::REJECTED));
    // The first step still ran.
    assert!(stdout.contains("→ Executing open_app {}"), "{stdout}");
    assert!(!stdout.contains("Results:"), "{stdout}");
}

#[test]
fn dry_run_validates_without_executing() {
    let temp = setup(&["sh", "-c", "exit 1"], &["false"]);
    write_plan(temp.path(), SESSION);

    let output = run(temp.path(), &["--plan", "plan.json", "--dry-run"], "");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{stdout}");
    assert!(stdout.contains("Plan is valid (4 steps)"), "{stdout}");
    assert!(!stdout.contains("→ Executing"), "{stdout}");
}

#[test]
fn goal_on_stdin_goes_through_planner() {
    let temp = setup(
        &["cat"],
        &[
            "sh",
            "-c",
            r#"grep -q 'close the app' || exit 9; echo '[{"tool":"close_app","args":{}}]'"#,
        ],
    );

    let output = run(temp.path(), &[], "close the app\n");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(exit_codes::OK), "{stdout}");
    assert!(stdout.contains("What do you want to do?"), "{stdout}");
    assert!(stdout.contains("close_app: TextEdit already closed"), "{stdout}");
}

#[test]
fn invalid_planner_reply_exits_with_planner_code() {
    let temp = setup(&["cat"], &["sh", "-c", "cat >/dev/null; echo 'I cannot help'"]);

    let output = run(temp.path(), &[], "open it\n");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(exit_codes::PLANNER));
    assert!(stderr.contains("invalid JSON"), "{stderr}");
}

#[test]
fn empty_goal_is_invalid() {
    let temp = setup(&["cat"], &["false"]);
    let output = run(temp.path(), &[], "\n");
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}
