//! Diagnostic tracing for the autopilot CLI.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. Product output
//! (the plan, per-step trace lines, outcomes) is printed to stdout by `main`
//! and is unaffected by the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber for the binary.
///
/// `RUST_LOG` selects targets; unset means `warn`, which still reports failed
/// steps, timeouts and planner errors. Per-step dispatch and state changes log
/// under `autopilot::engine`, script and planner subprocesses under
/// `autopilot::io::transport`, `autopilot::io::planner` and
/// `autopilot::io::process`.
///
/// ```bash
/// RUST_LOG=autopilot::engine=debug,autopilot::io::transport=debug autopilot --plan plan.json
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
