//! Process-level events shared by every command.

use std::error::Error;

use tracing::{error, info};

pub fn log_command_started(command: &str) {
    info!(
        event = "core.app.command_started",
        command,
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        os = std::env::consts::OS,
    );
}

pub fn log_command_completed(command: &str, exit_code: i32) {
    info!(event = "core.app.command_completed", command, exit_code);
}

pub fn log_command_failed(command: &str, error: &dyn Error) {
    error!(
        event = "core.app.command_failed",
        command,
        error = %error,
        causes = ?error_chain(error),
    );
}

/// Messages of the errors behind `error`, outermost first.
fn error_chain(error: &dyn Error) -> Vec<String> {
    std::iter::successors(error.source(), |&e| e.source())
        .map(ToString::to_string)
        .collect()
}
